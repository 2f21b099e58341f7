use std::time::Duration;

use atheneum::services::{
    BookInput, BorrowerInput, STATUS_ACTIVE, STATUS_RETURNED, add_book, add_borrower, add_loan,
    get_all_loans, get_book_by_id, get_loan_count_for_book, return_loan, update_book,
};
use atheneum::{DomainError, Library, db};
use chrono::DateTime;

// Unseeded in-memory database per test
async fn setup() -> Library {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let conn = db::init_db("sqlite::memory:").await.expect("init db");
    Library::new(conn, Duration::from_secs(5))
}

async fn book_with_copies(app: &Library, title: &str, quantity: i32) -> i32 {
    add_book(
        app,
        BookInput {
            title: title.to_string(),
            isbn: None,
            category_id: None,
            author_name: None,
            publisher_name: None,
            quantity,
        },
    )
    .await
    .expect("add book")
}

async fn borrower_named(app: &Library, name: &str) -> i32 {
    add_borrower(
        app,
        BorrowerInput {
            name: name.to_string(),
            email: None,
            phone: None,
        },
    )
    .await
    .expect("add borrower")
}

async fn active_loans_for_book(app: &Library, book_id: i32) -> i64 {
    get_all_loans(app)
        .await
        .expect("list loans")
        .into_iter()
        .filter(|l| l.book_id == book_id && l.status == STATUS_ACTIVE)
        .count() as i64
}

// available == quantity - active loans, checked after every committed step
async fn assert_availability_invariant(app: &Library, book_id: i32) {
    let book = get_book_by_id(app, book_id)
        .await
        .expect("get book")
        .expect("book exists");
    let active = active_loans_for_book(app, book_id).await;
    assert_eq!(
        i64::from(book.available),
        i64::from(book.quantity) - active,
        "availability drifted for book {book_id}"
    );
}

#[tokio::test]
async fn loan_and_return_adjust_availability() {
    let app = setup().await;
    let borrower_id = borrower_named(&app, "Ada").await;
    let book_id = book_with_copies(&app, "Dune", 2).await;

    let loan_id = add_loan(&app, book_id, borrower_id).await.expect("add loan");

    let book = get_book_by_id(&app, book_id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 2);
    assert_eq!(book.available, 1);
    assert_availability_invariant(&app, book_id).await;

    let loans = get_all_loans(&app).await.unwrap();
    assert_eq!(loans.len(), 1);
    let loan = &loans[0];
    assert_eq!(loan.id, loan_id);
    assert_eq!(loan.status, STATUS_ACTIVE);
    assert_eq!(loan.book_title, "Dune");
    assert_eq!(loan.borrower_name, "Ada");
    assert!(loan.return_date.is_none());

    // Due date is the loan date plus the 14-day loan period
    let loaned = DateTime::parse_from_rfc3339(&loan.loan_date).unwrap();
    let due = DateTime::parse_from_rfc3339(loan.due_date.as_deref().unwrap()).unwrap();
    assert_eq!(due - loaned, chrono::Duration::days(14));

    return_loan(&app, loan_id).await.expect("return loan");

    let book = get_book_by_id(&app, book_id).await.unwrap().unwrap();
    assert_eq!(book.available, 2);
    assert_availability_invariant(&app, book_id).await;

    let loans = get_all_loans(&app).await.unwrap();
    assert_eq!(loans[0].status, STATUS_RETURNED);
    assert!(loans[0].return_date.is_some());
}

#[tokio::test]
async fn add_loan_requires_an_available_copy() {
    let app = setup().await;
    let borrower_id = borrower_named(&app, "Ada").await;
    let book_id = book_with_copies(&app, "Dune", 1).await;

    add_loan(&app, book_id, borrower_id).await.expect("first loan");

    let err = add_loan(&app, book_id, borrower_id).await.unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)), "got {err:?}");

    // No row inserted, no availability change
    assert_eq!(get_loan_count_for_book(&app, book_id).await.unwrap(), 1);
    let book = get_book_by_id(&app, book_id).await.unwrap().unwrap();
    assert_eq!(book.available, 0);
    assert_availability_invariant(&app, book_id).await;
}

#[tokio::test]
async fn add_loan_on_zero_quantity_book_is_rejected() {
    let app = setup().await;
    let borrower_id = borrower_named(&app, "Ada").await;
    let book_id = book_with_copies(&app, "Out of print", 0).await;

    let err = add_loan(&app, book_id, borrower_id).await.unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));
    assert_eq!(get_loan_count_for_book(&app, book_id).await.unwrap(), 0);
}

#[tokio::test]
async fn add_loan_for_unknown_book_is_not_found() {
    let app = setup().await;
    let borrower_id = borrower_named(&app, "Ada").await;

    let err = add_loan(&app, 999, borrower_id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound));
}

#[tokio::test]
async fn add_loan_for_unknown_borrower_hits_foreign_key() {
    let app = setup().await;
    let book_id = book_with_copies(&app, "Dune", 1).await;

    let err = add_loan(&app, book_id, 999).await.unwrap_err();
    assert!(matches!(err, DomainError::Constraint(_)), "got {err:?}");

    // The rejected transaction must not leak a partial availability change
    let book = get_book_by_id(&app, book_id).await.unwrap().unwrap();
    assert_eq!(book.available, 1);
}

#[tokio::test]
async fn returning_a_returned_loan_is_rejected() {
    let app = setup().await;
    let borrower_id = borrower_named(&app, "Ada").await;
    let book_id = book_with_copies(&app, "Dune", 1).await;
    let loan_id = add_loan(&app, book_id, borrower_id).await.unwrap();

    return_loan(&app, loan_id).await.expect("first return");

    let err = return_loan(&app, loan_id).await.unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)), "got {err:?}");

    // available must not be incremented twice
    let book = get_book_by_id(&app, book_id).await.unwrap().unwrap();
    assert_eq!(book.available, 1);
    assert_availability_invariant(&app, book_id).await;
}

#[tokio::test]
async fn return_of_unknown_loan_is_not_found() {
    let app = setup().await;
    let err = return_loan(&app, 42).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound));
}

#[tokio::test]
async fn quantity_edit_recomputes_availability() {
    let app = setup().await;
    let borrower_id = borrower_named(&app, "Ada").await;
    let book_id = book_with_copies(&app, "Dune", 3).await;
    add_loan(&app, book_id, borrower_id).await.unwrap();

    let active = update_book(
        &app,
        book_id,
        BookInput {
            title: "Dune".to_string(),
            isbn: None,
            category_id: None,
            author_name: None,
            publisher_name: None,
            quantity: 5,
        },
    )
    .await
    .expect("update book");

    assert_eq!(active, 1);
    let book = get_book_by_id(&app, book_id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 5);
    assert_eq!(book.available, 4);
    assert_availability_invariant(&app, book_id).await;
}

// Shrinking quantity below the active-loan count persists anyway; the
// returned count is how the caller learns about the conflict.
#[tokio::test]
async fn quantity_edit_below_active_loans_persists_and_reports() {
    let app = setup().await;
    let borrower_id = borrower_named(&app, "Ada").await;
    let book_id = book_with_copies(&app, "Dune", 1).await;
    add_loan(&app, book_id, borrower_id).await.unwrap();

    let active = update_book(
        &app,
        book_id,
        BookInput {
            title: "Dune".to_string(),
            isbn: None,
            category_id: None,
            author_name: None,
            publisher_name: None,
            quantity: 0,
        },
    )
    .await
    .expect("update book");

    assert_eq!(active, 1);
    let book = get_book_by_id(&app, book_id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 0);
    assert_eq!(book.available, -1);
}

#[tokio::test]
async fn negative_quantity_is_rejected_before_the_store() {
    let app = setup().await;
    let input = BookInput {
        title: "Dune".to_string(),
        isbn: None,
        category_id: None,
        author_name: None,
        publisher_name: None,
        quantity: -1,
    };

    let err = add_book(&app, input.clone()).await.unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));

    let book_id = book_with_copies(&app, "Dune", 1).await;
    let err = update_book(&app, book_id, input).await.unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));
}
