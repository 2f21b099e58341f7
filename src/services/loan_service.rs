//! Loan service - the loan state machine and availability accounting.
//!
//! A loan is `active` from creation until it is returned, and `returned` is
//! terminal. Both transitions adjust the book's `available` count inside
//! the same transaction as the loan row change, so
//! `available == quantity - active loans` holds after every commit.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, Set, Statement, TransactionTrait,
};
use serde::Serialize;

use crate::Library;
use crate::domain::DomainError;
use crate::models::{book, loan};
use crate::services::{book_service, borrower_service};

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_RETURNED: &str = "returned";

pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Loan row enriched with book and borrower names for display.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub loan_date: String,
    pub due_date: Option<String>,
    pub return_date: Option<String>,
    pub status: String,
    pub book_title: String,
    pub borrower_name: String,
}

const LOAN_DETAILS_SELECT: &str = r#"
    SELECT l.id, l.book_id, l.borrower_id, l.loan_date, l.due_date,
           l.return_date, l.status,
           b.title AS book_title, br.name AS borrower_name
    FROM loans l
    JOIN books b ON l.book_id = b.id
    JOIN borrowers br ON l.borrower_id = br.id
"#;

pub async fn get_all_loans(app: &Library) -> Result<Vec<LoanDetails>, DomainError> {
    let db = app.conn();
    let rows = LoanDetails::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        format!("{LOAN_DETAILS_SELECT} ORDER BY l.loan_date DESC"),
    ))
    .all(db)
    .await?;
    Ok(rows)
}

/// The five newest active loans, for the dashboard.
pub async fn get_recent_active_loans(app: &Library) -> Result<Vec<LoanDetails>, DomainError> {
    let db = app.conn();
    let sql = format!("{LOAN_DETAILS_SELECT} WHERE l.status = ? ORDER BY l.loan_date DESC LIMIT 5");
    let rows = LoanDetails::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        &sql,
        [STATUS_ACTIVE.into()],
    ))
    .all(db)
    .await?;
    Ok(rows)
}

pub async fn get_total_active_loans(app: &Library) -> Result<u64, DomainError> {
    let count = loan::Entity::find()
        .filter(loan::Column::Status.eq(STATUS_ACTIVE))
        .count(app.conn())
        .await?;
    Ok(count)
}

/// Guard: loans of any status referencing the book.
pub async fn get_loan_count_for_book(app: &Library, book_id: i32) -> Result<u64, DomainError> {
    let count = loan::Entity::find()
        .filter(loan::Column::BookId.eq(book_id))
        .count(app.conn())
        .await?;
    Ok(count)
}

/// Guard: loans of any status referencing the borrower.
pub async fn get_loan_count_for_borrower(
    app: &Library,
    borrower_id: i32,
) -> Result<u64, DomainError> {
    let count = loan::Entity::find()
        .filter(loan::Column::BorrowerId.eq(borrower_id))
        .count(app.conn())
        .await?;
    Ok(count)
}

/// Guard: active loans held by the borrower.
pub async fn get_active_loan_count_for_borrower(
    app: &Library,
    borrower_id: i32,
) -> Result<u64, DomainError> {
    let count = loan::Entity::find()
        .filter(loan::Column::BorrowerId.eq(borrower_id))
        .filter(loan::Column::Status.eq(STATUS_ACTIVE))
        .count(app.conn())
        .await?;
    Ok(count)
}

/// Create a loan: requires `available > 0` on the book at the instant of
/// creation, inserts the loan row and decrements `available` in one
/// transaction. Due date is the loan date plus [`LOAN_PERIOD_DAYS`].
pub async fn add_loan(
    app: &Library,
    book_id: i32,
    borrower_id: i32,
) -> Result<i32, DomainError> {
    let db = app.conn();
    let loan_id = app
        .retry()
        .run(|| async move {
            let txn = db.begin().await?;

            let target = book::Entity::find_by_id(book_id)
                .one(&txn)
                .await?
                .ok_or(DomainError::NotFound)?;
            let available = target.available;
            if available <= 0 {
                return Err(DomainError::Invalid(format!(
                    "no available copies of book {book_id}"
                )));
            }

            let now = Utc::now();
            let row = loan::ActiveModel {
                book_id: Set(book_id),
                borrower_id: Set(borrower_id),
                loan_date: Set(now.to_rfc3339()),
                due_date: Set(Some((now + Duration::days(LOAN_PERIOD_DAYS)).to_rfc3339())),
                return_date: Set(None),
                status: Set(STATUS_ACTIVE.to_owned()),
                ..Default::default()
            };
            let res = loan::Entity::insert(row).exec(&txn).await?;

            let mut book_row: book::ActiveModel = target.into();
            book_row.available = Set(available - 1);
            book_row.update(&txn).await?;

            txn.commit().await?;
            Ok(res.last_insert_id)
        })
        .await?;

    app.cache().invalidate(book_service::CACHE_PREFIX);
    app.cache().invalidate(borrower_service::CACHE_PREFIX);
    Ok(loan_id)
}

/// Return a loan: marks it returned and increments the book's `available`
/// in one transaction. Returning an already-returned loan is rejected with
/// [`DomainError::Invalid`]; the transition is strictly one-way.
pub async fn return_loan(app: &Library, loan_id: i32) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let txn = db.begin().await?;

            let existing = loan::Entity::find_by_id(loan_id)
                .one(&txn)
                .await?
                .ok_or(DomainError::NotFound)?;
            if existing.status == STATUS_RETURNED {
                return Err(DomainError::Invalid("loan is already returned".to_owned()));
            }

            let target = book::Entity::find_by_id(existing.book_id)
                .one(&txn)
                .await?
                .ok_or(DomainError::NotFound)?;
            let available = target.available;

            let mut loan_row: loan::ActiveModel = existing.into();
            loan_row.return_date = Set(Some(Utc::now().to_rfc3339()));
            loan_row.status = Set(STATUS_RETURNED.to_owned());
            loan_row.update(&txn).await?;

            let mut book_row: book::ActiveModel = target.into();
            book_row.available = Set(available + 1);
            book_row.update(&txn).await?;

            txn.commit().await?;
            Ok(())
        })
        .await?;

    app.cache().invalidate(book_service::CACHE_PREFIX);
    app.cache().invalidate(borrower_service::CACHE_PREFIX);
    Ok(())
}

/// Whether an active loan is past due at `now`. Date-only due dates mean
/// end of day; unparseable dates count as not overdue rather than flagging
/// a loan on bad data.
pub fn is_overdue(status: &str, due_date: Option<&str>, now: DateTime<Utc>) -> bool {
    if status != STATUS_ACTIVE {
        return false;
    }
    let Some(raw) = due_date else {
        return false;
    };
    match parse_due_date(raw) {
        Some(due) => due < now,
        None => false,
    }
}

fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(23, 59, 59)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn active_loan_past_due_is_overdue() {
        let now = at("2026-03-15T12:00:00Z");
        assert!(is_overdue(STATUS_ACTIVE, Some("2026-03-10T09:00:00Z"), now));
    }

    #[test]
    fn active_loan_before_due_is_not_overdue() {
        let now = at("2026-03-15T12:00:00Z");
        assert!(!is_overdue(STATUS_ACTIVE, Some("2026-03-20T09:00:00Z"), now));
    }

    #[test]
    fn date_only_due_date_means_end_of_day() {
        let due = Some("2026-03-15");
        assert!(!is_overdue(STATUS_ACTIVE, due, at("2026-03-15T12:00:00Z")));
        assert!(is_overdue(STATUS_ACTIVE, due, at("2026-03-16T00:00:00Z")));
    }

    #[test]
    fn returned_loan_is_never_overdue() {
        let now = at("2026-03-15T12:00:00Z");
        assert!(!is_overdue(STATUS_RETURNED, Some("2026-03-01T09:00:00Z"), now));
    }

    #[test]
    fn missing_or_garbage_due_date_is_not_overdue() {
        let now = at("2026-03-15T12:00:00Z");
        assert!(!is_overdue(STATUS_ACTIVE, None, now));
        assert!(!is_overdue(STATUS_ACTIVE, Some("soonish"), now));
    }
}
