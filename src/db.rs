use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    apply_session_settings(&db).await;
    run_migrations(&db).await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Foreign-key enforcement, WAL journaling to reduce write-write blocking,
/// and a 30s busy wait before a write reports contention. A failing PRAGMA
/// is logged and skipped; the store still works with driver defaults.
async fn apply_session_settings(db: &DatabaseConnection) {
    let pragmas = [
        "PRAGMA foreign_keys = ON",
        "PRAGMA journal_mode = WAL",
        "PRAGMA synchronous = NORMAL",
        "PRAGMA busy_timeout = 30000",
    ];

    for pragma in pragmas {
        if let Err(e) = db
            .execute(Statement::from_string(
                db.get_database_backend(),
                pragma.to_owned(),
            ))
            .await
        {
            tracing::warn!("{pragma} failed, continuing with driver defaults: {e}");
        }
    }
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Create categories table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create authors table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create publishers table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS publishers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create books table. Author and publisher are free-text columns, not
    // foreign keys; see domain::refs for the seam that isolates this.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            isbn TEXT UNIQUE,
            category_id INTEGER,
            author_name TEXT,
            publisher_name TEXT,
            quantity INTEGER NOT NULL DEFAULT 1,
            available INTEGER NOT NULL DEFAULT 1,
            added_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create borrowers table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS borrowers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE,
            phone TEXT,
            joined_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Create loans table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS loans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL,
            borrower_id INTEGER NOT NULL,
            loan_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            due_date TEXT,
            return_date TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            FOREIGN KEY (book_id) REFERENCES books(id),
            FOREIGN KEY (borrower_id) REFERENCES borrowers(id)
        )
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}

/// Secondary indexes keeping the join-based aggregate reads cheap
/// (counts per category/author/publisher, loan counts per book/borrower).
async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let required = [
        "CREATE INDEX IF NOT EXISTS idx_loans_book_id ON loans (book_id)",
        "CREATE INDEX IF NOT EXISTS idx_loans_borrower_id ON loans (borrower_id)",
        "CREATE INDEX IF NOT EXISTS idx_books_category_id ON books (category_id)",
    ];

    for sql in required {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_owned(),
        ))
        .await?;
    }

    // Older databases may predate the author_name/publisher_name columns;
    // a failed index on those is skipped without failing startup.
    let optional = [
        "CREATE INDEX IF NOT EXISTS idx_books_author_name ON books (author_name)",
        "CREATE INDEX IF NOT EXISTS idx_books_publisher_name ON books (publisher_name)",
    ];

    for sql in optional {
        if let Err(e) = db
            .execute(Statement::from_string(
                db.get_database_backend(),
                sql.to_owned(),
            ))
            .await
        {
            tracing::debug!("skipping index: {sql}: {e}");
        }
    }

    Ok(())
}
