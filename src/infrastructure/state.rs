//! Library state: the connection plus the shared components every domain
//! operation composes with (read cache, retry policy, reference index).

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::cache::ReadCache;
use crate::config::Config;
use crate::db;
use crate::domain::{BookReferenceIndex, DomainError};
use crate::infrastructure::NameColumnRefs;
use crate::retry::RetryPolicy;
use crate::seed;

pub struct Library {
    conn: DatabaseConnection,
    cache: ReadCache,
    retry: RetryPolicy,
    refs: Arc<dyn BookReferenceIndex>,
}

impl Library {
    /// Initialize the store (idempotent migrations + default categories)
    /// and wire up the shared components.
    pub async fn open(config: &Config) -> Result<Self, DomainError> {
        let conn = db::init_db(&config.database_url).await?;
        seed::seed_default_categories(&conn).await?;
        Ok(Self::new(conn, config.cache_ttl))
    }

    /// Wrap an already-initialized connection. Used by tests that want an
    /// unseeded database or a shorter cache TTL.
    pub fn new(conn: DatabaseConnection, cache_ttl: Duration) -> Self {
        let refs = Arc::new(NameColumnRefs::new(conn.clone()));
        Self {
            conn,
            cache: ReadCache::new(cache_ttl),
            retry: RetryPolicy::default(),
            refs,
        }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn refs(&self) -> &dyn BookReferenceIndex {
        self.refs.as_ref()
    }
}
