use crate::error::AppResult;
use deadpool_sqlite::Pool;
use rusqlite::Connection;

/// Runs statements against the pooled SQLite store. Each call checks out one
/// connection and runs the closure on the pool's blocking thread.
#[derive(Clone)]
pub struct QueryExecutor {
    pool: Pool,
}

impl QueryExecutor {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub async fn query<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await?;
        let result = conn.interact(move |conn| f(conn)).await??;
        Ok(result)
    }

    /// Liveness check used by the health endpoint.
    pub async fn ping(&self) -> AppResult<i64> {
        self.query(|conn| conn.query_row("SELECT 1 AS ok", [], |row| row.get(0)))
            .await
    }
}
