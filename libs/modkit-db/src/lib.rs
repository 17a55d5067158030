//! Database handle for modules: an SQLite sqlx pool paired with a SeaORM
//! connection over the same pool, plus small query helpers.
//!
//! ```rust,no_run
//! # async fn demo() -> modkit_db::Result<()> {
//! use modkit_db::{ConnectOpts, DbHandle};
//!
//! let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//! let conn = db.sea();
//! # let _ = conn;
//! db.close().await;
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;
use std::time::Duration;

use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub mod like;
pub mod paging;
mod sqlite;

pub use paging::{total_pages, PageWindow};

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Pool knobs. In-memory databases always use a single, never-recycled
/// connection since each connection would otherwise see its own database.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    pub sqlite_busy_timeout: Option<Duration>,
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            sqlite_busy_timeout: None,
            create_sqlite_dirs: true,
        }
    }
}

#[derive(Debug)]
pub struct DbHandle {
    pool: SqlitePool,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Accepts `sqlite:` DSNs only.
    pub fn detect(dsn: &str) -> Result<()> {
        if dsn.trim_start().starts_with("sqlite:") {
            Ok(())
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        Self::detect(dsn)?;
        let dsn = dsn.trim();

        sqlite::prepare_sqlite_path(dsn, opts.create_sqlite_dirs)?;
        let (clean_dsn, pairs) = sqlite::extract_sqlite_pragmas(dsn);
        let memory = sqlite::is_memory_dsn(&clean_dsn);

        let default_busy = opts
            .sqlite_busy_timeout
            .map(|d| d.as_millis() as i64)
            .unwrap_or(sqlite::DEFAULT_BUSY_TIMEOUT_MS);
        let statements = sqlite::Pragmas::from_pairs(&pairs).statements(memory, default_busy);

        let connect_opts = SqliteConnectOptions::from_str(&clean_dsn)?.create_if_missing(true);

        let mut o = SqlitePoolOptions::new();
        if memory {
            o = o
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            if let Some(n) = opts.max_conns {
                o = o.max_connections(n);
            }
            if let Some(n) = opts.min_conns {
                o = o.min_connections(n);
            }
            if let Some(t) = opts.idle_timeout {
                o = o.idle_timeout(t);
            }
            if let Some(t) = opts.max_lifetime {
                o = o.max_lifetime(t);
            }
        }
        if let Some(t) = opts.acquire_timeout {
            o = o.acquire_timeout(t);
        }

        o = o.after_connect(move |conn, _meta| {
            let statements = statements.clone();
            Box::pin(async move {
                for stmt in &statements {
                    sqlx::query(stmt).execute(&mut *conn).await?;
                }
                Ok(())
            })
        });

        let pool = o.connect_with(connect_opts).await?;
        let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
        tracing::debug!(dsn = %clean_dsn, memory, "sqlite pool ready");

        Ok(Self {
            pool,
            dsn: clean_dsn,
            sea,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// DSN the pool was opened with, pragma parameters removed.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn sqlx_sqlite(&self) -> &SqlitePool {
        &self.pool
    }

    /// Owned SeaORM connection (cheap clone over the shared pool).
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }
}
