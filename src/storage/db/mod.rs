//! Database access for the sink.
//!
//! All statements go through sqlx's `Any` driver so one engine serves MySQL /
//! MariaDB (production) and SQLite (embedded, tests). Statements use `?`
//! placeholders and backtick-quoted identifiers, which both accept.
//!
//! - [`DbPool`]: Lazily connecting pool wrapper
//! - [`Backend`]: Which server family a connection target points at
//! - [`with_local_infile`]: Connection-target rewrite enabling bulk transfer
//!
//! # Example
//!
//! ```ignore
//! let pool = DbPool::connect_lazy("mysql://app@db/logs")?;
//! sqlx::query("SELECT 1").execute(pool.inner()).await?;
//! ```

mod pool;
mod target;

pub use pool::DbPool;
pub use target::{Backend, LOCAL_INFILE_PARAM, with_local_infile};
