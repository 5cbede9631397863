//! Transaction helper for multi-statement writes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use almanac_db::db::transaction::with_transaction;
//!
//! with_transaction(&mut conn, |tx| async move {
//!     series::insert(tx, &row).await?;
//!     exception::insert_ignore(tx, &exception).await?;
//!     Ok::<_, DbError>(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, scoped_futures::ScopedBoxFuture};

use crate::db::connection::DbConnection;

/// ## Summary
/// Runs `callback` inside a transaction, committing when it returns `Ok` and
/// rolling back otherwise.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, 'conn, 'pool, T, E, F>(
    conn: &'conn mut DbConnection<'pool>,
    callback: F,
) -> Result<T, E>
where
    F: for<'r> FnOnce(&'r mut DbConnection<'pool>) -> ScopedBoxFuture<'a, 'r, Result<T, E>>
        + Send
        + 'a,
    E: From<diesel::result::Error> + Send + 'a,
    T: Send + 'a,
    'a: 'conn,
{
    conn.transaction(callback).await
}
