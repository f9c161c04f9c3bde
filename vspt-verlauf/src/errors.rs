//! Basic error handling.

use failure_derive::Fail;
use vspt_util::impl_from_for_error;
use vspt_sqlite::errors::{SqlError, PoolError};
use vspt_sqlite::rusqlite::Error as RsqlError;

pub type Result<T> = ::std::result::Result<T, VerlaufError>;

#[derive(Fail, Debug)]
pub enum VerlaufError {
    /// SQL error from vspt-sqlite.
    #[fail(display = "vspt-sqlite: {}", _0)]
    Sql(SqlError),
    /// SQL error from rusqlite.
    #[fail(display = "rusqlite: {}", _0)]
    Rsql(RsqlError),
    /// r2d2 database error.
    #[fail(display = "r2d2: {}", _0)]
    Pool(PoolError)
}
impl_from_for_error!(VerlaufError,
                     SqlError => Sql,
                     RsqlError => Rsql,
                     PoolError => Pool);
