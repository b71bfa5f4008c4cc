//! Existence checks shared by every store that accepts foreign ids.

use crate::errors::ServiceError;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PrimaryKeyTrait};

/// Returns whether a row of `E` with primary key `id` exists.
pub async fn exists<E, C>(conn: &C, id: i32) -> Result<bool, DbErr>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    Ok(E::find_by_id(id).one(conn).await?.is_some())
}

/// Fails with the error built by `on_missing` when `id` does not resolve.
pub async fn ensure_exists<E, C, F>(conn: &C, id: i32, on_missing: F) -> Result<(), ServiceError>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
    F: FnOnce() -> ServiceError,
{
    if exists::<E, C>(conn, id).await? {
        Ok(())
    } else {
        Err(on_missing())
    }
}
