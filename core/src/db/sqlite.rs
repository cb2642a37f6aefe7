// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Common utilities to interact with an SQLite database.

use crate::db::{DbError, DbResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use time::OffsetDateTime;

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Opens a connection pool to the database described by `conn_str`.
///
/// File-backed databases are created if they don't exist yet.  Connections are never recycled
/// so that in-memory databases survive for as long as the pool does.
pub async fn connect(conn_str: &str) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(conn_str)
        .map_err(map_sqlx_error)?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)
}

/// Helper function to initialize the database with a schema.
///
/// The schema may contain multiple statements and must be idempotent because it is applied on
/// every startup.
pub async fn run_schema(pool: &SqlitePool, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(pool).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Converts a timestamp as extracted from the database into an `OffsetDateTime`.
///
/// The input parameters must both be positive.  The reason why their types are `i64`s instead of
/// the `u64` you would expect is because the numeric types exposed by sqlx and SQLite are all
/// signed.
pub fn build_timestamp(timestamp_sec: i64, timestamp_nsec: i64) -> DbResult<OffsetDateTime> {
    if timestamp_sec < 0 || timestamp_nsec < 0 {
        return Err(DbError::DataIntegrityError(format!(
            "Timestamp cannot have negative quantities: sec={}, nsec={}",
            timestamp_sec, timestamp_nsec
        )));
    }

    match OffsetDateTime::from_unix_timestamp_nanos(
        (i128::from(timestamp_sec) * 1_000_000_000) + (i128::from(timestamp_nsec)),
    ) {
        Ok(timestamp) => Ok(timestamp),
        Err(e) => Err(DbError::DataIntegrityError(format!("Invalid timestamp: {}", e))),
    }
}

/// Converts a timestamp into the seconds and nanoseconds pair needed by the database.
///
/// Timestamps before the epoch are rejected because `build_timestamp` could not recover them.
pub fn unpack_timestamp(ts: OffsetDateTime) -> DbResult<(i64, i64)> {
    let nanos = ts.unix_timestamp_nanos();
    if nanos < 0 {
        return Err(DbError::DataIntegrityError(format!(
            "Cannot store a negative timestamp into the database: {}",
            ts
        )));
    }
    match (i64::try_from(nanos / 1_000_000_000), i64::try_from(nanos % 1_000_000_000)) {
        (Ok(sec), Ok(nsec)) => Ok((sec, nsec)),
        _ => Err(DbError::DataIntegrityError(format!("Timestamp out of range: {}", ts))),
    }
}

/// Test utilities for the SQLite connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Initializes a fresh in-memory test database.
    pub async fn setup() -> SqlitePool {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        connect(":memory:").await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_run_schema_is_idempotent() {
        let pool = setup().await;
        let schema = "CREATE TABLE IF NOT EXISTS t (a INTEGER UNIQUE); \
            CREATE INDEX IF NOT EXISTS t_a ON t (a);";
        run_schema(&pool, schema).await.unwrap();
        run_schema(&pool, schema).await.unwrap();

        sqlx::query("INSERT INTO t (a) VALUES (1)").execute(&pool).await.unwrap();
        let row = sqlx::query("SELECT COUNT(*) AS n FROM t").fetch_one(&pool).await.unwrap();
        assert_eq!(1, row.try_get::<i64, _>("n").unwrap());
    }

    #[tokio::test]
    async fn test_map_sqlx_error_unique_violation() {
        let pool = setup().await;
        run_schema(&pool, "CREATE TABLE t (a INTEGER UNIQUE)").await.unwrap();

        sqlx::query("INSERT INTO t (a) VALUES (1)").execute(&pool).await.unwrap();
        let err = sqlx::query("INSERT INTO t (a) VALUES (1)").execute(&pool).await.unwrap_err();
        assert_eq!(DbError::AlreadyExists, map_sqlx_error(err));
    }

    #[tokio::test]
    async fn test_memory_database_shared_across_connections() {
        let pool = setup().await;
        run_schema(&pool, "CREATE TABLE t (a INTEGER)").await.unwrap();

        let mut conn1 = pool.acquire().await.unwrap();
        let mut conn2 = pool.acquire().await.unwrap();
        sqlx::query("INSERT INTO t (a) VALUES (5)").execute(&mut *conn1).await.unwrap();
        let row = sqlx::query("SELECT a FROM t").fetch_one(&mut *conn2).await.unwrap();
        assert_eq!(5, row.try_get::<i64, _>("a").unwrap());
    }

    #[test]
    fn test_build_unpack_timestamp_nsecs_precision() {
        let d = OffsetDateTime::from_unix_timestamp_nanos(1234567899876543215i128).unwrap();
        let (secs, nsecs) = unpack_timestamp(d).unwrap();
        assert_eq!(1234567899i64, secs);
        assert_eq!(876543215i64, nsecs);
        assert_eq!(Ok(d), build_timestamp(secs, nsecs));
    }

    #[test]
    fn test_build_timestamp_negative() {
        match build_timestamp(-1, 0) {
            Err(DbError::DataIntegrityError(_)) => (),
            e => panic!("Must have failed with a DataIntegrityError but got: {:?}", e),
        }
    }

    #[test]
    fn test_unpack_timestamp_before_epoch() {
        let d = OffsetDateTime::from_unix_timestamp(-10).unwrap();
        match unpack_timestamp(d) {
            Err(DbError::DataIntegrityError(_)) => (),
            e => panic!("Must have failed with a DataIntegrityError but got: {:?}", e),
        }
    }
}
