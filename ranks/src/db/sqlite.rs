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

//! Implementation of the military rank repository using SQLite.

use crate::db::{abbreviation_key, MilitaryRankRepository};
use crate::model::*;
use async_trait::async_trait;
use forcemap_core::clocks::Clock;
use forcemap_core::db::sqlite::{build_timestamp, map_sqlx_error, run_schema, unpack_timestamp};
use forcemap_core::db::{DbError, DbResult};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::sync::Arc;

/// Schema to use to initialize the database.
const SCHEMA: &str = include_str!("sqlite.sql");

impl TryFrom<SqliteRow> for MilitaryRank {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(map_sqlx_error)?;
        let abbreviation: String = row.try_get("abbreviation").map_err(map_sqlx_error)?;
        let order: i64 = row.try_get("rank_order").map_err(map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(map_sqlx_error)?;
        let created_at_nsecs: i64 = row.try_get("created_at_nsecs").map_err(map_sqlx_error)?;
        let updated_at_secs: i64 = row.try_get("updated_at_secs").map_err(map_sqlx_error)?;
        let updated_at_nsecs: i64 = row.try_get("updated_at_nsecs").map_err(map_sqlx_error)?;

        Ok(MilitaryRank::new(
            MilitaryRankId::parse(&id)?,
            Abbreviation::new(abbreviation)?,
            Order::from_i64(order)?,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        ))
    }
}

/// A military rank repository backed by a SQLite database.
#[derive(Clone)]
pub(crate) struct SqliteMilitaryRankRepository {
    /// Shared SQLite connection pool.
    pool: SqlitePool,

    /// Clock used to timestamp new entries.
    clock: Arc<dyn Clock>,
}

impl SqliteMilitaryRankRepository {
    /// Creates a repository backed by `pool`, initializing the schema if necessary.
    pub(crate) async fn attach(pool: SqlitePool, clock: Arc<dyn Clock>) -> DbResult<Self> {
        run_schema(&pool, SCHEMA).await?;
        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl MilitaryRankRepository for SqliteMilitaryRankRepository {
    async fn create(&self, props: &MilitaryRankProps) -> DbResult<MilitaryRank> {
        let now = self.clock.now_utc();
        let (now_secs, now_nsecs) = unpack_timestamp(now)?;
        let rank = MilitaryRank::new(
            MilitaryRankId::generate(),
            props.abbreviation().clone(),
            *props.order(),
            now,
            now,
        );

        let query_str = "
            INSERT INTO military_ranks (
                id, abbreviation, abbreviation_key, rank_order,
                created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ";
        let done = sqlx::query(query_str)
            .bind(rank.id().to_string())
            .bind(rank.abbreviation().as_str())
            .bind(abbreviation_key(rank.abbreviation().as_str()))
            .bind(rank.order().as_i64())
            .bind(now_secs)
            .bind(now_nsecs)
            .bind(now_secs)
            .bind(now_nsecs)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if done.rows_affected() != 1 {
            return Err(DbError::BackendError(format!(
                "Insertion affected {} rows instead of one",
                done.rows_affected()
            )));
        }
        Ok(rank)
    }

    async fn find_by_abbreviation(&self, abbreviation: &str) -> DbResult<Option<MilitaryRank>> {
        let query_str = "
            SELECT id, abbreviation, rank_order,
                created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs
            FROM military_ranks
            WHERE abbreviation_key = ?
        ";
        let maybe_row = sqlx::query(query_str)
            .bind(abbreviation_key(abbreviation))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        maybe_row.map(MilitaryRank::try_from).transpose()
    }

    async fn find_by_order(&self, order: Order) -> DbResult<Option<MilitaryRank>> {
        let query_str = "
            SELECT id, abbreviation, rank_order,
                created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs
            FROM military_ranks
            WHERE rank_order = ?
        ";
        let maybe_row = sqlx::query(query_str)
            .bind(order.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        maybe_row.map(MilitaryRank::try_from).transpose()
    }
}
