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

//! Operation to create a new military rank.

use crate::driver::validator::ABBREVIATION_KEY;
use crate::driver::validator::ORDER_KEY;
use crate::driver::{sanitizer, Driver};
use crate::model::{MilitaryRank, RawMilitaryRankProps};
use forcemap_core::db::DbError;
use forcemap_core::driver::{DriverError, DriverResult};
use log::{debug, error, info};
use std::time::Instant;
use time::OffsetDateTime;

/// Generates an identifier to correlate all log lines of a single creation.
fn operation_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("create-{}-{:08x}", millis, rand::random::<u32>())
}

impl Driver {
    /// Creates a new military rank from untrusted `raw` properties.
    ///
    /// The properties go through sanitization and validation before being persisted, so the
    /// returned errors are either classified errors describing what is wrong with the input or
    /// backend errors.
    pub(crate) async fn create_military_rank(
        self,
        raw: RawMilitaryRankProps,
    ) -> DriverResult<MilitaryRank> {
        let op = operation_id();
        let start = Instant::now();
        info!("[{}] Creating military rank", op);

        match self.do_create(&op, raw).await {
            Ok(rank) => {
                info!(
                    "[{}] Created military rank {} in {} ms",
                    op,
                    rank.id(),
                    start.elapsed().as_millis()
                );
                Ok(rank)
            }
            Err(e) if e.is_classified() => {
                error!(
                    "[{}] {}: {} after {} ms",
                    op,
                    e.kind(),
                    e,
                    start.elapsed().as_millis()
                );
                Err(e)
            }
            Err(e) => {
                error!(
                    "[{}] Military rank creation failed with unknown error: {} after {} ms",
                    op,
                    e,
                    start.elapsed().as_millis()
                );
                Err(e)
            }
        }
    }

    /// Runs the creation pipeline without any of the bookkeeping.
    async fn do_create(self, op: &str, raw: RawMilitaryRankProps) -> DriverResult<MilitaryRank> {
        debug!("[{}] Sanitizing {:?}", op, raw);
        let sanitized = sanitizer::sanitize(&raw);

        debug!("[{}] Validating {:?}", op, sanitized);
        let props = self.validator.validate(sanitized).await?;

        debug!("[{}] Persisting {:?}", op, props);
        match self.repository.create(&props).await {
            Ok(rank) => Ok(rank),
            Err(DbError::AlreadyExists) => {
                Err(DriverError::DuplicatedKey(format!("{} ou {}", ABBREVIATION_KEY, ORDER_KEY)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
