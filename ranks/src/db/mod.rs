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

//! Persistence layer for military ranks.

use crate::model::{MilitaryRank, MilitaryRankProps, Order};
use async_trait::async_trait;
use forcemap_core::db::DbResult;

#[cfg(test)]
pub(crate) mod memory;
pub(crate) mod sqlite;

/// Returns the key used to match abbreviations regardless of case.
pub(crate) fn abbreviation_key(abbreviation: &str) -> String {
    abbreviation.to_lowercase()
}

/// Operations to store and look up military ranks.
///
/// Implementations own the persisted collection and are responsible for its consistency: they
/// must reject a `create` that would duplicate an abbreviation (ignoring case) or an order with
/// `DbError::AlreadyExists`, even though callers are expected to check for duplicates first.
#[async_trait]
pub(crate) trait MilitaryRankRepository: Send + Sync {
    /// Persists a new rank with `props`, assigning it an identifier and creation timestamps.
    async fn create(&self, props: &MilitaryRankProps) -> DbResult<MilitaryRank>;

    /// Looks up the rank whose abbreviation matches `abbreviation` ignoring case.
    async fn find_by_abbreviation(&self, abbreviation: &str) -> DbResult<Option<MilitaryRank>>;

    /// Looks up the rank at position `order` in the hierarchy.
    async fn find_by_order(&self, order: Order) -> DbResult<Option<MilitaryRank>>;
}
