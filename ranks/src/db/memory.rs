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

//! In-memory implementation of the military rank repository for tests.

use crate::db::{abbreviation_key, MilitaryRankRepository};
use crate::model::*;
use async_trait::async_trait;
use forcemap_core::clocks::Clock;
use forcemap_core::db::{DbError, DbResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A military rank repository that keeps its data in memory and counts the lookups it serves.
pub(crate) struct InMemoryMilitaryRankRepository {
    /// Clock used to timestamp new entries.
    clock: Arc<dyn Clock>,

    /// All stored ranks, in insertion order.
    ranks: Mutex<Vec<MilitaryRank>>,

    /// Number of `find_by_*` calls served so far.
    lookups: AtomicUsize,
}

impl InMemoryMilitaryRankRepository {
    /// Creates an empty repository.
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, ranks: Mutex::default(), lookups: AtomicUsize::new(0) }
    }

    /// Returns the number of lookups served so far.
    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Returns a copy of all stored ranks.
    pub(crate) fn all(&self) -> Vec<MilitaryRank> {
        self.ranks.lock().unwrap().clone()
    }

    /// Returns the first stored rank that satisfies `pred`.
    fn find<P: Fn(&MilitaryRank) -> bool>(&self, pred: P) -> Option<MilitaryRank> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.ranks.lock().unwrap().iter().find(|rank| pred(rank)).cloned()
    }
}

#[async_trait]
impl MilitaryRankRepository for InMemoryMilitaryRankRepository {
    async fn create(&self, props: &MilitaryRankProps) -> DbResult<MilitaryRank> {
        let mut ranks = self.ranks.lock().unwrap();

        let key = abbreviation_key(props.abbreviation().as_str());
        if ranks.iter().any(|rank| {
            abbreviation_key(rank.abbreviation().as_str()) == key || rank.order() == props.order()
        }) {
            return Err(DbError::AlreadyExists);
        }

        let now = self.clock.now_utc();
        let rank = MilitaryRank::new(
            MilitaryRankId::generate(),
            props.abbreviation().clone(),
            *props.order(),
            now,
            now,
        );
        ranks.push(rank.clone());
        Ok(rank)
    }

    async fn find_by_abbreviation(&self, abbreviation: &str) -> DbResult<Option<MilitaryRank>> {
        let key = abbreviation_key(abbreviation);
        Ok(self.find(|rank| abbreviation_key(rank.abbreviation().as_str()) == key))
    }

    async fn find_by_order(&self, order: Order) -> DbResult<Option<MilitaryRank>> {
        Ok(self.find(|rank| *rank.order() == order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{generate_db_tests, test_clock};

    generate_db_tests!(InMemoryMilitaryRankRepository::new(test_clock()));
}
