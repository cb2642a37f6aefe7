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

//! Test utilities for the business layer.

use crate::db::memory::InMemoryMilitaryRankRepository;
use crate::db::tests::test_clock;
use crate::db::MilitaryRankRepository;
use crate::driver::validator::MilitaryRankValidator;
use crate::driver::Driver;
use crate::model::*;
use async_trait::async_trait;
use forcemap_core::db::{DbError, DbResult};
use std::sync::Arc;

/// State of a driver test backed by an in-memory repository.
pub(crate) struct TestContext {
    /// The repository shared with the driver, exposed for inspection.
    repository: Arc<InMemoryMilitaryRankRepository>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    pub(crate) fn setup() -> Self {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let repository = Arc::new(InMemoryMilitaryRankRepository::new(test_clock()));
        let driver = Driver::new(repository.clone());
        Self { repository, driver }
    }

    pub(crate) fn repository(&self) -> &InMemoryMilitaryRankRepository {
        &self.repository
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    pub(super) fn validator(&self) -> MilitaryRankValidator {
        self.driver.validator.clone()
    }

    /// Inserts a rank directly into the repository, bypassing validation.
    pub(crate) async fn create_rank(&self, abbreviation: &str, order: i64) -> MilitaryRank {
        let props = MilitaryRankProps::new(
            Abbreviation::new(abbreviation).unwrap(),
            Order::from_i64(order).unwrap(),
        );
        self.repository.create(&props).await.unwrap()
    }
}

/// A repository whose operations always fail with the configured error.
pub(crate) struct FailingRepository {
    /// Error returned by every operation.
    error: DbError,
}

impl FailingRepository {
    /// Creates a repository that fails with `error`.
    pub(crate) fn new(error: DbError) -> Self {
        Self { error }
    }
}

impl Default for FailingRepository {
    fn default() -> Self {
        Self::new(DbError::BackendError("connection lost".to_owned()))
    }
}

#[async_trait]
impl MilitaryRankRepository for FailingRepository {
    async fn create(&self, _props: &MilitaryRankProps) -> DbResult<MilitaryRank> {
        Err(self.error.clone())
    }

    async fn find_by_abbreviation(&self, _abbreviation: &str) -> DbResult<Option<MilitaryRank>> {
        Err(self.error.clone())
    }

    async fn find_by_order(&self, _order: Order) -> DbResult<Option<MilitaryRank>> {
        Err(self.error.clone())
    }
}

/// A repository that never finds anything but fails every insertion with the configured error.
///
/// With `DbError::AlreadyExists`, this mimics a concurrent creation that slipped in between the
/// lookups and the insertion.
pub(crate) struct InsertFailingRepository {
    /// Error returned by `create`.
    error: DbError,
}

impl InsertFailingRepository {
    /// Creates a repository whose insertions fail with `error`.
    pub(crate) fn new(error: DbError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl MilitaryRankRepository for InsertFailingRepository {
    async fn create(&self, _props: &MilitaryRankProps) -> DbResult<MilitaryRank> {
        Err(self.error.clone())
    }

    async fn find_by_abbreviation(&self, _abbreviation: &str) -> DbResult<Option<MilitaryRank>> {
        Ok(None)
    }

    async fn find_by_order(&self, _order: Order) -> DbResult<Option<MilitaryRank>> {
        Ok(None)
    }
}
