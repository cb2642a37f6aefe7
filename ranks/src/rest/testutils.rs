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

//! Test utilities for the REST API.

use crate::db::sqlite::SqliteMilitaryRankRepository;
use crate::db::tests::test_clock;
use crate::db::MilitaryRankRepository;
use crate::driver::Driver;
use crate::model::MilitaryRank;
use crate::rest::register_routes;
use axum::Router;
use forcemap_core::clocks::testutils::SettableClock;
use forcemap_core::clocks::Clock;
use forcemap_core::db::sqlite::testutils::setup;
use forcemap_core::rest::router::RouteAdapter;
use forcemap_core::rest::server::AxumHttpServer;
use std::sync::Arc;

/// Builds the application with all of its routes on top of `repository`.
fn build_app(repository: Arc<dyn MilitaryRankRepository>, clock: Arc<dyn Clock>) -> Router {
    let mut routes = RouteAdapter::new();
    register_routes(&mut routes, Driver::new(repository), clock);

    let mut server = AxumHttpServer::new();
    routes.apply_routes(&mut server).unwrap();
    server.router()
}

/// Builds the application on top of an arbitrary `repository`, for error injection.
pub(crate) fn app_with(repository: Arc<dyn MilitaryRankRepository>) -> Router {
    build_app(repository, test_clock())
}

pub(crate) struct TestContext {
    repository: Arc<SqliteMilitaryRankRepository>,
    clock: Arc<SettableClock>,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let clock = test_clock();
        let repository = SqliteMilitaryRankRepository::attach(setup().await, clock.clone());
        let repository = Arc::new(repository.await.unwrap());
        let app = build_app(repository.clone(), clock.clone());
        Self { repository, clock, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    pub(crate) async fn get_rank(&self, abbreviation: &str) -> Option<MilitaryRank> {
        self.repository.find_by_abbreviation(abbreviation).await.unwrap()
    }
}
