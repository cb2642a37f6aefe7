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

//! Entry point to the REST server.

use crate::driver::Driver;
use forcemap_core::clocks::Clock;
use forcemap_core::rest::responses;
use forcemap_core::rest::router::{RouteGroup, RouteRegistry};
use forcemap_core::rest::HttpResponse;
use http::{Method, StatusCode};
use std::sync::Arc;
use std::time::Instant;

mod health_get;
mod info_get;
mod rank_delete;
mod rank_get;
mod rank_put;
mod ranks_get;
mod ranks_post;
#[cfg(test)]
mod testutils;

/// Prefix under which all military rank APIs live.
pub(crate) const MILITARY_RANKS_PREFIX: &str = "/api/v1/military-ranks";

/// Response for APIs that exist but do nothing yet.
fn not_implemented() -> HttpResponse {
    responses::client_error(StatusCode::NOT_IMPLEMENTED, "Not implemented yet")
}

/// Service status and information APIs.
pub(crate) struct HealthRouteGroup {
    /// Clock used to report the current time.
    clock: Arc<dyn Clock>,

    /// When the group was created, to compute the uptime.
    started: Instant,
}

impl HealthRouteGroup {
    /// Creates a new group that reports times with `clock`.
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, started: Instant::now() }
    }
}

impl RouteGroup for HealthRouteGroup {
    fn define_routes(&self, routes: &mut dyn RouteRegistry) {
        routes.register_route(
            Method::GET,
            "/health",
            Arc::new(health_get::HealthController::new(self.clock.clone(), self.started)),
        );
        routes.register_route(Method::GET, "/", info_get::handler());
    }
}

/// Military rank management APIs.
pub(crate) struct MilitaryRankRouteGroup {
    /// Business logic shared by all APIs in the group.
    driver: Driver,
}

impl MilitaryRankRouteGroup {
    /// Creates a new group backed by `driver`.
    pub(crate) fn new(driver: Driver) -> Self {
        Self { driver }
    }
}

impl RouteGroup for MilitaryRankRouteGroup {
    fn define_routes(&self, routes: &mut dyn RouteRegistry) {
        routes.register_route(
            Method::POST,
            "/",
            Arc::new(ranks_post::CreateMilitaryRankController::new(self.driver.clone())),
        );
        routes.register_route(Method::GET, "/", ranks_get::handler());
        routes.register_route(Method::GET, "/:id", rank_get::handler());
        routes.register_route(Method::PUT, "/:id", rank_put::handler());
        routes.register_route(Method::DELETE, "/:id", rank_delete::handler());
    }
}

/// Registers all the APIs of the service into `routes`.
pub(crate) fn register_routes(
    routes: &mut dyn RouteRegistry,
    driver: Driver,
    clock: Arc<dyn Clock>,
) {
    routes.register_group("/", &HealthRouteGroup::new(clock));
    routes.register_group(MILITARY_RANKS_PREFIX, &MilitaryRankRouteGroup::new(driver));
}
