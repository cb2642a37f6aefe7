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

//! API to create a new military rank.

use crate::driver::Driver;
use crate::model::RawMilitaryRankProps;
use async_trait::async_trait;
use forcemap_core::rest::{
    responses, HttpRequest, HttpResponse, RestError, RestResult, RouteHandler,
};
use serde_json::Value;

/// Extracts the military rank fields from the request `payload`.  Null fields are absent.
fn raw_props(payload: &Value) -> RawMilitaryRankProps {
    let field = |name: &str| payload.get(name).filter(|value| !value.is_null()).cloned();
    RawMilitaryRankProps::new(field("abbreviation"), field("order"))
}

/// API handler.
pub(crate) struct CreateMilitaryRankController {
    /// Business logic to create the rank.
    driver: Driver,
}

impl CreateMilitaryRankController {
    /// Creates a new handler backed by `driver`.
    pub(crate) fn new(driver: Driver) -> Self {
        Self { driver }
    }

    /// Processes the request and returns either the response or the error to report.
    async fn create(&self, request: HttpRequest) -> RestResult<HttpResponse> {
        let payload = request.payload().ok_or(RestError::EmptyRequestBody)?;
        self.driver.clone().create_military_rank(raw_props(payload)).await?;
        Ok(responses::created())
    }
}

#[async_trait]
impl RouteHandler for CreateMilitaryRankController {
    async fn handle(&self, request: HttpRequest) -> HttpResponse {
        match self.create(request).await {
            Ok(response) => response,
            Err(e) => e.into_http_response(),
        }
    }
}
