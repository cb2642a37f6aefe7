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

//! API to check the health of the service.

use async_trait::async_trait;
use forcemap_core::clocks::Clock;
use forcemap_core::rest::{responses, HttpRequest, HttpResponse, RouteHandler};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;

/// API handler.
pub(crate) struct HealthController {
    /// Clock used to report the current time.
    clock: Arc<dyn Clock>,

    /// Start time of the service.
    started: Instant,
}

impl HealthController {
    /// Creates a new handler that reports times with `clock` and uptimes since `started`.
    pub(crate) fn new(clock: Arc<dyn Clock>, started: Instant) -> Self {
        Self { clock, started }
    }
}

#[async_trait]
impl RouteHandler for HealthController {
    async fn handle(&self, _request: HttpRequest) -> HttpResponse {
        let timestamp = match self.clock.now_utc().format(&Rfc3339) {
            Ok(timestamp) => timestamp,
            Err(e) => return responses::server_error(&e),
        };
        responses::success(json!({
            "status": "ok",
            "timestamp": timestamp,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime": self.started.elapsed().as_secs_f64(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::tests::NOW;
    use crate::rest::testutils::*;
    use forcemap_core::rest::testutils::*;
    use serde_json::Value;
    use std::time::Duration;
    use time::format_description::well_known::Rfc3339;
    use time::macros::datetime;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/health".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let data = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_data::<Value>()
            .await;
        assert_eq!("ok", data["status"]);
        assert_eq!(NOW.format(&Rfc3339).unwrap(), data["timestamp"]);
        assert_eq!("1.0.0", data["version"]);
        assert!(data["uptime"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_timestamp_follows_clock() {
        let context = TestContext::setup().await;
        context.clock().advance(Duration::from_secs(300));

        let data = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_data::<Value>()
            .await;
        let exp_timestamp = (NOW + time::Duration::minutes(5)).format(&Rfc3339).unwrap();
        assert_eq!(exp_timestamp, data["timestamp"]);
    }

    #[tokio::test]
    async fn test_timestamp_after_clock_moves_back() {
        let context = TestContext::setup().await;
        context.clock().set(datetime!(2023-12-31 23:59:59 UTC));

        let data = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_data::<Value>()
            .await;
        assert_eq!("2023-12-31T23:59:59Z", data["timestamp"]);
    }
}
