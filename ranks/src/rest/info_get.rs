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

//! API to describe the service.

use crate::rest::MILITARY_RANKS_PREFIX;
use forcemap_core::rest::{handler_fn, responses, HttpRequest, RouteHandler};
use serde_json::json;
use std::sync::Arc;

/// API handler.
pub(crate) fn handler() -> Arc<dyn RouteHandler> {
    handler_fn(|_request: HttpRequest| async {
        responses::success(json!({
            "name": "API Forcemap",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Military rank management service",
            "endpoints": {
                "health": "/health",
                "militaryRanks": MILITARY_RANKS_PREFIX,
            },
        }))
    })
}
