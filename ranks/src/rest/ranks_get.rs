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

//! API to list all military ranks.

use crate::rest::not_implemented;
use forcemap_core::rest::{handler_fn, HttpRequest, RouteHandler};
use std::sync::Arc;

/// API handler.  Not implemented yet.
pub(crate) fn handler() -> Arc<dyn RouteHandler> {
    handler_fn(|_request: HttpRequest| async { not_implemented() })
}
