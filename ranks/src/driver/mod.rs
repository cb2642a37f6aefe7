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

//! Business logic for the service.

use crate::db::MilitaryRankRepository;
use std::sync::Arc;

mod create;
mod sanitizer;
#[cfg(test)]
pub(crate) mod testutils;
mod validator;
use validator::MilitaryRankValidator;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot" and consume the driver.  The
/// driver is cheap to clone, so callers clone it once per request.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The repository that owns all persisted military ranks.
    repository: Arc<dyn MilitaryRankRepository>,

    /// Validator for incoming military rank properties.
    validator: MilitaryRankValidator,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(repository: Arc<dyn MilitaryRankRepository>) -> Self {
        let validator = MilitaryRankValidator::new(repository.clone());
        Self { repository, validator }
    }
}
