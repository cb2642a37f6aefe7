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

//! Generic business logic for any service.
//!
//! Every service should implement its own `Driver` type holding the repositories and other
//! collaborators it needs, all injected at construction time.  Operations implemented in the
//! `Driver` take `self` by value: the driver is cheap to clone and each operation is meant to be
//! a single, self-contained unit of work.
//!
//! The errors defined here form the taxonomy that the REST layer knows how to present to users.
//! Errors that carry a `status` are "classified": their message is safe to show to the client.
//! Everything else is unexpected and must never be shown verbatim.

use crate::db::DbError;
use http::StatusCode;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Catch-all error type for unexpected backend errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates that an entity with the same unique key already exists.  The payload is the
    /// user-facing label of the key that clashed.
    #[error("A {0} with this value already exists")]
    DuplicatedKey(String),

    /// Indicates that a parameter is present but holds a value outside of its domain.
    #[error("The field {field} is invalid: {reason}")]
    InvalidParam {
        /// User-facing label of the offending field.
        field: String,

        /// Explanation of the constraint that the value violates.
        reason: String,
    },

    /// Indicates that a required parameter was not provided.
    #[error("The field {0} must be filled in")]
    MissingParam(String),
}

impl DriverError {
    /// Shorthand to construct an `InvalidParam` error.
    pub fn invalid_param<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        DriverError::InvalidParam { field: field.into(), reason: reason.into() }
    }

    /// Returns the name of the error kind, used to classify failures in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::BackendError(_) => "BackendError",
            DriverError::DuplicatedKey(_) => "DuplicatedKeyError",
            DriverError::InvalidParam { .. } => "InvalidParamError",
            DriverError::MissingParam(_) => "MissingParamError",
        }
    }

    /// Returns the HTTP status code for classified errors, or `None` if the error is unexpected.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DriverError::BackendError(_) => None,
            DriverError::DuplicatedKey(_) => Some(StatusCode::CONFLICT),
            DriverError::InvalidParam { .. } => Some(StatusCode::UNPROCESSABLE_ENTITY),
            DriverError::MissingParam(_) => Some(StatusCode::UNPROCESSABLE_ENTITY),
        }
    }

    /// Returns true if this error is part of the classified taxonomy.
    pub fn is_classified(&self) -> bool {
        self.status().is_some()
    }
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        DriverError::BackendError(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
