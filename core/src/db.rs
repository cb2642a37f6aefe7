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

//! Generic abstraction to access the persistence layer.
//!
//! Services define repository traits with the operations they need and implement them once per
//! backend.  The types in this module are shared by all of those implementations so that the
//! business logic can handle persistence failures uniformly.

use crate::model::ModelError;

pub mod sqlite;

/// Persistence errors.  Failures we know how to react to get their own variant and everything
/// else is reported as a `BackendError` with the backend's own description.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// An insertion clashed with a uniqueness constraint.
    #[error("Already exists")]
    AlreadyExists,

    /// Unexpected failure reported by the backend.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Stored data could not be turned back into model types.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// The backend could not serve the request in time, typically because the connection pool
    /// was exhausted.
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Macros to run one suite of repository tests against every repository implementation.
///
/// The suite is a module of `async fn test_*(repository)` functions that take a ready-to-use
/// repository.  Each implementation then instantiates the suite with an expression that builds
/// a fresh repository, and every function in the suite becomes a separate `#[tokio::test]`.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Instantiates `module::name` as a test that runs against the repository built by `setup`.
    ///
    /// The optional `extra` attribute is attached to the generated test, which is useful to
    /// `#[ignore]` tests that need external resources.
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            #[tokio::test]
            $(#[$extra])?
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Instantiates every test in `names` from `module` against the repository built by `setup`.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module);
            )+
        };
    ];

    pub use generate_tests;
}
