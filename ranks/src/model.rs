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

//! High-level data types.

use derive_getters::Getters;
use derive_more::Constructor;
use forcemap_core::model::{ModelError, ModelResult};
use serde_json::Value;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Properties of a military rank exactly as received from a client, before any processing.
#[derive(Constructor, Debug, Default)]
pub(crate) struct RawMilitaryRankProps {
    /// The abbreviation, in whichever shape the client sent it.
    pub(crate) abbreviation: Option<Value>,

    /// The hierarchical order, in whichever shape the client sent it.
    pub(crate) order: Option<Value>,
}

/// Properties of a military rank after type normalization but before validation.
#[derive(Debug, PartialEq)]
pub(crate) struct SanitizedMilitaryRankProps {
    /// The trimmed abbreviation.  Empty if the client did not provide a usable one.
    pub(crate) abbreviation: String,

    /// The numeric order, which may still be out of range or fractional.
    pub(crate) order: Option<f64>,
}

/// Short name of a rank, such as "Cel" or "Sgt".  Never empty and never surrounded by whitespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Abbreviation(String);

impl Abbreviation {
    /// Creates a new abbreviation after validating that it is well-formed.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Abbreviation cannot be empty".to_owned()));
        }
        if s.trim() != s {
            return Err(ModelError(format!(
                "Abbreviation '{}' cannot have leading or trailing whitespace",
                s
            )));
        }
        Ok(Self(s))
    }

    /// Returns the abbreviation as a string.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Abbreviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Position of a rank in the hierarchy.  We store this as an u32 but guarantee that it is
/// positive and usable in an i32 context, which is what the storage layer supports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Order(u32);

impl Order {
    /// Largest order that can be represented.
    pub(crate) const MAX: u32 = i32::MAX as u32;

    /// Creates an order from an `i64` with range validation.
    pub(crate) fn from_i64(order: i64) -> ModelResult<Self> {
        match u32::try_from(order) {
            Ok(order) if (1..=Self::MAX).contains(&order) => Ok(Self(order)),
            _ => Err(ModelError(format!(
                "Order {} is out of range; must be between 1 and {}",
                order,
                Self::MAX
            ))),
        }
    }

    /// Returns the order as an `i64`.
    pub(crate) fn as_i64(self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated properties of a military rank, ready to be persisted.
#[derive(Constructor, Debug, Getters, PartialEq)]
pub(crate) struct MilitaryRankProps {
    /// The rank's abbreviation.
    abbreviation: Abbreviation,

    /// The rank's position in the hierarchy.
    order: Order,
}

/// Opaque identifier of a persisted military rank.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MilitaryRankId(Uuid);

impl MilitaryRankId {
    /// Generates a new random identifier.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its textual representation.
    pub(crate) fn parse(s: &str) -> ModelResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| ModelError(format!("Invalid military rank id '{}': {}", s, e)))
    }
}

impl fmt::Display for MilitaryRankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted military rank.
#[derive(Clone, Constructor, Debug, Getters, PartialEq)]
pub(crate) struct MilitaryRank {
    /// Identifier assigned at creation time.  Never changes.
    id: MilitaryRankId,

    /// The rank's abbreviation.
    abbreviation: Abbreviation,

    /// The rank's position in the hierarchy.
    order: Order,

    /// When the rank was created.
    created_at: OffsetDateTime,

    /// When the rank was last modified.
    updated_at: OffsetDateTime,
}
