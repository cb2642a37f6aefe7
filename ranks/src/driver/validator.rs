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

//! Validation of sanitized military rank properties.

use crate::db::MilitaryRankRepository;
use crate::model::{Abbreviation, MilitaryRankProps, Order, SanitizedMilitaryRankProps};
use forcemap_core::driver::{DriverError, DriverResult};
use std::sync::Arc;

/// User-facing label of the abbreviation field.
pub(super) const ABBREVIATION_FIELD: &str = "Abreviatura";

/// User-facing label of the order field.
pub(super) const ORDER_FIELD: &str = "Ordem";

/// User-facing label of the abbreviation when reported as a duplicate key.
pub(super) const ABBREVIATION_KEY: &str = "Posto/Graduação";

/// User-facing label of the order when reported as a duplicate key.
pub(super) const ORDER_KEY: &str = "Ordem hierárquica";

/// Checks the domain constraints of a numeric order and converts it to its strong type.
fn validate_order(order: f64) -> DriverResult<Order> {
    if order <= 0.0 {
        return Err(DriverError::invalid_param(ORDER_FIELD, "must be greater than zero"));
    }
    if !order.is_finite() || order.fract() != 0.0 {
        return Err(DriverError::invalid_param(ORDER_FIELD, "must be an integer"));
    }
    if order > f64::from(Order::MAX) {
        return Err(DriverError::invalid_param(
            ORDER_FIELD,
            format!("must not exceed {}", Order::MAX),
        ));
    }
    Order::from_i64(order as i64).map_err(|e| DriverError::invalid_param(ORDER_FIELD, e.0))
}

/// Validator of military rank properties against the data already in the repository.
#[derive(Clone)]
pub(super) struct MilitaryRankValidator {
    /// Repository used for the uniqueness checks.
    repository: Arc<dyn MilitaryRankRepository>,
}

impl MilitaryRankValidator {
    /// Creates a new validator that queries `repository`.
    pub(super) fn new(repository: Arc<dyn MilitaryRankRepository>) -> Self {
        Self { repository }
    }

    /// Validates `props` and returns them in their strongly-typed form.
    ///
    /// Checks run in a fixed order and stop at the first violation: presence of all fields,
    /// domain of the order, uniqueness of the abbreviation and uniqueness of the order.  The
    /// repository is only queried once all local checks pass.
    pub(super) async fn validate(
        &self,
        props: SanitizedMilitaryRankProps,
    ) -> DriverResult<MilitaryRankProps> {
        if props.abbreviation.is_empty() {
            return Err(DriverError::MissingParam(ABBREVIATION_FIELD.to_owned()));
        }
        let order = match props.order {
            Some(order) => order,
            None => return Err(DriverError::MissingParam(ORDER_FIELD.to_owned())),
        };

        let order = validate_order(order)?;
        let abbreviation = Abbreviation::new(props.abbreviation)
            .map_err(|e| DriverError::invalid_param(ABBREVIATION_FIELD, e.0))?;

        if self.repository.find_by_abbreviation(abbreviation.as_str()).await?.is_some() {
            return Err(DriverError::DuplicatedKey(ABBREVIATION_KEY.to_owned()));
        }
        if self.repository.find_by_order(order).await?.is_some() {
            return Err(DriverError::DuplicatedKey(ORDER_KEY.to_owned()));
        }

        Ok(MilitaryRankProps::new(abbreviation, order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    /// Shorthand to build sanitized props.
    fn sanitized(abbreviation: &str, order: Option<f64>) -> SanitizedMilitaryRankProps {
        SanitizedMilitaryRankProps { abbreviation: abbreviation.to_owned(), order }
    }

    #[tokio::test]
    async fn test_validate_ok() {
        let context = TestContext::setup();

        let props = context.validator().validate(sanitized("Cel", Some(1.0))).await.unwrap();
        assert_eq!("Cel", props.abbreviation().as_str());
        assert_eq!(1, props.order().as_i64());
        assert_eq!(2, context.repository().lookups());
    }

    #[tokio::test]
    async fn test_validate_largest_order() {
        let context = TestContext::setup();

        let props =
            context.validator().validate(sanitized("Rec", Some(2147483647.0))).await.unwrap();
        assert_eq!(2147483647, props.order().as_i64());
    }

    #[tokio::test]
    async fn test_validate_missing_abbreviation() {
        let context = TestContext::setup();

        for order in [Some(1.0), None, Some(-1.0)] {
            assert_eq!(
                DriverError::MissingParam("Abreviatura".to_owned()),
                context.validator().validate(sanitized("", order)).await.unwrap_err()
            );
        }
        assert_eq!(0, context.repository().lookups());
    }

    #[tokio::test]
    async fn test_validate_missing_order() {
        let context = TestContext::setup();

        assert_eq!(
            DriverError::MissingParam("Ordem".to_owned()),
            context.validator().validate(sanitized("Cel", None)).await.unwrap_err()
        );
        assert_eq!(0, context.repository().lookups());
    }

    #[tokio::test]
    async fn test_validate_order_not_positive() {
        let context = TestContext::setup();

        for order in [0.0, -1.0, -0.5, f64::NEG_INFINITY] {
            assert_eq!(
                DriverError::invalid_param("Ordem", "must be greater than zero"),
                context.validator().validate(sanitized("Cel", Some(order))).await.unwrap_err()
            );
        }
        assert_eq!(0, context.repository().lookups());
    }

    #[tokio::test]
    async fn test_validate_order_not_integer() {
        let context = TestContext::setup();

        for order in [1.5, f64::INFINITY] {
            assert_eq!(
                DriverError::invalid_param("Ordem", "must be an integer"),
                context.validator().validate(sanitized("Cel", Some(order))).await.unwrap_err()
            );
        }
        assert_eq!(0, context.repository().lookups());
    }

    #[tokio::test]
    async fn test_validate_order_too_large() {
        let context = TestContext::setup();

        assert_eq!(
            DriverError::invalid_param("Ordem", "must not exceed 2147483647"),
            context.validator().validate(sanitized("Cel", Some(2147483648.0))).await.unwrap_err()
        );
        assert_eq!(0, context.repository().lookups());
    }

    #[tokio::test]
    async fn test_validate_duplicate_abbreviation() {
        let context = TestContext::setup();
        context.create_rank("Maj", 3).await;

        for abbreviation in ["Maj", "MAJ", "maj"] {
            assert_eq!(
                DriverError::DuplicatedKey("Posto/Graduação".to_owned()),
                context
                    .validator()
                    .validate(sanitized(abbreviation, Some(4.0)))
                    .await
                    .unwrap_err()
            );
        }
    }

    #[tokio::test]
    async fn test_validate_duplicate_order() {
        let context = TestContext::setup();
        context.create_rank("Maj", 3).await;

        assert_eq!(
            DriverError::DuplicatedKey("Ordem hierárquica".to_owned()),
            context.validator().validate(sanitized("Cap", Some(3.0))).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_validate_abbreviation_checked_before_order() {
        let context = TestContext::setup();
        context.create_rank("Maj", 3).await;

        assert_eq!(
            DriverError::DuplicatedKey("Posto/Graduação".to_owned()),
            context.validator().validate(sanitized("Maj", Some(3.0))).await.unwrap_err()
        );
        assert_eq!(1, context.repository().lookups());
    }

    #[tokio::test]
    async fn test_validate_backend_error() {
        let validator = MilitaryRankValidator::new(Arc::new(FailingRepository::default()));

        match validator.validate(sanitized("Cel", Some(1.0))).await.unwrap_err() {
            DriverError::BackendError(_) => (),
            e => panic!("Unexpected error: {:?}", e),
        }
    }
}
