use std::path::PathBuf;

use thiserror::Error;

use crate::cpq::constraints::ConstraintViolation;
use crate::domain::packaging::{BagSizeId, BagTypeId, MaterialId, ProcessId};

/// Rejections produced while turning a configuration into a quote.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("unknown bag type `{0}`")]
    UnknownBagType(BagTypeId),
    #[error("unknown bag size `{0}`")]
    UnknownBagSize(BagSizeId),
    #[error("unknown material `{0}`")]
    UnknownMaterial(MaterialId),
    #[error("unknown process option `{0}`")]
    UnknownProcess(ProcessId),
    #[error("custom size requires width and height (missing: {missing})")]
    MissingCustomDimensions { missing: &'static str },
    #[error("custom {dimension} must be greater than zero")]
    InvalidDimension { dimension: &'static str },
    #[error("print colors must be at least 1, got {0}")]
    InvalidPrintColors(u32),
    #[error("configuration violates {} manufacturing constraint(s)", violations.len())]
    ConstraintViolation { violations: Vec<ConstraintViolation> },
    #[error("delivery date is outside the supported calendar range")]
    CalendarOverflow,
    #[error("price exceeds the supported numeric range")]
    PriceOverflow,
    #[error("quantity {0} is too large to quote")]
    QuantityOutOfRange(u32),
}

impl QuoteError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownBagType(_) => "UNKNOWN_BAG_TYPE",
            Self::UnknownBagSize(_) => "UNKNOWN_BAG_SIZE",
            Self::UnknownMaterial(_) => "UNKNOWN_MATERIAL",
            Self::UnknownProcess(_) => "UNKNOWN_PROCESS",
            Self::MissingCustomDimensions { .. } => "MISSING_CUSTOM_DIMENSIONS",
            Self::InvalidDimension { .. } => "INVALID_DIMENSION",
            Self::InvalidPrintColors(_) => "INVALID_PRINT_COLORS",
            Self::ConstraintViolation { .. } => "CONSTRAINT_VIOLATION",
            Self::CalendarOverflow => "CALENDAR_OVERFLOW",
            Self::PriceOverflow => "PRICE_OVERFLOW",
            Self::QuantityOutOfRange(_) => "QUANTITY_OUT_OF_RANGE",
        }
    }

    pub fn violations(&self) -> &[ConstraintViolation] {
        match self {
            Self::ConstraintViolation { violations } => violations,
            _ => &[],
        }
    }
}

/// Structural problems with reference data, detected once when a catalog is built.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog has no {0}")]
    EmptyFamily(&'static str),
    #[error("duplicate {family} id `{id}`")]
    DuplicateId { family: &'static str, id: String },
    #[error("catalog is missing the `custom` bag size")]
    MissingCustomSize,
    #[error("{family} `{id}` has a negative {field}")]
    NegativeValue { family: &'static str, id: String, field: &'static str },
    #[error("quantity tiers are invalid: {0}")]
    InvalidTiers(String),
    #[error("no minimum order quantity configured for printing method `{0}`")]
    MissingMoq(&'static str),
    #[error("constraint rule `{rule}` references unknown id `{id}`")]
    UnknownRuleReference { rule: String, id: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, code: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        "The configuration could not be quoted. Check the selected options and try again."
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        let InterfaceError::BadRequest { correlation_id: id, .. } = &mut mapped;
        *id = correlation_id;
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Quote(error) => Self::BadRequest {
                message: error.to_string(),
                code: error.code().to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::packaging::MaterialId;
    use crate::errors::{ApplicationError, InterfaceError, QuoteError};

    #[test]
    fn quote_error_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::from(QuoteError::UnknownMaterial(MaterialId::new("vellum")))
                .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref code,
                ..
            } if correlation_id == "req-1" && code == "UNKNOWN_MATERIAL"
        ));
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface = ApplicationError::from(QuoteError::InvalidPrintColors(0))
            .into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "The configuration could not be quoted. Check the selected options and try again."
        );
    }

    #[test]
    fn overflow_rejections_are_bad_requests() {
        let interface = ApplicationError::from(QuoteError::PriceOverflow).into_interface("req-3");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref code, .. } if code == "PRICE_OVERFLOW"
        ));
    }

    #[test]
    fn missing_dimension_message_names_the_field() {
        let error = QuoteError::MissingCustomDimensions { missing: "height" };
        assert_eq!(error.to_string(), "custom size requires width and height (missing: height)");
    }
}
