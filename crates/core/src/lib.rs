pub mod config;
pub mod cpq;
pub mod display;
pub mod domain;
pub mod errors;

pub use cpq::catalog::{CatalogData, CatalogRegistry, QuoteDefaults};
pub use cpq::constraints::{
    ConstraintResult, ConstraintRules, ConstraintViolation, Configurator, Selection,
    SelectionError,
};
pub use cpq::delivery::{add_business_days, DeliveryPolicy};
pub use cpq::pricing::PricingPolicy;
pub use cpq::{QuoteEngine, QuoteRuntime};
pub use domain::packaging::{
    BagSizeId, BagTypeId, MaterialId, PrintingMethod, ProcessCategory, ProcessId,
};
pub use domain::quote::{CheckoutRequest, CostBreakdown, QuoteInput, QuoteResult};
pub use errors::{ApplicationError, CatalogError, InterfaceError, QuoteError};
