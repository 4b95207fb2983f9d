pub mod catalog;
pub mod constraints;
pub mod cost;
pub mod delivery;
pub mod geometry;
pub mod pricing;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::domain::packaging::{PrintingMethod, ProcessOption};
use crate::domain::quote::{QuoteInput, QuoteResult};
use crate::errors::{CatalogError, QuoteError};

use self::{
    catalog::CatalogRegistry,
    constraints::{ConstraintEngine, ConstraintRules, Configurator},
    cost::compose_unit_economics,
    delivery::DeliveryPolicy,
    geometry::{resolve_surface_area, CustomDimensions},
    pricing::{DeterministicPricingEngine, PricingEngine, PricingPolicy},
};

pub trait QuoteRuntime: Send + Sync {
    /// Prices `input` with delivery dates counted from `today`.
    fn quote_on(&self, input: &QuoteInput, today: NaiveDate) -> Result<QuoteResult, QuoteError>;

    fn quote(&self, input: &QuoteInput) -> Result<QuoteResult, QuoteError> {
        self.quote_on(input, Utc::now().date_naive())
    }
}

/// Stateless pipeline from a configuration to a quote. Safe to share behind `Arc`.
#[derive(Clone, Debug)]
pub struct QuoteEngine {
    catalog: Arc<CatalogRegistry>,
    rules: ConstraintRules,
    pricing: DeterministicPricingEngine,
    delivery: DeliveryPolicy,
}

impl QuoteEngine {
    pub fn new(
        catalog: Arc<CatalogRegistry>,
        rules: ConstraintRules,
        pricing: PricingPolicy,
        delivery: DeliveryPolicy,
    ) -> Result<Self, CatalogError> {
        rules.check_against(&catalog)?;
        Ok(Self { catalog, rules, pricing: DeterministicPricingEngine::new(pricing), delivery })
    }

    /// Builds the engine described by `config`: the configured catalog file (or the builtin
    /// catalog), the standard rule set and the configured pricing constants.
    pub fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        let catalog = match config.catalog.path.as_deref() {
            Some(path) => CatalogRegistry::from_path(path)?,
            None => CatalogRegistry::builtin(),
        };

        Self::new(
            Arc::new(catalog),
            ConstraintRules::standard(),
            config.pricing.pricing_policy(),
            config.pricing.delivery_policy(),
        )
    }

    pub fn catalog(&self) -> &CatalogRegistry {
        &self.catalog
    }

    pub fn rules(&self) -> &ConstraintRules {
        &self.rules
    }

    pub fn pricing_policy(&self) -> &PricingPolicy {
        self.pricing.policy()
    }

    pub fn delivery_policy(&self) -> &DeliveryPolicy {
        &self.delivery
    }

    pub fn configurator(&self) -> Configurator<'_> {
        Configurator::new(&self.catalog, &self.rules)
    }

    fn resolve_processes(&self, input: &QuoteInput) -> Result<Vec<ProcessOption>, QuoteError> {
        input
            .processes
            .iter()
            .map(|id| {
                self.catalog
                    .process(id)
                    .cloned()
                    .ok_or_else(|| QuoteError::UnknownProcess(id.clone()))
            })
            .collect()
    }

    fn assemble(&self, input: &QuoteInput, today: NaiveDate) -> Result<QuoteResult, QuoteError> {
        if input.print_colors == 0 {
            return Err(QuoteError::InvalidPrintColors(input.print_colors));
        }

        let bag_type = self
            .catalog
            .bag_type(&input.bag_type)
            .ok_or_else(|| QuoteError::UnknownBagType(input.bag_type.clone()))?;
        let bag_size = self
            .catalog
            .bag_size(&input.bag_size)
            .ok_or_else(|| QuoteError::UnknownBagSize(input.bag_size.clone()))?;
        let material = self
            .catalog
            .material(&input.material)
            .ok_or_else(|| QuoteError::UnknownMaterial(input.material.clone()))?;
        let processes = self.resolve_processes(input)?;

        let constraints = self.rules.validate(input);
        if !constraints.valid {
            return Err(QuoteError::ConstraintViolation { violations: constraints.violations });
        }

        let surface_area = resolve_surface_area(
            bag_size,
            CustomDimensions {
                width: input.custom_width,
                height: input.custom_height,
                gusset: input.custom_gusset,
            },
        )?;

        let economics = compose_unit_economics(
            material,
            bag_type,
            &processes,
            surface_area,
            input.print_colors,
            self.pricing.policy().print_color_rate,
        )?;
        let priced = self.pricing.price(
            &economics,
            input.quantity,
            self.catalog.tiers(),
            self.catalog.overflow_discount(),
        )?;

        let printing_method = PrintingMethod::from_selection(&input.processes);
        let moq_required = self.catalog.moq_for(printing_method);
        let window = self.delivery.window_for(printing_method, priced.quantity, &input.processes);
        let delivery = self.delivery.estimate(window, today)?;

        for step in &priced.trace {
            debug!(
                event_name = "quote.pricing.step",
                stage = %step.stage,
                amount = %step.amount,
                "{}",
                step.detail
            );
        }

        Ok(QuoteResult {
            unit_price: priced.unit_price,
            total_price: priced.total_price,
            quantity: priced.quantity,
            tolerance_low: priced.tolerance_low,
            tolerance_target: priced.tolerance_target,
            tolerance_high: priced.tolerance_high,
            price_breaks: priced.price_breaks,
            delivery,
            printing_method,
            moq_met: priced.quantity >= moq_required,
            moq_required,
            surface_area,
            breakdown: priced.breakdown,
            bag_type: bag_type.clone(),
            bag_size: bag_size.clone(),
            material: material.clone(),
            processes,
        })
    }
}

impl Default for QuoteEngine {
    fn default() -> Self {
        Self {
            catalog: Arc::new(CatalogRegistry::builtin()),
            rules: ConstraintRules::standard(),
            pricing: DeterministicPricingEngine::default(),
            delivery: DeliveryPolicy::default(),
        }
    }
}

impl QuoteRuntime for QuoteEngine {
    fn quote_on(&self, input: &QuoteInput, today: NaiveDate) -> Result<QuoteResult, QuoteError> {
        match self.assemble(input, today) {
            Ok(result) => {
                debug!(
                    event_name = "quote.computed",
                    bag_type = %input.bag_type,
                    material = %input.material,
                    quantity = result.quantity,
                    unit_price = %result.unit_price,
                    total_price = %result.total_price,
                    moq_met = result.moq_met,
                    "quote computed"
                );
                Ok(result)
            }
            Err(error) => {
                warn!(
                    event_name = "quote.rejected",
                    code = error.code(),
                    error = %error,
                    "quote rejected"
                );
                Err(error)
            }
        }
    }
}
