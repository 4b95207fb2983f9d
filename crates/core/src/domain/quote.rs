use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::packaging::{
    BagSize, BagSizeId, BagType, BagTypeId, Material, MaterialId, PrintingMethod, ProcessId,
    ProcessOption,
};

/// A single pricing request. Built fresh per request and never stored by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub bag_type: BagTypeId,
    pub bag_size: BagSizeId,
    #[serde(default)]
    pub custom_width: Option<u32>,
    #[serde(default)]
    pub custom_height: Option<u32>,
    #[serde(default)]
    pub custom_gusset: Option<u32>,
    pub material: MaterialId,
    #[serde(default)]
    pub processes: BTreeSet<ProcessId>,
    pub quantity: u32,
    pub print_colors: u32,
}

impl QuoteInput {
    pub fn new(
        bag_type: impl Into<String>,
        bag_size: impl Into<String>,
        material: impl Into<String>,
        quantity: u32,
        print_colors: u32,
    ) -> Self {
        Self {
            bag_type: BagTypeId::new(bag_type),
            bag_size: BagSizeId::new(bag_size),
            custom_width: None,
            custom_height: None,
            custom_gusset: None,
            material: MaterialId::new(material),
            processes: BTreeSet::new(),
            quantity,
            print_colors,
        }
    }

    pub fn with_process(mut self, process: impl Into<String>) -> Self {
        self.processes.insert(ProcessId::new(process));
        self
    }

    pub fn with_custom_dimensions(mut self, width: u32, height: u32, gusset: Option<u32>) -> Self {
        self.custom_width = Some(width);
        self.custom_height = Some(height);
        self.custom_gusset = gusset;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TolerancePoint {
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreak {
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEstimate {
    pub min_days: u32,
    pub max_days: u32,
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

/// Per-unit contributions after the tier discount. The five amounts sum to the unit price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material_cost: Decimal,
    pub process_cost: Decimal,
    pub printing_cost: Decimal,
    pub setup_cost_per_unit: Decimal,
    pub margin: Decimal,
    pub discount: Decimal,
}

impl CostBreakdown {
    pub fn reconstructed_unit_price(&self) -> Decimal {
        self.material_cost
            + self.process_cost
            + self.printing_cost
            + self.setup_cost_per_unit
            + self.margin
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub quantity: u32,
    pub tolerance_low: TolerancePoint,
    pub tolerance_target: TolerancePoint,
    pub tolerance_high: TolerancePoint,
    pub price_breaks: Vec<PriceBreak>,
    pub delivery: DeliveryEstimate,
    pub printing_method: PrintingMethod,
    pub moq_met: bool,
    pub moq_required: u32,
    pub surface_area: Decimal,
    pub breakdown: CostBreakdown,
    pub bag_type: BagType,
    pub bag_size: BagSize,
    pub material: Material,
    pub processes: Vec<ProcessOption>,
}

/// Fields forwarded to the external checkout session call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub currency: String,
    pub moq_met: bool,
    pub estimated_delivery: NaiveDate,
}

impl QuoteResult {
    /// The first tier above the quoted quantity, shown as an upsell hint.
    pub fn next_price_break(&self) -> Option<&PriceBreak> {
        self.price_breaks.iter().find(|price_break| price_break.quantity > self.quantity)
    }

    pub fn checkout_request(&self) -> CheckoutRequest {
        let dimensions = if self.bag_size.is_custom() {
            String::from("custom size")
        } else {
            self.bag_size.label_en.clone()
        };

        CheckoutRequest {
            description: format!(
                "{} / {} / {} x {}",
                self.bag_type.name_en, self.material.name, dimensions, self.quantity
            ),
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            currency: "USD".to_owned(),
            moq_met: self.moq_met,
            estimated_delivery: self.delivery.latest,
        }
    }
}
