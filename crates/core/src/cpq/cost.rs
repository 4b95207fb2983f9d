use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::packaging::{BagType, CostType, Material, ProcessOption};
use crate::errors::QuoteError;

/// Unrounded per-unit economics. Setup cost stays a per-order total because
/// amortization depends on the final quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEconomics {
    pub material_cost: Decimal,
    pub process_unit_cost: Decimal,
    pub setup_cost_total: Decimal,
    pub print_color_cost: Decimal,
}

impl UnitEconomics {
    /// Cost of one unit when setup is spread across `quantity` units.
    pub fn base_unit_cost(&self, quantity: u32) -> Result<Decimal, QuoteError> {
        checked_sum([
            self.material_cost,
            self.process_unit_cost,
            self.print_color_cost,
            self.setup_cost_per_unit(quantity),
        ])
    }

    pub fn setup_cost_per_unit(&self, quantity: u32) -> Decimal {
        self.setup_cost_total / Decimal::from(quantity.max(1))
    }
}

pub(crate) fn checked_mul(left: Decimal, right: Decimal) -> Result<Decimal, QuoteError> {
    left.checked_mul(right).ok_or(QuoteError::PriceOverflow)
}

pub(crate) fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, QuoteError> {
    values.into_iter().try_fold(Decimal::ZERO, |total, value| {
        total.checked_add(value).ok_or(QuoteError::PriceOverflow)
    })
}

pub fn compose_unit_economics<'a>(
    material: &Material,
    bag_type: &BagType,
    processes: impl IntoIterator<Item = &'a ProcessOption>,
    area: Decimal,
    print_colors: u32,
    print_color_rate: Decimal,
) -> Result<UnitEconomics, QuoteError> {
    let material_cost =
        checked_mul(checked_mul(material.cost_per_sqm, area)?, bag_type.multiplier)?;

    let mut process_unit_cost = Decimal::ZERO;
    let mut setup_cost_total = Decimal::ZERO;
    for process in processes {
        let (slot, amount) = match process.cost_type {
            CostType::PerUnit => (&mut process_unit_cost, process.cost),
            CostType::PerOrder => (&mut setup_cost_total, process.cost),
            CostType::PerSqm => (&mut process_unit_cost, checked_mul(process.cost, area)?),
        };
        *slot = checked_sum([*slot, amount])?;
    }

    let print_color_cost =
        checked_mul(checked_mul(Decimal::from(print_colors), print_color_rate)?, area)?;

    Ok(UnitEconomics { material_cost, process_unit_cost, setup_cost_total, print_color_cost })
}
