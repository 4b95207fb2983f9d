use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::cpq::cost::{checked_mul, checked_sum, UnitEconomics};
use crate::domain::packaging::QuantityTier;
use crate::domain::quote::{CostBreakdown, PriceBreak, TolerancePoint};
use crate::errors::QuoteError;

pub const UNIT_PRICE_DP: u32 = 4;
pub const MONEY_DP: u32 = 2;

/// Engine constants that are not part of the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub margin: Decimal,
    pub print_color_rate: Decimal,
    pub quantity_floor: u32,
    pub tolerance_percent: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            margin: Decimal::new(25, 2),
            print_color_rate: Decimal::new(12, 2),
            quantity_floor: 10,
            tolerance_percent: 5,
        }
    }
}

impl PricingPolicy {
    pub fn effective_quantity(&self, requested: u32) -> u32 {
        requested.max(self.quantity_floor)
    }

    fn markup(&self) -> Decimal {
        Decimal::ONE + self.margin
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub quantity: u32,
    pub discount: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub tolerance_low: TolerancePoint,
    pub tolerance_target: TolerancePoint,
    pub tolerance_high: TolerancePoint,
    pub price_breaks: Vec<PriceBreak>,
    pub breakdown: CostBreakdown,
    pub trace: Vec<PricingTraceStep>,
}

pub trait PricingEngine: Send + Sync {
    fn price(
        &self,
        economics: &UnitEconomics,
        quantity: u32,
        tiers: &[QuantityTier],
        overflow_discount: Decimal,
    ) -> Result<PricingResult, QuoteError>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicPricingEngine {
    policy: PricingPolicy,
}

impl DeterministicPricingEngine {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn price(
        &self,
        economics: &UnitEconomics,
        quantity: u32,
        tiers: &[QuantityTier],
        overflow_discount: Decimal,
    ) -> Result<PricingResult, QuoteError> {
        price_with_trace(&self.policy, economics, quantity, tiers, overflow_discount)
    }
}

pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn marked_up_unit_price(
    policy: &PricingPolicy,
    base_cost: Decimal,
    discount: Decimal,
) -> Result<Decimal, QuoteError> {
    let marked_up = checked_mul(checked_mul(base_cost, discount)?, policy.markup())?;
    Ok(round_half_up(marked_up, UNIT_PRICE_DP))
}

fn extended_price(unit_price: Decimal, quantity: u32) -> Result<Decimal, QuoteError> {
    Ok(round_half_up(checked_mul(unit_price, Decimal::from(quantity))?, MONEY_DP))
}

/// Multiplier for `quantity`: the containing tier, the overflow discount above
/// the last tier, or neutral when the quantity falls in a gap.
pub fn tier_discount(tiers: &[QuantityTier], overflow_discount: Decimal, quantity: u32) -> Decimal {
    if let Some(tier) = tiers.iter().find(|tier| tier.contains(quantity)) {
        return tier.discount;
    }
    match tiers.last() {
        Some(last) if quantity > last.max => overflow_discount,
        _ => Decimal::ONE,
    }
}

/// One row per tier, with setup amortized over the tier minimum.
pub fn price_breaks(
    policy: &PricingPolicy,
    economics: &UnitEconomics,
    tiers: &[QuantityTier],
) -> Result<Vec<PriceBreak>, QuoteError> {
    tiers
        .iter()
        .map(|tier| -> Result<PriceBreak, QuoteError> {
            let base_cost = economics.base_unit_cost(tier.min)?;
            let unit_price = marked_up_unit_price(policy, base_cost, tier.discount)?;
            Ok(PriceBreak {
                quantity: tier.min,
                unit_price,
                total_price: extended_price(unit_price, tier.min)?,
            })
        })
        .collect()
}

pub fn tolerance_band(
    policy: &PricingPolicy,
    unit_price: Decimal,
    quantity: u32,
) -> Result<(TolerancePoint, TolerancePoint), QuoteError> {
    let requested = quantity;
    let quantity = u64::from(quantity);
    let percent = u64::from(policy.tolerance_percent);
    let low = quantity * (100 - percent.min(100)) / 100;
    let high = (quantity * (100 + percent)).div_ceil(100);

    let point = |quantity: u64| -> Result<TolerancePoint, QuoteError> {
        let quantity =
            u32::try_from(quantity).map_err(|_| QuoteError::QuantityOutOfRange(requested))?;
        Ok(TolerancePoint { quantity, price: extended_price(unit_price, quantity)? })
    };

    Ok((point(low)?, point(high)?))
}

/// Cost components after the tier discount; margin absorbs rounding so the
/// parts always add up to `unit_price`.
pub fn breakdown(
    economics: &UnitEconomics,
    quantity: u32,
    discount: Decimal,
    unit_price: Decimal,
) -> Result<CostBreakdown, QuoteError> {
    let part = |value: Decimal| -> Result<Decimal, QuoteError> {
        Ok(round_half_up(checked_mul(value, discount)?, UNIT_PRICE_DP))
    };

    let material_cost = part(economics.material_cost)?;
    let process_cost = part(economics.process_unit_cost)?;
    let printing_cost = part(economics.print_color_cost)?;
    let setup_cost_per_unit = part(economics.setup_cost_per_unit(quantity))?;
    let components =
        checked_sum([material_cost, process_cost, printing_cost, setup_cost_per_unit])?;
    let margin = unit_price.checked_sub(components).ok_or(QuoteError::PriceOverflow)?;

    Ok(CostBreakdown {
        material_cost,
        process_cost,
        printing_cost,
        setup_cost_per_unit,
        margin,
        discount,
    })
}

pub fn price_with_trace(
    policy: &PricingPolicy,
    economics: &UnitEconomics,
    requested_quantity: u32,
    tiers: &[QuantityTier],
    overflow_discount: Decimal,
) -> Result<PricingResult, QuoteError> {
    let quantity = policy.effective_quantity(requested_quantity);
    let base_cost = economics.base_unit_cost(quantity)?;
    let discount = tier_discount(tiers, overflow_discount, quantity);
    let unit_price = marked_up_unit_price(policy, base_cost, discount)?;
    let total_price = extended_price(unit_price, quantity)?;
    let (tolerance_low, tolerance_high) = tolerance_band(policy, unit_price, quantity)?;

    let trace = vec![
        PricingTraceStep {
            stage: "base_cost".to_owned(),
            detail: format!("material + process + printing + setup/{quantity}"),
            amount: base_cost,
        },
        PricingTraceStep {
            stage: "discount".to_owned(),
            detail: format!("tier multiplier for {quantity} units"),
            amount: discount,
        },
        PricingTraceStep {
            stage: "unit_price".to_owned(),
            detail: format!("base * discount * (1 + {})", policy.margin),
            amount: unit_price,
        },
        PricingTraceStep {
            stage: "total_price".to_owned(),
            detail: format!("unit_price * {quantity}"),
            amount: total_price,
        },
    ];

    Ok(PricingResult {
        quantity,
        discount,
        unit_price,
        total_price,
        tolerance_low,
        tolerance_target: TolerancePoint { quantity, price: total_price },
        tolerance_high,
        price_breaks: price_breaks(policy, economics, tiers)?,
        breakdown: breakdown(economics, quantity, discount, unit_price)?,
        trace,
    })
}
