//! Presentation helpers. Amounts stay in USD everywhere else; the CNY rate is
//! applied only here.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::quote::DeliveryEstimate;

const MM_PER_INCH: Decimal = Decimal::from_parts(254, 0, 0, false, 1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn label(self) -> &'static str {
        match self {
            Self::Metric => "mm",
            Self::Imperial => "in",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        })
    }
}

pub fn format_usd(amount: Decimal) -> String {
    format!("${}", format_fixed(amount, 2))
}

pub fn format_usd_unit(amount: Decimal) -> String {
    format!("${}", format_fixed(amount, 4))
}

pub fn format_cny(amount_usd: Decimal, rate: Decimal) -> String {
    converted_cny(amount_usd, rate, 2)
}

pub fn format_cny_unit(amount_usd: Decimal, rate: Decimal) -> String {
    converted_cny(amount_usd, rate, 4)
}

fn converted_cny(amount_usd: Decimal, rate: Decimal, dp: u32) -> String {
    match amount_usd.checked_mul(rate) {
        Some(amount) => format!("¥ {}", format_fixed(amount, dp)),
        None => "¥ n/a".to_owned(),
    }
}

pub fn format_quantity(quantity: u32) -> String {
    group_thousands(&quantity.to_string())
}

/// `5月22日`
pub fn format_delivery_date(date: NaiveDate) -> String {
    format!("{}月{}日", date.month(), date.day())
}

pub fn format_date_range(estimate: &DeliveryEstimate) -> String {
    format!(
        "{} – {}",
        format_delivery_date(estimate.earliest),
        format_delivery_date(estimate.latest)
    )
}

/// Inches, snapped to a quarter fraction when close enough, else one decimal.
pub fn mm_to_inch(mm: u32) -> String {
    let inches = Decimal::from(mm) / MM_PER_INCH;
    let whole = inches.floor();
    let frac = inches - whole;
    let tolerance = Decimal::new(6, 2);

    if frac < Decimal::new(625, 4) {
        return whole.to_string();
    }

    for (target, label) in
        [(Decimal::new(25, 2), "1/4"), (Decimal::new(5, 1), "1/2"), (Decimal::new(75, 2), "3/4")]
    {
        if (frac - target).abs() < tolerance {
            if whole > Decimal::ZERO {
                return format!("{whole} {label}");
            }
            return label.to_owned();
        }
    }

    format!("{:.1}", inches.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

pub fn mm_to_inch_decimal(mm: u32) -> Decimal {
    let inches = Decimal::from(mm) / MM_PER_INCH;
    inches.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_dimensions(width: u32, height: u32, gusset: u32, system: UnitSystem) -> String {
    match system {
        UnitSystem::Imperial => format!(
            "{}\" × {}\" × {}\"",
            mm_to_inch(width),
            mm_to_inch(height),
            mm_to_inch(gusset)
        ),
        UnitSystem::Metric => format!("{width} × {height} × {gusset} mm"),
    }
}

pub fn format_single_dim(mm: u32, system: UnitSystem) -> String {
    match system {
        UnitSystem::Imperial => format!("{}\"", mm_to_inch(mm)),
        UnitSystem::Metric => format!("{mm} mm"),
    }
}

pub fn dim_unit_label(system: UnitSystem) -> &'static str {
    system.label()
}

fn format_fixed(amount: Decimal, dp: u32) -> String {
    let rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", dp as usize, rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{}", group_thousands(integer))
    } else {
        format!("{sign}{}.{fraction}", group_thousands(integer))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
