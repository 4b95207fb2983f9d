use rust_decimal::Decimal;

use crate::domain::packaging::BagSize;
use crate::errors::QuoteError;

const MM_PER_METRE: u32 = 1_000;

/// Caller-supplied pouch dimensions in millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CustomDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub gusset: Option<u32>,
}

/// Surface area in square metres for a preset size or a custom gusseted pouch.
///
/// Custom pouches use `2·w·h + 2·g·h + w·g` with every dimension in metres; the
/// gusset defaults to zero.
pub fn resolve_surface_area(
    size: &BagSize,
    custom: CustomDimensions,
) -> Result<Decimal, QuoteError> {
    if !size.is_custom() {
        return Ok(size.surface_area);
    }

    let width = custom.width.ok_or(QuoteError::MissingCustomDimensions { missing: "width" })?;
    let height = custom.height.ok_or(QuoteError::MissingCustomDimensions { missing: "height" })?;
    if width == 0 {
        return Err(QuoteError::InvalidDimension { dimension: "width" });
    }
    if height == 0 {
        return Err(QuoteError::InvalidDimension { dimension: "height" });
    }

    let w = to_metres(width);
    let h = to_metres(height);
    let g = to_metres(custom.gusset.unwrap_or(0));

    Ok(Decimal::TWO * (w * h) + Decimal::TWO * (g * h) + w * g)
}

fn to_metres(millimetres: u32) -> Decimal {
    Decimal::from(millimetres) / Decimal::from(MM_PER_METRE)
}
