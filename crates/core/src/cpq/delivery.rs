use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::packaging::{PrintingMethod, ProcessId};
use crate::domain::quote::DeliveryEstimate;
use crate::errors::QuoteError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub min: u32,
    pub max: u32,
}

impl DayWindow {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn extend(self, extra: DayWindow) -> Self {
        Self { min: self.min + extra.min, max: self.max + extra.max }
    }
}

/// Lead-time rules in business days.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub digital: DayWindow,
    pub flexo: DayWindow,
    pub gravure: DayWindow,
    /// Orders strictly above this quantity get `large_order_extra`.
    pub large_order_threshold: u32,
    pub large_order_extra: DayWindow,
    pub slow_finishes: Vec<ProcessId>,
    pub slow_finish_extra: DayWindow,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            digital: DayWindow::new(5, 8),
            flexo: DayWindow::new(8, 14),
            gravure: DayWindow::new(12, 18),
            large_order_threshold: 10_000,
            large_order_extra: DayWindow::new(3, 5),
            slow_finishes: vec![ProcessId::new("spot-uv")],
            slow_finish_extra: DayWindow::new(2, 3),
        }
    }
}

impl DeliveryPolicy {
    pub fn base_window(&self, method: PrintingMethod) -> DayWindow {
        match method {
            PrintingMethod::Digital => self.digital,
            PrintingMethod::Flexo => self.flexo,
            PrintingMethod::Gravure => self.gravure,
        }
    }

    pub fn window_for<'a>(
        &self,
        method: PrintingMethod,
        quantity: u32,
        processes: impl IntoIterator<Item = &'a ProcessId>,
    ) -> DayWindow {
        let mut window = self.base_window(method);
        if quantity > self.large_order_threshold {
            window = window.extend(self.large_order_extra);
        }
        if processes.into_iter().any(|process| self.slow_finishes.contains(process)) {
            window = window.extend(self.slow_finish_extra);
        }
        window
    }

    pub fn estimate(
        &self,
        window: DayWindow,
        start: NaiveDate,
    ) -> Result<DeliveryEstimate, QuoteError> {
        Ok(DeliveryEstimate {
            min_days: window.min,
            max_days: window.max,
            earliest: add_business_days(start, window.min)?,
            latest: add_business_days(start, window.max)?,
        })
    }
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Walks forward one calendar day at a time and counts only Monday to Friday.
/// The start date itself is never counted.
pub fn add_business_days(start: NaiveDate, days: u32) -> Result<NaiveDate, QuoteError> {
    let mut date = start;
    let mut counted = 0;
    while counted < days {
        date = date.checked_add_days(Days::new(1)).ok_or(QuoteError::CalendarOverflow)?;
        if is_business_day(date) {
            counted += 1;
        }
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{add_business_days, DayWindow, DeliveryPolicy};
    use crate::domain::packaging::{PrintingMethod, ProcessId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn friday_plus_one_business_day_is_monday() {
        assert_eq!(add_business_days(date(2024, 5, 3), 1).expect("date"), date(2024, 5, 6));
    }

    #[test]
    fn weekend_start_counts_from_monday() {
        // Saturday
        assert_eq!(add_business_days(date(2024, 5, 4), 1).expect("date"), date(2024, 5, 6));
        assert_eq!(add_business_days(date(2024, 5, 5), 5).expect("date"), date(2024, 5, 10));
    }

    #[test]
    fn zero_days_is_the_start_date() {
        assert_eq!(add_business_days(date(2024, 5, 4), 0).expect("date"), date(2024, 5, 4));
    }

    #[test]
    fn twelve_business_days_from_monday_spans_two_weekends() {
        assert_eq!(add_business_days(date(2024, 5, 6), 12).expect("date"), date(2024, 5, 22));
    }

    #[test]
    fn windows_follow_method_quantity_and_slow_finish() {
        let policy = DeliveryPolicy::default();
        let none: Vec<ProcessId> = Vec::new();
        let spot_uv = [ProcessId::new("spot-uv")];

        assert_eq!(policy.window_for(PrintingMethod::Digital, 500, &none), DayWindow::new(5, 8));
        assert_eq!(policy.window_for(PrintingMethod::Flexo, 10_000, &none), DayWindow::new(8, 14));
        assert_eq!(
            policy.window_for(PrintingMethod::Gravure, 10_001, &spot_uv),
            DayWindow::new(17, 26)
        );
    }

    #[test]
    fn estimate_converts_both_ends() {
        let policy = DeliveryPolicy::default();
        let estimate =
            policy.estimate(DayWindow::new(5, 8), date(2024, 5, 6)).expect("estimate");

        assert_eq!(estimate.earliest, date(2024, 5, 13));
        assert_eq!(estimate.latest, date(2024, 5, 16));
        assert_eq!((estimate.min_days, estimate.max_days), (5, 8));
    }
}
