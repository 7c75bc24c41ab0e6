use chrono::Datelike;

use crate::services::week_selection::{SelectedRange, Week};

/// Combined preview discount never exceeds 45%.
pub const MAX_COMBINED_DISCOUNT: f64 = 0.45;

pub struct PricingService;

impl PricingService {
    /// Seasonal discount for the week's start month.
    /// July-September is high season (no discount), June and October are
    /// shoulder season, everything else is slow season.
    pub fn seasonal_discount(week: Week) -> f64 {
        match week.start().month() {
            7..=9 => 0.0,
            6 | 10 => 0.15,
            _ => 0.30,
        }
    }

    pub fn season_name(week: Week) -> &'static str {
        match Self::seasonal_discount(week) {
            d if d == 0.0 => "High Season",
            d if d == 0.15 => "Shoulder Season",
            _ => "Slow Season",
        }
    }

    /// Discount for staying longer, by number of selected weeks.
    pub fn length_discount(weeks: usize) -> f64 {
        match weeks {
            n if n >= 12 => 0.20,
            n if n >= 8 => 0.175,
            n if n >= 6 => 0.15,
            n if n >= 4 => 0.125,
            n if n >= 2 => 0.10,
            _ => 0.0,
        }
    }

    /// Weekly price for one week of a stay: the base rate plus the
    /// accommodation rate with its seasonal discount applied. Not rounded;
    /// rounding happens once, at the total.
    pub fn price_for_week(week: Week, base_rate: f64, accommodation_rate: f64) -> f64 {
        base_rate + accommodation_rate * (1.0 - Self::seasonal_discount(week))
    }

    /// Booking total over the selected weeks, rounded to whole currency
    /// units. Seasonal-only on purpose: the length discount belongs to the
    /// accommodation-card preview, not to the charged total.
    pub fn total_price(
        range: &SelectedRange,
        base_rate: f64,
        accommodation_rate: f64,
    ) -> Option<i64> {
        if range.is_empty() {
            return None;
        }
        let sum: f64 = range
            .weeks()
            .iter()
            .map(|&w| Self::price_for_week(w, base_rate, accommodation_rate))
            .sum();
        Some(sum.round() as i64)
    }

    /// Preview discount shown on accommodation cards: length discount plus
    /// the mean seasonal discount across the selection, capped.
    pub fn combined_discount(range: &SelectedRange) -> f64 {
        if range.is_empty() {
            return 0.0;
        }
        let seasonal_sum: f64 = range
            .weeks()
            .iter()
            .map(|&w| Self::seasonal_discount(w))
            .sum();
        let avg_seasonal = seasonal_sum / range.len() as f64;
        let total = Self::length_discount(range.len()) + avg_seasonal;
        total.min(MAX_COMBINED_DISCOUNT)
    }

    /// Weekly card price with the combined discount applied, rounded.
    pub fn discounted_weekly_price(weekly_price: f64, range: &SelectedRange) -> i64 {
        (weekly_price * (1.0 - Self::combined_discount(range))).round() as i64
    }
}
