//! Deal grading: property classification, benchmark selection and the
//! weighted seven-factor scorecard.

pub mod benchmarks;
pub mod classification;
pub mod evaluation;
pub mod scorecard;

use rust_decimal::Decimal;

/// A descending staircase of `(threshold, points)` bands with a floor.
///
/// Every breakpoint table in this module is expressed as one of these so
/// the magic numbers live in a single, auditable place.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Staircase {
    pub bands: &'static [(Decimal, u32)],
    pub floor: u32,
}

impl Staircase {
    /// Points for the first band whose threshold `value` reaches (`>=`).
    pub fn at_least(&self, value: Decimal) -> u32 {
        self.bands
            .iter()
            .find(|(threshold, _)| value >= *threshold)
            .map_or(self.floor, |(_, points)| *points)
    }

    /// Points for the first band whose threshold `value` stays under (`<=`).
    pub fn at_most(&self, value: Decimal) -> u32 {
        self.bands
            .iter()
            .find(|(threshold, _)| value <= *threshold)
            .map_or(self.floor, |(_, points)| *points)
    }
}
