use serde::{Deserialize, Serialize};

use super::travel_cost_matrix::Time;

/// Window for the start of an operation. Defaults to an unbounded window `[0, f64::MAX]`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: Time,
    end: Time,
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow {
            start: 0.0,
            end: f64::MAX,
        }
    }
}

impl TimeWindow {
    pub fn new(start: Time, end: Time) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn end(&self) -> Time {
        self.end
    }

    pub fn width(&self) -> Time {
        self.end - self.start
    }

    pub fn is_satisfied(&self, arrival: Time) -> bool {
        arrival <= self.end
    }
}
