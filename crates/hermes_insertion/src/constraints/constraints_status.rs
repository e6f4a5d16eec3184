/// Outcome of a hard activity constraint for one insertion gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintsStatus {
    Fulfilled,
    NotFulfilled,
    /// Not fulfilled here and at every later gap of the route; the scan can stop.
    NotFulfilledBreak,
}

impl ConstraintsStatus {
    #[inline]
    pub fn is_fulfilled(self) -> bool {
        self == ConstraintsStatus::Fulfilled
    }
}
