use std::ops::{AddAssign, Index, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Vector = SmallVec<[f64; 2]>;

/// Multi-dimensional quantity used for job demands, vehicle capacities and loads.
/// Missing dimensions read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount(Vector);

pub type Capacity = Amount;

/// Shared zero amount for borrowed lookups that have nothing to return.
pub static EMPTY_AMOUNT: Amount = Amount::EMPTY;

impl Amount {
    pub const EMPTY: Amount = Amount(Vector::new_const());

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        let mut vec = SmallVec::with_capacity(dimensions);
        vec.resize(dimensions, 0.0);
        Amount(vec)
    }

    pub fn from_vec(vec: Vec<f64>) -> Self {
        Amount(SmallVec::from_vec(vec))
    }

    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&value| value == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn update_max(&mut self, other: &Amount) {
        let max_len = self.len().max(other.len());
        self.0.resize(max_len, 0.0);
        for i in 0..max_len {
            self.0[i] = self.0[i].max(other.get(i));
        }
    }

    pub fn max(&self, other: &Amount) -> Amount {
        let mut result = self.clone();
        result.update_max(other);
        result
    }

    pub fn added(&self, other: &Amount) -> Amount {
        let mut result = self.clone();
        result += other;
        result
    }

    pub fn negated(&self) -> Amount {
        Amount(self.0.iter().map(|&value| -value).collect())
    }

    /// Every dimension of `self` is lower or equal to the matching dimension of `capacity`.
    pub fn fits_in(&self, capacity: &Capacity) -> bool {
        let len = self.len().max(capacity.len());
        (0..len).all(|i| self.get(i) <= capacity.get(i))
    }

    /// Average over the dimensions of `self[i] / capacity[i]`, ignoring dimensions without capacity.
    pub fn ratio_to(&self, capacity: &Capacity) -> f64 {
        let len = self.len().max(capacity.len());
        let mut sum = 0.0;
        let mut dimensions = 0;
        for i in 0..len {
            let denominator = capacity.get(i);
            if denominator != 0.0 {
                sum += self.get(i) / denominator;
                dimensions += 1;
            }
        }

        if dimensions == 0 {
            0.0
        } else {
            sum / dimensions as f64
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Index<usize> for Amount {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a += b;
        }
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.len() {
            self.0.resize(rhs.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.iter()) {
            *a -= b;
        }
    }
}
