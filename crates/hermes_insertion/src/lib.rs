pub mod constraints;
pub mod error;
pub mod fleet_manager;
pub mod insertion;
pub mod params;
pub mod problem;
pub mod recreate;
pub mod solution;
pub mod state;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
