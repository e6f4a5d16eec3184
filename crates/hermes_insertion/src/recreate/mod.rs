pub mod best_insertion;
pub mod best_insertion_concurrent;
pub mod inserter;
pub mod insertion_strategy;
pub mod listeners;
pub mod noise;
mod parallel;
pub mod recreate_context;
pub mod recreate_strategy;
pub mod regret_insertion;
pub mod regret_insertion_fast;
pub mod scoring;
