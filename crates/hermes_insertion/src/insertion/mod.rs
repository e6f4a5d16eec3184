pub mod access_egress;
pub mod activity_insertion_costs;
pub mod auxiliary_path_cost;
pub mod break_insertion;
pub mod calculator_builder;
pub mod calculator_switcher;
pub mod fix_costs;
pub mod insertion_context;
pub mod insertion_data;
pub mod job_insertion_calculator;
pub mod penalty_vehicle;
pub mod route_level_insertion;
pub mod service_insertion;
pub mod shipment_insertion;
pub mod vehicle_type_dependent;
