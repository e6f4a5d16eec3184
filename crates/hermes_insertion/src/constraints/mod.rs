pub mod activity_constraint;
pub mod constraint_manager;
pub mod constraints_status;
pub mod load_constraint;
pub mod max_waiting_constraint;
pub mod route_constraint;
pub mod skill_constraint;
pub mod time_window_constraint;
pub mod vehicle_break_constraint;
pub mod vehicle_switch_constraint;
