pub mod route_states;
pub mod state_updater;
