pub mod activity;
pub mod driver;
pub mod route;
