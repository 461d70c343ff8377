// Price planning and order execution
pub mod executor;
pub mod planner;

pub use executor::OrderExecutor;
pub use planner::{plan, PricePlanner};
