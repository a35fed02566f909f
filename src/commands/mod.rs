pub mod calculate;
pub mod start;
