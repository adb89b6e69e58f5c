pub mod chart;
pub mod config;
pub mod observability;
pub mod pricefeed;
pub mod schedule;
pub mod stats;
pub mod types;
