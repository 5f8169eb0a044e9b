// Domain layer - Fleet entities and value types
pub mod alert;
pub mod analytics;
pub mod connectivity;
pub mod error;
pub mod firmware;
pub mod joints;
pub mod kpi;
pub mod maintenance;
pub mod power;
pub mod robot;
pub mod sensors;
pub mod telemetry;

#[cfg(test)]
pub mod fixtures;
