// Application layer - Simulation loops, aggregation and use cases
pub mod aggregation;
pub mod filtering;
pub mod firmware_service;
pub mod fleet_service;
pub mod polling;
pub mod session_service;
pub mod subsystems;
pub mod telemetry_source;
