pub mod configuration;
pub mod contract;
pub mod domain;
pub mod scenario;
pub mod telemetry;
pub mod users_client;
