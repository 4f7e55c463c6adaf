pub mod config;
pub mod menu;
pub mod scenarios;
pub mod server;
pub mod telemetry;
