//! Library exports for resource-metrics, shared between the binary and tests.

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod plugin;
pub mod query;
pub mod routes;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
