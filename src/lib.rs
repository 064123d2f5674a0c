// Broker snapshot service: live entity metrics + queue depth + persisted baseline.

pub mod aggregator;
pub mod broker;
pub mod config;
pub mod entities_repo;
pub mod error;
pub mod metrics;
pub mod models;
pub mod persister;
pub mod routes;
pub mod service;
pub mod version;
