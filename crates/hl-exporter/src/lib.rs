//! hl-exporter: Prometheus exporter for Hyperliquid validators.
//!
//! A background monitor polls the Hyperliquid `info` API for validator
//! summaries every few minutes, folds them into stake aggregates, and
//! publishes per-validator and aggregate gauges through a [`MetricsSink`].
//! The binary serves the resulting registry on `/metrics`.
//!
//! # Modules
//!
//! - [`config`]: [`ExporterConfig`] and [`Network`] loaded from the environment
//! - [`client`]: HTTP client for the `validatorSummaries` request
//! - [`validator`]: decoded [`ValidatorSummary`] records and [`AggregateStats`]
//! - [`monitor`]: the poll/aggregate/publish cycle and its scheduler
//! - [`metrics`]: the [`MetricsSink`] trait and its Prometheus implementation
//! - [`routes`] / [`state`]: HTTP endpoints for scraping and health checks

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod routes;
pub mod security;
pub mod state;
pub mod validator;

pub use client::ValidatorApiClient;
pub use config::{ConfigError, ExporterConfig, Network};
pub use error::{MonitorError, TransportError};
pub use metrics::{MetricsSink, PrometheusSink};
pub use monitor::{update_validator_metrics, ValidatorMonitor};
pub use validator::{AggregateStats, ValidatorSummary};
