//! AdServe - Advertisement delivery and performance-measurement engine
//!
//! This library provides the core functionality for the AdServe engine,
//! including the advertisement lifecycle state machine, placement
//! eligibility evaluation, delivery-event logging with budget
//! enforcement, daily analytics rollups and reporting.
//!
//! # Architecture
//! - `storage`: SeaORM-backed persistence (SQLite / MySQL / PostgreSQL)
//! - `analytics`: Pure daily aggregation over delivery-event windows
//! - `services`: Lifecycle, eligibility, events, campaigns, insights
//! - `config`: Configuration management
//! - `errors`: Unified error taxonomy

pub mod analytics;
pub mod cli;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
