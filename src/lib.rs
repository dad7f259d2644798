//! Credit Eligibility Dashboard Library
//!
//! A browser dashboard in front of a remote credit-scoring service: it shows a
//! customer's profile, requests an eligibility probability, and surfaces model
//! interpretation artifacts and a drift report. All scoring lives in the
//! remote service; this crate owns the reactive orchestration between user
//! actions and page regions.
//!
//! # Modules
//!
//! - `circuit_breaker`: Circuit breaker guarding scoring-service calls.
//! - `config`: Configuration management.
//! - `engine`: Reactive binding engine (rule table, dispatch, stale-result discard).
//! - `errors`: Error types for the dashboard's HTTP surface.
//! - `handlers`: HTTP request handlers and session store.
//! - `models`: Scoring-service data models and fetch outcomes.
//! - `render`: Presentation of rule payloads as HTML fragments.
//! - `scoring_client`: Scoring-service HTTP client.
//! - `shell`: Page layout and router composition.
//! - `view_model`: Inputs, trigger counters and committed region content.

pub mod circuit_breaker;
pub mod config;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod render;
pub mod scoring_client;
pub mod shell;
pub mod view_model;
