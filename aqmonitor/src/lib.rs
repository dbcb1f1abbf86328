//! Air-quality snapshot service.
//!
//! Polls an AirVisual-style provider for a fixed location on a timer, keeps
//! the US AQI of every reading in Postgres, and serves two read endpoints:
//! the current reading for any coordinate and the worst recorded moment.

pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod metrics;
pub mod model;
pub mod rest;
pub mod scheduler;
pub mod service;
