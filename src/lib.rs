//! `fare-watch` library crate.
//!
//! The binary (`fares`) is a thin wrapper around this library so that:
//!
//! - the acquisition pipeline is testable against a scripted provider
//! - transport (Amadeus, S3, Telegram) stays behind small traits
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fares;
pub mod io;
pub mod notify;
pub mod report;
pub mod storage;
