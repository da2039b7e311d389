// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event Matcher: swipe-to-match client for curated events
//!
//! This crate loads a catalog of events from the lu.ma scraper dataset on
//! Apify (with cached, local-file, and sample-data fallback), ranks the
//! events against user-declared preferences, and records swipe decisions
//! (pass / like / super-like) in per-user local storage while forwarding
//! outcomes to an analytics webhook.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod store;
pub mod time_utils;

pub use engine::MatchEngine;
pub use services::{AnalyticsSink, CatalogService};
pub use session::SessionController;
pub use store::UserStore;
