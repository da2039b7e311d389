// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external collaborators and business logic.

pub mod analytics;
pub mod catalog;
pub mod identity;

pub use analytics::AnalyticsSink;
pub use catalog::{CatalogLoad, CatalogService, CatalogSource};
pub use identity::{IdentityProvider, StoredIdentity};
