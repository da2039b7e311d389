// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event matching and ranking.

pub mod enhance;
pub mod keywords;
pub mod score;

pub use enhance::{
    EnhancementContext, NullSignals, RecommendationEnhancer, SignalProvider, SimulatedSignals,
};
pub use score::{MatchEngine, MatchWeights};
