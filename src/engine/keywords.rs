// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed keyword tables for interest and occupation matching.
//!
//! The category set is closed: both enums cover every supported category,
//! so an unknown free-text value never reaches a lookup here (it parses to
//! the no-match branch upstream).

use crate::models::{Interest, Occupation};

/// Keywords whose presence in an event's searchable text marks the
/// interest as matched.
pub fn interest_keywords(interest: Interest) -> &'static [&'static str] {
    match interest {
        Interest::Tech => &[
            "tech",
            "software",
            "developer",
            "innovation",
            "code",
            "programming",
            "ai",
            "data",
            "hackathon",
        ],
        Interest::Business => &[
            "business",
            "entrepreneur",
            "startup",
            "investor",
            "venture",
            "growth",
            "founder",
        ],
        Interest::Arts => &[
            "art",
            "design",
            "creative",
            "culture",
            "music",
            "gallery",
            "exhibition",
        ],
        Interest::Networking => &[
            "network",
            "connect",
            "meetup",
            "social",
            "community",
            "mixer",
        ],
        Interest::Education => &[
            "learn",
            "workshop",
            "course",
            "training",
            "seminar",
            "tutorial",
            "bootcamp",
        ],
        Interest::Health => &[
            "health",
            "wellness",
            "fitness",
            "mindfulness",
            "yoga",
            "meditation",
            "wellbeing",
        ],
    }
}

/// Keywords marking an event as relevant to an occupation. Binary: one hit
/// earns the full occupation weight.
pub fn occupation_keywords(occupation: Occupation) -> &'static [&'static str] {
    match occupation {
        Occupation::Student => &[
            "student",
            "university",
            "college",
            "academic",
            "education",
            "campus",
        ],
        Occupation::Developer => &[
            "developer",
            "software",
            "code",
            "programming",
            "tech",
            "engineer",
            "hackathon",
        ],
        Occupation::Designer => &[
            "design", "creative", "ux", "ui", "graphic", "visual", "art",
        ],
        Occupation::ProductManager => &[
            "product",
            "manager",
            "management",
            "strategy",
            "leadership",
            "agile",
        ],
        Occupation::Entrepreneur => &[
            "entrepreneur",
            "startup",
            "founder",
            "business",
            "venture",
            "pitch",
        ],
        Occupation::Marketing => &[
            "marketing",
            "growth",
            "brand",
            "social",
            "content",
            "digital",
            "seo",
        ],
    }
}

/// Case-insensitive substring test over pre-lowercased text.
pub fn any_keyword_matches(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}
