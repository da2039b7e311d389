// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User preference models.
//!
//! Interest and occupation categories are closed enums: free-text values
//! from imported data that don't name a known category deserialize to the
//! "no match" branch (dropped / `None`) rather than failing.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event format the user wants to attend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFormat {
    #[serde(rename = "in-person")]
    InPerson,
    #[serde(rename = "virtual")]
    Virtual,
    #[serde(rename = "both")]
    Both,
}

impl FromStr for EventFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in-person" => Ok(EventFormat::InPerson),
            "virtual" => Ok(EventFormat::Virtual),
            "both" => Ok(EventFormat::Both),
            _ => Err(()),
        }
    }
}

/// Interest categories with fixed keyword sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interest {
    Tech,
    Business,
    Arts,
    Networking,
    Education,
    Health,
}

impl Interest {
    pub const ALL: [Interest; 6] = [
        Interest::Tech,
        Interest::Business,
        Interest::Arts,
        Interest::Networking,
        Interest::Education,
        Interest::Health,
    ];
}

impl fmt::Display for Interest {
    /// Capitalized label, as shown on match reason chips.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Interest::Tech => "Tech",
            Interest::Business => "Business",
            Interest::Arts => "Arts",
            Interest::Networking => "Networking",
            Interest::Education => "Education",
            Interest::Health => "Health",
        };
        f.write_str(label)
    }
}

impl FromStr for Interest {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tech" => Ok(Interest::Tech),
            "business" => Ok(Interest::Business),
            "arts" => Ok(Interest::Arts),
            "networking" => Ok(Interest::Networking),
            "education" => Ok(Interest::Education),
            "health" => Ok(Interest::Health),
            _ => Err(()),
        }
    }
}

/// Occupation categories with fixed keyword sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupation {
    Student,
    Developer,
    Designer,
    #[serde(rename = "pm")]
    ProductManager,
    Entrepreneur,
    Marketing,
}

impl FromStr for Occupation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Occupation::Student),
            "developer" => Ok(Occupation::Developer),
            "designer" => Ok(Occupation::Designer),
            "pm" => Ok(Occupation::ProductManager),
            "entrepreneur" => Ok(Occupation::Entrepreneur),
            "marketing" => Ok(Occupation::Marketing),
            _ => Err(()),
        }
    }
}

/// User-declared matching preferences.
///
/// Created or overwritten wholesale; there is no partial-field history.
/// An all-default value scores every event at zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Display name entered on the preferences form.
    #[serde(
        rename = "name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_occupation")]
    pub occupation: Option<Occupation>,
    #[serde(default, deserialize_with = "lenient_interests")]
    pub interests: Vec<Interest>,
    #[serde(default, deserialize_with = "lenient_format")]
    pub format: Option<EventFormat>,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// AI recommendation consent and connected-service flags, settable
/// independently from the matching preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPreferences {
    #[serde(default)]
    pub allow_recommendations: bool,
    #[serde(default)]
    pub connect_calendar: bool,
    #[serde(default)]
    pub connect_slack: bool,
    #[serde(default)]
    pub connect_github: bool,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// How much personal signal the enhancer may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Strict,
    #[default]
    Balanced,
    Open,
}

/// Unknown occupation strings become `None` instead of an error.
fn lenient_occupation<'de, D>(deserializer: D) -> Result<Option<Occupation>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Unknown interest strings are dropped instead of failing the document.
fn lenient_interests<'de, D>(deserializer: D) -> Result<Vec<Interest>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
}

fn lenient_format<'de, D>(deserializer: D) -> Result<Option<EventFormat>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}
