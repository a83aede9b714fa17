//! Entry and Franchise Models

use super::milestone::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of work an entry tracks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    #[default]
    Game,
    Book,
    Movie,
    Other,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Game => "GAME",
            MediaType::Book => "BOOK",
            MediaType::Movie => "MOVIE",
            MediaType::Other => "OTHER",
        }
    }

    /// Title of the checkbox seeded into a freshly created entry, if any
    pub fn seed_checkbox_title(&self) -> Option<&'static str> {
        match self {
            MediaType::Book => Some("Finished Reading"),
            MediaType::Movie => Some("Watched"),
            MediaType::Game | MediaType::Other => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GAME" => Ok(MediaType::Game),
            "BOOK" => Ok(MediaType::Book),
            "MOVIE" => Ok(MediaType::Movie),
            "OTHER" => Ok(MediaType::Other),
            other => Err(ValidationError::InvalidMediaType(other.to_string())),
        }
    }
}

/// A trackable unit owning one milestone forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub franchise_id: String,
    pub title: String,
    pub media_type: MediaType,
    pub is_optional: bool,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(
        franchise_id: impl Into<String>,
        title: impl Into<String>,
        media_type: MediaType,
        is_optional: bool,
        display_order: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            franchise_id: franchise_id.into(),
            title: title.into(),
            media_type,
            is_optional,
            display_order,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial entry update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_optional: Option<bool>,
}

impl EntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.media_type.is_none() && self.is_optional.is_none()
    }
}

/// A named collection of entries sharing a visual accent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Franchise {
    pub id: String,
    pub name: String,
    pub accent: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Franchise {
    /// Build a franchise with trimmed, non-empty name and accent
    pub fn new(name: &str, accent: &str) -> Result<Self, ValidationError> {
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: normalize_name(name)?,
            accent: normalize_accent(accent)?,
            created_at: now,
            modified_at: now,
        })
    }
}

pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

pub fn normalize_accent(accent: &str) -> Result<String, ValidationError> {
    let trimmed = accent.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAccent);
    }
    Ok(trimmed.to_string())
}

/// Partial franchise update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

/// Single-row user preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub include_optional_entries: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            include_optional_entries: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_round_trip_names() {
        for media in [MediaType::Game, MediaType::Book, MediaType::Movie, MediaType::Other] {
            assert_eq!(media.as_str().parse::<MediaType>().unwrap(), media);
        }
        assert!("PODCAST".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_seed_titles() {
        assert_eq!(MediaType::Book.seed_checkbox_title(), Some("Finished Reading"));
        assert_eq!(MediaType::Movie.seed_checkbox_title(), Some("Watched"));
        assert_eq!(MediaType::Game.seed_checkbox_title(), None);
    }

    #[test]
    fn test_franchise_trims_fields() {
        let franchise = Franchise::new("  Zelda ", " #22c55e ").unwrap();
        assert_eq!(franchise.name, "Zelda");
        assert_eq!(franchise.accent, "#22c55e");
        assert_eq!(Franchise::new(" ", "#fff"), Err(ValidationError::EmptyName));
        assert_eq!(Franchise::new("Zelda", ""), Err(ValidationError::EmptyAccent));
    }

    #[test]
    fn test_preferences_default_includes_optional() {
        assert!(UserPreferences::default().include_optional_entries);
    }
}
