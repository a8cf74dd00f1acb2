//! Content categories and stage identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One content isolation boundary. The declaration order is the pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Destination,
    Flight,
    Hotel,
    Itinerary,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Destination,
        Category::Flight,
        Category::Hotel,
        Category::Itinerary,
    ];

    /// Stable key used for file and archive entry names.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Destination => "destination_guide",
            Category::Flight => "flight_options",
            Category::Hotel => "hotel_recommendations",
            Category::Itinerary => "itinerary_recommendations",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Destination => "Destination Guide",
            Category::Flight => "Flight Options",
            Category::Hotel => "Hotel Recommendations",
            Category::Itinerary => "Itinerary Recommendations",
        }
    }

    pub fn final_file_name(&self) -> String {
        format!("{}.md", self.key())
    }

    pub fn draft_file_name(&self) -> String {
        format!("temp_{}.md", self.key())
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Text shown before a document has been generated.
    pub fn pending_notice(&self) -> String {
        format!("{} will be displayed here.", self.title())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Generation stage writing an unverified draft.
    Draft,
    /// Verification stage writing the final artifact.
    Verified,
}

/// `(category, kind)`: names exactly one stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId {
    pub category: Category,
    pub kind: StageKind,
}

impl StageId {
    pub fn draft(category: Category) -> Self {
        Self {
            category,
            kind: StageKind::Draft,
        }
    }

    pub fn verified(category: Category) -> Self {
        Self {
            category,
            kind: StageKind::Verified,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StageKind::Draft => "draft",
            StageKind::Verified => "verified",
        };
        write!(f, "{}:{}", self.category.key(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(Category::Flight.final_file_name(), "flight_options.md");
        assert_eq!(Category::Hotel.draft_file_name(), "temp_hotel_recommendations.md");
        assert_eq!(
            Category::Itinerary.final_file_name(),
            "itinerary_recommendations.md"
        );
    }

    #[test]
    fn test_keys_unique_and_parse_back() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
        assert_eq!(Category::from_key("weather"), None);
    }

    #[test]
    fn test_stage_id_display() {
        assert_eq!(
            StageId::verified(Category::Destination).to_string(),
            "destination_guide:verified"
        );
    }
}
