//! # Purity Gate
//!
//! Programmatic category check applied to every verified document before it
//! is written. The document is split into sections at Markdown headings and
//! each section is scored against keyword lexicons. A section is foreign when
//! some other category scores at least [`MIN_FOREIGN_HITS`], at least twice
//! the owning category's score, and more than every other category combined.
//! Foreign sections are dropped whole.
//!
//! Lexicons only hold terms exclusive to their category. Sights, markets and
//! food belong to both the destination guide and the itinerary, and airport
//! transfers belong to both the destination guide and the flight options, so
//! none of those words count for any category. `Day N` sections of an
//! itinerary are never dropped.
//!
//! The gate never empties a document: if every section would be removed the
//! original text is kept and the report says so.

use regex::Regex;
use serde::Serialize;

use super::category::Category;

pub const MIN_FOREIGN_HITS: usize = 3;

const DESTINATION_TERMS: &str = r"(?i)\b(?:neighbou?rhoods?|districts?|customs|etiquette|dress codes?|safety|scams?|climate|weather|rainy season|dry season|visas?|currency|exchange rates?|tipping|local language|phrases|emergency numbers?|vaccinations?|travel insurance)\b";
const FLIGHT_TERMS: &str = r"(?i)\b(?:flights?|airlines?|airways|layovers?|stopovers?|non-?stop|economy class|business class|premium economy|baggage|carry-?on|checked bags?|boarding|airfares?|fares?|round-?trip|one-?way|red-?eye|flight numbers?|carriers?|legroom|in-?flight)\b";
const HOTEL_TERMS: &str = r"(?i)\b(?:hotels?|resorts?|hostels?|check-?in|check-?out|rooms?|suites?|amenities|per night|nightly rates?|star rating|guest (?:rating|reviews?)|bedrooms?|front desk|concierge|swimming pool|breakfast included|propert(?:y|ies)|accommodations?)\b";
const ITINERARY_TERMS: &str = r"(?i)\b(?:day\s+\d+|morning|afternoon|evening|schedule|itinerary|\d{1,2}(?::\d{2})?\s?(?:am|pm)|lunch|dinner|overnight|free time|rest period|head back|then visit)\b";

fn terms(category: Category) -> &'static str {
    match category {
        Category::Destination => DESTINATION_TERMS,
        Category::Flight => FLIGHT_TERMS,
        Category::Hotel => HOTEL_TERMS,
        Category::Itinerary => ITINERARY_TERMS,
    }
}

fn is_day_heading(heading: &str) -> bool {
    let title = heading.trim_start_matches('#').trim_start();
    let mut words = title.split_whitespace();
    matches!(words.next(), Some(word) if word.eq_ignore_ascii_case("day"))
        && words
            .next()
            .map(|n| n.trim_end_matches(|c: char| !c.is_ascii_digit()))
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// A section dropped from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedSection {
    /// Heading line, or empty for the preamble
    pub heading: String,
    /// Category the section was attributed to
    pub detected: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurityReport {
    pub category: Category,
    pub cleaned: String,
    pub removed: Vec<RemovedSection>,
    /// Every section looked foreign, so the original was kept as-is.
    pub kept_original: bool,
}

impl PurityReport {
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && !self.kept_original
    }
}

/// Category classifier over Markdown sections.
pub struct PurityGate {
    lexicons: Vec<(Category, Regex)>,
}

impl Default for PurityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PurityGate {
    pub fn new() -> Self {
        let mut lexicons = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            match Regex::new(terms(category)) {
                Ok(re) => lexicons.push((category, re)),
                Err(e) => tracing::error!(
                    category = %category,
                    "Purity lexicon failed to compile, category unchecked: {}",
                    e
                ),
            }
        }
        Self { lexicons }
    }

    /// Keyword hits per category for one block of text.
    pub fn score(&self, text: &str) -> Vec<(Category, usize)> {
        self.lexicons
            .iter()
            .map(|(category, re)| (*category, re.find_iter(text).count()))
            .collect()
    }

    /// The category a section belongs to, if it is foreign to `owner`.
    pub fn foreign_category(&self, owner: Category, text: &str) -> Option<Category> {
        let scores = self.score(text);
        let own = scores
            .iter()
            .find(|(category, _)| *category == owner)
            .map(|(_, hits)| *hits)
            .unwrap_or(0);

        let total: usize = scores.iter().map(|(_, hits)| hits).sum();

        scores
            .into_iter()
            .filter(|(category, hits)| {
                *category != owner
                    && *hits >= MIN_FOREIGN_HITS
                    && *hits >= own * 2
                    && *hits * 2 > total
            })
            .max_by_key(|(_, hits)| *hits)
            .map(|(category, _)| category)
    }

    /// Drop foreign sections from a document written for `owner`.
    pub fn enforce(&self, owner: Category, text: &str) -> PurityReport {
        let mut kept = Vec::new();
        let mut removed = Vec::new();

        for section in split_sections(text) {
            if owner == Category::Itinerary && is_day_heading(section.heading) {
                kept.push(section.body);
                continue;
            }
            match self.foreign_category(owner, &section.body) {
                Some(detected) => removed.push(RemovedSection {
                    heading: section.heading.to_string(),
                    detected,
                }),
                None => kept.push(section.body),
            }
        }

        let cleaned = kept.concat().trim().to_string();
        if !removed.is_empty() && cleaned.is_empty() {
            return PurityReport {
                category: owner,
                cleaned: text.to_string(),
                removed: Vec::new(),
                kept_original: true,
            };
        }

        PurityReport {
            category: owner,
            cleaned: if removed.is_empty() {
                text.to_string()
            } else {
                cleaned
            },
            removed,
            kept_original: false,
        }
    }
}

struct Section<'a> {
    heading: &'a str,
    body: String,
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

/// Split at ATX headings. Text before the first heading is its own section.
fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections: Vec<Section<'_>> = Vec::new();
    let mut in_fence = false;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if !in_fence && is_heading(trimmed) {
            sections.push(Section {
                heading: trimmed,
                body: String::new(),
            });
        } else if sections.is_empty() {
            sections.push(Section {
                heading: "",
                body: String::new(),
            });
        }
        if let Some(current) = sections.last_mut() {
            current.body.push_str(line);
        }
    }
    sections
}
