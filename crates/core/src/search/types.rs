//! Query and result shapes for the search provider.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of one provider call: either the parsed list or a textual error.
///
/// The error branch is content, not a failure: callers hand it to the agent
/// as an observation and keep going.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchOutcome<T> {
    Results(Vec<T>),
    Error(String),
}

impl<T> SearchOutcome<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, SearchOutcome::Error(_))
    }

    pub fn results(&self) -> Option<&[T]> {
        match self {
            SearchOutcome::Results(items) => Some(items),
            SearchOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SearchOutcome::Results(_) => None,
            SearchOutcome::Error(msg) => Some(msg),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchOutcome<U> {
        match self {
            SearchOutcome::Results(items) => SearchOutcome::Results(items.into_iter().map(f).collect()),
            SearchOutcome::Error(msg) => SearchOutcome::Error(msg),
        }
    }
}

/// Parameters for a round-trip flight search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FlightQuery {
    /// Departure airport code (IATA)
    pub departure_airport: String,
    /// Arrival airport code (IATA)
    pub arrival_airport: String,
    /// YYYY-MM-DD
    pub outbound_date: String,
    /// YYYY-MM-DD
    pub return_date: String,
    #[serde(default = "default_one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants_in_seat: u32,
    #[serde(default)]
    pub infants_on_lap: u32,
    /// 0 = any number of stops, 1 = nonstop only, 2 = one stop or fewer, 3 = two stops or fewer
    #[serde(default)]
    pub stops: u32,
}

/// Parameters for a hotel availability search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HotelQuery {
    /// City or area to search in
    pub location: String,
    /// YYYY-MM-DD
    pub check_in_date: String,
    /// YYYY-MM-DD
    pub check_out_date: String,
    #[serde(default = "default_two")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default = "default_one")]
    pub rooms: u32,
    /// Provider rating filter (7 = 3.5+, 8 = 4.0+, 9 = 4.5+)
    #[serde(default = "default_min_rating")]
    pub min_rating: u32,
    /// Comma separated star classes, e.g. "3,4"
    #[serde(default = "default_hotel_class")]
    pub hotel_class: String,
}

fn default_one() -> u32 {
    1
}

fn default_two() -> u32 {
    2
}

fn default_min_rating() -> u32 {
    8
}

fn default_hotel_class() -> String {
    "4".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirportStop {
    pub name: String,
    pub id: String,
    pub time: String,
}

/// One flight segment of an offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightLeg {
    pub departure_airport: AirportStop,
    pub arrival_airport: AirportStop,
    /// Minutes
    pub duration: u32,
    pub airline: String,
    pub flight_number: String,
    pub airplane: String,
    pub travel_class: String,
    pub overnight: bool,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layover {
    /// Minutes
    pub duration: u32,
    pub name: String,
    pub id: String,
    pub overnight: bool,
}

/// A complete itinerary offer from the `best_flights` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightOffer {
    pub flights: Vec<FlightLeg>,
    pub layovers: Vec<Layover>,
    /// Minutes
    pub total_duration: u32,
    pub price: Option<u64>,
    #[serde(rename = "type")]
    pub trip_type: String,
}

impl FlightOffer {
    pub fn stops(&self) -> usize {
        self.flights.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rate {
    pub lowest: Option<String>,
    pub extracted_lowest: Option<f64>,
}

/// One entry of the `properties` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelListing {
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub hotel_class: Option<String>,
    pub extracted_hotel_class: Option<u8>,
    pub overall_rating: Option<f64>,
    pub reviews: Option<u64>,
    pub rate_per_night: Option<Rate>,
    pub total_rate: Option<Rate>,
    pub amenities: Vec<String>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
}

/// One organic web search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}
