//! # Trip Parameters
//!
//! The raw intake form ([`TripRequest`]) and the validated, read-only bundle
//! ([`TripParameters`]) every stage prompt is built from.

use crate::error::TripValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Spending level the hotel and itinerary stages plan for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BudgetTier {
    Budget,
    #[default]
    #[serde(rename = "Mid-range")]
    MidRange,
    Luxury,
}

impl BudgetTier {
    pub fn label(&self) -> &'static str {
        match self {
            BudgetTier::Budget => "Budget",
            BudgetTier::MidRange => "Mid-range",
            BudgetTier::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BudgetTier {
    type Err = TripValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "budget" => Ok(BudgetTier::Budget),
            "midrange" => Ok(BudgetTier::MidRange),
            "luxury" => Ok(BudgetTier::Luxury),
            _ => Err(TripValidationError::UnknownBudgetTier(s.to_string())),
        }
    }
}

/// Unvalidated trip form as submitted by the presentation layer.
/// Omitted fields take the form defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct TripRequest {
    pub destination: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    /// YYYY-MM-DD
    pub outbound_date: String,
    /// YYYY-MM-DD
    pub return_date: String,
    pub adults: u32,
    pub children: u32,
    pub rooms: u32,
    pub hotel_city: String,
    pub hotel_class: u8,
    pub preferences: String,
    pub budget: String,
    pub special_requirements: String,
}

impl Default for TripRequest {
    fn default() -> Self {
        Self {
            destination: "Bangkok, Thailand".to_string(),
            departure_airport: "HYD".to_string(),
            arrival_airport: "BKK".to_string(),
            outbound_date: String::new(),
            return_date: String::new(),
            adults: 2,
            children: 1,
            rooms: 1,
            hotel_city: "Bangkok".to_string(),
            hotel_class: 4,
            preferences: "historical sites, local cuisine, nature, shopping".to_string(),
            budget: BudgetTier::MidRange.label().to_string(),
            special_requirements: "Child-friendly activities, Transport & Connectivity"
                .to_string(),
        }
    }
}

impl TripRequest {
    /// Validate once at intake. The result is immutable afterwards.
    pub fn validate(&self) -> Result<TripParameters, TripValidationError> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(TripValidationError::EmptyDestination);
        }
        let hotel_city = self.hotel_city.trim();
        if hotel_city.is_empty() {
            return Err(TripValidationError::EmptyHotelCity);
        }

        let departure_airport = parse_airport("departure_airport", &self.departure_airport)?;
        let arrival_airport = parse_airport("arrival_airport", &self.arrival_airport)?;
        let outbound_date = parse_date("outbound_date", &self.outbound_date)?;
        let return_date = parse_date("return_date", &self.return_date)?;

        if return_date <= outbound_date {
            return Err(TripValidationError::ReturnNotAfterOutbound {
                outbound: outbound_date.format(DATE_FORMAT).to_string(),
                return_date: return_date.format(DATE_FORMAT).to_string(),
            });
        }
        if self.adults < 1 {
            return Err(TripValidationError::NoAdults);
        }
        if self.rooms < 1 {
            return Err(TripValidationError::NoRooms);
        }
        if !(1..=5).contains(&self.hotel_class) {
            return Err(TripValidationError::HotelClassOutOfRange(self.hotel_class));
        }
        let budget = self.budget.parse::<BudgetTier>()?;

        Ok(TripParameters {
            destination: destination.to_string(),
            departure_airport,
            arrival_airport,
            outbound_date,
            return_date,
            adults: self.adults,
            children: self.children,
            rooms: self.rooms,
            hotel_city: hotel_city.to_string(),
            hotel_class: self.hotel_class,
            preferences: self.preferences.trim().to_string(),
            budget,
            special_requirements: self.special_requirements.trim().to_string(),
        })
    }
}

fn parse_airport(field: &'static str, value: &str) -> Result<String, TripValidationError> {
    let code = value.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(TripValidationError::InvalidAirportCode {
            field,
            value: value.to_string(),
        })
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, TripValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        TripValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })
}

/// Validated trip parameters. Fields are private so the bundle stays read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripParameters {
    destination: String,
    departure_airport: String,
    arrival_airport: String,
    outbound_date: NaiveDate,
    return_date: NaiveDate,
    adults: u32,
    children: u32,
    rooms: u32,
    hotel_city: String,
    hotel_class: u8,
    preferences: String,
    budget: BudgetTier,
    special_requirements: String,
}

impl TripParameters {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn departure_airport(&self) -> &str {
        &self.departure_airport
    }

    pub fn arrival_airport(&self) -> &str {
        &self.arrival_airport
    }

    pub fn outbound_date(&self) -> NaiveDate {
        self.outbound_date
    }

    pub fn return_date(&self) -> NaiveDate {
        self.return_date
    }

    pub fn outbound(&self) -> String {
        self.outbound_date.format(DATE_FORMAT).to_string()
    }

    pub fn return_on(&self) -> String {
        self.return_date.format(DATE_FORMAT).to_string()
    }

    pub fn adults(&self) -> u32 {
        self.adults
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn rooms(&self) -> u32 {
        self.rooms
    }

    pub fn hotel_city(&self) -> &str {
        &self.hotel_city
    }

    pub fn hotel_class(&self) -> u8 {
        self.hotel_class
    }

    pub fn preferences(&self) -> &str {
        &self.preferences
    }

    pub fn budget(&self) -> BudgetTier {
        self.budget
    }

    pub fn special_requirements(&self) -> &str {
        &self.special_requirements
    }

    pub fn travelers(&self) -> u32 {
        self.adults + self.children
    }

    /// Whole days between outbound and return.
    pub fn trip_days(&self) -> i64 {
        (self.return_date - self.outbound_date).num_days()
    }

    /// File name for the downloadable archive, e.g. `Bangkok_Thailand_travel_plan.zip`.
    pub fn archive_name(&self) -> String {
        let mut stem = String::with_capacity(self.destination.len());
        for c in self.destination.chars() {
            if c.is_alphanumeric() || c == '-' {
                stem.push(c);
            } else if !stem.ends_with('_') {
                stem.push('_');
            }
        }
        let stem = stem.trim_matches('_');
        let stem = if stem.is_empty() { "trip" } else { stem };
        format!("{}_travel_plan.zip", stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(outbound: &str, return_date: &str) -> TripRequest {
        TripRequest {
            outbound_date: outbound.to_string(),
            return_date: return_date.to_string(),
            ..TripRequest::default()
        }
    }

    #[test]
    fn test_validate_reference_trip() {
        let params = request("2025-03-01", "2025-03-08").validate().unwrap();
        assert_eq!(params.destination(), "Bangkok, Thailand");
        assert_eq!(params.trip_days(), 7);
        assert_eq!(params.travelers(), 3);
        assert_eq!(params.budget(), BudgetTier::MidRange);
        assert_eq!(params.outbound(), "2025-03-01");
        assert_eq!(params.return_on(), "2025-03-08");
    }

    #[test]
    fn test_return_before_outbound_rejected() {
        let err = request("2025-03-08", "2025-03-01").validate().unwrap_err();
        assert!(matches!(
            err,
            TripValidationError::ReturnNotAfterOutbound { .. }
        ));
    }

    #[test]
    fn test_same_day_return_rejected() {
        let err = request("2025-03-01", "2025-03-01").validate().unwrap_err();
        assert!(matches!(
            err,
            TripValidationError::ReturnNotAfterOutbound { .. }
        ));
    }

    #[test]
    fn test_malformed_date_rejected() {
        let err = request("03/01/2025", "2025-03-08").validate().unwrap_err();
        assert_eq!(
            err,
            TripValidationError::InvalidDate {
                field: "outbound_date",
                value: "03/01/2025".to_string()
            }
        );
    }

    #[test]
    fn test_traveler_and_class_bounds() {
        let mut req = request("2025-03-01", "2025-03-08");
        req.adults = 0;
        assert_eq!(req.validate().unwrap_err(), TripValidationError::NoAdults);

        let mut req = request("2025-03-01", "2025-03-08");
        req.rooms = 0;
        assert_eq!(req.validate().unwrap_err(), TripValidationError::NoRooms);

        let mut req = request("2025-03-01", "2025-03-08");
        req.hotel_class = 6;
        assert_eq!(
            req.validate().unwrap_err(),
            TripValidationError::HotelClassOutOfRange(6)
        );

        let mut req = request("2025-03-01", "2025-03-08");
        req.children = 0;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_airport_codes_normalized() {
        let mut req = request("2025-03-01", "2025-03-08");
        req.departure_airport = " hyd ".to_string();
        assert_eq!(req.validate().unwrap().departure_airport(), "HYD");

        req.arrival_airport = "BK1".to_string();
        assert!(matches!(
            req.validate().unwrap_err(),
            TripValidationError::InvalidAirportCode { field: "arrival_airport", .. }
        ));
    }

    #[test]
    fn test_budget_tier_parsing() {
        assert_eq!("mid-range".parse::<BudgetTier>().unwrap(), BudgetTier::MidRange);
        assert_eq!("Mid range".parse::<BudgetTier>().unwrap(), BudgetTier::MidRange);
        assert_eq!("LUXURY".parse::<BudgetTier>().unwrap(), BudgetTier::Luxury);
        assert!("cheap".parse::<BudgetTier>().is_err());
    }

    #[test]
    fn test_archive_name_is_path_safe() {
        let params = request("2025-03-01", "2025-03-08").validate().unwrap();
        assert_eq!(params.archive_name(), "Bangkok_Thailand_travel_plan.zip");
    }
}
