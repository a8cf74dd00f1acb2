//! # External Search Client
//!
//! Flight, hotel and web queries against the SerpApi provider.
//! Calls never fail past this boundary: errors come back as text.

pub mod serpapi;
pub mod types;

pub use serpapi::{parse_flights, parse_hotels, SearchClient};
pub use types::{
    FlightLeg, FlightOffer, FlightQuery, HotelListing, HotelQuery, SearchOutcome, WebResult,
};
