//! SerpApi-backed implementation of the search client.
//!
//! Single attempt per call, no retries, no state beyond the HTTP client.
//! Every failure is folded into [`SearchOutcome::Error`].

use super::types::{FlightOffer, FlightQuery, HotelListing, HotelQuery, SearchOutcome, WebResult};
use crate::config::SearchConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Thin request/response mapper around the SerpApi search endpoint.
#[derive(Debug, Clone)]
pub struct SearchClient {
    config: SearchConfig,
    http: Result<reqwest::Client, String>,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent("wayfarer/0.1")
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e));
        Self { config, http }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Round-trip flight options (`best_flights`).
    #[tracing::instrument(skip(self), fields(route = %format!("{}-{}", query.departure_airport, query.arrival_airport)))]
    pub async fn find_flights(&self, query: &FlightQuery) -> SearchOutcome<FlightOffer> {
        let params = vec![
            ("engine", "google_flights".to_string()),
            ("departure_id", query.departure_airport.clone()),
            ("arrival_id", query.arrival_airport.clone()),
            ("outbound_date", query.outbound_date.clone()),
            ("return_date", query.return_date.clone()),
            ("adults", query.adults.to_string()),
            ("children", query.children.to_string()),
            ("infants_in_seat", query.infants_in_seat.to_string()),
            ("infants_on_lap", query.infants_on_lap.to_string()),
            ("stops", query.stops.to_string()),
        ];
        match self.fetch(params).await {
            Ok(body) => parse_flights(&body),
            Err(e) => SearchOutcome::Error(e),
        }
    }

    /// Hotel listings (`properties`).
    #[tracing::instrument(skip(self), fields(location = %query.location))]
    pub async fn find_hotels(&self, query: &HotelQuery) -> SearchOutcome<HotelListing> {
        let params = vec![
            ("engine", "google_hotels".to_string()),
            ("q", query.location.clone()),
            ("check_in_date", query.check_in_date.clone()),
            ("check_out_date", query.check_out_date.clone()),
            ("adults", query.adults.to_string()),
            ("children", query.children.to_string()),
            ("bedrooms", query.rooms.to_string()),
            ("rating", query.min_rating.to_string()),
            ("hotel_class", query.hotel_class.clone()),
        ];
        match self.fetch(params).await {
            Ok(body) => parse_hotels(&body),
            Err(e) => SearchOutcome::Error(e),
        }
    }

    /// General web search (`organic_results`) for destination research.
    #[tracing::instrument(skip(self))]
    pub async fn search_web(&self, query: &str, max_results: usize) -> SearchOutcome<WebResult> {
        let params = vec![
            ("engine", "google".to_string()),
            ("q", query.to_string()),
            ("num", max_results.to_string()),
        ];
        match self.fetch(params).await {
            Ok(body) => match parse_list::<WebResult>(&body, "organic_results") {
                SearchOutcome::Results(mut items) => {
                    items.truncate(max_results);
                    SearchOutcome::Results(items)
                }
                err => err,
            },
            Err(e) => SearchOutcome::Error(e),
        }
    }

    async fn fetch(&self, mut params: Vec<(&'static str, String)>) -> Result<Value, String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "Search API key is not configured".to_string())?;
        let client = self.http.as_ref().map_err(Clone::clone)?;

        params.extend([
            ("currency", self.config.currency.clone()),
            ("hl", self.config.language.clone()),
            ("gl", self.config.country.clone()),
            ("api_key", api_key.to_string()),
        ]);

        let response = client
            .get(&self.config.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Search request failed: {}", e);
                format!("Failed to query search provider: {}", e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read search response: {}", e))?;

        // Provider errors come back as {"error": "..."} with a 4xx status.
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                if let Some(err) = body.get("error").and_then(|e| e.as_str()) {
                    tracing::warn!(%status, "Search provider returned an error: {}", err);
                    return Err(err.to_string());
                }
                if !status.is_success() {
                    return Err(format!("Search provider returned HTTP {}", status));
                }
                Ok(body)
            }
            Err(e) if status.is_success() => {
                Err(format!("Failed to parse search response: {}", e))
            }
            Err(_) => Err(format!("Search provider returned HTTP {}", status)),
        }
    }
}

/// Map a `google_flights` response body.
pub fn parse_flights(body: &Value) -> SearchOutcome<FlightOffer> {
    parse_list(body, "best_flights")
}

/// Map a `google_hotels` response body.
pub fn parse_hotels(body: &Value) -> SearchOutcome<HotelListing> {
    parse_list(body, "properties")
}

fn parse_list<T: DeserializeOwned>(body: &Value, field: &str) -> SearchOutcome<T> {
    if let Some(err) = body.get("error").and_then(|e| e.as_str()) {
        return SearchOutcome::Error(err.to_string());
    }
    let Some(list) = body.get(field) else {
        return SearchOutcome::Error(format!("Search response is missing '{}'", field));
    };
    match serde_json::from_value::<Vec<T>>(list.clone()) {
        Ok(items) => SearchOutcome::Results(items),
        Err(e) => SearchOutcome::Error(format!("Malformed '{}' in search response: {}", field, e)),
    }
}
