//! # Agent Profiles
//!
//! The five fixed agents of the travel crew. Each profile is a label
//! (role/goal/backstory) plus the tools it may call and its iteration budget.

use crate::tools::ToolKind;
use serde::{Deserialize, Serialize};

const DESTINATION_BACKSTORY: &str = include_str!("defaults/destination_specialist.md");
const FLIGHT_BACKSTORY: &str = include_str!("defaults/flight_expert.md");
const HOTEL_BACKSTORY: &str = include_str!("defaults/hotel_strategist.md");
const ITINERARY_BACKSTORY: &str = include_str!("defaults/itinerary_specialist.md");
const VERIFICATION_BACKSTORY: &str = include_str!("defaults/verification_specialist.md");

/// Which agent a stage is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    DestinationSpecialist,
    FlightExpert,
    HotelStrategist,
    ItinerarySpecialist,
    VerificationSpecialist,
}

impl AgentRole {
    pub fn all() -> [AgentRole; 5] {
        [
            AgentRole::DestinationSpecialist,
            AgentRole::FlightExpert,
            AgentRole::HotelStrategist,
            AgentRole::ItinerarySpecialist,
            AgentRole::VerificationSpecialist,
        ]
    }

    /// Build the profile with the given iteration budget.
    pub fn profile(self, max_iterations: u32) -> AgentProfile {
        let (role, goal, backstory, tools): (&str, &str, &str, &[ToolKind]) = match self {
            AgentRole::DestinationSpecialist => (
                "Travel Destination Specialist",
                "Provide comprehensive insights about the destination: where to stay, what to see, and how to get around",
                DESTINATION_BACKSTORY,
                &[ToolKind::WebSearch],
            ),
            AgentRole::FlightExpert => (
                "Flight Booking Expert",
                "Find the most suitable and cost-effective flight options",
                FLIGHT_BACKSTORY,
                &[ToolKind::FlightSearch],
            ),
            AgentRole::HotelStrategist => (
                "Hotel Booking Strategist",
                "Identify and recommend the best accommodation options for the party",
                HOTEL_BACKSTORY,
                &[ToolKind::HotelSearch],
            ),
            AgentRole::ItinerarySpecialist => (
                "Travel Itinerary Specialist",
                "Create a detailed, personalised day-by-day itinerary within the traveller's constraints",
                ITINERARY_BACKSTORY,
                &[ToolKind::WebSearch],
            ),
            AgentRole::VerificationSpecialist => (
                "Travel Content Verification Specialist",
                "Verify and improve travel documents while keeping each strictly within its own category",
                VERIFICATION_BACKSTORY,
                &[],
            ),
        };

        AgentProfile {
            role: self,
            title: role.to_string(),
            goal: goal.to_string(),
            backstory: backstory.trim().to_string(),
            tools: tools.to_vec(),
            max_iterations: max_iterations.max(1),
        }
    }
}

/// Label, allowed tools and iteration budget of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub role: AgentRole,
    pub title: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<ToolKind>,
    pub max_iterations: u32,
}

impl AgentProfile {
    pub fn uses_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}
