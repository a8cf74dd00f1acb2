//! Stage prompt templates, filled from the trip parameters at plan-build time.

use super::category::Category;
use crate::trip::TripParameters;

/// What a document of this category may cover, used by verification prompts.
fn allowed_scope(category: Category) -> &'static [&'static str] {
    match category {
        Category::Destination => &[
            "Attractions and points of interest",
            "Local culture and customs",
            "Neighbourhoods and areas",
            "Transportation within the destination",
            "Safety tips and local information",
        ],
        Category::Flight => &[
            "Airline details and flight numbers",
            "Departure and arrival times",
            "Prices and fees",
            "Layover information",
            "Flight amenities and policies",
        ],
        Category::Hotel => &[
            "Hotel names and ratings",
            "Room types and prices",
            "Hotel locations and amenities",
            "Guest reviews and ratings",
            "Special offers",
        ],
        Category::Itinerary => &[
            "Day-by-day schedule of activities",
            "Time-specific plans",
            "Recommended restaurants and meals",
            "Transportation between activities",
            "Estimated costs for activities",
        ],
    }
}

fn noun(category: Category) -> &'static str {
    match category {
        Category::Destination => "destination guide",
        Category::Flight => "flight",
        Category::Hotel => "hotel",
        Category::Itinerary => "itinerary",
    }
}

/// Task text and expected-output contract of the generation stage.
pub fn draft_prompt(category: Category, trip: &TripParameters) -> (String, String) {
    match category {
        Category::Destination => (
            format!(
                "Research {destination} and write a destination guide covering:\n\
                 - Top attractions and must-visit places, each with a short description\n\
                 - The best neighbourhoods to stay in, with pros and cons\n\
                 - Local culture, customs and etiquette\n\
                 - Getting around within the destination\n\
                 - Rough budget guidance for {budget} travellers\n\
                 - Seasonal considerations around {outbound} to {return_on}\n\
                 - Safety and health tips\n\
                 - Local cuisine and dishes to try\n\n\
                 Restrictions:\n\
                 - Be specific to {destination}; avoid advice that fits anywhere\n\
                 - Recommendations must suit a party of {travelers}\n\
                 - Reflect these preferences: {preferences}\n\
                 - Use well-structured Markdown with clear headings",
                destination = trip.destination(),
                budget = trip.budget(),
                outbound = trip.outbound(),
                return_on = trip.return_on(),
                travelers = trip.travelers(),
                preferences = trip.preferences(),
            ),
            "A detailed travel guide with comprehensive destination insights".to_string(),
        ),
        Category::Flight => (
            format!(
                "Find the best flights from {from} to {to} for {travelers} travellers \
                 ({adults} adults, {children} children):\n\
                 - Outbound: {outbound}\n\
                 - Return: {return_on}\n\n\
                 Weigh value rather than lowest price alone, convenient times, few layovers, \
                 total travel time, airline reputation and baggage policy.\n\n\
                 Present a Markdown table with: airline and flight numbers, departure and arrival \
                 times with dates, duration including layovers, number of stops, price per person, \
                 total price for all travellers, notable features.\n\n\
                 Restrictions:\n\
                 - Between 3 and 5 options\n\
                 - Mark prices that are estimates\n\
                 - Flag red-eye departures and long layovers\n\
                 - Clearly mark the best value option and say why",
                from = trip.departure_airport(),
                to = trip.arrival_airport(),
                travelers = trip.travelers(),
                adults = trip.adults(),
                children = trip.children(),
                outbound = trip.outbound(),
                return_on = trip.return_on(),
            ),
            "A comprehensive list of the best flight options with pricing and details".to_string(),
        ),
        Category::Hotel => (
            format!(
                "Find the best hotels in {city}:\n\
                 - Check-in: {outbound}\n\
                 - Check-out: {return_on}\n\
                 - Rooms: {rooms}\n\
                 - Adults: {adults}\n\
                 - Children: {children}\n\
                 - Hotel class: {class} stars\n\
                 - Budget level: {budget}\n\
                 - Special requirements: {requirements}\n\n\
                 For each hotel give the name and star rating, what makes it stand out, location and \
                 nearby sights, suitable room types, key amenities, price range, a guest rating \
                 summary, and pros and cons from recent reviews.\n\n\
                 Restrictions:\n\
                 - Exactly 5 hotels across different neighbourhoods or styles\n\
                 - Every hotel must fit the party and the budget level\n\
                 - At least one option addresses the special requirements\n\
                 - Clearly mark the best overall value",
                city = trip.hotel_city(),
                outbound = trip.outbound(),
                return_on = trip.return_on(),
                rooms = trip.rooms(),
                adults = trip.adults(),
                children = trip.children(),
                class = trip.hotel_class(),
                budget = trip.budget(),
                requirements = trip.special_requirements(),
            ),
            "Top 5 hotel recommendations with detailed descriptions".to_string(),
        ),
        Category::Itinerary => (
            format!(
                "Create a detailed {days}-day itinerary for {destination}:\n\
                 - Preferences: {preferences}\n\
                 - Budget level: {budget}\n\
                 - Dates: {outbound} to {return_on}\n\
                 - Travellers: {adults} adults and {children} children\n\
                 - Special requirements: {requirements}\n\n\
                 Include a day-by-day breakdown with times, named attractions, estimated costs, \
                 transport between stops, a restaurant for each meal, bad-weather alternatives, \
                 and rest periods.\n\n\
                 Restrictions:\n\
                 - Exactly {days} days, each under its own heading \"## Day N\"\n\
                 - Keep the pace suitable for children when they travel\n\
                 - Address every preference at least once a day\n\
                 - Leave realistic travel time between locations",
                days = trip.trip_days(),
                destination = trip.destination(),
                preferences = trip.preferences(),
                budget = trip.budget(),
                outbound = trip.outbound(),
                return_on = trip.return_on(),
                adults = trip.adults(),
                children = trip.children(),
                requirements = trip.special_requirements(),
            ),
            "A comprehensive day-by-day travel itinerary in Markdown".to_string(),
        ),
    }
}

/// Task text and expected-output contract of the verification stage.
///
/// The draft itself is appended by the orchestrator when the stage runs.
pub fn verify_prompt(category: Category, trip: &TripParameters) -> (String, String) {
    let checks = match category {
        Category::Destination => format!(
            "Verify the destination guide for {}. Check factual accuracy, completeness, \
             relevance to the preferences ({}), practical usefulness and formatting.",
            trip.destination(),
            trip.preferences()
        ),
        Category::Flight => format!(
            "Verify the flight options from {} to {}. Check that prices are plausible, times and \
             durations are consistent, every option is complete, the options suit {} travellers \
             and the best value option is highlighted.",
            trip.departure_airport(),
            trip.arrival_airport(),
            trip.travelers()
        ),
        Category::Hotel => format!(
            "Verify the hotel recommendations for {}. Check amenities, suitability for {} adults \
             and {} children, the {}-star standard, the {} budget level and the special \
             requirements ({}).",
            trip.hotel_city(),
            trip.adults(),
            trip.children(),
            trip.hotel_class(),
            trip.budget(),
            trip.special_requirements()
        ),
        Category::Itinerary => format!(
            "Verify the {days}-day itinerary for {}. Check realistic timing and transport, balance \
             across the preferences ({}), suitability for {} adults and {} children, the {} budget \
             level, contingency plans and the special requirements ({}). The final document must \
             contain exactly {days} days, each under its own heading \"## Day N\".",
            trip.destination(),
            trip.preferences(),
            trip.adults(),
            trip.children(),
            trip.budget(),
            trip.special_requirements(),
            days = trip.trip_days(),
        ),
    };

    let others: Vec<&str> = Category::ALL
        .into_iter()
        .filter(|c| *c != category)
        .map(noun)
        .collect();
    let scope = allowed_scope(category)
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n");

    let task = format!(
        "{checks}\n\n\
         IMPORTANT: this document must ONLY contain {own} information. It should only cover:\n\
         {scope}\n\n\
         If you find ANY {others} content, remove it. Do not move it anywhere.\n\n\
         Correct errors, fill gaps and improve the structure. Remove any Markdown code block \
         markers. Return the polished final document.",
        checks = checks,
        own = noun(category),
        scope = scope,
        others = others.join(", "),
    );
    let expected = format!(
        "A verified and enhanced {} with ONLY {} information",
        category.title().to_lowercase(),
        noun(category)
    );
    (task, expected)
}

/// Append the draft under review to a verification task.
pub fn with_draft(task: &str, draft: &str) -> String {
    format!(
        "{}\n\n## Draft to verify\n\n<draft>\n{}\n</draft>",
        task.trim_end(),
        draft.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::TripRequest;

    fn bangkok() -> TripParameters {
        TripRequest {
            outbound_date: "2025-03-01".to_string(),
            return_date: "2025-03-08".to_string(),
            ..TripRequest::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_itinerary_prompts_carry_day_count() {
        let trip = bangkok();
        let (draft, _) = draft_prompt(Category::Itinerary, &trip);
        let (verify, _) = verify_prompt(Category::Itinerary, &trip);
        assert!(draft.contains("7-day itinerary for Bangkok, Thailand"));
        assert!(verify.contains("Verify the 7-day itinerary"));
        assert!(verify.contains("exactly 7 days"));
    }

    #[test]
    fn test_verify_prompt_names_foreign_categories() {
        let (task, expected) = verify_prompt(Category::Flight, &bangkok());
        assert!(task.contains("ONLY contain flight information"));
        assert!(task.contains("destination guide, hotel, itinerary"));
        assert!(expected.contains("ONLY flight information"));
    }

    #[test]
    fn test_flight_prompt_uses_airports_and_party() {
        let (task, _) = draft_prompt(Category::Flight, &bangkok());
        assert!(task.contains("from HYD to BKK for 3 travellers"));
    }

    #[test]
    fn test_with_draft_embeds_text() {
        let rendered = with_draft("Verify it.", "  # Hotels\n");
        assert!(rendered.ends_with("<draft>\n# Hotels\n</draft>"));
    }
}
