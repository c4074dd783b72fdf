//! Typed wrappers for the card service endpoints.
//!
//! Each method is one [`CampusCardClient::call`] with the default retry
//! budget; the models mirror the service's JSON field for field.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{geometry::Marker, CampusCardClient, Result};

/// `GET /ping` response. The heartbeat ignores this body; any 2xx counts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Pong {
    pub pong: bool,
    pub timestamp: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RegisterOutcome {
    pub message: String,
    pub user_id: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UserProfile {
    pub message: String,
    pub user_id: i64,
    pub student_id: String,
    pub full_name: String,
    pub points: i64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Found,
    NotFound,
}

/// `GET /query_lost_card` response. Which optional fields are present
/// depends on the status and on how the finder chose to hand the card over.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CardQueryOutcome {
    pub status: CardStatus,
    pub message: String,
    /// `contact` (reach the finder directly) or `location` (pick up at a
    /// drop-off point). Absent when nothing matched.
    #[serde(default)]
    pub handler_type: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub location_info: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub card_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<String>,
    /// Recently found cards that matched nobody, shown as public notices.
    #[serde(default)]
    pub unmatched_cards: Vec<UnmatchedCard>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UnmatchedCard {
    pub card_id: i64,
    pub masked_info: String,
    pub found_time: String,
    #[serde(default)]
    pub found_location: Option<String>,
    pub handler_option: i64,
    pub handler_text: String,
    pub contact_info: String,
    #[serde(default)]
    pub owner_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HotLocations {
    pub locations: Vec<HotLocation>,
    #[serde(default)]
    pub statistics: Option<LocationStatistics>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HotLocation {
    pub location: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LocationStatistics {
    pub total_cards: u64,
    pub cards_with_ai_analysis: u64,
    pub ai_analysis_coverage: f64,
}

// The service answers with a bare `[]` when no cards exist at all, and
// with the full object otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HotLocationsWire {
    Data(HotLocations),
    Empty(Vec<serde_json::Value>),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearestPoint {
    pub name: String,
    pub distance: f64,
    pub coordinates: Coordinates,
}

/// One recognized location in a smart query response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LocationResult {
    pub location: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub nearest_lost_and_found: Option<NearestPoint>,
    #[serde(default)]
    pub ai_advice: Option<String>,
    /// The advice above is a quick placeholder; the full text is fetched
    /// separately through [`CampusCardClient::ai_advice`].
    #[serde(default)]
    pub ai_advice_loading: bool,
}

/// Marker overlay data accompanying a location query, ready for
/// [`crate::geometry::project`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MapData {
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub map_image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LocationQueryOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<LocationResult>,
    #[serde(default)]
    pub map_data: Option<MapData>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AiAdvice {
    pub success: bool,
    pub location: String,
    pub ai_advice: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
}

impl CampusCardClient {
    /// Liveness check.
    pub async fn ping(&self) -> Result<Pong> {
        self.get("/ping").await
    }

    pub async fn register(
        &self,
        student_id: &str,
        full_name: &str,
        password: &str,
    ) -> Result<RegisterOutcome> {
        self.post(
            "/register",
            &json!({
                "student_id": student_id,
                "full_name": full_name,
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(
        &self,
        student_id: &str,
        full_name: &str,
        password: &str,
    ) -> Result<UserProfile> {
        self.post(
            "/login",
            &json!({
                "student_id": student_id,
                "full_name": full_name,
                "password": password,
            }),
        )
        .await
    }

    /// Looks up whether a card reported lost by `student_id` has been found.
    pub async fn query_lost_card(&self, student_id: &str) -> Result<CardQueryOutcome> {
        self.get(&format!("/query_lost_card?student_id={student_id}"))
            .await
    }

    /// Ranked list of locations where cards are most often lost.
    pub async fn hot_locations(&self) -> Result<HotLocations> {
        let wire: HotLocationsWire = self.get("/hot_locations").await?;
        Ok(match wire {
            HotLocationsWire::Data(data) => data,
            HotLocationsWire::Empty(_) => HotLocations::default(),
        })
    }

    /// Free-text location query. A successful response may carry
    /// [`MapData`] for the marker overlay.
    pub async fn smart_location_query(&self, user_input: &str) -> Result<LocationQueryOutcome> {
        self.post("/smart_location_query", &json!({ "user_input": user_input }))
            .await
    }

    /// Full advice text for a location, fetched after the quick placeholder
    /// in [`LocationResult::ai_advice`].
    pub async fn ai_advice(
        &self,
        location_name: &str,
        nearest_point: &NearestPoint,
    ) -> Result<AiAdvice> {
        self.post(
            "/get_ai_advice",
            &json!({
                "location_name": location_name,
                "nearest_point": nearest_point,
            }),
        )
        .await
    }

    /// Marks a found-card record as collected. Only the record's owner may
    /// do this; the service enforces it.
    pub async fn delete_card_record(
        &self,
        card_id: i64,
        current_user_student_id: &str,
    ) -> Result<DeleteOutcome> {
        self.post(
            "/delete_card_record",
            &json!({
                "card_id": card_id,
                "current_user_student_id": current_user_student_id,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::{CardStatus, CardQueryOutcome, HotLocationsWire, LocationQueryOutcome};

    #[test]
    fn found_card_decodes_contact_branch() {
        let outcome: CardQueryOutcome = serde_json::from_str(
            r#"{
                "status": "found",
                "message": "your card has been found",
                "contact_info": "138-0000-0000",
                "handler_type": "contact",
                "owner_name": null,
                "card_id": 17,
                "student_id": "20230101"
            }"#,
        )
        .expect("must decode");

        assert_eq!(outcome.status, CardStatus::Found);
        assert_eq!(outcome.handler_type.as_deref(), Some("contact"));
        assert_eq!(outcome.card_id, Some(17));
        assert!(outcome.unmatched_cards.is_empty());
    }

    #[test]
    fn not_found_decodes_unmatched_cards() {
        let outcome: CardQueryOutcome = serde_json::from_str(
            r#"{
                "status": "not_found",
                "message": "no card matched yet",
                "unmatched_cards": [{
                    "card_id": 3,
                    "masked_info": "S** (2023****)",
                    "found_time": "2025-01-02 10:30",
                    "found_location": "second cafeteria",
                    "handler_option": 2,
                    "handler_text": "left at a drop-off point",
                    "contact_info": "pickup: west gate kiosk"
                }]
            }"#,
        )
        .expect("must decode");

        assert_eq!(outcome.status, CardStatus::NotFound);
        assert_eq!(outcome.unmatched_cards.len(), 1);
        assert_eq!(outcome.unmatched_cards[0].handler_option, 2);
    }

    #[test]
    fn hot_locations_accepts_bare_empty_array() {
        let wire: HotLocationsWire = serde_json::from_str("[]").expect("must decode");
        assert!(matches!(wire, HotLocationsWire::Empty(_)));
    }

    #[test]
    fn location_query_carries_markers_for_projection() {
        let outcome: LocationQueryOutcome = serde_json::from_str(
            r##"{
                "success": true,
                "message": "recognized 1 location",
                "results": [{
                    "location": "library",
                    "coordinates": {"x": 420.0, "y": 180.0},
                    "nearest_lost_and_found": {
                        "name": "north kiosk",
                        "distance": 37.2,
                        "coordinates": {"x": 400.0, "y": 150.0}
                    },
                    "ai_advice": "head north",
                    "ai_advice_loading": true
                }],
                "map_data": {
                    "markers": [
                        {"type": "query_location", "name": "library", "x": 420, "y": 180,
                         "color": "#000000", "shape": "square"},
                        {"type": "nearest_point", "name": "north kiosk", "x": 400, "y": 150,
                         "distance": 37.2, "color": "#dc3545", "shape": "circle"}
                    ],
                    "map_image": "campus_map.jpg"
                }
            }"##,
        )
        .expect("must decode");

        let map_data = outcome.map_data.expect("map data present");
        assert_eq!(map_data.markers.len(), 2);
        assert_eq!(map_data.markers[1].distance, Some(37.2));
        assert!(outcome.results[0].ai_advice_loading);
    }
}
