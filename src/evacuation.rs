use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::FloodEventInput;

/// How many locations a priority response carries; the true unique total is
/// still reported.
pub const TOP_LOCATIONS: usize = 20;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Historical high-precipitation event, accumulated in session state across
/// calls.
#[derive(Debug, Clone, Serialize)]
pub struct FloodEvent {
    pub date: String,
    pub station_id: String,
    pub station_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub precipitation_inches: f64,
    pub temperature_f: Option<f64>,
    pub severity: String,
    pub state: String,
}

impl FloodEvent {
    /// Tags the event with its state and derives a severity label from the
    /// precipitation total.
    pub fn from_input(input: FloodEventInput, state: &str) -> Self {
        let severity = if input.precipitation_inches > 10.0 {
            "Major"
        } else {
            "Moderate"
        };
        FloodEvent {
            date: input.date,
            station_id: input.station_id,
            station_name: input.station_name,
            latitude: input.latitude,
            longitude: input.longitude,
            precipitation_inches: round2(input.precipitation_inches),
            temperature_f: input.temperature_f.map(round1),
            severity: severity.to_string(),
            state: state.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationDetails {
    pub state: String,
    pub station_name: Option<String>,
    pub historical_precipitation_inches: f64,
    pub last_event_date: String,
}

/// A unique high-risk location, keyed by the display form of its
/// coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct EvacuationLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub risk_score: f64,
    pub details: LocationDetails,
}

/// Risk score for one event: historical precipitation weighted 60%, current
/// hurricane intensity 40%, scaled to a nominal 0-10 range. Extreme
/// precipitation can push past 10; scores are not clamped.
pub fn risk_score(precipitation_inches: f64, hurricane_intensity: u8) -> f64 {
    let flood_score = (precipitation_inches / 10.0) * 0.6;
    let hurricane_score = (f64::from(hurricane_intensity) / 5.0) * 0.4;
    (flood_score + hurricane_score) * 10.0
}

/// Scores every event, keeps those above 5, deduplicates by the "lat,lng"
/// display string (the stored score is replaced only when strictly beaten,
/// so ties keep the first-seen event), and sorts descending by risk.
pub fn prioritize(events: &[FloodEvent], hurricane_intensity: u8) -> Vec<EvacuationLocation> {
    let mut locations: Vec<EvacuationLocation> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for event in events {
        let score = risk_score(event.precipitation_inches, hurricane_intensity);
        if score <= 5.0 {
            continue;
        }

        let key = format!("{},{}", event.latitude, event.longitude);
        let location = EvacuationLocation {
            latitude: event.latitude,
            longitude: event.longitude,
            risk_score: round2(score),
            details: LocationDetails {
                state: event.state.clone(),
                station_name: event.station_name.clone(),
                historical_precipitation_inches: event.precipitation_inches,
                last_event_date: event.date.clone(),
            },
        };

        match index_by_key.get(&key) {
            Some(&i) => {
                if locations[i].risk_score < score {
                    locations[i] = location;
                }
            }
            None => {
                index_by_key.insert(key, locations.len());
                locations.push(location);
            }
        }
    }

    // Stable sort: equal scores stay in first-seen order.
    locations.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    locations
}

/// Per-state counts over the returned slice, for logging and the response.
pub fn state_distribution(locations: &[EvacuationLocation]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for location in locations {
        *counts.entry(location.details.state.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(lat: f64, lng: f64, precipitation: f64) -> FloodEvent {
        FloodEvent {
            date: "2024-09-26".to_string(),
            station_id: "722020".to_string(),
            station_name: Some("MIAMI INTL".to_string()),
            latitude: lat,
            longitude: lng,
            precipitation_inches: precipitation,
            temperature_f: Some(78.0),
            severity: "Moderate".to_string(),
            state: "FL".to_string(),
        }
    }

    #[test]
    fn risk_score_weights_precipitation_and_intensity() {
        // (5/10 * 0.6 + 5/5 * 0.4) * 10 = 7.0
        assert!((risk_score(5.0, 5) - 7.0).abs() < 1e-9);
        // (10/10 * 0.6 + 5/5 * 0.4) * 10 = 10.0
        assert!((risk_score(10.0, 5) - 10.0).abs() < 1e-9);
        // Scores above the nominal range are preserved, not clamped.
        assert!(risk_score(25.0, 5) > 10.0);
    }

    #[test]
    fn events_at_or_below_threshold_are_dropped() {
        // Category 1: 0.6 * 7 + 0.8 = 5.0, not strictly above 5.
        let kept = prioritize(&[event(25.0, -80.0, 7.0)], 1);
        assert!(kept.is_empty());

        let kept = prioritize(&[event(25.0, -80.0, 7.5)], 1);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn duplicate_coordinates_keep_highest_score() {
        let events = vec![
            event(25.5, -80.25, 5.0), // risk 7.0 at category 5
            event(25.5, -80.25, 7.5), // risk 8.5
        ];
        let locations = prioritize(&events, 5);

        assert_eq!(locations.len(), 1);
        assert!((locations[0].risk_score - 8.5).abs() < 1e-9);
        assert!(
            (locations[0].details.historical_precipitation_inches - 7.5).abs() < 1e-9
        );
    }

    #[test]
    fn equal_scores_keep_first_seen_entry() {
        let mut first = event(25.5, -80.25, 5.0);
        first.date = "2023-01-01".to_string();
        let mut second = event(25.5, -80.25, 5.0);
        second.date = "2024-01-01".to_string();

        let locations = prioritize(&[first, second], 5);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].details.last_event_date, "2023-01-01");
    }

    #[test]
    fn distinct_coordinates_stay_separate() {
        let events = vec![
            event(25.5, -80.25, 6.0),
            event(25.5, -80.26, 6.0),
            event(26.5, -80.25, 8.0),
        ];
        let locations = prioritize(&events, 5);

        assert_eq!(locations.len(), 3);
        // Sorted descending by risk.
        assert!((locations[0].risk_score - 8.8).abs() < 1e-9);
        assert!(locations[0].risk_score >= locations[1].risk_score);
        assert!(locations[1].risk_score >= locations[2].risk_score);
    }

    #[test]
    fn state_distribution_counts_per_state() {
        let mut fl = event(25.5, -80.25, 8.0);
        fl.state = "FL".to_string();
        let mut ga = event(32.0, -81.1, 9.0);
        ga.state = "GA".to_string();
        let mut ga2 = event(31.0, -81.5, 7.0);
        ga2.state = "GA".to_string();

        let locations = prioritize(&[fl, ga, ga2], 5);
        let counts = state_distribution(&locations);
        assert_eq!(counts["FL"], 1);
        assert_eq!(counts["GA"], 2);
    }

    #[test]
    fn flood_event_derives_severity_and_rounds() {
        let input = FloodEventInput {
            date: "2024-09-26".to_string(),
            station_id: "722020".to_string(),
            station_name: None,
            latitude: 25.5,
            longitude: -80.25,
            precipitation_inches: 10.456,
            temperature_f: Some(78.44),
        };
        let e = FloodEvent::from_input(input, "FL");
        assert_eq!(e.severity, "Major");
        assert!((e.precipitation_inches - 10.46).abs() < 1e-9);
        assert_eq!(e.temperature_f, Some(78.4));
        assert_eq!(e.state, "FL");

        let moderate = FloodEventInput {
            date: "2024-09-26".to_string(),
            station_id: "722020".to_string(),
            station_name: None,
            latitude: 25.5,
            longitude: -80.25,
            precipitation_inches: 6.0,
            temperature_f: None,
        };
        assert_eq!(FloodEvent::from_input(moderate, "FL").severity, "Moderate");
    }
}
