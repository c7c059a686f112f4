use std::collections::BTreeMap;

use crate::alerts::Alert;
use crate::evacuation::{EvacuationLocation, FloodEvent};
use crate::maps::MapData;
use crate::zones::ZoneCoordinate;

/// Values passed forward between pipeline phases. Every slot is
/// last-write-wins except the flood history, which appends across calls.
#[derive(Debug, Default)]
pub struct SessionState {
    pub alerts: Option<AlertsSnapshot>,
    pub zone_coordinates: Option<Vec<ZoneCoordinate>>,
    pub map_data: Option<MapData>,
    pub flood_history: FloodHistory,
    pub evacuation: Option<EvacuationSnapshot>,
}

/// Most recent alerts result, kept for downstream consumers.
#[derive(Debug, Clone)]
pub struct AlertsSnapshot {
    pub alerts: Vec<Alert>,
    pub count: usize,
    pub severity_breakdown: BTreeMap<String, u32>,
    pub timestamp: String,
    pub limited: bool,
}

/// Accumulated historical flood events, tagged by the states already
/// ingested.
#[derive(Debug, Default)]
pub struct FloodHistory {
    pub events: Vec<FloodEvent>,
    pub processed_states: Vec<String>,
}

impl FloodHistory {
    /// Appends events and records the state once, no matter how many times
    /// it is re-ingested.
    pub fn record(&mut self, state: &str, events: Vec<FloodEvent>) {
        self.events.extend(events);
        if !self.processed_states.iter().any(|s| s == state) {
            self.processed_states.push(state.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EvacuationSnapshot {
    pub locations: Vec<EvacuationLocation>,
    pub hurricane_intensity: u8,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(state: &str) -> FloodEvent {
        FloodEvent {
            date: "2024-09-26".to_string(),
            station_id: "722020".to_string(),
            station_name: None,
            latitude: 25.5,
            longitude: -80.25,
            precipitation_inches: 6.0,
            temperature_f: None,
            severity: "Moderate".to_string(),
            state: state.to_string(),
        }
    }

    #[test]
    fn flood_history_appends_across_calls() {
        let mut history = FloodHistory::default();
        assert!(history.is_empty());

        history.record("FL", vec![event("FL"), event("FL")]);
        history.record("GA", vec![event("GA")]);

        assert_eq!(history.events.len(), 3);
        assert_eq!(history.processed_states, vec!["FL", "GA"]);
    }

    #[test]
    fn processed_states_are_recorded_once() {
        let mut history = FloodHistory::default();
        history.record("FL", vec![event("FL")]);
        history.record("FL", vec![event("FL")]);

        assert_eq!(history.events.len(), 2);
        assert_eq!(history.processed_states, vec!["FL"]);
    }
}
