use serde::Serialize;

use crate::models::{LatLng, MarkerInput};

/// Google Maps directions URLs accept at most 8 waypoints beyond the
/// destination.
pub const MAX_WAYPOINTS: usize = 8;

/// Marker as handed to the frontend; defaults applied.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub address: String,
}

impl From<&MarkerInput> for Marker {
    fn from(input: &MarkerInput) -> Self {
        Marker {
            lat: input.lat,
            lng: input.lng,
            title: input.title.clone().unwrap_or_else(|| "Location".to_string()),
            address: input.address.clone().unwrap_or_default(),
        }
    }
}

/// Assembled map: shareable URL plus the full structured marker list.
#[derive(Debug, Clone, Serialize)]
pub struct MapData {
    pub center: LatLng,
    pub zoom: u32,
    pub markers: Vec<Marker>,
    pub map_url: String,
}

/// With markers this is a point-to-point directions URL: first marker as the
/// destination, up to 8 more as waypoints; markers past the ninth appear only
/// in the structured list. Without markers it is a plain search URL at the
/// center.
pub fn build_map_url(
    center_lat: f64,
    center_lng: f64,
    zoom: u32,
    markers: &[MarkerInput],
) -> String {
    if let Some(first) = markers.first() {
        let mut url = format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            first.lat, first.lng
        );
        let waypoints: Vec<String> = markers
            .iter()
            .skip(1)
            .take(MAX_WAYPOINTS)
            .map(|m| format!("{},{}", m.lat, m.lng))
            .collect();
        if !waypoints.is_empty() {
            url.push_str("&waypoints=");
            url.push_str(&waypoints.join("|"));
        }
        url.push_str("&travelmode=driving");
        url
    } else {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}&zoom={}",
            center_lat, center_lng, zoom
        )
    }
}

pub fn build_map(
    center_lat: f64,
    center_lng: f64,
    zoom: u32,
    markers: &[MarkerInput],
) -> MapData {
    MapData {
        center: LatLng {
            lat: center_lat,
            lng: center_lng,
        },
        zoom,
        markers: markers.iter().map(Marker::from).collect(),
        map_url: build_map_url(center_lat, center_lng, zoom, markers),
    }
}

/// Numbered one-line-per-marker summary for the agent response.
pub fn marker_summary(markers: &[MarkerInput]) -> Vec<String> {
    markers
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let title = m
                .title
                .clone()
                .unwrap_or_else(|| format!("Location {}", i + 1));
            format!("{}. {} ({}, {})", i + 1, title, m.lat, m.lng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(lat: f64, lng: f64) -> MarkerInput {
        MarkerInput {
            lat,
            lng,
            title: None,
            address: None,
        }
    }

    #[test]
    fn no_markers_builds_a_search_url() {
        let map = build_map(25.76, -80.19, 12, &[]);
        assert_eq!(
            map.map_url,
            "https://www.google.com/maps/search/?api=1&query=25.76,-80.19&zoom=12"
        );
        assert!(map.markers.is_empty());
    }

    #[test]
    fn single_marker_has_no_waypoints() {
        let map = build_map(25.76, -80.19, 12, &[marker(26.1, -80.2)]);
        assert_eq!(
            map.map_url,
            "https://www.google.com/maps/dir/?api=1&destination=26.1,-80.2&travelmode=driving"
        );
    }

    #[test]
    fn waypoint_url_caps_at_one_destination_plus_eight() {
        let markers: Vec<MarkerInput> = (0..11).map(|i| marker(25.0 + i as f64, -80.0)).collect();
        let map = build_map(25.76, -80.19, 12, &markers);

        assert_eq!(map.markers.len(), 11);

        assert!(map.map_url.contains("destination=25,-80"));
        let waypoints = map
            .map_url
            .split("waypoints=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap();
        let pairs: Vec<&str> = waypoints.split('|').collect();
        assert_eq!(pairs.len(), MAX_WAYPOINTS);
        assert_eq!(pairs[0], "26,-80");
        assert_eq!(pairs[7], "33,-80");
        // Markers 10 and 11 are dropped from the URL only.
        assert!(!waypoints.contains("34,-80"));
        assert!(!waypoints.contains("35,-80"));
    }

    #[test]
    fn structured_markers_apply_defaults() {
        let input = MarkerInput {
            lat: 25.0,
            lng: -80.0,
            title: None,
            address: None,
        };
        let m = Marker::from(&input);
        assert_eq!(m.title, "Location");
        assert_eq!(m.address, "");
    }

    #[test]
    fn summary_numbers_markers_from_one() {
        let markers = vec![
            MarkerInput {
                lat: 25.0,
                lng: -80.0,
                title: Some("Shelter A".to_string()),
                address: None,
            },
            marker(26.0, -81.0),
        ];
        let summary = marker_summary(&markers);
        assert_eq!(summary[0], "1. Shelter A (25, -80)");
        assert_eq!(summary[1], "2. Location 2 (26, -81)");
    }
}
