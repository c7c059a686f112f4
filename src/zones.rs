use serde::Serialize;

use crate::models::Geometry;

/// NWS zone category, discriminated by the third character of the zone ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Forecast,
    County,
    Fire,
}

impl ZoneType {
    /// 'Z' is a forecast zone, 'C' a county, 'F' a fire weather zone
    /// (case-insensitive). Short or unrecognized IDs fall back to forecast.
    pub fn from_zone_id(zone_id: &str) -> Self {
        match zone_id.chars().nth(2).map(|c| c.to_ascii_uppercase()) {
            Some('Z') => ZoneType::Forecast,
            Some('C') => ZoneType::County,
            Some('F') => ZoneType::Fire,
            _ => ZoneType::Forecast,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            ZoneType::Forecast => "forecast",
            ZoneType::County => "county",
            ZoneType::Fire => "fire",
        }
    }
}

/// Alert payloads reference zones by URL; bare IDs pass through unchanged.
pub fn normalize_zone_id(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Lookup candidates for a zone, tried in order until one answers 200:
/// the type-specific endpoint first, then forecast and county as fallbacks.
pub fn candidate_urls(base: &str, zone_id: &str) -> [String; 3] {
    let zone_type = ZoneType::from_zone_id(zone_id);
    [
        format!("{}/zones/{}/{}", base, zone_type.path(), zone_id),
        format!("{}/zones/forecast/{}", base, zone_id),
        format!("{}/zones/county/{}", base, zone_id),
    ]
}

/// Resolved zone position used for map rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneCoordinate {
    pub zone_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: &'static str,
}

/// Unweighted vertex mean of the outer ring: for a Polygon the first ring,
/// for a MultiPolygon the first polygon's first ring. Holes, area weighting
/// and antimeridian wraparound are ignored; this is a marker-placement
/// approximation, not a geometric centroid. Returns (lat, lon).
pub fn centroid(geometry: &Geometry) -> Option<(f64, f64)> {
    let ring = match geometry {
        Geometry::Polygon { coordinates } => coordinates.first()?,
        Geometry::MultiPolygon { coordinates } => coordinates.first()?.first()?,
    };
    if ring.is_empty() {
        return None;
    }

    let mut lon_sum = 0.0;
    let mut lat_sum = 0.0;
    for vertex in ring {
        lon_sum += vertex.first()?;
        lat_sum += vertex.get(1)?;
    }
    let n = ring.len() as f64;
    Some((lat_sum / n, lon_sum / n))
}

/// Four decimal places is plenty for zone-level marker placement.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
