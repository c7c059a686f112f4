use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// National Weather Service API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AlertResponse {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    pub properties: AlertProperties,
}

/// Raw alert properties as returned by `/alerts/active`. Severity stays a
/// plain string here; bucketing happens in the alerts module.
#[derive(Debug, Deserialize)]
pub struct AlertProperties {
    pub event: Option<String>,
    pub severity: Option<String>,
    pub urgency: Option<String>,
    pub certainty: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub onset: Option<String>,
    pub expires: Option<String>,
    #[serde(rename = "affectedZones", default)]
    pub affected_zones: Vec<String>,
    #[serde(rename = "senderName")]
    pub sender_name: Option<String>,
}

/// Zone lookup response from `/zones/{type}/{id}`.
#[derive(Debug, Deserialize)]
pub struct ZoneResponse {
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: ZoneProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct ZoneProperties {
    pub name: Option<String>,
}

/// GeoJSON geometry, restricted to the variants the zone endpoints return.
/// Positions are kept as raw coordinate arrays ([lon, lat, ...]).
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

#[derive(Debug, Deserialize)]
pub struct PointsResponse {
    pub properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
pub struct PointsProperties {
    pub forecast: String,
    #[serde(rename = "forecastHourly")]
    pub forecast_hourly: String,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct ForecastProperties {
    pub periods: Vec<ForecastPeriod>,
    pub updated: Option<String>,
    #[serde(rename = "updateTime")]
    pub update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastPeriod {
    pub name: Option<String>,
    pub temperature: Option<f64>,
    #[serde(rename = "temperatureUnit")]
    pub temperature_unit: Option<String>,
    #[serde(rename = "windSpeed")]
    pub wind_speed: Option<String>,
    #[serde(rename = "windDirection")]
    pub wind_direction: Option<String>,
    #[serde(rename = "shortForecast")]
    pub short_forecast: Option<String>,
    #[serde(rename = "detailedForecast")]
    pub detailed_forecast: Option<String>,
    #[serde(rename = "probabilityOfPrecipitation", default)]
    pub probability_of_precipitation: QuantitativeValue,
}

/// NWS unit-bearing measurement; the value is null when the sensor has no
/// reading.
#[derive(Debug, Default, Deserialize)]
pub struct QuantitativeValue {
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationResponse {
    pub properties: ObservationProperties,
}

#[derive(Debug, Deserialize)]
pub struct ObservationProperties {
    pub timestamp: Option<String>,
    #[serde(default)]
    pub temperature: QuantitativeValue,
    #[serde(default)]
    pub dewpoint: QuantitativeValue,
    #[serde(rename = "relativeHumidity", default)]
    pub relative_humidity: QuantitativeValue,
    #[serde(rename = "windSpeed", default)]
    pub wind_speed: QuantitativeValue,
    #[serde(rename = "windDirection", default)]
    pub wind_direction: QuantitativeValue,
    #[serde(rename = "barometricPressure", default)]
    pub barometric_pressure: QuantitativeValue,
    #[serde(default)]
    pub visibility: QuantitativeValue,
    #[serde(rename = "textDescription")]
    pub text_description: Option<String>,
    #[serde(rename = "rawMessage")]
    pub raw_message: Option<String>,
}

// ============================================================================
// Google Maps API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: PlaceGeometry,
    pub place_id: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceGeometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct PlacesResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
pub struct Place {
    pub name: Option<String>,
    pub vicinity: Option<String>,
    pub geometry: PlaceGeometry,
    pub place_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Deserialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
pub struct Route {
    pub summary: Option<String>,
    pub legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
pub struct Leg {
    pub distance: TextValue,
    pub duration: TextValue,
    pub start_address: String,
    pub end_address: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub html_instructions: String,
    pub distance: TextValue,
    pub duration: TextValue,
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: i64,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetAlertsRequest {
    /// Two-letter state code (e.g. "FL"); ignored when coordinates are given
    pub state: Option<String>,
    /// Latitude for point-scoped alerts
    pub latitude: Option<f64>,
    /// Longitude for point-scoped alerts
    pub longitude: Option<f64>,
    /// Exact severity to keep: "Extreme", "Severe", "Moderate" or "Minor"
    pub severity: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetZoneCoordinatesRequest {
    /// NWS zone IDs (e.g. "FLZ069", "FLC073") or zone URLs from an alert's
    /// affected zones
    pub zone_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct MarkerInput {
    pub lat: f64,
    pub lng: f64,
    pub title: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GenerateMapRequest {
    pub center_lat: f64,
    pub center_lng: f64,
    /// Zoom level 1-20, default 12
    pub zoom: Option<u32>,
    pub markers: Option<Vec<MarkerInput>>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FloodEventInput {
    /// Observation date, YYYY-MM-DD
    pub date: String,
    pub station_id: String,
    pub station_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub precipitation_inches: f64,
    pub temperature_f: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RecordFloodHistoryRequest {
    /// Two-letter state code the events belong to
    pub state: String,
    pub events: Vec<FloodEventInput>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CalculateEvacuationPriorityRequest {
    /// Hurricane category, 1-5
    pub hurricane_intensity: u8,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetForecastRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// "7day" (default) or "hourly"
    pub period: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetCurrentConditionsRequest {
    /// NWS station ID (e.g. "KMIA")
    pub station_id: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GeocodeAddressRequest {
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetDirectionsRequest {
    /// Address or "lat,lng"
    pub origin: String,
    /// Address or "lat,lng"
    pub destination: String,
    /// "driving" (default), "walking", "bicycling" or "transit"
    pub mode: Option<String>,
    pub alternatives: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchNearbyPlacesRequest {
    /// Center point as "lat,lng"
    pub location: String,
    /// Place type (e.g. "hospital", "shelter", "pharmacy")
    pub place_type: String,
    /// Search radius in meters, default 5000
    pub radius: Option<u32>,
    pub keyword: Option<String>,
}
