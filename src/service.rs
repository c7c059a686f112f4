use std::env;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler, tool::ToolRouter},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::alerts::{filter_and_rank, AlertScope};
use crate::constants::{DEFAULT_USER_AGENT, GOOGLE_MAPS_BASE, NWS_API_BASE, REQUEST_TIMEOUT_SECS};
use crate::evacuation::{self, FloodEvent, TOP_LOCATIONS};
use crate::maps;
use crate::models::{
    AlertResponse, CalculateEvacuationPriorityRequest, DirectionsResponse, ForecastResponse,
    GenerateMapRequest, GeocodeAddressRequest, GeocodeResponse, GetAlertsRequest,
    GetCurrentConditionsRequest, GetDirectionsRequest, GetForecastRequest,
    GetZoneCoordinatesRequest, ObservationResponse, PlacesResponse, PointsResponse,
    RecordFloodHistoryRequest, SearchNearbyPlacesRequest, ZoneResponse,
};
use crate::state::{AlertsSnapshot, EvacuationSnapshot, SessionState};
use crate::zones::{candidate_urls, centroid, normalize_zone_id, round4, ZoneCoordinate, ZoneType};

/// Wraps a JSON result envelope as MCP text content.
fn envelope(value: Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(value.to_string())])
}

/// Uniform error envelope. Tool failures never surface as protocol errors;
/// the caller always receives `{status: "error", message}`.
fn error_envelope(message: impl Into<String>) -> CallToolResult {
    envelope(json!({ "status": "error", "message": message.into() }))
}

/// Weather advisory tool service backed by the NWS and Google Maps APIs.
#[derive(Clone)]
pub struct WeatherAdvisor {
    client: Arc<Client>,
    maps_api_key: Option<String>,
    state: Arc<Mutex<SessionState>>,
    tool_router: ToolRouter<Self>,
}

impl WeatherAdvisor {
    pub fn new() -> Result<Self> {
        let user_agent =
            env::var("NWS_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let maps_api_key = env::var("GOOGLE_MAPS_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Ok(Self {
            client: Arc::new(client),
            maps_api_key,
            state: Arc::new(Mutex::new(SessionState::default())),
            tool_router: Self::tool_router(),
        })
    }

    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// GET against an NWS endpoint, deserializing the GeoJSON body.
    async fn get_nws<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/geo+json")
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("request failed with status: {}", response.status());
        }

        Ok(response.json::<T>().await?)
    }

    /// GET against a Google Maps web service endpoint.
    async fn get_google<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", GOOGLE_MAPS_BASE, path);
        let response = self.client.get(&url).query(params).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("request failed with status: {}", response.status());
        }

        Ok(response.json::<T>().await?)
    }

    /// Single zone-endpoint attempt; anything but a parseable 200 is a miss
    /// and the caller moves on to the next candidate.
    async fn try_zone(&self, url: &str) -> Option<ZoneResponse> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/geo+json")
            .send()
            .await
            .ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }
        response.json::<ZoneResponse>().await.ok()
    }
}

#[tool_handler]
impl ServerHandler for WeatherAdvisor {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "weather-advisor-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "Weather advisory tools backed by the National Weather Service and Google Maps \
                APIs: active alerts with severity ranking, zone coordinate lookup, forecasts, \
                station observations, map generation, geocoding, nearby-place search, directions, \
                and flood-history-based evacuation prioritization. Every tool returns a JSON \
                envelope with a \"status\" field of \"success\" or \"error\"."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl WeatherAdvisor {
    /// Fetches, filters and ranks active NWS alerts.
    #[tool(description = "Get active weather alerts from the National Weather Service. Scope by latitude+longitude (takes precedence), by two-letter state code, or neither for a national query. Optionally filter to one severity (Extreme, Severe, Moderate, Minor). Large result sets are ranked by severity and truncated to the 10 (or 5 for national queries) most critical alerts.")]
    async fn get_alerts(
        &self,
        Parameters(request): Parameters<GetAlertsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let scope = AlertScope::from_query(
            request.state.as_deref(),
            request.latitude,
            request.longitude,
        );
        let url = if let (Some(lat), Some(lng)) = (request.latitude, request.longitude) {
            format!("{}/alerts/active?point={},{}", NWS_API_BASE, lat, lng)
        } else if let Some(state) = request.state.as_deref() {
            format!("{}/alerts/active?area={}", NWS_API_BASE, state)
        } else {
            format!("{}/alerts/active", NWS_API_BASE)
        };
        tracing::info!("getting alerts ({:?} scope): {}", scope, url);

        let response = match self.get_nws::<AlertResponse>(&url).await {
            Ok(response) => response,
            Err(e) => return Ok(error_envelope(format!("Failed to get alerts: {}", e))),
        };

        let digest = filter_and_rank(response.features, request.severity.as_deref(), scope);
        let returned_count = digest.alerts.len();
        let timestamp = Utc::now().to_rfc3339();
        let note = digest.limited.then(|| {
            format!(
                "Showing top {} critical alerts out of {} total",
                returned_count, digest.total_count
            )
        });

        self.session().alerts = Some(AlertsSnapshot {
            alerts: digest.alerts.clone(),
            count: digest.total_count,
            severity_breakdown: digest.severity_breakdown.clone(),
            timestamp: timestamp.clone(),
            limited: digest.limited,
        });

        tracing::info!(
            "retrieved {} active alerts, returning {}",
            digest.total_count,
            returned_count
        );

        Ok(envelope(json!({
            "status": "success",
            "alerts": digest.alerts,
            "total_count": digest.total_count,
            "returned_count": returned_count,
            "severity_breakdown": digest.severity_breakdown,
            "timestamp": timestamp,
            "limited": digest.limited,
            "note": note,
        })))
    }

    /// Resolves NWS zone references to marker coordinates.
    #[tool(description = "Get geographic coordinates for NWS zone IDs (forecast zones like FLZ069, county zones like FLC073, fire weather zones) or zone URLs from an alert's affected zones. Returns the approximate center of each zone's polygon. Zones that cannot be resolved are skipped; the call fails only if none resolve.")]
    async fn get_zone_coordinates(
        &self,
        Parameters(request): Parameters<GetZoneCoordinatesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let requested = request.zone_ids.len();
        let mut coordinates: Vec<ZoneCoordinate> = Vec::new();

        for reference in &request.zone_ids {
            let zone_id = normalize_zone_id(reference);
            let zone_type = ZoneType::from_zone_id(zone_id);

            let mut zone: Option<ZoneResponse> = None;
            for url in candidate_urls(NWS_API_BASE, zone_id) {
                if let Some(found) = self.try_zone(&url).await {
                    zone = Some(found);
                    break;
                }
            }
            let Some(zone) = zone else {
                tracing::warn!("failed to look up zone {} on all endpoints", zone_id);
                continue;
            };

            match zone.geometry.as_ref().and_then(centroid) {
                Some((lat, lon)) => {
                    tracing::info!(
                        "resolved {} zone {} to ({}, {})",
                        zone_type.path(),
                        zone_id,
                        lat,
                        lon
                    );
                    coordinates.push(ZoneCoordinate {
                        zone_id: zone_id.to_string(),
                        latitude: round4(lat),
                        longitude: round4(lon),
                        name: zone
                            .properties
                            .name
                            .unwrap_or_else(|| zone_id.to_string()),
                        zone_type: zone_type.path(),
                    });
                }
                None => tracing::warn!("no usable geometry for zone {}", zone_id),
            }
        }

        if coordinates.is_empty() {
            return Ok(error_envelope("Could not get coordinates for any zones"));
        }

        let count = coordinates.len();
        let summary = format!(
            "Retrieved coordinates for {} out of {} zones",
            count, requested
        );
        self.session().zone_coordinates = Some(coordinates.clone());

        Ok(envelope(json!({
            "status": "success",
            "data": {
                "coordinates": coordinates,
                "count": count,
                "summary": summary,
            },
        })))
    }

    /// Builds a shareable map URL plus structured marker data.
    #[tool(description = "Generate a Google Maps URL for visualization. With markers, builds a point-to-point URL using the first marker as the destination and up to 8 more as waypoints (extra markers are kept in the structured marker list but dropped from the URL). Without markers, builds a single-point lookup URL at the center.")]
    async fn generate_map(
        &self,
        Parameters(request): Parameters<GenerateMapRequest>,
    ) -> Result<CallToolResult, McpError> {
        let zoom = request.zoom.unwrap_or(12);
        let markers = request.markers.unwrap_or_default();
        tracing::info!(
            "generating map '{}' at ({}, {}) with {} markers",
            request.title.as_deref().unwrap_or("Map"),
            request.center_lat,
            request.center_lng,
            markers.len()
        );

        let map = maps::build_map(request.center_lat, request.center_lng, zoom, &markers);
        let marker_summary = maps::marker_summary(&markers);
        let message = format!("Generated map with {} marker(s)", markers.len());
        let instruction = format!("View map: {}", map.map_url);

        self.session().map_data = Some(map.clone());

        Ok(envelope(json!({
            "status": "success",
            "message": message,
            "map_url": map.map_url,
            "center": map.center,
            "zoom": map.zoom,
            "markers": map.markers,
            "marker_summary": marker_summary,
            "instruction": instruction,
        })))
    }

    /// Feeds the flood-history accumulator used by evacuation prioritization.
    #[tool(description = "Record historical high-precipitation flood events for a state. Events accumulate across calls (they are appended, not replaced) and feed calculate_evacuation_priority. Each event gets a derived severity: Major above 10 inches of precipitation, Moderate otherwise.")]
    async fn record_flood_history(
        &self,
        Parameters(request): Parameters<RecordFloodHistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state_code = request.state;
        let events: Vec<FloodEvent> = request
            .events
            .into_iter()
            .map(|input| FloodEvent::from_input(input, &state_code))
            .collect();
        let recorded = events.len();

        let (total_events, processed_states) = {
            let mut session = self.session();
            session.flood_history.record(&state_code, events);
            (
                session.flood_history.events.len(),
                session.flood_history.processed_states.clone(),
            )
        };

        tracing::info!(
            "recorded {} flood events for {}; {} accumulated across {} state(s)",
            recorded,
            state_code,
            total_events,
            processed_states.len()
        );

        Ok(envelope(json!({
            "status": "success",
            "data": {
                "recorded": recorded,
                "total_events": total_events,
                "processed_states": processed_states,
                "summary": format!(
                    "Recorded {} flood events for {}; {} total across {} state(s)",
                    recorded, state_code, total_events, processed_states.len()
                ),
            },
        })))
    }

    /// Ranks accumulated flood locations for evacuation.
    #[tool(description = "Calculate evacuation priority for high-risk locations from accumulated flood history and a hurricane category (1-5). Scores each location, deduplicates by coordinates keeping the highest score, and returns the top 20 by risk. Requires record_flood_history to have been called first.")]
    async fn calculate_evacuation_priority(
        &self,
        Parameters(request): Parameters<CalculateEvacuationPriorityRequest>,
    ) -> Result<CallToolResult, McpError> {
        let intensity = request.hurricane_intensity;

        let locations = {
            let session = self.session();
            if session.flood_history.is_empty() {
                return Ok(error_envelope(
                    "No flood risk data available. Call record_flood_history first.",
                ));
            }
            evacuation::prioritize(&session.flood_history.events, intensity)
        };

        let total_unique = locations.len();
        let top: Vec<_> = locations.iter().take(TOP_LOCATIONS).cloned().collect();
        let state_distribution = evacuation::state_distribution(&top);
        let timestamp = Utc::now().to_rfc3339();

        self.session().evacuation = Some(EvacuationSnapshot {
            locations,
            hurricane_intensity: intensity,
            timestamp,
        });

        tracing::info!(
            "evacuation priority: {} unique high-risk locations, top {} distribution {:?}",
            total_unique,
            top.len(),
            state_distribution
        );

        Ok(envelope(json!({
            "status": "success",
            "data": {
                "prioritized_locations": top,
                "total_unique_locations": total_unique,
                "state_distribution": state_distribution,
                "summary": format!(
                    "Identified {} unique high-risk locations across multiple states based on flood data.",
                    total_unique
                ),
            },
        })))
    }

    /// Two-step NWS forecast: point lookup, then gridpoint periods.
    #[tool(description = "Get the NWS weather forecast for a US location. Provide latitude and longitude, and optionally period: \"7day\" (default) or \"hourly\".")]
    async fn get_forecast(
        &self,
        Parameters(request): Parameters<GetForecastRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "getting forecast for {}, {}",
            request.latitude,
            request.longitude
        );

        let points_url = format!(
            "{}/points/{},{}",
            NWS_API_BASE, request.latitude, request.longitude
        );
        let points = match self.get_nws::<PointsResponse>(&points_url).await {
            Ok(points) => points,
            Err(e) => return Ok(error_envelope(format!("Failed to get forecast: {}", e))),
        };

        let forecast_url = if request.period.as_deref() == Some("hourly") {
            points.properties.forecast_hourly
        } else {
            points.properties.forecast
        };
        let forecast = match self.get_nws::<ForecastResponse>(&forecast_url).await {
            Ok(forecast) => forecast,
            Err(e) => return Ok(error_envelope(format!("Failed to get forecast: {}", e))),
        };

        let periods: Vec<Value> = forecast
            .properties
            .periods
            .iter()
            .map(|period| {
                json!({
                    "name": period.name,
                    "temperature": period.temperature,
                    "temperature_unit": period.temperature_unit,
                    "wind_speed": period.wind_speed,
                    "wind_direction": period.wind_direction,
                    "short_forecast": period.short_forecast,
                    "detailed_forecast": period.detailed_forecast,
                    "precipitation_probability": period.probability_of_precipitation.value,
                })
            })
            .collect();
        let updated = forecast
            .properties
            .updated
            .or(forecast.properties.update_time);

        tracing::info!("retrieved {} forecast periods", periods.len());

        Ok(envelope(json!({
            "status": "success",
            "location": format!("{},{}", request.latitude, request.longitude),
            "periods": periods,
            "updated": updated,
        })))
    }

    /// Latest observation from an NWS station.
    #[tool(description = "Get current weather conditions from an NWS observation station (e.g. \"KMIA\" for Miami). Values are metric; temperature is Celsius.")]
    async fn get_current_conditions(
        &self,
        Parameters(request): Parameters<GetCurrentConditionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let url = format!(
            "{}/stations/{}/observations/latest",
            NWS_API_BASE, request.station_id
        );
        let observation = match self.get_nws::<ObservationResponse>(&url).await {
            Ok(observation) => observation,
            Err(e) => return Ok(error_envelope(format!("Failed to get conditions: {}", e))),
        };
        let props = observation.properties;

        tracing::info!("retrieved current conditions for {}", request.station_id);

        Ok(envelope(json!({
            "status": "success",
            "conditions": {
                "station_id": request.station_id,
                "timestamp": props.timestamp,
                "temperature": props.temperature.value,
                "temperature_unit": "C",
                "dewpoint": props.dewpoint.value,
                "humidity": props.relative_humidity.value,
                "wind_speed": props.wind_speed.value,
                "wind_direction": props.wind_direction.value,
                "barometric_pressure": props.barometric_pressure.value,
                "visibility": props.visibility.value,
                "text_description": props.text_description,
                "raw_message": props.raw_message,
            },
        })))
    }

    /// Address to coordinates via the Google Geocoding API.
    #[tool(description = "Geocode an address to latitude/longitude coordinates using the Google Maps Geocoding API.")]
    async fn geocode_address(
        &self,
        Parameters(request): Parameters<GeocodeAddressRequest>,
    ) -> Result<CallToolResult, McpError> {
        let Some(key) = self.maps_api_key.as_deref() else {
            return Ok(error_envelope("GOOGLE_MAPS_API_KEY not configured"));
        };

        let params = [
            ("address", request.address.clone()),
            ("key", key.to_string()),
        ];
        let data = match self.get_google::<GeocodeResponse>("geocode/json", &params).await {
            Ok(data) => data,
            Err(e) => return Ok(error_envelope(format!("Failed to geocode address: {}", e))),
        };

        if data.status != "OK" {
            return Ok(error_envelope(format!("Geocoding failed: {}", data.status)));
        }
        let Some(result) = data.results.first() else {
            return Ok(error_envelope("Geocoding failed: empty result set"));
        };

        tracing::info!(
            "geocoded {} -> {},{}",
            request.address,
            result.geometry.location.lat,
            result.geometry.location.lng
        );

        Ok(envelope(json!({
            "status": "success",
            "result": {
                "address": request.address,
                "formatted_address": result.formatted_address,
                "latitude": result.geometry.location.lat,
                "longitude": result.geometry.location.lng,
                "place_id": result.place_id,
                "types": result.types,
            },
        })))
    }

    /// Route lookup via the Google Directions API.
    #[tool(description = "Get directions between two locations (addresses or \"lat,lng\") using the Google Maps Directions API. Mode is one of driving (default), walking, bicycling, transit.")]
    async fn get_directions(
        &self,
        Parameters(request): Parameters<GetDirectionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let Some(key) = self.maps_api_key.as_deref() else {
            return Ok(error_envelope("GOOGLE_MAPS_API_KEY not configured"));
        };

        let mode = request.mode.unwrap_or_else(|| "driving".to_string());
        let alternatives = request.alternatives.unwrap_or(true);
        let params = [
            ("origin", request.origin.clone()),
            ("destination", request.destination.clone()),
            ("mode", mode.clone()),
            ("alternatives", alternatives.to_string()),
            ("key", key.to_string()),
        ];
        let data = match self
            .get_google::<DirectionsResponse>("directions/json", &params)
            .await
        {
            Ok(data) => data,
            Err(e) => return Ok(error_envelope(format!("Failed to get directions: {}", e))),
        };

        if data.status != "OK" {
            return Ok(error_envelope(format!("Directions failed: {}", data.status)));
        }

        let mut routes = Vec::new();
        for route in &data.routes {
            let Some(leg) = route.legs.first() else {
                return Ok(error_envelope("Directions failed: route missing legs"));
            };
            let steps: Vec<Value> = leg
                .steps
                .iter()
                .take(5)
                .map(|step| {
                    json!({
                        "instruction": step.html_instructions,
                        "distance": step.distance.text,
                        "duration": step.duration.text,
                    })
                })
                .collect();
            routes.push(json!({
                "summary": route.summary.as_deref().unwrap_or("Route"),
                "distance": leg.distance.text,
                "distance_meters": leg.distance.value,
                "duration": leg.duration.text,
                "duration_seconds": leg.duration.value,
                "start_address": leg.start_address,
                "end_address": leg.end_address,
                "steps": steps,
            }));
        }

        tracing::info!(
            "got directions {} -> {}, {} routes",
            request.origin,
            request.destination,
            routes.len()
        );

        Ok(envelope(json!({
            "status": "success",
            "result": {
                "origin": request.origin,
                "destination": request.destination,
                "mode": mode,
                "routes": routes,
            },
        })))
    }

    /// Nearby-place search via the Google Places API.
    #[tool(description = "Search for nearby places (e.g. hospital, shelter, pharmacy, gas_station) around a \"lat,lng\" center using the Google Maps Places API. Radius is in meters, default 5000.")]
    async fn search_nearby_places(
        &self,
        Parameters(request): Parameters<SearchNearbyPlacesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let Some(key) = self.maps_api_key.as_deref() else {
            return Ok(error_envelope("GOOGLE_MAPS_API_KEY not configured"));
        };

        let radius = request.radius.unwrap_or(5000);
        let mut params = vec![
            ("location", request.location.clone()),
            ("radius", radius.to_string()),
            ("type", request.place_type.clone()),
            ("key", key.to_string()),
        ];
        if let Some(keyword) = &request.keyword {
            params.push(("keyword", keyword.clone()));
        }
        let data = match self
            .get_google::<PlacesResponse>("place/nearbysearch/json", &params)
            .await
        {
            Ok(data) => data,
            Err(e) => return Ok(error_envelope(format!("Failed to search places: {}", e))),
        };

        // ZERO_RESULTS is a valid, empty answer for places searches.
        if data.status != "OK" && data.status != "ZERO_RESULTS" {
            return Ok(error_envelope(format!(
                "Places search failed: {}",
                data.status
            )));
        }

        let places: Vec<Value> = data
            .results
            .iter()
            .take(10)
            .map(|place| {
                json!({
                    "name": place.name,
                    "address": place.vicinity,
                    "location": place.geometry.location,
                    "place_id": place.place_id,
                    "types": place.types,
                    "rating": place.rating,
                    "open_now": place
                        .opening_hours
                        .as_ref()
                        .and_then(|hours| hours.open_now),
                })
            })
            .collect();
        let count = places.len();

        tracing::info!(
            "found {} places of type '{}' near {}",
            count,
            request.place_type,
            request.location
        );

        Ok(envelope(json!({
            "status": "success",
            "result": {
                "location": request.location,
                "place_type": request.place_type,
                "radius_meters": radius,
                "keyword": request.keyword,
                "places": places,
                "count": count,
            },
        })))
    }
}
