/// Default user agent for NWS requests (override with NWS_USER_AGENT)
pub const DEFAULT_USER_AGENT: &str = "(WeatherAdvisor, contact@example.com)";

/// National Weather Service API base URL
pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// Google Maps web service API base URL
pub const GOOGLE_MAPS_BASE: &str = "https://maps.googleapis.com/maps/api";

/// Per-call HTTP timeout in seconds; a timeout is a final provider error, not retried
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
