use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{AlertFeature, AlertProperties};

/// NWS alert severity, ordered by how urgently the alert should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

impl Severity {
    /// Buckets a raw severity label; anything outside the four known levels
    /// lands in Unknown.
    pub fn parse(label: &str) -> Self {
        match label {
            "Extreme" => Severity::Extreme,
            "Severe" => Severity::Severe,
            "Moderate" => Severity::Moderate,
            "Minor" => Severity::Minor,
            _ => Severity::Unknown,
        }
    }

    /// Sort key: lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            Severity::Extreme => 0,
            Severity::Severe => 1,
            Severity::Moderate => 2,
            Severity::Minor => 3,
            Severity::Unknown => 4,
        }
    }
}

/// How the alerts query was scoped; decides the truncation cap for large
/// result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertScope {
    National,
    State,
    Point,
}

impl AlertScope {
    /// Coordinates take precedence over a state code; neither means a
    /// national query.
    pub fn from_query(state: Option<&str>, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        if latitude.is_some() && longitude.is_some() {
            AlertScope::Point
        } else if state.is_some() {
            AlertScope::State
        } else {
            AlertScope::National
        }
    }

    /// National queries get trimmed harder to keep agent payloads small.
    fn cap(self) -> usize {
        match self {
            AlertScope::National => 5,
            AlertScope::State | AlertScope::Point => 10,
        }
    }
}

/// One alert as reported to callers; a straight projection of the wire
/// properties with the severity label defaulted.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub event: Option<String>,
    pub severity: String,
    pub urgency: Option<String>,
    pub certainty: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub onset: Option<String>,
    pub expires: Option<String>,
    pub affected_zones: Vec<String>,
    pub sender_name: Option<String>,
}

impl From<AlertProperties> for Alert {
    fn from(props: AlertProperties) -> Self {
        Alert {
            event: props.event,
            severity: props.severity.unwrap_or_else(|| "Unknown".to_string()),
            urgency: props.urgency,
            certainty: props.certainty,
            headline: props.headline,
            description: props.description,
            instruction: props.instruction,
            onset: props.onset,
            expires: props.expires,
            affected_zones: props.affected_zones,
            sender_name: props.sender_name,
        }
    }
}

/// Filtered, ranked and possibly truncated alert set.
#[derive(Debug, Serialize)]
pub struct AlertDigest {
    pub alerts: Vec<Alert>,
    /// Count after severity filtering, before truncation.
    pub total_count: usize,
    /// Tally over the filtered set, keyed by severity label. The five known
    /// buckets are always present; unrecognized labels get buckets of their
    /// own.
    pub severity_breakdown: BTreeMap<String, u32>,
    pub limited: bool,
}

fn empty_breakdown() -> BTreeMap<String, u32> {
    ["Extreme", "Severe", "Moderate", "Minor", "Unknown"]
        .into_iter()
        .map(|label| (label.to_string(), 0))
        .collect()
}

/// Applies the optional exact-match severity filter, tallies severities over
/// the filtered set, and when more than 10 alerts remain, ranks them by
/// severity priority (stable, so provider order breaks ties) and truncates
/// to the scope's cap.
pub fn filter_and_rank(
    features: Vec<AlertFeature>,
    severity_filter: Option<&str>,
    scope: AlertScope,
) -> AlertDigest {
    let mut alerts = Vec::new();
    let mut severity_breakdown = empty_breakdown();

    for feature in features {
        let props = feature.properties;

        if let Some(wanted) = severity_filter {
            if props.severity.as_deref() != Some(wanted) {
                continue;
            }
        }

        let alert = Alert::from(props);
        *severity_breakdown.entry(alert.severity.clone()).or_insert(0) += 1;
        alerts.push(alert);
    }

    let total_count = alerts.len();
    if total_count > 10 {
        alerts.sort_by_key(|alert| Severity::parse(&alert.severity).priority());
        alerts.truncate(scope.cap());
        tracing::info!(
            "{:?} query: limiting to top {} alerts out of {} total",
            scope,
            alerts.len(),
            total_count
        );
    }

    AlertDigest {
        alerts,
        total_count,
        severity_breakdown,
        limited: total_count > 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(event: &str, severity: Option<&str>) -> AlertFeature {
        AlertFeature {
            properties: AlertProperties {
                event: Some(event.to_string()),
                severity: severity.map(str::to_string),
                urgency: Some("Immediate".to_string()),
                certainty: Some("Likely".to_string()),
                headline: None,
                description: None,
                instruction: None,
                onset: None,
                expires: None,
                affected_zones: vec!["https://api.weather.gov/zones/forecast/CAZ001".to_string()],
                sender_name: Some("NWS Test".to_string()),
            },
        }
    }

    #[test]
    fn severity_filter_keeps_exact_matches_in_order() {
        let features = vec![
            feature("Hurricane Warning", Some("Extreme")),
            feature("Tornado Warning", Some("Severe")),
            feature("Flood Watch", Some("Moderate")),
            feature("Blizzard Warning", Some("Severe")),
        ];

        let digest = filter_and_rank(features, Some("Severe"), AlertScope::National);

        assert_eq!(digest.total_count, 2);
        let events: Vec<_> = digest
            .alerts
            .iter()
            .map(|a| a.event.as_deref().unwrap())
            .collect();
        assert_eq!(events, vec!["Tornado Warning", "Blizzard Warning"]);
        assert_eq!(digest.severity_breakdown["Severe"], 2);
        assert_eq!(digest.severity_breakdown["Extreme"], 0);
    }

    #[test]
    fn severity_filter_excludes_alerts_without_severity() {
        let features = vec![feature("Special Statement", None)];
        let digest = filter_and_rank(features, Some("Severe"), AlertScope::State);
        assert_eq!(digest.total_count, 0);
        assert!(digest.alerts.is_empty());
    }

    #[test]
    fn small_sets_are_never_truncated() {
        let features = vec![
            feature("a", Some("Extreme")),
            feature("b", Some("Severe")),
            feature("c", Some("Moderate")),
            feature("d", Some("Minor")),
            feature("e", Some("Severe")),
            feature("f", Some("Extreme")),
            feature("g", Some("Moderate")),
        ];

        let digest = filter_and_rank(features, None, AlertScope::State);

        assert_eq!(digest.total_count, 7);
        assert_eq!(digest.alerts.len(), 7);
        assert!(!digest.limited);
        // Provider order untouched below the cap.
        assert_eq!(digest.alerts[0].event.as_deref(), Some("a"));
        assert_eq!(digest.alerts[6].event.as_deref(), Some("g"));
        assert_eq!(digest.severity_breakdown["Extreme"], 2);
        assert_eq!(digest.severity_breakdown["Severe"], 2);
        assert_eq!(digest.severity_breakdown["Moderate"], 2);
        assert_eq!(digest.severity_breakdown["Minor"], 1);
        assert_eq!(digest.severity_breakdown["Unknown"], 0);
    }

    fn twelve_mixed() -> Vec<AlertFeature> {
        let severities = [
            "Minor", "Severe", "Moderate", "Extreme", "Severe", "Minor", "Moderate", "Extreme",
            "Severe", "Minor", "Moderate", "Severe",
        ];
        severities
            .into_iter()
            .enumerate()
            .map(|(i, s)| feature(&format!("event-{i}"), Some(s)))
            .collect()
    }

    #[test]
    fn national_scope_caps_at_five_most_critical() {
        let digest = filter_and_rank(twelve_mixed(), None, AlertScope::National);

        assert_eq!(digest.total_count, 12);
        assert_eq!(digest.alerts.len(), 5);
        assert!(digest.limited);

        let priorities: Vec<u8> = digest
            .alerts
            .iter()
            .map(|a| Severity::parse(&a.severity).priority())
            .collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        // 2 Extreme + 4 Severe in the input, so the top 5 are those levels.
        assert_eq!(digest.alerts[0].severity, "Extreme");
        assert_eq!(digest.alerts[1].severity, "Extreme");
        assert!(digest.alerts[2..].iter().all(|a| a.severity == "Severe"));
    }

    #[test]
    fn state_scope_caps_at_ten() {
        let digest = filter_and_rank(twelve_mixed(), None, AlertScope::State);
        assert_eq!(digest.total_count, 12);
        assert_eq!(digest.alerts.len(), 10);
        assert!(digest.limited);
    }

    #[test]
    fn ranking_keeps_provider_order_within_a_severity() {
        let digest = filter_and_rank(twelve_mixed(), None, AlertScope::State);
        // Extreme alerts were at input positions 3 and 7.
        assert_eq!(digest.alerts[0].event.as_deref(), Some("event-3"));
        assert_eq!(digest.alerts[1].event.as_deref(), Some("event-7"));
        // Severe alerts follow in input order 1, 4, 8, 11.
        assert_eq!(digest.alerts[2].event.as_deref(), Some("event-1"));
        assert_eq!(digest.alerts[3].event.as_deref(), Some("event-4"));
        assert_eq!(digest.alerts[4].event.as_deref(), Some("event-8"));
        assert_eq!(digest.alerts[5].event.as_deref(), Some("event-11"));
    }

    #[test]
    fn unrecognized_labels_get_their_own_bucket_and_sort_last() {
        let mut features = twelve_mixed();
        features.push(feature("odd", Some("Catastrophic")));

        let digest = filter_and_rank(features, None, AlertScope::State);

        assert_eq!(digest.severity_breakdown["Catastrophic"], 1);
        assert_eq!(digest.severity_breakdown["Unknown"], 0);
        assert_eq!(Severity::parse("Catastrophic"), Severity::Unknown);
        // 13 alerts, cap 10: the unrecognized label ranks last and is cut.
        assert!(digest.alerts.iter().all(|a| a.severity != "Catastrophic"));
    }

    #[test]
    fn missing_severity_defaults_to_unknown_label() {
        let digest = filter_and_rank(vec![feature("x", None)], None, AlertScope::National);
        assert_eq!(digest.alerts[0].severity, "Unknown");
        assert_eq!(digest.severity_breakdown["Unknown"], 1);
    }

    #[test]
    fn scope_prefers_coordinates_over_state() {
        assert_eq!(
            AlertScope::from_query(Some("FL"), Some(25.76), Some(-80.19)),
            AlertScope::Point
        );
        assert_eq!(
            AlertScope::from_query(Some("FL"), None, None),
            AlertScope::State
        );
        assert_eq!(AlertScope::from_query(None, None, None), AlertScope::National);
        // One coordinate alone is not a point query.
        assert_eq!(
            AlertScope::from_query(None, Some(25.76), None),
            AlertScope::National
        );
    }
}
