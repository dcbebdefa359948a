//! Renders a coordinator snapshot the way a home-automation sensor would
//! show it: a state string plus a flat attribute map.

use serde::Serialize;
use serde_json::{json, Map, Value};

use fotd_coordinator::{FlavorSnapshot, UpdateFailure};

pub(crate) const UNKNOWN_STATE: &str = "Unknown";
const ATTRIBUTION: &str = "Data provided by store locations";

/// How the host should present a failed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Severity {
    /// The user has to fix credentials or the configured location.
    ActionRequired,
    /// Retried automatically on the next tick.
    Unavailable,
}

impl Severity {
    fn of(failure: &UpdateFailure) -> Option<Self> {
        match failure {
            UpdateFailure::ReauthRequired { .. } => Some(Severity::ActionRequired),
            UpdateFailure::Transient { .. } => Some(Severity::Unavailable),
            UpdateFailure::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SensorView {
    pub name: String,
    pub state: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub attributes: Map<String, Value>,
}

impl SensorView {
    /// `provider_name` is the chain's display name. A stale flavor keeps
    /// showing after a failed update; `available` and `severity` report the
    /// failure alongside it.
    pub(crate) fn from_snapshot(
        name: &str,
        provider_name: &str,
        location_id: &str,
        snapshot: &FlavorSnapshot,
    ) -> Self {
        let severity = snapshot.last_error.as_ref().and_then(Severity::of);
        let mut attributes = Map::new();
        attributes.insert("attribution".into(), json!(ATTRIBUTION));

        let state = if let Some(flavor) = &snapshot.flavor {
            attributes.insert("name".into(), json!(flavor.name()));
            attributes.insert("provider".into(), json!(provider_name));
            attributes.insert("location_id".into(), json!(location_id));
            if let Some(description) = flavor.description() {
                attributes.insert("description".into(), json!(description));
            }
            if let Some(ingredients) = flavor.ingredients() {
                attributes.insert("ingredients".into(), json!(ingredients));
            }
            if let Some(allergens) = flavor.allergens() {
                attributes.insert("allergens".into(), json!(allergens));
            }
            if let Some(price) = flavor.price() {
                attributes.insert("pricing".into(), json!(price));
            }
            if let Some(date) = flavor.available_date() {
                attributes.insert("available_date".into(), json!(date.to_rfc3339()));
            }
            if let Some(image_url) = flavor.image_url() {
                attributes.insert("image_url".into(), json!(image_url));
            }
            if let Some(nutrition) = flavor.nutrition_info() {
                attributes.insert("nutrition_info".into(), json!(nutrition));
            }
            flavor.name().to_string()
        } else {
            UNKNOWN_STATE.to_string()
        };

        if let Some(at) = snapshot.last_success {
            attributes.insert("last_success".into(), json!(at.to_rfc3339()));
        }
        if let Some(failure) = &snapshot.last_error {
            attributes.insert("last_error".into(), json!(failure.to_string()));
        }

        Self {
            name: name.to_string(),
            state,
            available: severity.is_none(),
            severity,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use fotd_core::{ErrorKind, FlavorInfo};

    use super::*;

    fn vanilla_snapshot() -> FlavorSnapshot {
        FlavorSnapshot {
            flavor: Some(
                FlavorInfo::new("Vanilla")
                    .unwrap()
                    .with_description(Some("Classic"))
                    .with_price(Some("$3.49")),
            ),
            last_success: Some(Utc.with_ymd_and_hms(2026, 9, 27, 15, 0, 0).unwrap()),
            ..FlavorSnapshot::default()
        }
    }

    #[test]
    fn empty_snapshot_is_unknown_with_no_flavor_attributes() {
        let view =
            SensorView::from_snapshot("Kitchen", "Culver's", "x", &FlavorSnapshot::default());
        assert_eq!(view.state, UNKNOWN_STATE);
        assert!(view.available);
        assert!(!view.attributes.contains_key("name"));
        assert!(view.attributes.contains_key("attribution"));
    }

    #[test]
    fn flavor_fields_become_attributes() {
        let view = SensorView::from_snapshot("Kitchen", "Culver's", "madison", &vanilla_snapshot());
        assert_eq!(view.state, "Vanilla");
        assert_eq!(view.attributes["provider"], "Culver's");
        assert_eq!(view.attributes["location_id"], "madison");
        assert_eq!(view.attributes["description"], "Classic");
        assert_eq!(view.attributes["pricing"], "$3.49");
        assert_eq!(view.attributes["last_success"], "2026-09-27T15:00:00+00:00");
        assert!(!view.attributes.contains_key("allergens"));
        assert!(view.severity.is_none());
    }

    #[test]
    fn transient_failure_keeps_stale_flavor_but_marks_unavailable() {
        let mut snap = vanilla_snapshot();
        snap.last_error = Some(UpdateFailure::Transient {
            kind: ErrorKind::Timeout,
            message: "request timed out".into(),
        });
        let view = SensorView::from_snapshot("Kitchen", "Culver's", "madison", &snap);
        assert_eq!(view.state, "Vanilla");
        assert!(!view.available);
        assert_eq!(view.severity, Some(Severity::Unavailable));
        assert_eq!(view.attributes["last_error"], "update failed: request timed out");
    }

    #[test]
    fn auth_failure_requires_action() {
        let snap = FlavorSnapshot {
            last_error: Some(UpdateFailure::ReauthRequired {
                message: "401".into(),
            }),
            needs_reauth: true,
            ..FlavorSnapshot::default()
        };
        let view = SensorView::from_snapshot("Kitchen", "Culver's", "madison", &snap);
        assert_eq!(view.severity, Some(Severity::ActionRequired));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["severity"], "action_required");
    }
}
