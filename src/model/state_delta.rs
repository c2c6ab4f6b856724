use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Narrative shown when the resolver's reply cannot be decoded.
pub const FALLBACK_OUTCOME: &str = "The story stumbles for a moment...";

static EMPTY_DELTA: StateDelta = StateDelta {
    vitality: None,
    inventory: None,
    location: None,
};

/// A partial update to the session. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireDelta")]
pub struct StateDelta {
    #[serde(rename = "health", skip_serializing_if = "Option::is_none")]
    pub vitality: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// The shape resolvers actually send: `health` or `vitality`, sometimes
/// both, and numbers of any width.
#[derive(Deserialize)]
struct WireDelta {
    #[serde(default)]
    health: Option<Number>,
    #[serde(default)]
    vitality: Option<Number>,
    #[serde(default)]
    inventory: Option<Vec<String>>,
    #[serde(default)]
    location: Option<String>,
}

impl From<WireDelta> for StateDelta {
    fn from(wire: WireDelta) -> Self {
        Self {
            vitality: wire.health.or(wire.vitality).map(|n| saturate(&n)),
            inventory: wire.inventory,
            location: wire.location,
        }
    }
}

/// Out-of-range values pin to the nearest `i32`; fractions truncate.
fn saturate(n: &Number) -> i32 {
    if let Some(v) = n.as_i64() {
        v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    } else if n.as_u64().is_some() {
        i32::MAX
    } else {
        // `as` saturates float-to-int casts.
        n.as_f64().map_or(0, |f| f as i32)
    }
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        self.vitality.is_none() && self.inventory.is_none() && self.location.is_none()
    }
}

/// What the resolver's reply amounted to.
///
/// This does NOT mutate state; `engine::apply_delta` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Delta { update: StateDelta, outcome: String },
    Fallback,
}

impl Resolution {
    pub fn update(&self) -> &StateDelta {
        match self {
            Resolution::Delta { update, .. } => update,
            Resolution::Fallback => &EMPTY_DELTA,
        }
    }

    pub fn outcome(&self) -> &str {
        match self {
            Resolution::Delta { outcome, .. } => outcome,
            Resolution::Fallback => FALLBACK_OUTCOME,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_carries_no_update() {
        let fallback = Resolution::Fallback;
        assert!(fallback.update().is_empty());
        assert_eq!(fallback.outcome(), FALLBACK_OUTCOME);
        assert!(fallback.is_fallback());
    }

    #[test]
    fn delta_accepts_health_and_vitality_keys() {
        let a: StateDelta = serde_json::from_str(r#"{"health": 40}"#).unwrap();
        let b: StateDelta = serde_json::from_str(r#"{"vitality": 40}"#).unwrap();
        assert_eq!(a.vitality, Some(40));
        assert_eq!(a, b);
        assert!(a.inventory.is_none());
    }

    #[test]
    fn health_wins_when_both_keys_are_sent() {
        let delta: StateDelta =
            serde_json::from_str(r#"{"health":80,"vitality":10,"location":"hall"}"#).unwrap();
        assert_eq!(delta.vitality, Some(80));
        assert_eq!(delta.location.as_deref(), Some("hall"));
    }

    #[test]
    fn oversized_numbers_saturate() {
        let big: StateDelta = serde_json::from_str(r#"{"health":3000000000}"#).unwrap();
        assert_eq!(big.vitality, Some(i32::MAX));

        let low: StateDelta = serde_json::from_str(r#"{"health":-3000000000}"#).unwrap();
        assert_eq!(low.vitality, Some(i32::MIN));

        let huge: StateDelta = serde_json::from_str(r#"{"health":18446744073709551615}"#).unwrap();
        assert_eq!(huge.vitality, Some(i32::MAX));

        let fraction: StateDelta = serde_json::from_str(r#"{"vitality":42.9}"#).unwrap();
        assert_eq!(fraction.vitality, Some(42));
    }

    #[test]
    fn serializes_vitality_as_health() {
        let delta = StateDelta {
            vitality: Some(5),
            ..StateDelta::default()
        };
        assert_eq!(serde_json::to_string(&delta).unwrap(), r#"{"health":5}"#);
    }
}
