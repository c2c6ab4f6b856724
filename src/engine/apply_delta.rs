use crate::config::VitalityPolicy;
use crate::model::session_state::SessionState;
use crate::model::state_delta::Resolution;

/// Which fields a merge touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub vitality: bool,
    pub inventory: bool,
    pub location: bool,
    pub recovered: bool,
}

/// Merge a Resolution into the SessionState.
///
/// Present fields overwrite, absent fields stay. `last_outcome` is always
/// replaced and `scene_index` always advances by one.
pub fn apply_delta(
    state: &mut SessionState,
    resolution: &Resolution,
    policy: VitalityPolicy,
) -> MergeReport {
    let update = resolution.update();
    let mut report = MergeReport {
        recovered: resolution.is_fallback(),
        ..MergeReport::default()
    };

    if let Some(vitality) = update.vitality {
        state.vitality = match policy {
            VitalityPolicy::Unclamped => vitality,
            VitalityPolicy::Clamped => vitality.clamp(0, state.max_vitality),
        };
        report.vitality = true;
    }

    if let Some(inventory) = &update.inventory {
        state.inventory = inventory.clone();
        report.inventory = true;
    }

    if let Some(location) = &update.location {
        state.location = location.clone();
        report.location = true;
    }

    state.last_outcome = resolution.outcome().to_string();
    state.scene_index += 1;

    tracing::debug!(
        scene_index = state.scene_index,
        vitality = state.vitality,
        ?report,
        "delta applied"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::state_delta::{StateDelta, FALLBACK_OUTCOME};

    fn start() -> SessionState {
        SessionState::default()
    }

    fn delta(update: StateDelta, outcome: &str) -> Resolution {
        Resolution::Delta {
            update,
            outcome: outcome.into(),
        }
    }

    #[test]
    fn torch_scenario() {
        let mut state = start();
        let resolution = delta(
            StateDelta {
                vitality: Some(90),
                inventory: Some(vec!["torch".into()]),
                location: None,
            },
            "You find a torch.",
        );

        let report = apply_delta(&mut state, &resolution, VitalityPolicy::Unclamped);

        assert_eq!(state.vitality(), 90);
        assert_eq!(state.inventory(), ["torch".to_string()]);
        assert_eq!(state.location(), "starting_point");
        assert_eq!(state.last_outcome(), "You find a torch.");
        assert_eq!(state.scene_index(), 1);
        assert!(report.vitality && report.inventory && !report.location);
    }

    #[test]
    fn fallback_only_touches_outcome_and_index() {
        let mut state = start().with_inventory(["map"]);
        let before = state.clone();

        let report = apply_delta(&mut state, &Resolution::Fallback, VitalityPolicy::Unclamped);

        assert_eq!(state.vitality(), before.vitality());
        assert_eq!(state.inventory(), before.inventory());
        assert_eq!(state.location(), before.location());
        assert_eq!(state.last_outcome(), FALLBACK_OUTCOME);
        assert_eq!(state.scene_index(), before.scene_index() + 1);
        assert!(report.recovered);
    }

    #[test]
    fn each_field_is_independent() {
        let updates = [
            StateDelta {
                vitality: Some(7),
                ..StateDelta::default()
            },
            StateDelta {
                inventory: Some(vec![]),
                ..StateDelta::default()
            },
            StateDelta {
                location: Some("tower".into()),
                ..StateDelta::default()
            },
        ];

        for update in updates {
            let mut state = SessionState::new(50, 100, "cellar").with_inventory(["key", "key"]);
            let before = state.clone();
            apply_delta(&mut state, &delta(update.clone(), "o"), VitalityPolicy::Unclamped);

            assert_eq!(
                state.vitality(),
                update.vitality.unwrap_or(before.vitality())
            );
            assert_eq!(
                state.inventory(),
                update.inventory.as_deref().unwrap_or(before.inventory())
            );
            assert_eq!(
                state.location(),
                update.location.as_deref().unwrap_or(before.location())
            );
        }
    }

    #[test]
    fn inventory_is_replaced_without_dedup() {
        let mut state = start().with_inventory(["coin"]);
        let update = StateDelta {
            inventory: Some(vec!["coin".into(), "coin".into()]),
            ..StateDelta::default()
        };
        apply_delta(&mut state, &delta(update, ""), VitalityPolicy::Unclamped);
        assert_eq!(state.inventory().len(), 2);
    }

    #[test]
    fn clamping_is_opt_in() {
        let over = delta(
            StateDelta {
                vitality: Some(250),
                ..StateDelta::default()
            },
            "",
        );
        let under = delta(
            StateDelta {
                vitality: Some(-30),
                ..StateDelta::default()
            },
            "",
        );

        let mut state = start();
        apply_delta(&mut state, &over, VitalityPolicy::Unclamped);
        assert_eq!(state.vitality(), 250);

        let mut state = start();
        apply_delta(&mut state, &over, VitalityPolicy::Clamped);
        assert_eq!(state.vitality(), 100);

        let mut state = start();
        apply_delta(&mut state, &under, VitalityPolicy::Clamped);
        assert_eq!(state.vitality(), 0);
        assert!(state.is_depleted());
    }
}
