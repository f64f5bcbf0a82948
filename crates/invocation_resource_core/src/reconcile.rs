//! Desired-versus-applied reconciliation.
//!
//! This is the stand-in for an orchestration host: it compares each declared
//! resource with its last-applied record, decides which lifecycle operation
//! (if any) to run, and commits the new record only when that operation
//! succeeds. Failures are collected per resource; nothing is retried.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::contract::{validate_config, ResourceConfig, ResourceState};
use crate::error::LifecycleError;
use crate::lifecycle::LifecycleHandler;
use crate::logging::{log_error, log_info};
use crate::state::StateDocument;

const COMPONENT: &str = "reconciler";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlannedAction {
    Create,
    Update,
    Delete,
    NoOp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Planned,
    Applied,
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceOutcome {
    pub name: String,
    pub action: PlannedAction,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub outcomes: Vec<ResourceOutcome>,
}

impl ReconcileReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.status == OutcomeStatus::Failed)
    }

    pub fn outcome(&self, name: &str) -> Option<&ResourceOutcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }
}

pub fn plan_action(
    desired: Option<&ResourceConfig>,
    applied: Option<&ResourceState>,
) -> PlannedAction {
    match (desired, applied) {
        (None, None) => PlannedAction::NoOp,
        (None, Some(_)) => PlannedAction::Delete,
        (Some(_), None) => PlannedAction::Create,
        (Some(config), Some(state)) if has_changes(config, state) => PlannedAction::Update,
        (Some(_), Some(_)) => PlannedAction::NoOp,
    }
}

/// Whether any declared attribute differs from the last-applied record.
///
/// `input` is not compared while the desired config conceals it: the stored
/// copy is blank, and only triggers (or another attribute) can force a
/// re-invocation.
pub fn has_changes(config: &ResourceConfig, state: &ResourceState) -> bool {
    config.function_name != state.function_name
        || config.qualifier != state.qualifier
        || config.triggers != state.triggers
        || config.conceal_input != state.conceal_input
        || config.conceal_result != state.conceal_result
        || config.finalizer != state.finalizer
        || (!config.conceal_input && config.input != state.input)
}

/// Computes what [`reconcile`] would do, without invoking anything.
pub fn plan(
    desired: &BTreeMap<String, ResourceConfig>,
    state: &StateDocument,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for name in resource_names(desired, state) {
        let config = desired.get(&name);
        let applied = state.get(&name);
        let action = plan_action(config, applied);
        let id = applied.map(|record| record.id.clone());

        let validation = match config {
            Some(config) => validate_config(config).err(),
            None => None,
        };
        let outcome = match validation {
            Some(error) => ResourceOutcome {
                name: name.clone(),
                action,
                status: OutcomeStatus::Failed,
                id,
                error: Some(error.to_string()),
            },
            None => ResourceOutcome {
                name: name.clone(),
                action,
                status: if action == PlannedAction::NoOp {
                    OutcomeStatus::Unchanged
                } else {
                    OutcomeStatus::Planned
                },
                id,
                error: None,
            },
        };

        log_info(
            COMPONENT,
            "resource_planned",
            json!({
                "resource": name,
                "action": action,
                "status": outcome.status,
            }),
        );
        report.outcomes.push(outcome);
    }

    report
}

/// Drives every resource in `desired` or `state` towards its desired form.
///
/// `state` is updated in place for each resource whose operation succeeded;
/// records of failed resources are left exactly as they were.
pub fn reconcile(
    desired: &BTreeMap<String, ResourceConfig>,
    state: &mut StateDocument,
    handler: &LifecycleHandler<'_>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for name in resource_names(desired, state) {
        let refreshed = state.get(&name).map(|record| handler.read(record));
        let config = desired.get(&name);
        let action = plan_action(config, refreshed.as_ref());

        // Declared configs are validated on every pass, even when nothing changed.
        let result = match config.map(validate_config).transpose() {
            Err(error) => Err(LifecycleError::from(error)),
            Ok(_) => apply_action(action, config, refreshed.as_ref(), &name, state, handler),
        };

        let outcome = match result {
            Ok(id) => {
                let status = if action == PlannedAction::NoOp {
                    OutcomeStatus::Unchanged
                } else {
                    OutcomeStatus::Applied
                };
                log_info(
                    COMPONENT,
                    "resource_applied",
                    json!({
                        "resource": name.clone(),
                        "action": action,
                        "status": status,
                        "id": id.clone(),
                    }),
                );
                ResourceOutcome {
                    name,
                    action,
                    status,
                    id,
                    error: None,
                }
            }
            Err(error) => {
                log_error(
                    COMPONENT,
                    "resource_failed",
                    json!({
                        "resource": name.clone(),
                        "action": action,
                        "error": error.to_string(),
                    }),
                );
                ResourceOutcome {
                    name,
                    action,
                    status: OutcomeStatus::Failed,
                    id: refreshed.map(|record| record.id),
                    error: Some(error.to_string()),
                }
            }
        };
        report.outcomes.push(outcome);
    }

    report
}

fn apply_action(
    action: PlannedAction,
    config: Option<&ResourceConfig>,
    applied: Option<&ResourceState>,
    name: &str,
    state: &mut StateDocument,
    handler: &LifecycleHandler<'_>,
) -> Result<Option<String>, LifecycleError> {
    match (action, config, applied) {
        (PlannedAction::Create | PlannedAction::Update, Some(config), prior) => {
            let record = handler.create_or_update(config, prior)?;
            let id = record.id.clone();
            state.resources.insert(name.to_string(), record);
            Ok(Some(id))
        }
        (PlannedAction::Delete, _, Some(record)) => {
            handler.delete(record)?;
            state.resources.remove(name);
            Ok(None)
        }
        _ => Ok(applied.map(|record| record.id.clone())),
    }
}

/// Deletes every tracked resource.
pub fn destroy(state: &mut StateDocument, handler: &LifecycleHandler<'_>) -> ReconcileReport {
    reconcile(&BTreeMap::new(), state, handler)
}

fn resource_names(
    desired: &BTreeMap<String, ResourceConfig>,
    state: &StateDocument,
) -> BTreeSet<String> {
    desired
        .keys()
        .chain(state.resources.keys())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{FinalizerConfig, LATEST_QUALIFIER};

    fn sample_config() -> ResourceConfig {
        ResourceConfig {
            function_name: "f1".to_string(),
            qualifier: LATEST_QUALIFIER.to_string(),
            triggers: BTreeMap::from([("trig_key".to_string(), "a".to_string())]),
            input: r#"{"param":"v1"}"#.to_string(),
            conceal_input: false,
            conceal_result: false,
            finalizer: None,
        }
    }

    fn applied(config: &ResourceConfig) -> ResourceState {
        ResourceState::from_applied("id-1".to_string(), config, b"R1")
    }

    #[test]
    fn plan_action_covers_presence_combinations() {
        let config = sample_config();
        let state = applied(&config);

        assert_eq!(plan_action(None, None), PlannedAction::NoOp);
        assert_eq!(plan_action(Some(&config), None), PlannedAction::Create);
        assert_eq!(plan_action(None, Some(&state)), PlannedAction::Delete);
        assert_eq!(
            plan_action(Some(&config), Some(&state)),
            PlannedAction::NoOp
        );
    }

    #[test]
    fn input_change_forces_update() {
        let mut config = sample_config();
        let state = applied(&config);
        config.input = r#"{"param":"v2"}"#.to_string();

        assert_eq!(
            plan_action(Some(&config), Some(&state)),
            PlannedAction::Update
        );
    }

    #[test]
    fn trigger_change_forces_update() {
        let mut config = sample_config();
        let state = applied(&config);
        config
            .triggers
            .insert("trig_key".to_string(), "trigger-now".to_string());

        assert_eq!(
            plan_action(Some(&config), Some(&state)),
            PlannedAction::Update
        );
    }

    #[test]
    fn concealed_input_change_is_ignored() {
        let mut config = sample_config();
        config.conceal_input = true;
        let state = applied(&config);
        config.input = r#"{"param":"v2"}"#.to_string();

        assert_eq!(
            plan_action(Some(&config), Some(&state)),
            PlannedAction::NoOp
        );
    }

    #[test]
    fn revealing_input_forces_update() {
        let mut config = sample_config();
        config.conceal_input = true;
        let state = applied(&config);
        config.conceal_input = false;

        assert_eq!(
            plan_action(Some(&config), Some(&state)),
            PlannedAction::Update
        );
    }

    #[test]
    fn finalizer_change_forces_update() {
        let mut config = sample_config();
        let state = applied(&config);
        config.finalizer = Some(FinalizerConfig {
            function_name: "f2".to_string(),
            qualifier: LATEST_QUALIFIER.to_string(),
            input: "{}".to_string(),
        });

        assert_eq!(
            plan_action(Some(&config), Some(&state)),
            PlannedAction::Update
        );
    }

    #[test]
    fn concealed_result_does_not_cause_drift() {
        let mut config = sample_config();
        config.conceal_result = true;
        let state = applied(&config);

        assert!(!has_changes(&config, &state));
    }

    #[test]
    fn plan_reports_actions_and_validation_errors() {
        let mut state = StateDocument::default();
        let kept = sample_config();
        state.resources.insert("kept".to_string(), applied(&kept));
        state
            .resources
            .insert("removed".to_string(), applied(&sample_config()));

        let mut broken = sample_config();
        broken.input = "nope".to_string();
        let desired = BTreeMap::from([("kept".to_string(), kept), ("broken".to_string(), broken)]);

        let report = plan(&desired, &state);

        let kept = report.outcome("kept").expect("kept outcome");
        assert_eq!(kept.action, PlannedAction::NoOp);
        assert_eq!(kept.status, OutcomeStatus::Unchanged);

        let removed = report.outcome("removed").expect("removed outcome");
        assert_eq!(removed.action, PlannedAction::Delete);
        assert_eq!(removed.status, OutcomeStatus::Planned);

        let broken = report.outcome("broken").expect("broken outcome");
        assert_eq!(broken.action, PlannedAction::Create);
        assert_eq!(broken.status, OutcomeStatus::Failed);
        assert!(broken
            .error
            .as_deref()
            .is_some_and(|message| message.contains("input")));
        assert!(report.has_failures());
    }
}
