use activation_logging::{activation_debug, activation_info, activation_warn};

use crate::patterns::validate_instance;
use crate::{AppState, Effect, Msg, Notice, PermissionOutcome, Ticket};

/// Pure update function: applies a message to state and returns any effects.
///
/// Effects must be executed in the returned order; the flag is always persisted
/// after the registration change it depends on.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Loaded {
            support_enabled,
            instances,
        } => {
            state.load(support_enabled, instances);
            if state.patterns().is_empty() {
                // Nothing to hold permissions for, so nothing to reconcile.
                Vec::new()
            } else {
                let ticket = state.begin_check();
                vec![Effect::CheckPermissions {
                    ticket,
                    request: state.permission_request(),
                }]
            }
        }
        Msg::PermissionsChecked { ticket, held } => {
            if !state.take_check(ticket) {
                activation_debug!("Dropping superseded permission check {}", ticket);
                Vec::new()
            } else if held != state.support_enabled() {
                activation_info!(
                    "Stored flag {} disagrees with held permissions; correcting to {}",
                    state.support_enabled(),
                    held
                );
                // The registration follows the corrected flag.
                let mut effects = if held {
                    commit_enabled(&mut state)
                } else {
                    state.commit_flag(false);
                    vec![
                        Effect::Unregister {
                            handle: state.config().handle.clone(),
                        },
                        Effect::PersistFlag(false),
                    ]
                };
                let notice = Notice::FlagCorrected { enabled: held };
                state.set_notice(notice.clone());
                effects.push(Effect::Notify(notice));
                effects
            } else {
                Vec::new()
            }
        }
        Msg::ToggleClicked(requested) => {
            state.clear_notice();
            toggle(&mut state, requested)
        }
        Msg::PermissionResolved { ticket, outcome } => resolve(&mut state, ticket, outcome),
        Msg::InstanceSubmitted(raw) => add_instance(&mut state, &raw),
        Msg::InstancesReset => {
            activation_info!("Resetting instance list ({} entries)", state.instances().len());
            state.set_instances(Vec::new());
            vec![Effect::PersistInstances(Vec::new())]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn toggle(state: &mut AppState, requested: bool) -> Vec<Effect> {
    state.cancel_check();
    if let Some(ticket) = state.in_flight() {
        activation_info!("Toggle to {} queued behind permission ticket {}", requested, ticket);
        state.queue_toggle(requested);
        return Vec::new();
    }

    if requested {
        enable(state)
    } else {
        disable(state)
    }
}

fn enable(state: &mut AppState) -> Vec<Effect> {
    if state.patterns().is_empty() {
        activation_info!("No instances configured; enabling without a permission prompt");
        return commit_enabled(state);
    }

    let ticket = state.begin_request();
    let request = state.permission_request();
    activation_info!(
        "Requesting {} origins and {:?} (ticket {})",
        request.origins.len(),
        request.permissions,
        ticket
    );
    vec![Effect::RequestPermissions { ticket, request }]
}

fn disable(state: &mut AppState) -> Vec<Effect> {
    let mut effects = vec![Effect::Unregister {
        handle: state.config().handle.clone(),
    }];
    if !state.patterns().is_empty() {
        effects.push(Effect::RemovePermissions {
            origins: state.patterns().to_vec(),
        });
    }
    state.commit_flag(false);
    effects.push(Effect::PersistFlag(false));
    effects
}

fn commit_enabled(state: &mut AppState) -> Vec<Effect> {
    let handle = state.config().handle.clone();
    let registration = if state.patterns().is_empty() {
        Effect::Unregister { handle }
    } else {
        Effect::Register {
            handle,
            patterns: state.patterns().to_vec(),
            descriptor: state.config().descriptor.clone(),
        }
    };
    state.commit_flag(true);
    vec![registration, Effect::PersistFlag(true)]
}

fn resolve(state: &mut AppState, ticket: Ticket, outcome: PermissionOutcome) -> Vec<Effect> {
    if !state.finish_request(ticket) {
        activation_warn!("Ignoring stale permission answer {:?} for ticket {}", outcome, ticket);
        return Vec::new();
    }

    let mut effects = match outcome {
        PermissionOutcome::Granted => {
            activation_info!("Permission granted (ticket {})", ticket);
            commit_enabled(state)
        }
        PermissionOutcome::Denied => {
            activation_info!("Permission denied (ticket {})", ticket);
            state.commit_flag(false);
            state.set_notice(Notice::PermissionDenied);
            vec![
                Effect::Unregister {
                    handle: state.config().handle.clone(),
                },
                Effect::PersistFlag(false),
                Effect::Notify(Notice::PermissionDenied),
            ]
        }
        PermissionOutcome::Dismissed => {
            activation_info!("Permission prompt dismissed (ticket {}); keeping flag", ticket);
            state.mark_dirty();
            Vec::new()
        }
    };

    if let Some(next) = state.take_queued() {
        effects.extend(toggle(state, next));
    }
    effects
}

fn add_instance(state: &mut AppState, raw: &str) -> Vec<Effect> {
    let candidate = raw.trim();
    if let Err(err) = validate_instance(candidate, state.instances()) {
        activation_warn!("Rejected instance {:?}: {}", candidate, err);
        let notice = Notice::InstanceRejected(err);
        state.set_notice(notice.clone());
        return vec![Effect::Notify(notice)];
    }

    state.clear_notice();
    state.push_instance(candidate.to_string());
    let mut effects = vec![Effect::PersistInstances(state.instances().to_vec())];
    // A grant for the old list does not cover the new host.
    effects.extend(toggle(state, true));
    effects
}
