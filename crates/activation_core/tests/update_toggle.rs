use std::sync::Once;

use activation_core::{
    update, ActivationConfig, AppState, Effect, InjectionDescriptor, InjectionStrategy, Msg,
    Notice, PermissionOutcome, PermissionRequest, Ticket,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(activation_logging::initialize_for_tests);
}

fn loaded(strategy: InjectionStrategy, enabled: bool, instances: &[&str]) -> AppState {
    let state = AppState::new(ActivationConfig::new(strategy));
    let (state, _) = update(
        state,
        Msg::Loaded {
            support_enabled: enabled,
            instances: Some(instances.iter().map(|s| s.to_string()).collect()),
        },
    );
    state
}

fn requested_ticket(effects: &[Effect]) -> Ticket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::RequestPermissions { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("permission request effect")
}

fn site_a_patterns() -> Vec<String> {
    vec![
        "https://*.siteA.com/*".to_string(),
        "http://*.siteA.com/*".to_string(),
    ]
}

#[test]
fn enabling_requests_patterns_plus_declarative_capability() {
    init_logging();
    let state = loaded(InjectionStrategy::DeclarativeRules, false, &["siteA.com"]);

    let (next, effects) = update(state, Msg::ToggleClicked(true));
    let ticket = requested_ticket(&effects);

    assert_eq!(
        effects,
        vec![Effect::RequestPermissions {
            ticket,
            request: PermissionRequest {
                origins: site_a_patterns(),
                permissions: vec!["declarativeContent".to_string()],
            },
        }]
    );
    // Not committed before the grant arrives.
    assert!(!next.support_enabled());
    assert!(next.view().checkbox_checked);
    assert!(next.view().awaiting_permission);
}

#[test]
fn message_platform_requests_no_extra_capability() {
    init_logging();
    let state = loaded(InjectionStrategy::RuntimeMessage, false, &["siteA.com"]);

    let (_next, effects) = update(state, Msg::ToggleClicked(true));

    match &effects[..] {
        [Effect::RequestPermissions { request, .. }] => {
            assert!(request.permissions.is_empty());
            assert_eq!(request.origins, site_a_patterns());
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn grant_registers_then_persists_flag() {
    init_logging();
    let state = loaded(InjectionStrategy::DeclarativeRules, false, &["siteA.com"]);
    let (state, effects) = update(state, Msg::ToggleClicked(true));
    let ticket = requested_ticket(&effects);

    let (next, effects) = update(
        state,
        Msg::PermissionResolved {
            ticket,
            outcome: PermissionOutcome::Granted,
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::Register {
                handle: "invidious".to_string(),
                patterns: site_a_patterns(),
                descriptor: InjectionDescriptor::default(),
            },
            Effect::PersistFlag(true),
        ]
    );
    assert!(next.support_enabled());
    assert!(!next.view().awaiting_permission);
}

#[test]
fn denial_forces_flag_false_and_clears_registration() {
    init_logging();
    // Start from a stored `true` to show denial wins regardless of prior state.
    let state = loaded(InjectionStrategy::DeclarativeRules, true, &["siteA.com"]);
    let (state, effects) = update(state, Msg::ToggleClicked(true));
    let ticket = requested_ticket(&effects);

    let (next, effects) = update(
        state,
        Msg::PermissionResolved {
            ticket,
            outcome: PermissionOutcome::Denied,
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::Unregister {
                handle: "invidious".to_string()
            },
            Effect::PersistFlag(false),
            Effect::Notify(Notice::PermissionDenied),
        ]
    );
    let view = next.view();
    assert!(!view.support_enabled);
    assert!(!view.checkbox_checked);
    assert_eq!(view.notice, Some(Notice::PermissionDenied));
}

#[test]
fn later_grant_clears_denial_notice() {
    init_logging();
    let state = loaded(InjectionStrategy::DeclarativeRules, false, &["siteA.com"]);
    let (state, effects) = update(state, Msg::ToggleClicked(true));
    let ticket = requested_ticket(&effects);
    let (state, _) = update(
        state,
        Msg::PermissionResolved {
            ticket,
            outcome: PermissionOutcome::Denied,
        },
    );
    assert_eq!(state.view().notice, Some(Notice::PermissionDenied));

    let (state, effects) = update(state, Msg::ToggleClicked(true));
    let ticket = requested_ticket(&effects);
    let (next, _) = update(
        state,
        Msg::PermissionResolved {
            ticket,
            outcome: PermissionOutcome::Granted,
        },
    );

    let view = next.view();
    assert!(view.support_enabled);
    assert_eq!(view.notice, None);
}

#[test]
fn dismissed_prompt_keeps_prior_flag() {
    init_logging();
    let state = loaded(InjectionStrategy::DeclarativeRules, false, &["siteA.com"]);
    let (state, effects) = update(state, Msg::ToggleClicked(true));
    let ticket = requested_ticket(&effects);

    let (next, effects) = update(
        state,
        Msg::PermissionResolved {
            ticket,
            outcome: PermissionOutcome::Dismissed,
        },
    );

    assert!(effects.is_empty());
    assert!(!next.support_enabled());
    assert!(!next.view().checkbox_checked);
}

#[test]
fn disabling_unregisters_revokes_and_persists() {
    init_logging();
    let state = loaded(InjectionStrategy::RuntimeMessage, true, &["siteA.com"]);

    let (next, effects) = update(state, Msg::ToggleClicked(false));

    assert_eq!(
        effects,
        vec![
            Effect::Unregister {
                handle: "invidious".to_string()
            },
            Effect::RemovePermissions {
                origins: site_a_patterns()
            },
            Effect::PersistFlag(false),
        ]
    );
    assert!(!next.support_enabled());
}

#[test]
fn empty_pattern_set_enables_without_prompt() {
    init_logging();
    let state = loaded(InjectionStrategy::DeclarativeRules, false, &[]);

    let (next, effects) = update(state, Msg::ToggleClicked(true));

    assert_eq!(
        effects,
        vec![
            Effect::Unregister {
                handle: "invidious".to_string()
            },
            Effect::PersistFlag(true),
        ]
    );
    assert!(next.support_enabled());

    let (next, effects) = update(next, Msg::ToggleClicked(false));
    assert_eq!(
        effects,
        vec![
            Effect::Unregister {
                handle: "invidious".to_string()
            },
            Effect::PersistFlag(false),
        ]
    );
    assert!(!next.support_enabled());
}

#[test]
fn toggles_during_prompt_are_queued_latest_wins() {
    init_logging();
    let state = loaded(InjectionStrategy::DeclarativeRules, false, &["siteA.com"]);
    let (state, effects) = update(state, Msg::ToggleClicked(true));
    let ticket = requested_ticket(&effects);

    let (state, effects) = update(state, Msg::ToggleClicked(false));
    assert!(effects.is_empty());
    assert!(!state.view().checkbox_checked);
    let (state, effects) = update(state, Msg::ToggleClicked(true));
    assert!(effects.is_empty());
    assert!(state.view().checkbox_checked);
    let (state, effects) = update(state, Msg::ToggleClicked(false));
    assert!(effects.is_empty());

    let (next, effects) = update(
        state,
        Msg::PermissionResolved {
            ticket,
            outcome: PermissionOutcome::Granted,
        },
    );

    // The grant is applied first, then the queued disable tears it down again.
    assert_eq!(
        effects,
        vec![
            Effect::Register {
                handle: "invidious".to_string(),
                patterns: site_a_patterns(),
                descriptor: InjectionDescriptor::default(),
            },
            Effect::PersistFlag(true),
            Effect::Unregister {
                handle: "invidious".to_string()
            },
            Effect::RemovePermissions {
                origins: site_a_patterns()
            },
            Effect::PersistFlag(false),
        ]
    );
    assert!(!next.support_enabled());
    assert!(!next.view().awaiting_permission);
}

#[test]
fn stale_answer_cannot_override_newer_request() {
    init_logging();
    let state = loaded(InjectionStrategy::DeclarativeRules, false, &["siteA.com"]);
    let (state, effects) = update(state, Msg::ToggleClicked(true));
    let first = requested_ticket(&effects);
    let (state, _) = update(
        state,
        Msg::PermissionResolved {
            ticket: first,
            outcome: PermissionOutcome::Granted,
        },
    );
    let (state, effects) = update(state, Msg::InstanceSubmitted("siteB.org".to_string()));
    let second = requested_ticket(&effects);
    assert_ne!(first, second);

    // A duplicate delivery of the first answer arrives late.
    let (state, effects) = update(
        state,
        Msg::PermissionResolved {
            ticket: first,
            outcome: PermissionOutcome::Denied,
        },
    );
    assert!(effects.is_empty());
    assert!(state.support_enabled());
    assert!(state.view().awaiting_permission);

    let (next, effects) = update(
        state,
        Msg::PermissionResolved {
            ticket: second,
            outcome: PermissionOutcome::Granted,
        },
    );
    assert_eq!(effects.len(), 2);
    assert!(next.support_enabled());
}

#[test]
fn on_off_cycles_converge_to_same_state() {
    init_logging();
    let mut state = loaded(InjectionStrategy::DeclarativeRules, false, &["siteA.com"]);
    let mut finals = Vec::new();

    for _ in 0..2 {
        for _ in 0..2 {
            let (next, effects) = update(state, Msg::ToggleClicked(true));
            let ticket = requested_ticket(&effects);
            let (next, _) = update(
                next,
                Msg::PermissionResolved {
                    ticket,
                    outcome: PermissionOutcome::Granted,
                },
            );
            let (next, effects) = update(next, Msg::ToggleClicked(false));
            assert_eq!(effects.last(), Some(&Effect::PersistFlag(false)));
            state = next;
        }
        let view = state.view();
        finals.push((view.support_enabled, view.checkbox_checked, view.awaiting_permission));
    }

    assert_eq!(finals, vec![(false, false, false), (false, false, false)]);
}
