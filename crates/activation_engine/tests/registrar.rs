use std::sync::{Arc, Once};

use activation_engine::host::{PageStateMatcher, RequestContentScript, Rule, UrlFilter};
use activation_engine::{
    select_registrar, DeclarativeRegistrar, InjectionRegistrar, MessageRegistrar, PromptAnswer,
    RegistrarKind, ScriptBundle, ScriptMessage, SimulatedRuntime,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(activation_logging::initialize_for_tests);
}

fn bundle() -> ScriptBundle {
    ScriptBundle {
        js: vec![
            "config.js".to_string(),
            "utils/previewBar.js".to_string(),
            "content.js".to_string(),
        ],
        css: vec!["content.css".to_string(), "popup.css".to_string()],
        all_frames: true,
    }
}

fn patterns() -> Vec<String> {
    vec![
        "https://*.siteA.com/*".to_string(),
        "http://*.siteA.com/*".to_string(),
    ]
}

#[test]
fn probe_selects_strategy_once() {
    init_logging();
    let chromium = Arc::new(SimulatedRuntime::declarative(PromptAnswer::Grant));
    let firefox = Arc::new(SimulatedRuntime::message_based(PromptAnswer::Grant));

    assert_eq!(select_registrar(chromium).kind(), RegistrarKind::Declarative);
    assert_eq!(select_registrar(firefox).kind(), RegistrarKind::Message);
}

#[tokio::test]
async fn declarative_register_builds_one_rule_per_handle() {
    init_logging();
    let runtime = Arc::new(SimulatedRuntime::declarative(PromptAnswer::Grant));
    let registrar = DeclarativeRegistrar::new(runtime.clone());

    registrar
        .register("invidious", &patterns(), &bundle())
        .await
        .expect("register");

    assert_eq!(
        runtime.rules(),
        vec![Rule {
            id: "invidious".to_string(),
            conditions: patterns()
                .into_iter()
                .map(|pattern| PageStateMatcher {
                    page_url: UrlFilter {
                        url_matches: pattern
                    },
                })
                .collect(),
            actions: vec![RequestContentScript {
                all_frames: true,
                js: bundle().js,
                css: bundle().css,
            }],
        }]
    );
}

#[tokio::test]
async fn declarative_register_twice_replaces_rule() {
    init_logging();
    let runtime = Arc::new(SimulatedRuntime::declarative(PromptAnswer::Grant));
    let registrar = DeclarativeRegistrar::new(runtime.clone());

    registrar
        .register("invidious", &patterns(), &bundle())
        .await
        .expect("first register");
    let wider = vec!["https://*.siteB.com/*".to_string()];
    registrar
        .register("invidious", &wider, &bundle())
        .await
        .expect("second register");

    let rules = runtime.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].conditions.len(), 1);
    assert_eq!(rules[0].conditions[0].page_url.url_matches, wider[0]);
}

#[tokio::test]
async fn unregister_without_registration_is_ok() {
    init_logging();
    let chromium = Arc::new(SimulatedRuntime::declarative(PromptAnswer::Grant));
    let firefox = Arc::new(SimulatedRuntime::message_based(PromptAnswer::Grant));

    DeclarativeRegistrar::new(chromium.clone())
        .unregister("invidious")
        .await
        .expect("declarative unregister");
    MessageRegistrar::new(firefox.clone())
        .unregister("invidious")
        .await
        .expect("message unregister");

    assert_eq!(chromium.active_registrations(), 0);
    assert_eq!(firefox.active_registrations(), 0);
}

#[tokio::test]
async fn runtime_failures_on_removal_are_swallowed() {
    init_logging();
    // A message-only browser rejects every declarative call.
    let firefox = Arc::new(SimulatedRuntime::message_based(PromptAnswer::Grant));

    let result = DeclarativeRegistrar::new(firefox).unregister("invidious").await;

    assert_eq!(result, Ok(()));
}

#[test]
fn register_message_matches_runtime_wire_format() {
    let message = ScriptMessage::register("invidious", &patterns(), &bundle());

    assert_eq!(
        serde_json::to_value(&message).expect("encode"),
        json!({
            "message": "registerContentScript",
            "id": "invidious",
            "allFrames": true,
            "js": [
                {"file": "config.js"},
                {"file": "utils/previewBar.js"},
                {"file": "content.js"},
            ],
            "css": [{"file": "content.css"}, {"file": "popup.css"}],
            "matches": ["https://*.siteA.com/*", "http://*.siteA.com/*"],
        })
    );
    assert_eq!(
        serde_json::to_value(ScriptMessage::Unregister {
            id: "invidious".to_string()
        })
        .expect("encode"),
        json!({"message": "unregisterContentScript", "id": "invidious"})
    );
}

#[tokio::test]
async fn message_register_twice_never_overlaps() {
    init_logging();
    let runtime = Arc::new(SimulatedRuntime::message_based(PromptAnswer::Grant));
    let registrar = MessageRegistrar::new(runtime.clone());

    for _ in 0..2 {
        registrar
            .register("invidious", &patterns(), &bundle())
            .await
            .expect("register");
    }

    let scripts = runtime.content_scripts();
    assert_eq!(scripts.len(), 1);
    let registration = &scripts["invidious"];
    assert!(registration.all_frames);
    assert_eq!(registration.js, bundle().js);
    assert_eq!(registration.css, bundle().css);
    assert_eq!(registration.matches, patterns());
    assert_eq!(runtime.overlapping_registrations(), 0);

    registrar.unregister("invidious").await.expect("unregister");
    assert_eq!(runtime.active_registrations(), 0);
}
