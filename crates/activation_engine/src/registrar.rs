use std::sync::Arc;

use activation_logging::{activation_debug, activation_info, activation_warn};
use async_trait::async_trait;
use serde::Serialize;

use crate::host::{
    CapabilityProbe, DeclarativeContent, PageStateMatcher, RequestContentScript, Rule,
    RuntimeMessenger, UrlFilter,
};
use crate::{RegistrarError, RegistrarKind, ScriptBundle};

/// Attaches a script bundle to pages matching a pattern list, under one handle.
///
/// Both calls are idempotent: registering twice leaves one live registration,
/// and unregistering an unknown handle succeeds.
#[async_trait]
pub trait InjectionRegistrar: Send + Sync {
    fn kind(&self) -> RegistrarKind;

    async fn register(
        &self,
        handle: &str,
        patterns: &[String],
        bundle: &ScriptBundle,
    ) -> Result<(), RegistrarError>;

    async fn unregister(&self, handle: &str) -> Result<(), RegistrarError>;
}

/// Picks the registrar for this browser. Call once at startup.
pub fn select_registrar<H>(host: Arc<H>) -> Box<dyn InjectionRegistrar>
where
    H: CapabilityProbe + DeclarativeContent + RuntimeMessenger + 'static,
{
    if host.has_declarative_content() {
        activation_info!("Using declarative content rules for injection");
        Box::new(DeclarativeRegistrar::new(host))
    } else {
        activation_info!("Using runtime content script messages for injection");
        Box::new(MessageRegistrar::new(host))
    }
}

pub struct DeclarativeRegistrar {
    rules: Arc<dyn DeclarativeContent>,
}

impl DeclarativeRegistrar {
    pub fn new(rules: Arc<dyn DeclarativeContent>) -> Self {
        Self { rules }
    }

    async fn remove_quietly(&self, handle: &str) {
        if let Err(err) = self.rules.remove_rules(&[handle.to_string()]).await {
            activation_warn!("Ignoring rule removal failure for {}: {}", handle, err);
        }
    }
}

/// One OR-ed page matcher per pattern, one action carrying the bundle.
pub fn build_rule(handle: &str, patterns: &[String], bundle: &ScriptBundle) -> Rule {
    Rule {
        id: handle.to_string(),
        conditions: patterns
            .iter()
            .map(|pattern| PageStateMatcher {
                page_url: UrlFilter {
                    url_matches: pattern.clone(),
                },
            })
            .collect(),
        actions: vec![RequestContentScript {
            all_frames: bundle.all_frames,
            js: bundle.js.clone(),
            css: bundle.css.clone(),
        }],
    }
}

#[async_trait]
impl InjectionRegistrar for DeclarativeRegistrar {
    fn kind(&self) -> RegistrarKind {
        RegistrarKind::Declarative
    }

    async fn register(
        &self,
        handle: &str,
        patterns: &[String],
        bundle: &ScriptBundle,
    ) -> Result<(), RegistrarError> {
        // Replace, never append.
        self.remove_quietly(handle).await;
        let rule = build_rule(handle, patterns, bundle);
        activation_debug!(
            "Adding rule {} with {} conditions",
            rule.id,
            rule.conditions.len()
        );
        self.rules.add_rules(vec![rule]).await
    }

    async fn unregister(&self, handle: &str) -> Result<(), RegistrarError> {
        self.remove_quietly(handle).await;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    pub file: String,
}

/// Wire messages understood by the background script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "message")]
pub enum ScriptMessage {
    #[serde(rename = "registerContentScript", rename_all = "camelCase")]
    Register {
        id: String,
        all_frames: bool,
        js: Vec<FileRef>,
        css: Vec<FileRef>,
        matches: Vec<String>,
    },
    #[serde(rename = "unregisterContentScript")]
    Unregister { id: String },
}

impl ScriptMessage {
    pub fn register(handle: &str, patterns: &[String], bundle: &ScriptBundle) -> Self {
        ScriptMessage::Register {
            id: handle.to_string(),
            all_frames: bundle.all_frames,
            js: file_refs(&bundle.js),
            css: file_refs(&bundle.css),
            matches: patterns.to_vec(),
        }
    }
}

fn file_refs(paths: &[String]) -> Vec<FileRef> {
    paths
        .iter()
        .map(|file| FileRef { file: file.clone() })
        .collect()
}

pub struct MessageRegistrar {
    messenger: Arc<dyn RuntimeMessenger>,
}

impl MessageRegistrar {
    pub fn new(messenger: Arc<dyn RuntimeMessenger>) -> Self {
        Self { messenger }
    }

    async fn send(&self, message: &ScriptMessage) -> Result<(), RegistrarError> {
        let value =
            serde_json::to_value(message).map_err(|err| RegistrarError::Encode(err.to_string()))?;
        self.messenger.send_message(value).await
    }
}

#[async_trait]
impl InjectionRegistrar for MessageRegistrar {
    fn kind(&self) -> RegistrarKind {
        RegistrarKind::Message
    }

    async fn register(
        &self,
        handle: &str,
        patterns: &[String],
        bundle: &ScriptBundle,
    ) -> Result<(), RegistrarError> {
        self.unregister(handle).await?;
        activation_debug!("Registering content scripts {} for {} patterns", handle, patterns.len());
        self.send(&ScriptMessage::register(handle, patterns, bundle))
            .await
    }

    async fn unregister(&self, handle: &str) -> Result<(), RegistrarError> {
        let message = ScriptMessage::Unregister {
            id: handle.to_string(),
        };
        if let Err(err) = self.send(&message).await {
            activation_warn!("Ignoring unregister failure for {}: {}", handle, err);
        }
        Ok(())
    }
}
