//! Host runtime surfaces the registrar strategies are built on.

use async_trait::async_trait;
use serde::Serialize;

use crate::RegistrarError;

/// Reports which injection primitives the running browser offers.
pub trait CapabilityProbe {
    fn has_declarative_content(&self) -> bool;
}

/// Page-change rule registry keyed by rule id.
#[async_trait]
pub trait DeclarativeContent: Send + Sync {
    /// Removing ids that are not registered succeeds.
    async fn remove_rules(&self, ids: &[String]) -> Result<(), RegistrarError>;

    async fn add_rules(&self, rules: Vec<Rule>) -> Result<(), RegistrarError>;
}

/// One-way message channel to the background runtime.
#[async_trait]
pub trait RuntimeMessenger: Send + Sync {
    async fn send_message(&self, message: serde_json::Value) -> Result<(), RegistrarError>;
}

/// Fires its actions when any condition matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: String,
    pub conditions: Vec<PageStateMatcher>,
    pub actions: Vec<RequestContentScript>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStateMatcher {
    pub page_url: UrlFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlFilter {
    pub url_matches: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContentScript {
    pub all_frames: bool,
    pub js: Vec<String>,
    pub css: Vec<String>,
}
