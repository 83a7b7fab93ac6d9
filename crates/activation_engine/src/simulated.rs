//! In-process stand-in for the browser runtime.
//!
//! Keeps granted permissions, declarative rules and message-registered content
//! scripts in memory so the whole activation flow can run headless.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use activation_logging::{activation_debug, activation_warn};
use async_trait::async_trait;
use serde_json::Value;

use crate::host::{CapabilityProbe, DeclarativeContent, Rule, RuntimeMessenger};
use crate::{BrokerError, PermissionBroker, PermissionSet, RegistrarError};

/// How the simulated user answers a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptAnswer {
    #[default]
    Grant,
    Deny,
    Dismiss,
}

/// A content script registered through runtime messages.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRegistration {
    pub all_frames: bool,
    pub js: Vec<String>,
    pub css: Vec<String>,
    pub matches: Vec<String>,
}

#[derive(Default)]
struct SimState {
    origins: BTreeSet<String>,
    permissions: BTreeSet<String>,
    answers: VecDeque<PromptAnswer>,
    default_answer: PromptAnswer,
    prompts: Vec<PermissionSet>,
    rules: BTreeMap<String, Rule>,
    scripts: BTreeMap<String, MessageRegistration>,
    overlapping_registrations: usize,
}

pub struct SimulatedRuntime {
    declarative: bool,
    state: Mutex<SimState>,
}

impl SimulatedRuntime {
    /// A browser with declarative content rules.
    pub fn declarative(default_answer: PromptAnswer) -> Self {
        Self::new(true, default_answer)
    }

    /// A browser that registers content scripts through its background runtime.
    pub fn message_based(default_answer: PromptAnswer) -> Self {
        Self::new(false, default_answer)
    }

    fn new(declarative: bool, default_answer: PromptAnswer) -> Self {
        Self {
            declarative,
            state: Mutex::new(SimState {
                default_answer,
                ..SimState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answers used for the next prompts, before falling back to the default.
    pub fn queue_answers(&self, answers: impl IntoIterator<Item = PromptAnswer>) {
        self.lock().answers.extend(answers);
    }

    pub fn set_default_answer(&self, answer: PromptAnswer) {
        self.lock().default_answer = answer;
    }

    /// Grants without prompting, as if allowed in an earlier session.
    pub fn pre_grant(&self, set: &PermissionSet) {
        let mut state = self.lock();
        state.origins.extend(set.origins.iter().cloned());
        state.permissions.extend(set.permissions.iter().cloned());
    }

    /// Drops every grant, as the user can do from the browser's own settings.
    pub fn revoke_everything(&self) {
        let mut state = self.lock();
        state.origins.clear();
        state.permissions.clear();
    }

    pub fn prompts(&self) -> Vec<PermissionSet> {
        self.lock().prompts.clone()
    }

    pub fn granted_origins(&self) -> Vec<String> {
        self.lock().origins.iter().cloned().collect()
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.lock().rules.values().cloned().collect()
    }

    pub fn content_scripts(&self) -> BTreeMap<String, MessageRegistration> {
        self.lock().scripts.clone()
    }

    /// Live registrations across both mechanisms.
    pub fn active_registrations(&self) -> usize {
        let state = self.lock();
        state.rules.len() + state.scripts.len()
    }

    /// Register messages that arrived while the id was still registered.
    pub fn overlapping_registrations(&self) -> usize {
        self.lock().overlapping_registrations
    }
}

impl SimState {
    fn holds(&self, set: &PermissionSet) -> bool {
        set.origins.iter().all(|origin| self.origins.contains(origin))
            && set
                .permissions
                .iter()
                .all(|permission| self.permissions.contains(permission))
    }
}

impl CapabilityProbe for SimulatedRuntime {
    fn has_declarative_content(&self) -> bool {
        self.declarative
    }
}

#[async_trait]
impl PermissionBroker for SimulatedRuntime {
    async fn contains(&self, set: &PermissionSet) -> Result<bool, BrokerError> {
        Ok(self.lock().holds(set))
    }

    async fn request(&self, set: &PermissionSet) -> Result<bool, BrokerError> {
        let mut state = self.lock();
        if state.holds(set) {
            return Ok(true);
        }
        state.prompts.push(set.clone());
        let answer = state.answers.pop_front().unwrap_or(state.default_answer);
        activation_debug!("Simulated prompt answered {:?}", answer);
        match answer {
            PromptAnswer::Grant => {
                state.origins.extend(set.origins.iter().cloned());
                state.permissions.extend(set.permissions.iter().cloned());
                Ok(true)
            }
            PromptAnswer::Deny => Ok(false),
            PromptAnswer::Dismiss => Err(BrokerError::Dismissed),
        }
    }

    async fn remove(&self, origins: &[String]) -> Result<bool, BrokerError> {
        let mut state = self.lock();
        let mut removed = false;
        for origin in origins {
            removed |= state.origins.remove(origin);
        }
        Ok(removed)
    }
}

#[async_trait]
impl DeclarativeContent for SimulatedRuntime {
    async fn remove_rules(&self, ids: &[String]) -> Result<(), RegistrarError> {
        if !self.declarative {
            return Err(RegistrarError::Runtime(
                "declarativeContent is not available".to_string(),
            ));
        }
        let mut state = self.lock();
        for id in ids {
            state.rules.remove(id);
        }
        Ok(())
    }

    async fn add_rules(&self, rules: Vec<Rule>) -> Result<(), RegistrarError> {
        if !self.declarative {
            return Err(RegistrarError::Runtime(
                "declarativeContent is not available".to_string(),
            ));
        }
        let mut state = self.lock();
        if let Some(rule) = rules.iter().find(|rule| state.rules.contains_key(&rule.id)) {
            return Err(RegistrarError::Runtime(format!("duplicate rule id {}", rule.id)));
        }
        for rule in rules {
            state.rules.insert(rule.id.clone(), rule);
        }
        Ok(())
    }
}

fn files(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("file").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl RuntimeMessenger for SimulatedRuntime {
    async fn send_message(&self, message: Value) -> Result<(), RegistrarError> {
        let kind = message.get("message").and_then(Value::as_str);
        let id = message
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| RegistrarError::Runtime("message without id".to_string()))?
            .to_string();
        let mut state = self.lock();
        match kind {
            Some("registerContentScript") => {
                let registration = MessageRegistration {
                    all_frames: message
                        .get("allFrames")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                    js: files(&message["js"]),
                    css: files(&message["css"]),
                    matches: strings(&message["matches"]),
                };
                if state.scripts.insert(id, registration).is_some() {
                    state.overlapping_registrations += 1;
                }
                Ok(())
            }
            Some("unregisterContentScript") => {
                state.scripts.remove(&id);
                Ok(())
            }
            other => {
                activation_warn!("Simulated runtime ignored message {:?}", other);
                Err(RegistrarError::Runtime(format!("unknown message {other:?}")))
            }
        }
    }
}
