use crate::effect::{Notice, PermissionRequest};
use crate::patterns::derive_patterns;
use crate::view_model::AppViewModel;
use crate::ActivationConfig;

/// Identifies one permission round trip so late answers can be told apart.
pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    config: ActivationConfig,
    support_enabled: bool,
    instances: Vec<String>,
    patterns: Vec<String>,
    next_ticket: Ticket,
    pending_check: Option<Ticket>,
    in_flight: Option<Ticket>,
    queued: Option<bool>,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new(config: ActivationConfig) -> Self {
        let instances = config.default_instances.clone();
        let patterns = derive_patterns(&instances);
        Self {
            config,
            instances,
            patterns,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let checkbox_checked = self
            .queued
            .or(self.in_flight.map(|_| true))
            .unwrap_or(self.support_enabled);
        AppViewModel {
            checkbox_checked,
            support_enabled: self.support_enabled,
            awaiting_permission: self.in_flight.is_some(),
            instances: self.instances.clone(),
            patterns: self.patterns.clone(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the mark.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    pub fn support_enabled(&self) -> bool {
        self.support_enabled
    }

    pub fn instances(&self) -> &[String] {
        &self.instances
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn awaiting_permission(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(crate) fn permission_request(&self) -> PermissionRequest {
        PermissionRequest {
            origins: self.patterns.clone(),
            permissions: self.config.strategy.extra_permissions(),
        }
    }

    pub(crate) fn load(&mut self, support_enabled: bool, instances: Option<Vec<String>>) {
        self.support_enabled = support_enabled;
        let instances = instances.unwrap_or_else(|| self.config.default_instances.clone());
        self.set_instances(instances);
    }

    pub(crate) fn set_instances(&mut self, instances: Vec<String>) {
        self.patterns = derive_patterns(&instances);
        self.instances = instances;
        self.dirty = true;
    }

    pub(crate) fn push_instance(&mut self, instance: String) {
        let mut instances = std::mem::take(&mut self.instances);
        instances.push(instance);
        self.set_instances(instances);
    }

    pub(crate) fn commit_flag(&mut self, enabled: bool) {
        self.support_enabled = enabled;
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.dirty = true;
    }

    pub(crate) fn clear_notice(&mut self) {
        if self.notice.take().is_some() {
            self.dirty = true;
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }

    pub(crate) fn begin_check(&mut self) -> Ticket {
        let ticket = self.issue_ticket();
        self.pending_check = Some(ticket);
        ticket
    }

    /// Consumes the pending startup check if `ticket` is the one still awaited.
    pub(crate) fn take_check(&mut self, ticket: Ticket) -> bool {
        if self.pending_check == Some(ticket) {
            self.pending_check = None;
            true
        } else {
            false
        }
    }

    /// A user decision supersedes whatever the startup check would report.
    pub(crate) fn cancel_check(&mut self) {
        self.pending_check = None;
    }

    pub(crate) fn begin_request(&mut self) -> Ticket {
        let ticket = self.issue_ticket();
        self.in_flight = Some(ticket);
        self.dirty = true;
        ticket
    }

    pub(crate) fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    /// Closes the outstanding request if `ticket` matches it.
    pub(crate) fn finish_request(&mut self, ticket: Ticket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn queue_toggle(&mut self, requested: bool) {
        self.queued = Some(requested);
        self.dirty = true;
    }

    pub(crate) fn take_queued(&mut self) -> Option<bool> {
        self.queued.take()
    }
}
