use crate::Ticket;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Settings read from the store at startup. `None` means the list was never saved.
    Loaded {
        support_enabled: bool,
        instances: Option<Vec<String>>,
    },
    /// Answer to the startup permission check.
    PermissionsChecked { ticket: Ticket, held: bool },
    /// User flipped the integration checkbox.
    ToggleClicked(bool),
    /// Broker answered a permission prompt.
    PermissionResolved {
        ticket: Ticket,
        outcome: PermissionOutcome,
    },
    /// User submitted a new instance from the text box.
    InstanceSubmitted(String),
    /// User confirmed resetting the instance list.
    InstancesReset,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// The prompt went away without an answer.
    Dismissed,
}
