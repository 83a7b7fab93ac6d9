use crate::Notice;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    /// What the checkbox shows; may lead the committed flag while a prompt is open.
    pub checkbox_checked: bool,
    pub support_enabled: bool,
    pub awaiting_permission: bool,
    pub instances: Vec<String>,
    pub patterns: Vec<String>,
    pub notice: Option<Notice>,
    pub dirty: bool,
}
