/// Store key of the persisted feature flag.
pub const SUPPORT_KEY: &str = "supportInvidious";
/// Store key of the persisted instance list.
pub const INSTANCES_KEY: &str = "invidiousInstances";
/// Name of the single injection registration.
pub const REGISTRATION_HANDLE: &str = "invidious";

/// Extra capability the declarative-rule platform must hold besides host access.
pub const DECLARATIVE_CONTENT_PERMISSION: &str = "declarativeContent";

/// Instances used when the store has no list yet.
pub const DEFAULT_INSTANCES: &[&str] = &["invidio.us", "invidiou.sh", "invidious.snopyta.org"];

/// How content scripts get attached to matching pages on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjectionStrategy {
    /// Page-matcher rules that request the scripts when a page matches.
    #[default]
    DeclarativeRules,
    /// The background runtime registers content scripts on request.
    RuntimeMessage,
}

impl InjectionStrategy {
    /// Non-host permissions that must be requested along with the patterns.
    pub fn extra_permissions(self) -> Vec<String> {
        match self {
            InjectionStrategy::DeclarativeRules => {
                vec![DECLARATIVE_CONTENT_PERMISSION.to_string()]
            }
            InjectionStrategy::RuntimeMessage => Vec::new(),
        }
    }
}

/// Fixed script and style bundle injected into matching pages.
///
/// Script order is load order; later files rely on state set up by earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionDescriptor {
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub all_frames: bool,
}

impl Default for InjectionDescriptor {
    fn default() -> Self {
        Self {
            scripts: [
                "config.js",
                "utils/previewBar.js",
                "utils/skipNotice.js",
                "utils.js",
                "content.js",
                "popup.js",
            ]
            .into_iter()
            .map(ToOwned::to_owned)
            .collect(),
            styles: ["content.css", "./libs/Source+Sans+Pro.css", "popup.css"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
            all_frames: true,
        }
    }
}

/// Construction-time context for the activation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationConfig {
    pub handle: String,
    pub strategy: InjectionStrategy,
    pub descriptor: InjectionDescriptor,
    pub default_instances: Vec<String>,
}

impl ActivationConfig {
    pub fn new(strategy: InjectionStrategy) -> Self {
        Self {
            handle: REGISTRATION_HANDLE.to_string(),
            strategy,
            descriptor: InjectionDescriptor::default(),
            default_instances: DEFAULT_INSTANCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self::new(InjectionStrategy::default())
    }
}
