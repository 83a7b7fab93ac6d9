use async_trait::async_trait;

use crate::{BrokerError, PermissionSet};

/// The host runtime's grant/query/revoke permission primitives.
///
/// `request` may show a prompt and only returns once the user answered or the
/// runtime decided on its own.
#[async_trait]
pub trait PermissionBroker: Send + Sync {
    async fn contains(&self, set: &PermissionSet) -> Result<bool, BrokerError>;

    async fn request(&self, set: &PermissionSet) -> Result<bool, BrokerError>;

    /// Revokes host access for `origins`; returns whether anything was removed.
    async fn remove(&self, origins: &[String]) -> Result<bool, BrokerError>;
}
