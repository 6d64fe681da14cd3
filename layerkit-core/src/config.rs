use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_STACK_NAME: &str = "CdkLayerStack";
pub const DEFAULT_ACCOUNT: &str = "664115809707";
pub const DEFAULT_REGION: &str = "eu-central-1";

/// The deployable unit these utilities ship with, bound to one account/region pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackDescriptor {
    pub name: String,
    pub account: String,
    pub region: String,
}

impl Default for StackDescriptor {
    fn default() -> Self {
        Self {
            name: DEFAULT_STACK_NAME.to_string(),
            account: DEFAULT_ACCOUNT.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl StackDescriptor {
    pub fn trace_loaded(&self) {
        info!(
            stack = %self.name,
            account = %self.account,
            region = %self.region,
            "Loaded stack descriptor"
        );
        debug!(?self, "Stack descriptor (full debug)");
    }
}
