//! Shared reply types.

use serde::{Deserialize, Serialize};

/// Reply of a mutation that only reports whether it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgedResponse {
    /// Whether the cluster acknowledged the change.
    pub acknowledged: bool,
}

impl AcknowledgedResponse {
    /// Whether the cluster acknowledged the change.
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }
}
