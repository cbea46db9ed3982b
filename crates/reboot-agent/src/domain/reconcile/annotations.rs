use std::collections::BTreeMap;

use crate::config::RebootConfig;

/// What a pod's annotations ask of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootMarker {
    /// The owning deployment should be restarted.
    Requested,
    /// A reboot is already underway; nothing to do.
    InProgress,
    /// No reboot annotation present.
    Absent,
}

impl RebootMarker {
    /// Classify a pod's annotations.
    ///
    /// A reboot request wins over an in-progress marker when both are present.
    pub fn classify(annotations: &BTreeMap<String, String>, config: &RebootConfig) -> Self {
        if annotations.contains_key(&config.trigger_key) {
            Self::Requested
        } else if annotations.contains_key(&config.in_progress_key) {
            Self::InProgress
        } else {
            Self::Absent
        }
    }
}
