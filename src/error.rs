//! Error types surfaced by the scene core.
//!
//! Spatial queries never fail: a miss is an empty result. Only programming or
//! domain-model mistakes (a duplicate selectable key) and bad configuration
//! produce errors.

use crate::selectables::SelectableRef;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("duplicate selectable key: {key}")]
    DuplicateKey { key: SelectableRef },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid { var: String, value: String, reason: String },
}
