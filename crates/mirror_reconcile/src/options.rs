//! Reconciliation options.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of names listed per preview line.
pub const DEFAULT_PREVIEW_LIMIT: usize = 50;

/// Default wait for a confirmation decision, in seconds.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 180;

/// Knobs for planning, previewing and confirming a reconciliation.
///
/// Deserializes from the `[reconcile]` configuration section; absent keys
/// take their defaults.
///
/// # Examples
///
/// ```
/// use mirror_reconcile::ReconcileOptions;
///
/// let options = ReconcileOptions::builder()
///     .delete_missing_roles(false)
///     .build()
///     .unwrap();
/// assert!(!options.delete_missing_roles());
/// assert_eq!(*options.preview_limit(), 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(default)]
#[builder(default)]
pub struct ReconcileOptions {
    /// Delete target roles whose name is absent from the snapshot
    delete_missing_roles: bool,
    /// Treat permission bitfield drift as a role update
    compare_role_permissions: bool,
    /// Names listed per preview line before truncating
    preview_limit: usize,
    /// Seconds to wait for a confirmation decision
    confirmation_timeout_secs: u64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            delete_missing_roles: true,
            compare_role_permissions: true,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

impl ReconcileOptions {
    /// Creates a new options builder starting from the defaults.
    pub fn builder() -> ReconcileOptionsBuilder {
        ReconcileOptionsBuilder::default()
    }

    /// Confirmation wait as a [`Duration`].
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}
