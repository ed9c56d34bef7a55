//! [`CapabilityMatrix`] – which capability groups an adapter can drive.
//!
//! Every [`Intent`] belongs to exactly one [`Capability`] group (see
//! [`Intent::capability`]).  An adapter advertises a static matrix; callers
//! consult it before dispatch so a camera command is never sent to an
//! autopilot link that has no camera control.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use skyvox_types::{Capability, Intent};

/// Support flag for one capability group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilitySupport {
    pub supported: bool,
}

/// Capability group → support flag, with an entry for every group.
///
/// # Example
///
/// ```
/// use skyvox_hal::capability::CapabilityMatrix;
/// use skyvox_types::{Capability, Intent};
///
/// let matrix = CapabilityMatrix::none()
///     .grant(Capability::Flight)
///     .grant(Capability::Status);
///
/// assert!(matrix.supports_intent(Intent::Takeoff));
/// assert!(!matrix.supports_intent(Intent::ZoomIn));
/// assert!(!matrix.supports_intent(Intent::Unknown));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CapabilityMatrix {
    entries: BTreeMap<Capability, CapabilitySupport>,
}

impl CapabilityMatrix {
    /// Every group unsupported.
    pub fn none() -> Self {
        Self {
            entries: Capability::ALL
                .iter()
                .map(|c| (*c, CapabilitySupport { supported: false }))
                .collect(),
        }
    }

    /// Every group supported.
    pub fn all() -> Self {
        Capability::ALL
            .iter()
            .fold(Self::none(), |m, c| m.grant(*c))
    }

    pub fn grant(mut self, cap: Capability) -> Self {
        self.entries.insert(cap, CapabilitySupport { supported: true });
        self
    }

    pub fn revoke(mut self, cap: Capability) -> Self {
        self.entries.insert(cap, CapabilitySupport { supported: false });
        self
    }

    pub fn supports(&self, cap: Capability) -> bool {
        self.entries.get(&cap).is_some_and(|s| s.supported)
    }

    /// `false` for [`Intent::Unknown`], which has no capability group.
    pub fn supports_intent(&self, intent: Intent) -> bool {
        intent.capability().is_some_and(|c| self.supports(c))
    }

    /// Every executable intent this matrix covers.
    pub fn supported_intents(&self) -> BTreeSet<Intent> {
        Intent::ALL
            .iter()
            .copied()
            .filter(|i| self.supports_intent(*i))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        self.entries.iter().map(|(c, s)| (*c, s.supported))
    }
}
