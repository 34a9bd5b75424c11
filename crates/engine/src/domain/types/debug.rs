use std::collections::BTreeSet;

/// Global development-only relaxation parsed from `<debug-overrides>`.
///
/// A single `override_pins` flag applies to every connection, where the
/// platform format allows one per `<certificates>` bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugOverride {
    override_pins: bool,
    trust_anchors: BTreeSet<Vec<u8>>,
}

impl DebugOverride {
    /// `trust_anchors` are DER-encoded certificates.
    pub fn new<I>(override_pins: bool, trust_anchors: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            override_pins,
            trust_anchors: trust_anchors.into_iter().collect(),
        }
    }

    pub fn override_pins(&self) -> bool {
        self.override_pins
    }

    pub fn trust_anchors(&self) -> &BTreeSet<Vec<u8>> {
        &self.trust_anchors
    }

    /// Chains anchored to one of the debug trust anchors skip pin checks.
    pub fn bypasses_pins(&self) -> bool {
        self.override_pins && !self.trust_anchors.is_empty()
    }
}
