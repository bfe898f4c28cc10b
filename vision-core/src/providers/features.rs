//! Translation of requested capabilities into provider feature selectors
//!
//! The typed transport takes a bit-set of visual features, the REST transport
//! takes a comma-separated list of lowercase feature tokens. Both are derived
//! from the same [`CapabilitySet`].

use crate::protocol::{Capability, CapabilitySet, Transport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit-set of visual features understood by the typed transport
///
/// Bit values mirror the provider's own feature flags so the set can be
/// logged or compared against provider documentation directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualFeatures(u32);

impl VisualFeatures {
    pub const NONE: VisualFeatures = VisualFeatures(0);
    pub const TAGS: VisualFeatures = VisualFeatures(1);
    pub const CAPTION: VisualFeatures = VisualFeatures(1 << 1);
    pub const DENSE_CAPTIONS: VisualFeatures = VisualFeatures(1 << 2);
    pub const OBJECTS: VisualFeatures = VisualFeatures(1 << 3);
    pub const READ: VisualFeatures = VisualFeatures(1 << 4);
    pub const SMART_CROPS: VisualFeatures = VisualFeatures(1 << 5);
    pub const PEOPLE: VisualFeatures = VisualFeatures(1 << 6);

    /// Query tokens for each flag, in bit order
    const TOKENS: [(VisualFeatures, &'static str); 7] = [
        (Self::TAGS, "tags"),
        (Self::CAPTION, "caption"),
        (Self::DENSE_CAPTIONS, "denseCaptions"),
        (Self::OBJECTS, "objects"),
        (Self::READ, "read"),
        (Self::SMART_CROPS, "smartCrops"),
        (Self::PEOPLE, "people"),
    ];

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Set-membership test; true when every bit of `other` is set
    pub fn contains(&self, other: VisualFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    /// The flag a capability maps to
    pub fn for_capability(capability: Capability) -> VisualFeatures {
        match capability {
            Capability::Caption => Self::CAPTION,
            Capability::Read => Self::READ,
            Capability::Objects => Self::OBJECTS,
        }
    }

    /// Render the set the way the provider's query string expects it
    pub fn to_query_value(&self) -> String {
        Self::TOKENS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, token)| *token)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl BitOr for VisualFeatures {
    type Output = VisualFeatures;

    fn bitor(self, rhs: Self) -> Self::Output {
        VisualFeatures(self.0 | rhs.0)
    }
}

impl BitOrAssign for VisualFeatures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for VisualFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&self.to_query_value())
        }
    }
}

/// Transport-specific feature selector built once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFeatureSelector {
    /// Bit-set for the typed transport
    Bits(VisualFeatures),
    /// Ordered, de-duplicated lowercase tokens for the REST transport
    Tokens(Vec<&'static str>),
}

impl ProviderFeatureSelector {
    /// True when no capability was translated
    pub fn is_empty(&self) -> bool {
        match self {
            ProviderFeatureSelector::Bits(bits) => bits.is_empty(),
            ProviderFeatureSelector::Tokens(tokens) => tokens.is_empty(),
        }
    }

    /// Comma-separated form used on the wire
    pub fn to_csv(&self) -> String {
        match self {
            ProviderFeatureSelector::Bits(bits) => bits.to_query_value(),
            ProviderFeatureSelector::Tokens(tokens) => tokens.join(","),
        }
    }
}

/// Maps capability sets to provider feature selectors
pub struct FeatureTranslator;

impl FeatureTranslator {
    /// Build the selector for the given transport
    ///
    /// Never fails. An empty capability set produces an empty selector; it is
    /// up to the caller to reject such requests.
    pub fn to_selector(capabilities: &CapabilitySet, transport: Transport) -> ProviderFeatureSelector {
        match transport {
            Transport::Typed => ProviderFeatureSelector::Bits(Self::to_visual_features(capabilities)),
            Transport::RestJson => ProviderFeatureSelector::Tokens(Self::to_rest_tokens(capabilities)),
        }
    }

    /// OR together the flag of every requested capability
    pub fn to_visual_features(capabilities: &CapabilitySet) -> VisualFeatures {
        capabilities
            .iter()
            .fold(VisualFeatures::NONE, |acc, capability| {
                acc | VisualFeatures::for_capability(capability)
            })
    }

    /// Lowercase tokens in first-seen order, without duplicates
    pub fn to_rest_tokens(capabilities: &CapabilitySet) -> Vec<&'static str> {
        let mut tokens: Vec<&'static str> = Vec::with_capacity(capabilities.len());
        for capability in capabilities.iter() {
            let token = capability.token();
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Comma-joined REST feature list
    pub fn to_rest_features_csv(capabilities: &CapabilitySet) -> String {
        Self::to_rest_tokens(capabilities).join(",")
    }
}
