//! Canonical request and response types
//!
//! These are the shapes exchanged with the thin API layer. Every response,
//! whichever transport produced it, is expressed with these types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of visual analysis a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(alias = "caption", alias = "CAPTION")]
    Caption,
    #[serde(alias = "read", alias = "READ")]
    Read,
    #[serde(alias = "objects", alias = "OBJECTS")]
    Objects,
}

impl Capability {
    /// All known capabilities in declaration order
    pub const ALL: [Capability; 3] = [Capability::Caption, Capability::Read, Capability::Objects];

    /// Lowercase token used by the REST transport
    pub fn token(&self) -> &'static str {
        match self {
            Capability::Caption => "caption",
            Capability::Read => "read",
            Capability::Objects => "objects",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Caption => "Caption",
            Capability::Read => "Read",
            Capability::Objects => "Objects",
        };
        f.write_str(name)
    }
}

/// Error returned when a capability name is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCapability(pub String);

impl fmt::Display for UnknownCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown capability '{}'", self.0)
    }
}

impl std::error::Error for UnknownCapability {}

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caption" => Ok(Capability::Caption),
            "read" => Ok(Capability::Read),
            "objects" => Ok(Capability::Objects),
            _ => Err(UnknownCapability(s.to_string())),
        }
    }
}

/// A set of requested capabilities
///
/// Keeps the order in which capabilities were first seen so that anything
/// derived from it (the REST feature list in particular) is stable for a
/// given input. Inserting a capability twice has no effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<Capability>")]
pub struct CapabilitySet {
    items: Vec<Capability>,
}

impl CapabilitySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from capability names, silently skipping names that are
    /// not recognized
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| match name.as_ref().parse::<Capability>() {
                Ok(capability) => Some(capability),
                Err(err) => {
                    tracing::debug!("Ignoring requested capability: {}", err);
                    None
                }
            })
            .collect()
    }

    /// Add a capability, returning false if it was already present
    pub fn insert(&mut self, capability: Capability) -> bool {
        if self.items.contains(&capability) {
            return false;
        }
        self.items.push(capability);
        true
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.items.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.items.iter().copied()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        let mut set = CapabilitySet::new();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(items: Vec<Capability>) -> Self {
        items.into_iter().collect()
    }
}

impl From<Vec<String>> for CapabilitySet {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<CapabilitySet> for Vec<Capability> {
    fn from(set: CapabilitySet) -> Self {
        set.items
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.items.iter().map(|c| c.to_string()).collect();
        f.write_str(&names.join(","))
    }
}

/// Which provider interface is used for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Transport {
    /// Strongly-typed call
    #[default]
    #[serde(alias = "Sdk", alias = "sdk", alias = "typed")]
    Typed,
    /// Loosely-typed JSON REST call
    #[serde(alias = "Rest", alias = "rest", alias = "rest_json")]
    RestJson,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Typed => f.write_str("typed"),
            Transport::RestJson => f.write_str("rest_json"),
        }
    }
}

/// The image handed to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Publicly reachable image URL
    Url(String),
    /// In-memory upload
    Bytes { data: Vec<u8>, content_type: String },
}

impl ImageSource {
    pub fn url(url: impl Into<String>) -> Self {
        ImageSource::Url(url.into())
    }

    pub fn bytes(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        ImageSource::Bytes {
            data,
            content_type: content_type.into(),
        }
    }
}

/// Request to analyze an image by URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeUrlRequest {
    pub url: String,
    pub requirements: CapabilitySet,
    #[serde(default, alias = "transport")]
    pub engine: Option<Transport>,
}

impl AnalyzeUrlRequest {
    pub fn new(url: impl Into<String>, requirements: CapabilitySet) -> Self {
        Self {
            url: url.into(),
            requirements,
            engine: None,
        }
    }

    pub fn with_engine(mut self, engine: Transport) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Transport to use, falling back to the typed call
    pub fn transport(&self) -> Transport {
        self.engine.unwrap_or_default()
    }
}

/// Normalized analysis result
///
/// A field is `None` exactly when its capability was not requested. Fields
/// are always serialized, so unrequested sections show up as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResponse {
    pub correlation_id: String,
    pub caption: Option<Caption>,
    pub read: Option<Vec<ReadLine>>,
    pub objects: Option<Vec<DetectedObject>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadLine {
    pub text: String,
    pub bounding_polygon: Vec<Point>,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub text: String,
    pub confidence: f64,
    pub bounding_polygon: Vec<Point>,
}

/// Pixel coordinate in the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedObject {
    pub name: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}
