//! Strongly-typed result of the typed analysis call
//!
//! Every section is optional; the provider only returns the sections that were
//! selected. Unknown fields are ignored so newer provider versions keep
//! deserializing.

use serde::{Deserialize, Serialize};

/// Result graph returned by the typed transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_result: Option<TypedCaption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_result: Option<TypedReadResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects_result: Option<TypedObjectsResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedCaption {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedReadResult {
    #[serde(default)]
    pub blocks: Vec<TypedBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedBlock {
    #[serde(default)]
    pub lines: Vec<TypedLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedLine {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bounding_polygon: Vec<TypedPoint>,
    #[serde(default)]
    pub words: Vec<TypedWord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedWord {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub bounding_polygon: Vec<TypedPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedObjectsResult {
    #[serde(default)]
    pub values: Vec<TypedObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedObject {
    #[serde(default)]
    pub bounding_box: TypedRect,
    #[serde(default)]
    pub tags: Vec<TypedTag>,
}

/// Axis-aligned rectangle as the typed transport reports it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedRect {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub w: i32,
    #[serde(default)]
    pub h: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedTag {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
}
