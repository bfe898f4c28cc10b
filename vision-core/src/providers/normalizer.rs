//! Conversion of raw provider results into [`CanonicalResponse`]
//!
//! Both transports feed the same dispatch. Each section is produced only if
//! its capability was requested; a requested section the provider left out
//! becomes an empty list (read, objects) or `None` (caption). Unexpected REST
//! shapes never fail the request; they degrade to empty values.

use crate::protocol::{
    BoundingBox, CanonicalResponse, Capability, CapabilitySet, Caption, DetectedObject, Point,
    ReadLine, Word,
};
use crate::providers::typed::{TypedObject, TypedPoint, TypedResult};
use serde_json::Value;
use tracing::debug;

/// Name given to detected objects that carry no tag
pub const UNKNOWN_OBJECT_NAME: &str = "unknown";

/// Raw result of one provider call, tagged by the transport that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum RawAnalysis {
    /// Deserialized result of the typed call
    Typed(TypedResult),
    /// Untouched JSON document from the REST call
    Rest(Value),
}

impl RawAnalysis {
    pub fn shape_name(&self) -> &'static str {
        match self {
            RawAnalysis::Typed(_) => "typed",
            RawAnalysis::Rest(_) => "rest",
        }
    }
}

/// Which of the two REST read layouts a document uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestReadShape {
    /// `readResult.blocks[].lines[]`, text under `text`, polygon under
    /// `boundingPolygon`
    Blocks,
    /// `readResult.pages[].lines[]`, text under `content`, polygon under
    /// `boundingBox`
    Pages,
    /// Neither layout present
    Absent,
}

impl RestReadShape {
    /// Detect the layout by key existence
    pub fn detect(root: &Value) -> Self {
        let Some(read_result) = root.get("readResult") else {
            return RestReadShape::Absent;
        };

        if read_result.get("blocks").is_some_and(Value::is_array) {
            RestReadShape::Blocks
        } else if read_result.get("pages").is_some_and(Value::is_array) {
            RestReadShape::Pages
        } else {
            RestReadShape::Absent
        }
    }

    fn container_key(&self) -> Option<&'static str> {
        match self {
            RestReadShape::Blocks => Some("blocks"),
            RestReadShape::Pages => Some("pages"),
            RestReadShape::Absent => None,
        }
    }

    fn text_key(&self) -> &'static str {
        match self {
            RestReadShape::Pages => "content",
            _ => "text",
        }
    }

    fn polygon_key(&self) -> &'static str {
        match self {
            RestReadShape::Pages => "boundingBox",
            _ => "boundingPolygon",
        }
    }
}

/// Stateless normalizer for both transports
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    /// Build the canonical response for `requested` from `raw`
    pub fn normalize(
        correlation_id: impl Into<String>,
        raw: &RawAnalysis,
        requested: &CapabilitySet,
    ) -> CanonicalResponse {
        let wants = |capability| requested.contains(capability);

        let (caption, read, objects) = match raw {
            RawAnalysis::Typed(result) => (
                wants(Capability::Caption).then(|| typed_caption(result)).flatten(),
                wants(Capability::Read).then(|| typed_read(result)),
                wants(Capability::Objects).then(|| typed_objects(result)),
            ),
            RawAnalysis::Rest(root) => (
                wants(Capability::Caption).then(|| rest_caption(root)).flatten(),
                wants(Capability::Read).then(|| rest_read(root)),
                wants(Capability::Objects).then(|| rest_objects(root)),
            ),
        };

        CanonicalResponse {
            correlation_id: correlation_id.into(),
            caption,
            read,
            objects,
        }
    }
}

fn typed_caption(result: &TypedResult) -> Option<Caption> {
    match &result.caption_result {
        Some(caption) => Some(Caption {
            text: caption.text.clone(),
            confidence: caption.confidence,
        }),
        None => {
            debug!("Caption requested but typed result has no caption section");
            None
        }
    }
}

fn typed_read(result: &TypedResult) -> Vec<ReadLine> {
    let Some(read) = &result.read_result else {
        debug!("Read requested but typed result has no read section");
        return Vec::new();
    };

    read.blocks
        .iter()
        .flat_map(|block| block.lines.iter())
        .map(|line| ReadLine {
            text: line.text.clone(),
            bounding_polygon: typed_polygon(&line.bounding_polygon),
            words: line
                .words
                .iter()
                .map(|word| Word {
                    text: word.text.clone(),
                    confidence: word.confidence,
                    bounding_polygon: typed_polygon(&word.bounding_polygon),
                })
                .collect(),
        })
        .collect()
}

fn typed_polygon(points: &[TypedPoint]) -> Vec<Point> {
    points.iter().map(|p| Point::new(p.x, p.y)).collect()
}

fn typed_objects(result: &TypedResult) -> Vec<DetectedObject> {
    let Some(objects) = &result.objects_result else {
        debug!("Objects requested but typed result has no objects section");
        return Vec::new();
    };

    objects.values.iter().map(typed_object).collect()
}

fn typed_object(object: &TypedObject) -> DetectedObject {
    let (name, confidence) = match object.tags.first() {
        Some(tag) => (tag.name.clone(), tag.confidence),
        None => (UNKNOWN_OBJECT_NAME.to_string(), 0.0),
    };
    let rect = object.bounding_box;

    DetectedObject {
        name,
        confidence,
        bounding_box: BoundingBox::new(rect.x, rect.y, rect.w, rect.h),
    }
}

fn rest_caption(root: &Value) -> Option<Caption> {
    let caption = root.get("captionResult")?;
    let text = caption.get("text").and_then(Value::as_str);
    let confidence = caption.get("confidence").and_then(Value::as_f64);

    match (text, confidence) {
        (Some(text), Some(confidence)) => Some(Caption {
            text: text.to_string(),
            confidence,
        }),
        _ => {
            debug!("captionResult present but missing text or confidence");
            None
        }
    }
}

fn rest_read(root: &Value) -> Vec<ReadLine> {
    let shape = RestReadShape::detect(root);
    let Some(container_key) = shape.container_key() else {
        debug!("Read requested but REST document has no blocks or pages");
        return Vec::new();
    };

    let containers = root
        .get("readResult")
        .and_then(|read| read.get(container_key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    containers
        .iter()
        .filter_map(|container| container.get("lines").and_then(Value::as_array))
        .flatten()
        .map(|line| ReadLine {
            text: line
                .get(shape.text_key())
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            bounding_polygon: line
                .get(shape.polygon_key())
                .map(parse_polygon)
                .unwrap_or_default(),
            words: Vec::new(),
        })
        .collect()
}

fn rest_objects(root: &Value) -> Vec<DetectedObject> {
    let Some(values) = root
        .get("objectsResult")
        .and_then(|objects| objects.get("values"))
        .and_then(Value::as_array)
    else {
        debug!("Objects requested but REST document has no objectsResult.values list");
        return Vec::new();
    };

    values
        .iter()
        .map(|object| {
            let tag = object
                .get("tags")
                .and_then(Value::as_array)
                .and_then(|tags| tags.first());

            let name = tag
                .and_then(|t| t.get("name"))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_OBJECT_NAME)
                .to_string();
            let confidence = tag
                .and_then(|t| t.get("confidence"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            DetectedObject {
                name,
                confidence,
                bounding_box: object
                    .get("boundingBox")
                    .map(parse_bounding_box)
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// Parse a REST polygon
///
/// Accepts a list of `{x, y}` objects or a flat list of alternating x,y
/// numbers (truncated toward zero; a trailing odd value is dropped). Any
/// other shape yields an empty polygon.
pub fn parse_polygon(value: &Value) -> Vec<Point> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    match items.first() {
        Some(Value::Object(_)) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| Point::new(int_field(item, "x"), int_field(item, "y")))
            .collect(),
        Some(Value::Number(_)) if items.len() >= 2 && items.iter().all(Value::is_number) => items
            .chunks_exact(2)
            .map(|pair| Point::new(truncate(&pair[0]), truncate(&pair[1])))
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse a REST bounding box, reading `w`/`h` or `width`/`height`
///
/// A short key only wins when it holds a number.
///
/// Missing fields default to zero; a non-object yields an all-zero box.
pub fn parse_bounding_box(value: &Value) -> BoundingBox {
    if !value.is_object() {
        return BoundingBox::default();
    }

    let either = |short: &str, long: &str| {
        match value.get(short).filter(|v| v.is_number()) {
            Some(v) => truncate(v),
            None => int_field(value, long),
        }
    };

    BoundingBox::new(
        int_field(value, "x"),
        int_field(value, "y"),
        either("w", "width"),
        either("h", "height"),
    )
}

fn int_field(value: &Value, key: &str) -> i32 {
    value.get(key).map(truncate).unwrap_or(0)
}

// Saturating, truncates toward zero; non-numbers read as 0
fn truncate(value: &Value) -> i32 {
    if let Some(n) = value.as_i64() {
        return n.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    }
    value.as_f64().map(|n| n as i32).unwrap_or(0)
}
