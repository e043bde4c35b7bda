use crate::error::{ConceptError, Result};
use crate::extractor::{ConceptDescriptor, SHORT_LABEL_BUDGET};
use evidence_protocol::truncate_label;
use serde_json::Value;

/// Parse an extractor response into descriptors, field by field.
///
/// The payload is either a bare array or an object with a `concepts` array.
/// An entry missing its title is discarded on its own; the rest of the batch
/// survives. Optional fields fall back per field: `text` to the title,
/// `short_label` to a truncated title, `importance` to absent when it is not
/// a number in [0, 1].
pub fn parse_descriptors(payload: &Value) -> Result<Vec<ConceptDescriptor>> {
    let entries = match payload {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => map
            .get("concepts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ConceptError::Payload("object payload has no 'concepts' array".to_string())
            })?,
        other => {
            return Err(ConceptError::Payload(format!(
                "expected array or object, got {other}"
            )))
        }
    };

    let mut descriptors = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry) {
            Some(descriptor) => descriptors.push(descriptor),
            None => log::warn!("discarding malformed concept entry at index {index}"),
        }
    }
    Ok(descriptors)
}

fn parse_entry(entry: &Value) -> Option<ConceptDescriptor> {
    let object = entry.as_object()?;
    let title = non_empty_string(object.get("title"))?;
    let text = non_empty_string(object.get("text")).unwrap_or_else(|| title.clone());
    let short_label = non_empty_string(object.get("shortLabel"))
        .or_else(|| non_empty_string(object.get("short_label")))
        .unwrap_or_else(|| truncate_label(&title, SHORT_LABEL_BUDGET));
    let importance = object
        .get("importance")
        .and_then(Value::as_f64)
        .filter(|value| (0.0..=1.0).contains(value))
        .map(|value| value as f32);

    Some(ConceptDescriptor {
        title,
        text,
        short_label,
        importance,
    })
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
