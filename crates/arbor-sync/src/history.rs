#![forbid(unsafe_code)]

//! State history serialization.
//!
//! The captured mutation log travels from the generating environment to
//! the hydrating one as a single markup-embedded block: a versioned JSON
//! envelope of `(element id, category, key, tagged value)` tuples, base64
//! wrapped for markup safety, keyed by a fixed well-known id so both
//! sides can locate it deterministically.
//!
//! Decoding rejects anything outside the closed tag and category sets —
//! an unknown tag is a hard failure, never coerced, so a corrupt blob can
//! never silently poison replay.

use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Serialize};

use arbor_core::{ElementId, SlotCategory, Value, ValueKind};

use crate::error::HistoryError;
use crate::recorder::MutationRecord;

/// Envelope format version.
const FORMAT_VERSION: u32 = 1;

/// Well-known id of the markup-embedded state block.
pub const STATE_BLOCK_ID: &str = "arbor-state";

/// MIME-ish type attribute of the embedded block.
const STATE_BLOCK_TYPE: &str = "application/arbor-state";

#[derive(Serialize, Deserialize)]
struct BlobEnvelope {
    format_version: u32,
    records: Vec<BlobRecord>,
}

#[derive(Serialize, Deserialize)]
struct BlobRecord {
    seq: u64,
    id: u64,
    cat: String,
    key: String,
    tag: String,
    value: serde_json::Value,
}

/// Encode a mutation log into its transferable blob form.
///
/// # Errors
///
/// Fails when a record carries a number with no finite wire form.
pub fn encode_records(records: &[MutationRecord]) -> Result<String, HistoryError> {
    let envelope = BlobEnvelope {
        format_version: FORMAT_VERSION,
        records: records
            .iter()
            .map(|record| {
                let value = value_to_json(&record.value)
                    .ok_or(HistoryError::NonFiniteNumber { seq: record.seq })?;
                Ok(BlobRecord {
                    seq: record.seq,
                    id: record.target.raw(),
                    cat: record.category.as_str().to_owned(),
                    key: record.key.clone(),
                    tag: record.value.tag().to_owned(),
                    value,
                })
            })
            .collect::<Result<Vec<_>, HistoryError>>()?,
    };

    let json = serde_json::to_string(&envelope)
        .map_err(|err| HistoryError::Malformed(err.to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Decode a blob back into a mutation log.
///
/// # Errors
///
/// Fails on malformed base64/JSON, an unsupported envelope version, or —
/// hard, never coerced — an unknown value tag or category name.
pub fn decode_blob(blob: &str) -> Result<Vec<MutationRecord>, HistoryError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(blob.trim())
        .map_err(|err| HistoryError::Malformed(format!("base64: {err}")))?;
    let json = String::from_utf8(bytes)
        .map_err(|err| HistoryError::Malformed(format!("utf-8: {err}")))?;
    let envelope: BlobEnvelope =
        serde_json::from_str(&json).map_err(|err| HistoryError::Malformed(err.to_string()))?;

    if envelope.format_version != FORMAT_VERSION {
        return Err(HistoryError::UnsupportedVersion(envelope.format_version));
    }

    envelope
        .records
        .into_iter()
        .map(|record| {
            let kind = ValueKind::from_tag(&record.tag)
                .ok_or_else(|| HistoryError::UnknownTag(record.tag.clone()))?;
            let category = SlotCategory::from_str(&record.cat)
                .ok_or_else(|| HistoryError::UnknownCategory(record.cat.clone()))?;
            let value = json_to_value_of_kind(kind, &record.value)?;
            Ok(MutationRecord {
                seq: record.seq,
                target: ElementId::from_raw(record.id),
                category,
                key: record.key,
                value,
            })
        })
        .collect()
}

/// Wrap a blob in its markup-embedded block form.
#[must_use]
pub fn embed_block(blob: &str) -> String {
    format!(
        "<script type=\"{STATE_BLOCK_TYPE}\" id=\"{STATE_BLOCK_ID}\">{blob}</script>"
    )
}

/// Locate and extract the embedded blob from generated markup.
///
/// Returns `None` when no block with the well-known id is present.
#[must_use]
pub fn extract_block(markup: &str) -> Option<&str> {
    let marker = format!("id=\"{STATE_BLOCK_ID}\"");
    let at = markup.find(&marker)?;
    let rest = &markup[at..];
    let open = rest.find('>')?;
    let body = &rest[open + 1..];
    let close = body.find("</script>")?;
    Some(body[..close].trim())
}

fn value_to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Str(s) => Some(serde_json::Value::String(s.clone())),
        Value::Num(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number),
        Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, nested) in map {
                out.insert(key.clone(), value_to_json(nested)?);
            }
            Some(serde_json::Value::Object(out))
        }
        Value::List(items) => items
            .iter()
            .map(value_to_json)
            .collect::<Option<Vec<_>>>()
            .map(serde_json::Value::Array),
    }
}

fn json_to_value_of_kind(
    kind: ValueKind,
    json: &serde_json::Value,
) -> Result<Value, HistoryError> {
    let mismatch = |expected: &str| {
        HistoryError::Malformed(format!("payload does not match its `{expected}` tag"))
    };
    match kind {
        ValueKind::Str => json
            .as_str()
            .map(|s| Value::Str(s.to_owned()))
            .ok_or_else(|| mismatch("str")),
        ValueKind::Num => json
            .as_f64()
            .map(Value::Num)
            .ok_or_else(|| mismatch("num")),
        ValueKind::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| mismatch("bool")),
        ValueKind::Object => match json {
            serde_json::Value::Object(map) => {
                let mut out = BTreeMap::new();
                for (key, nested) in map {
                    out.insert(key.clone(), json_to_value(nested)?);
                }
                Ok(Value::Object(out))
            }
            _ => Err(mismatch("obj")),
        },
        ValueKind::List => match json {
            serde_json::Value::Array(items) => Ok(Value::List(
                items.iter().map(json_to_value).collect::<Result<_, _>>()?,
            )),
            _ => Err(mismatch("list")),
        },
    }
}

/// Convert nested JSON (already inside a tagged top-level value) to a
/// [`Value`]. JSON's own typing is self-describing below the top level;
/// `null` has no representation and is rejected.
fn json_to_value(json: &serde_json::Value) -> Result<Value, HistoryError> {
    match json {
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Num)
            .ok_or_else(|| HistoryError::Malformed("non-finite nested number".into())),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Object(map) => {
            let mut out = BTreeMap::new();
            for (key, nested) in map {
                out.insert(key.clone(), json_to_value(nested)?);
            }
            Ok(Value::Object(out))
        }
        serde_json::Value::Array(items) => Ok(Value::List(
            items.iter().map(json_to_value).collect::<Result<_, _>>()?,
        )),
        serde_json::Value::Null => {
            Err(HistoryError::Malformed("null is not a representable value".into()))
        }
    }
}

/// Parse a serialized history payload accompanying a navigation
/// occurrence into a value for the `history` slot. The payload is plain
/// JSON; `null` is rejected like everywhere else.
///
/// # Errors
///
/// Fails on malformed JSON or unrepresentable values.
pub fn parse_history_payload(payload: &str) -> Result<Value, HistoryError> {
    let json: serde_json::Value = serde_json::from_str(payload)
        .map_err(|err| HistoryError::Malformed(format!("history payload: {err}")))?;
    json_to_value(&json)
}
