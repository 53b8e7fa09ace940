use serde_json::Value;

use crate::error::SnapshotError;
use crate::ir::{EdgeRecord, GraphSnapshot, NodeRecord, PersonData, RecordId};

/// Decode a snapshot from JSON text, accepting JSON5 (comments, trailing
/// commas) as a fallback. Records that do not decode are dropped.
pub fn parse_snapshot(input: &str) -> Result<GraphSnapshot, SnapshotError> {
    let value = match serde_json::from_str::<Value>(input) {
        Ok(value) => value,
        Err(json) => match json5::from_str::<Value>(input) {
            Ok(value) => value,
            Err(json5) => return Err(SnapshotError::Syntax { json, json5 }),
        },
    };
    snapshot_from_value(value)
}

pub fn snapshot_from_value(value: Value) -> Result<GraphSnapshot, SnapshotError> {
    let Value::Object(mut root) = value else {
        return Err(SnapshotError::NotAnObject);
    };
    let nodes = take_list(&mut root, "nodes")?;
    let edges = take_list(&mut root, "edges")?;

    let mut snapshot = GraphSnapshot::new();
    for (idx, raw) in nodes.into_iter().enumerate() {
        match decode_node(raw) {
            Some(node) => snapshot.nodes.push(node),
            None => tracing::debug!(index = idx, "skipping undecodable node record"),
        }
    }
    for (idx, raw) in edges.into_iter().enumerate() {
        match serde_json::from_value::<EdgeRecord>(raw) {
            Ok(edge) => snapshot.edges.push(edge),
            Err(err) => tracing::debug!(index = idx, error = %err, "skipping undecodable edge record"),
        }
    }
    Ok(snapshot)
}

fn take_list(
    root: &mut serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Vec<Value>, SnapshotError> {
    match root.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(SnapshotError::InvalidList { field }),
    }
}

/// Only a non-object record is unusable. The id and the details decode
/// independently, so a mistyped detail never costs a person their place.
fn decode_node(raw: Value) -> Option<NodeRecord> {
    let Value::Object(mut record) = raw else {
        return None;
    };
    let id = record
        .remove("id")
        .and_then(|id| serde_json::from_value::<RecordId>(id).ok());
    let data = match record.remove("data") {
        // Stores hand out `data: null` for people with no details filled in.
        None | Some(Value::Null) => PersonData::default(),
        Some(details @ Value::Object(_)) => serde_json::from_value(details).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "ignoring unreadable person details");
            PersonData::default()
        }),
        Some(_) => {
            tracing::debug!("ignoring person details that are not an object");
            PersonData::default()
        }
    };
    Some(NodeRecord { id, data })
}
