use crate::model::ItemRecord;
use crate::traits::{ParseError, RecordParser};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Parser for the repository's one-JSON-object-per-item files.
///
/// The top level must be an object. Repeated keys keep their last value.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRecordParser;

impl RecordParser for JsonRecordParser {
    fn format_id(&self) -> &str {
        "json"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()) == Some("json")
    }

    fn parse(&self, content: &[u8]) -> Result<ItemRecord, ParseError> {
        let object: Map<String, Value> = serde_json::from_slice(content)
            .map_err(|e| ParseError::InvalidContent(e.to_string()))?;
        ItemRecord::deserialize(Value::Object(object))
            .map_err(|e| ParseError::InvalidContent(e.to_string()))
    }
}
