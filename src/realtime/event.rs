use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

impl ChangeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOperation::Insert => "INSERT",
            ChangeOperation::Update => "UPDATE",
            ChangeOperation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(ChangeOperation::Insert),
            "UPDATE" => Ok(ChangeOperation::Update),
            "DELETE" => Ok(ChangeOperation::Delete),
            other => Err(format!("unknown change operation '{other}'")),
        }
    }
}

fn default_schema() -> String {
    "public".to_string()
}

/// A row change in the backing database.
///
/// Deserializes both the database-webhook payload (`type`, `record`,
/// `old_record`) and the realtime channel payload (`eventType`, `new`, `old`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChangeEvent {
    pub table: String,

    #[serde(rename = "type", alias = "eventType")]
    pub operation: ChangeOperation,

    #[serde(default = "default_schema")]
    pub schema: String,

    /// Row after the change; absent for deletes
    #[serde(default, alias = "new", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub record: Option<Value>,

    /// Row before the change, when the table replicates it
    #[serde(default, alias = "old", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub old_record: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub commit_timestamp: Option<Timestamp>,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, operation: ChangeOperation) -> Self {
        Self {
            table: table.into(),
            operation,
            schema: default_schema(),
            record: None,
            old_record: None,
            commit_timestamp: None,
        }
    }

    pub fn with_record(mut self, record: Value) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_old_record(mut self, old_record: Value) -> Self {
        self.old_record = Some(old_record);
        self
    }

    /// Column value from the new row, or the old row for deletes.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.record
            .as_ref()
            .and_then(|r| r.get(name))
            .or_else(|| self.old_record.as_ref().and_then(|r| r.get(name)))
    }

    /// Column value rendered as a plain string (strings unquoted).
    pub fn field_str(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The new row decoded into `T`.
    pub fn record_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.record
            .as_ref()
            .and_then(|r| serde_json::from_value(r.clone()).ok())
    }
}
