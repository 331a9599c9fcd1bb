//! Module `protocol`
//!
//! Messages exchanged between callers and the background worker. A request
//! carries a correlation id, an operation type and a type-specific payload;
//! the worker answers with the same id and a success flag.

use serde::{Deserialize, Serialize};

/// Payload of an `upload` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub file: Vec<u8>,
    pub filepath: String,
}

/// Payload of a `savetext` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveTextPayload {
    pub text: String,
    pub filepath: String,
}

/// Payload of `moveFile` and `moveFolder` requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub source_path: String,
    pub destination_path: String,
}

/// Payload of `deleteFile` and `deleteFolder` requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePayload {
    pub path: String,
}

/// A mutation the worker knows how to perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Operation {
    #[serde(rename = "upload")]
    Upload(UploadPayload),
    #[serde(rename = "savetext")]
    SaveText(SaveTextPayload),
    #[serde(rename = "moveFile")]
    MoveFile(MovePayload),
    #[serde(rename = "moveFolder")]
    MoveFolder(MovePayload),
    #[serde(rename = "deleteFile")]
    DeleteFile(DeletePayload),
    #[serde(rename = "deleteFolder")]
    DeleteFolder(DeletePayload),
}

impl Operation {
    /// Wire name of the operation type
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Upload(_) => "upload",
            Operation::SaveText(_) => "savetext",
            Operation::MoveFile(_) => "moveFile",
            Operation::MoveFolder(_) => "moveFolder",
            Operation::DeleteFile(_) => "deleteFile",
            Operation::DeleteFolder(_) => "deleteFolder",
        }
    }
}

/// Request sent to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(flatten)]
    pub operation: Operation,
}

/// Worker reply, matched to its request by `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(id: String) -> Self {
        Self {
            id,
            success: true,
            error: None,
        }
    }

    pub fn failure(id: String, error: String) -> Self {
        Self {
            id,
            success: false,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_type_and_payload_fields() {
        let request = Request {
            id: "4".into(),
            operation: Operation::MoveFolder(MovePayload {
                source_path: "/src".into(),
                destination_path: "/lib/src".into(),
            }),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "id": "4",
                "type": "moveFolder",
                "payload": { "sourcePath": "/src", "destinationPath": "/lib/src" }
            })
        );
    }

    #[test]
    fn wire_request_parses_into_operation() {
        let raw = r#"{"id":"9","type":"savetext","payload":{"text":"hi","filepath":"/a.txt"}}"#;
        let request: Request = serde_json::from_str(raw).unwrap();
        assert_eq!(request.operation.kind(), "savetext");
        assert_eq!(
            request.operation,
            Operation::SaveText(SaveTextPayload {
                text: "hi".into(),
                filepath: "/a.txt".into(),
            })
        );
    }

    #[test]
    fn success_response_omits_error() {
        let value = serde_json::to_value(Response::success("1".into())).unwrap();
        assert_eq!(value, json!({ "id": "1", "success": true }));
    }
}
