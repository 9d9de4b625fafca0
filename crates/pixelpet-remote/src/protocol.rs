use std::path::PathBuf;

use pixelpet_core::error::GenerationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version spoken over the backend's stdio.
pub const JSONRPC_VERSION: &str = "2.0";

pub const GENERATE_TEXT_METHOD: &str = "pixelpet.generate_text";
pub const GENERATE_IMAGE_METHOD: &str = "pixelpet.generate_image";

/// JSON-RPC request/response ID type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

/// JSON-RPC error payload returned by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    pub params: Value,
}

impl RequestEnvelope {
    pub fn new<P: Serialize>(id: i64, method: &str, params: &P) -> Result<Self, GenerationError> {
        let params = serde_json::to_value(params).map_err(|err| {
            GenerationError::Backend(format!("failed to encode {method} params: {err}"))
        })?;
        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl ResponseEnvelope {
    /// Decode the result payload, turning an error response into
    /// [`GenerationError::Backend`].
    pub fn into_result<T: DeserializeOwned>(self, method: &str) -> Result<T, GenerationError> {
        if let Some(error) = self.error {
            return Err(GenerationError::Backend(format!(
                "{method} failed: {} (code {})",
                error.message, error.code
            )));
        }
        let result = self.result.ok_or_else(|| {
            GenerationError::Backend(format!("{method} response carried no result"))
        })?;
        serde_json::from_value(result)
            .map_err(|err| GenerationError::Backend(format!("invalid {method} result: {err}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateTextParams {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateTextResult {
    pub text: String,
}

/// The backend writes the image to `output_path` (or a path of its choosing
/// returned in the result); the host reads the bytes from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateImageParams {
    pub prompt: String,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateImageResult {
    pub path: PathBuf,
}
