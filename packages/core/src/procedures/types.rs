//! Procedure request/response envelopes and error codes
//!
//! Codes follow JSON-RPC 2.0 numbering: the standard range for protocol
//! failures, and the implementation-defined range from -32000 for domain
//! failures.

use crate::services::{ErrorCategory, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Domain error codes
pub const NOT_FOUND: i32 = -32000;
pub const CONFLICT: i32 = -32001;
pub const VALIDATION_ERROR: i32 = -32002;

/// One line of the procedure stream
#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureRequest {
    /// Echoed back verbatim; any JSON value
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcedureResponse {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcedureError>,
}

impl ProcedureResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: ProcedureError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProcedureError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl std::fmt::Display for ProcedureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

impl std::error::Error for ProcedureError {}

impl From<ServiceError> for ProcedureError {
    fn from(err: ServiceError) -> Self {
        let code = match err.category() {
            ErrorCategory::Validation => VALIDATION_ERROR,
            ErrorCategory::NotFound => NOT_FOUND,
            ErrorCategory::Conflict => CONFLICT,
            ErrorCategory::Internal => INTERNAL_ERROR,
        };
        ProcedureError::new(code, err.to_string())
    }
}

/// Deserialize procedure params; a missing params value reads as `{}`
pub(crate) fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, ProcedureError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|e| ProcedureError::invalid_params(format!("Invalid parameters: {}", e)))
}

/// Serialize a handler result
pub(crate) fn to_result<T: Serialize>(value: &T) -> Result<Value, ProcedureError> {
    serde_json::to_value(value)
        .map_err(|e| ProcedureError::internal_error(format!("Failed to serialize result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_without_params() {
        let request: ProcedureRequest =
            serde_json::from_str(r#"{"id": 7, "method": "preferences.get"}"#).unwrap();
        assert_eq!(request.id, json!(7));
        assert!(request.params.is_null());
    }

    #[test]
    fn test_request_requires_method() {
        let result: Result<ProcedureRequest, _> = serde_json::from_str(r#"{"id": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_omits_absent_side() {
        let ok = serde_json::to_value(ProcedureResponse::success(json!("a"), json!({"x": 1}))).unwrap();
        assert!(ok.get("error").is_none());
        assert_eq!(ok["result"]["x"], 1);

        let failed = serde_json::to_value(ProcedureResponse::error(
            json!(2),
            ProcedureError::method_not_found("nope"),
        ))
        .unwrap();
        assert!(failed.get("result").is_none());
        assert_eq!(failed["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn test_service_error_mapping() {
        let cases = [
            (ServiceError::invalid_hierarchy("cycle"), VALIDATION_ERROR),
            (ServiceError::entry_not_found("e"), NOT_FOUND),
            (ServiceError::FranchiseHasEntries { count: 1 }, CONFLICT),
            (ServiceError::store_failed("io"), INTERNAL_ERROR),
        ];
        for (err, code) in cases {
            assert_eq!(ProcedureError::from(err).code, code);
        }
    }

    #[test]
    fn test_parse_params_treats_null_as_empty_object() {
        #[derive(Debug, Deserialize)]
        struct Optional {
            #[serde(default)]
            flag: Option<bool>,
        }
        let parsed: Optional = parse_params(Value::Null).unwrap();
        assert!(parsed.flag.is_none());

        let err = parse_params::<Optional>(json!({"flag": "yes"})).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }
}
