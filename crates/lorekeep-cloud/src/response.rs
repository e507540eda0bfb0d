//! Uniform result envelope for cloud operations

use serde::Serialize;

use crate::error::CloudError;

/// Outcome of a cloud operation, success or a displayable error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CloudResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Convert back into a `Result` carrying the error message
    ///
    /// # Errors
    /// Returns the error message when the operation failed
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .unwrap_or_else(|| "Unknown cloud error".to_string())),
        }
    }
}

impl<T> From<Result<T, CloudError>> for CloudResponse<T> {
    fn from(result: Result<T, CloudError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}
