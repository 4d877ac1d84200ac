//! The backend's uniform response envelope.
//!
//! Every Fernway endpoint responds with `{code, message, data, errors}`.
//! `code` is the business-level status (`200` on success) and is checked
//! after the transport-level HTTP status.

use serde::Deserialize;

use super::ApiError;

/// Wire shape of every backend response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: u16,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> Envelope<T> {
    /// Collapse the envelope into the payload or a typed failure.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Backend` when `code != 200`, and
    /// `ApiError::EmptyData` when a success envelope carries no payload.
    pub fn into_result(self) -> Result<T, ApiError> {
        if self.code != 200 {
            return Err(ApiError::Backend {
                code: self.code,
                message: self.message,
                errors: self.errors,
            });
        }

        self.data.ok_or(ApiError::EmptyData)
    }

    /// Check the envelope's business code, discarding any payload.
    ///
    /// For endpoints that acknowledge with `{code: 200, data: null}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Backend` when `code != 200`.
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.code != 200 {
            return Err(ApiError::Backend {
                code: self.code,
                message: self.message,
                errors: self.errors,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: i32,
    }

    #[test]
    fn test_success_envelope() {
        let envelope: Envelope<Payload> =
            serde_json::from_str(r#"{"code":200,"message":"ok","data":{"value":7},"errors":[]}"#)
                .unwrap();
        assert_eq!(envelope.into_result().unwrap(), Payload { value: 7 });
    }

    #[test]
    fn test_business_error_envelope() {
        let envelope: Envelope<Payload> = serde_json::from_str(
            r#"{"code":422,"message":"Out of stock","data":null,"errors":["quantity exceeds stock"]}"#,
        )
        .unwrap();
        let err = envelope.into_result().unwrap_err();
        match err {
            ApiError::Backend {
                code,
                message,
                errors,
            } => {
                assert_eq!(code, 422);
                assert_eq!(message, "Out of stock");
                assert_eq!(errors, vec!["quantity exceeds stock".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_success_without_data() {
        let envelope: Envelope<Payload> =
            serde_json::from_str(r#"{"code":200,"message":"ok","data":null}"#).unwrap();
        assert!(matches!(
            envelope.into_result(),
            Err(ApiError::EmptyData)
        ));
    }

    #[test]
    fn test_ack_ignores_missing_data() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":200,"message":"deleted","data":null}"#).unwrap();
        assert!(envelope.into_ack().is_ok());

        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":404,"message":"no such address","data":null}"#)
                .unwrap();
        assert!(envelope.into_ack().is_err());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let envelope: Envelope<Payload> =
            serde_json::from_str(r#"{"code":200,"data":{"value":1}}"#).unwrap();
        assert!(envelope.message.is_empty());
        assert!(envelope.errors.is_empty());
    }
}
