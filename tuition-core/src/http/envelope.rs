use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::http::error::ApiError;

/// Every shape a successful response body comes in.
///
/// The API answers either with the payload itself or wraps it as
/// `{ "data": .., "success": .., "message": .. }`. A body of
/// `{ "success": false, "message": .. }` is a failure even on a 2xx.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped {
        data: T,
        #[serde(default)]
        success: Option<bool>,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(T),
    Status {
        success: bool,
        #[serde(default)]
        message: Option<String>,
    },
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Envelope::Wrapped {
                success: Some(false),
                message,
                ..
            } => Err(ApiError::Rejected(message)),
            Envelope::Wrapped { data, .. } => Ok(data),
            Envelope::Bare(data) => Ok(data),
            Envelope::Status {
                success: false,
                message,
            } => Err(ApiError::Rejected(message)),
            Envelope::Status { .. } => Err(ApiError::Decode(serde::de::Error::custom(
                "response carried no data",
            ))),
        }
    }
}

/// Decodes a response body into `T`, whichever envelope it came in.
pub fn unwrap<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice::<Envelope<T>>(body)
        .or_else(|_| {
            // untagged enums swallow the real cause, decode again for it
            serde_json::from_slice::<T>(body).map(Envelope::Bare)
        })?
        .into_result()
}

/// For calls that may or may not echo the entity back.
pub fn unwrap_optional<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    acknowledge(body)?;
    Ok(unwrap::<T>(body).ok())
}

#[derive(Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

/// For calls whose payload is ignored: only an explicit `success: false`
/// counts as a failure. Empty or non JSON bodies are fine.
pub fn acknowledge(body: &[u8]) -> Result<(), ApiError> {
    match serde_json::from_slice::<Acknowledgement>(body) {
        Ok(Acknowledgement {
            success: Some(false),
            message,
        }) => Err(ApiError::Rejected(message)),
        _ => Ok(()),
    }
}
