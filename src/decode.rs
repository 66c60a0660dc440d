//! Response decoding: per-operation shapes, envelope
//! unwrapping, and error-body message extraction

use log::{debug, error, trace};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Canned message shown when the backend looks down
pub const BACKEND_UNREACHABLE_MSG: &str
  = "Could not reach backend. Is it running on port 8000?";

/// How an endpoint wraps its successful payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape
{   /// Payload is the response body itself
    Bare
  , /// Payload sits in the `data` field of an envelope
    Enveloped
}

/// Standard envelope around an operation's real payload
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T>
{   pub success: bool
  , #[serde(default)]
    pub message: String
  , pub data: Option<T>
  , #[serde(default)]
    pub errors: Option<Vec<String>>
}

/// Decode a success-status body into the operation's
/// payload type according to its declared shape.
///
/// A parse failure on a success body still surfaces as an
/// ApiError carrying the response status, so callers only
/// ever see one error type.
pub fn decode_success<T: DeserializeOwned>(
  shape: ResponseShape
, status: u16
, body: &str
) -> Result<T, crate::error::ApiError>
{   trace!(
      "Decoding {:?} body ({} bytes)",
      shape,
      body.len()
    );

    match shape
    {   ResponseShape::Bare => {
          serde_json::from_str(body).map_err(|e| {
            error!("Parse error on bare body: {}", e);
            crate::error::ApiError::new(
              status,
              format!("Failed to parse response: {}", e)
            )
          })
        }
      , ResponseShape::Enveloped => {
          let envelope: Envelope<T>
            = serde_json::from_str(body).map_err(|e| {
                error!("Parse error on envelope: {}", e);
                crate::error::ApiError::new(
                  status,
                  format!("Failed to parse response: {}", e)
                )
              })?;

          envelope.data.ok_or_else(|| {
            error!("Envelope arrived without a data field");
            crate::error::ApiError::new(
              status,
              "Failed to parse response: envelope had no data"
                .to_string()
            )
          })
        }
    }
}

/// Build the ApiError for a non-success response. The
/// body is parsed tolerantly; an unparseable body falls
/// back to an empty object so extraction still runs.
pub fn decode_failure(
  status: u16
, status_reason: &str
, body: &str
) -> crate::error::ApiError
{   let parsed: Value = serde_json::from_str(body)
      .unwrap_or_else(|_| Value::Object(Default::default()));

    let message
      = error_message_from_body(&parsed, status_reason);
    debug!("Request failed ({}): {}", status, message);

    crate::error::ApiError::new(status, message)
}

/// Ordered extraction chain over whatever shape the
/// backend sent: a string `message` field, then a string
/// `detail` field, then the first `msg` of a `detail`
/// validation array, else the HTTP status reason.
pub fn error_message_from_body(
  body: &Value
, status_reason: &str
) -> String
{   extract_message(body)
      .or_else(|| extract_detail_string(body))
      .or_else(|| extract_detail_array_msg(body))
      .unwrap_or_else(|| status_reason.to_string())
}

fn extract_message(body: &Value) -> Option<String>
{   body.get("message")?.as_str().map(str::to_string)
}

fn extract_detail_string(body: &Value) -> Option<String>
{   body.get("detail")?.as_str().map(str::to_string)
}

fn extract_detail_array_msg(body: &Value) -> Option<String>
{   body.get("detail")?
      .as_array()?
      .first()?
      .get("msg")?
      .as_str()
      .map(str::to_string)
}

/// Map a transport-level failure message to something a
/// writer can act on. Browser-style fetch failures become
/// the canned unreachable hint; anything else passes
/// through unchanged.
pub fn friendly_transport_message(raw: &str) -> String
{   if raw.contains("fetch")
    {   return BACKEND_UNREACHABLE_MSG.to_string();
    }
    raw.to_string()
}

/// Build the ApiError for a request that never completed.
/// Connection refusals get the canned unreachable hint.
pub fn transport_error(err: &reqwest::Error)
  -> crate::error::ApiError
{   error!("Transport failure: {}", err);
    if err.is_connect()
    {   return crate::error::ApiError::transport(
          BACKEND_UNREACHABLE_MSG.to_string()
        );
    }
    crate::error::ApiError::transport(
      friendly_transport_message(&err.to_string())
    )
}
