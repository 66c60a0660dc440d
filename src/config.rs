//! Configuration for the PlotCraft backend client

use log::debug;
use serde::{Deserialize, Serialize};

/// Backend origin used when nothing else is configured
pub const DEFAULT_API_BASE: &str
  = "http://localhost:8000";

/// Environment variable consulted for the backend origin
pub const API_BASE_ENV_VAR: &str
  = "BACKEND_API_URL";

/// Backend client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig
{   /// Backend origin; overrides the environment
    pub api_base: Option<String>
}

impl Default for BackendConfig
{   fn default() -> Self
    {   BackendConfig
        {   api_base: None
        }
    }
}

/// Resolve the backend origin to target.
///
/// Precedence: explicit configuration, then the
/// BACKEND_API_URL environment variable, then the local
/// default. Resolved once when a client is constructed
/// and never changed mid-session.
pub fn resolve_api_base(explicit: Option<&str>) -> String
{   if let Some(base) = explicit
    {   debug!("Using configured api base: {}", base);
        return normalize_base(base);
    }

    match std::env::var(API_BASE_ENV_VAR)
    {   Ok(base) if !base.is_empty() => {
          debug!(
            "Using {} from environment: {}",
            API_BASE_ENV_VAR,
            base
          );
          normalize_base(&base)
        }
      , _ => {
          debug!(
            "Using default api base: {}",
            DEFAULT_API_BASE
          );
          DEFAULT_API_BASE.to_string()
        }
    }
}

/// Operation paths start with a slash
fn normalize_base(base: &str) -> String
{   base.trim_end_matches('/').to_string()
}
