use std::fmt;

/// Error type surfaced by every PlotCraft API operation
/// Implements Clone for sending through reply channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError
{   /// HTTP status code; 0 signals a transport failure
    /// (DNS, connection, abort), not an HTTP code
    pub status: u16
  , /// Human-readable message
    pub message: String
}

impl ApiError
{   /// Error carrying a real HTTP status
    pub fn new(status: u16, message: String) -> Self
    {   ApiError
        {   status
          , message
        }
    }

    /// Error for a request that never completed
    pub fn transport(message: String) -> Self
    {   ApiError
        {   status: 0
          , message
        }
    }

    /// Whether the request never reached the backend
    pub fn is_transport(&self) -> bool
    {   self.status == 0
    }
}

impl fmt::Display for ApiError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   if self.is_transport()
        {   write!(f, "Transport error: {}", self.message)
        } else
        {   write!(f,
              "API error ({}): {}",
              self.status,
              self.message
            )
        }
    }
}

impl std::error::Error for ApiError {}

impl From<String> for ApiError
{   fn from(s: String) -> Self
    {   ApiError::transport(s)
    }
}

impl From<&str> for ApiError
{   fn from(s: &str) -> Self
    {   ApiError::transport(s.to_string())
    }
}
