//! Request and response types for the story operations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ===== Operations =====

/// The five remote story operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation
{   /// Full pipeline: genre + characters + continuation
    ContinueStory
  , /// Genre classification with probabilities
    DetectGenre
  , /// Plot twist generation
    GenerateTwist
  , /// Multi-metric story scoring
    ScoreStory
  , /// Named character extraction
    ExtractCharacters
}

impl Operation
{   /// Fixed request path for this operation
    pub fn path(&self) -> &'static str
    {   match self
        {   Operation::ContinueStory => {
              "/api/v1/story/continue"
            }
          , Operation::DetectGenre => {
              "/api/v1/genre/detect"
            }
          , Operation::GenerateTwist => {
              "/api/v1/twist/generate"
            }
          , Operation::ScoreStory => {
              "/api/v1/score/story"
            }
          , Operation::ExtractCharacters => {
              "/api/v1/score/characters"
            }
        }
    }

    /// Declared response shape for this operation.
    /// The continuation endpoint replies with the payload
    /// directly; the other four wrap it in an envelope.
    /// This asymmetry is the backend's fixed contract.
    pub fn shape(&self) -> crate::decode::ResponseShape
    {   match self
        {   Operation::ContinueStory => {
              crate::decode::ResponseShape::Bare
            }
          , _ => crate::decode::ResponseShape::Enveloped
        }
    }
}

// ===== Twist types =====

/// Plot twist flavors understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwistType
{   Unexpected
  , Reversal
  , Revelation
  , Betrayal
  , Discovery
}

impl TwistType
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   TwistType::Unexpected => "unexpected"
          , TwistType::Reversal => "reversal"
          , TwistType::Revelation => "revelation"
          , TwistType::Betrayal => "betrayal"
          , TwistType::Discovery => "discovery"
        }
    }
}

/// The backend falls back to "unexpected" when the field
/// is omitted; the client default matches
impl Default for TwistType
{   fn default() -> Self
    {   TwistType::Unexpected
    }
}

// ===== Wire types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryContinueRequest
{   pub story: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoryContinueResponse
{   pub detected_genre: String
  , pub characters: Vec<String>
  , pub continuation: String
  , pub score: f64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreDetectRequest
{   pub text: String
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenreDetectResponse
{   pub genre: String
  , /// Model confidence in [0, 1]
    pub confidence: f64
  , /// Per-genre probabilities in [0, 1]; not required
    /// to sum to 1
    pub all_probabilities: HashMap<String, f64>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwistGenerateRequest
{   pub text: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub twist_type: Option<TwistType>
}

impl TwistGenerateRequest
{   /// The twist type the backend will apply
    pub fn effective_twist_type(&self) -> TwistType
    {   self.twist_type.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TwistGenerateResponse
{   pub twist: String
  , pub twist_type: String
  , pub full_story_with_twist: String
  , pub prompt_used: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreStoryRequest
{   pub text: String
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreStoryResponse
{   /// Total score scaled to 0-100
    pub total_score: f64
  , pub breakdown: HashMap<String, f64>
  , pub metrics: HashMap<String, f64>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractCharactersRequest
{   pub text: String
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractCharactersResponse
{   pub characters: Vec<String>
  , pub count: usize
}

impl ExtractCharactersResponse
{   /// The backend promises count == characters.len()
    pub fn is_consistent(&self) -> bool
    {   self.count == self.characters.len()
    }
}
