pub mod error;
pub mod config;
pub mod api;
pub mod request;
pub mod decode;
pub mod storage;
pub mod session;
pub mod signup;
pub mod client;

/*

plotcraft is an async-only client library for the
PlotCraft-AI story backend: one typed call per remote
operation (continue / genre / twist / score / characters)
plus the user + OTP endpoints the signup and session
flows consume. every operation either returns its typed
payload or an ApiError; there is no third outcome.

plotcraft/
├── Cargo.toml          # Main manifest
├── src/
│   ├── lib.rs          # Channel API surface
│   ├── error.rs        # ApiError
│   ├── config.rs       # Backend origin resolution
│   ├── api/            # HTTP client actors
│   │   ├── mod.rs      # Re-exports the clients
│   │   ├── story.rs    # Five story operations
│   │   └── users.rs    # User/profile/OTP endpoints
│   ├── request.rs      # Story operation wire types
│   ├── decode.rs       # Shapes, envelope, error bodies
│   ├── storage.rs      # Client-local key/value state
│   ├── session.rs      # Redirect gate + override
│   ├── signup.rs       # Email/OTP signup flow
│   └── client.rs       # Backend actor interface
└── tests/              # Integration and unit tests

*/

/// PLOTCRAFT API INTERFACE:

// ===== ContinueStory =====

pub type ContinueStoryReply
  = Result<
      crate::request::StoryContinueResponse,
      crate::error::ApiError
    >;
pub type ContinueStoryReplySender
  = tokio::sync::mpsc::UnboundedSender<ContinueStoryReply>;

pub struct ContinueStoryArgs
{   pub request: crate::request::StoryContinueRequest
  , pub reply: ContinueStoryReplySender
}

// ===== DetectGenre =====

pub type DetectGenreReply
  = Result<
      crate::request::GenreDetectResponse,
      crate::error::ApiError
    >;
pub type DetectGenreReplySender
  = tokio::sync::mpsc::UnboundedSender<DetectGenreReply>;

pub struct DetectGenreArgs
{   pub request: crate::request::GenreDetectRequest
  , pub reply: DetectGenreReplySender
}

// ===== GenerateTwist =====

pub type GenerateTwistReply
  = Result<
      crate::request::TwistGenerateResponse,
      crate::error::ApiError
    >;
pub type GenerateTwistReplySender
  = tokio::sync::mpsc::UnboundedSender<GenerateTwistReply>;

pub struct GenerateTwistArgs
{   pub request: crate::request::TwistGenerateRequest
  , pub reply: GenerateTwistReplySender
}

// ===== ScoreStory =====

pub type ScoreStoryReply
  = Result<
      crate::request::ScoreStoryResponse,
      crate::error::ApiError
    >;
pub type ScoreStoryReplySender
  = tokio::sync::mpsc::UnboundedSender<ScoreStoryReply>;

pub struct ScoreStoryArgs
{   pub request: crate::request::ScoreStoryRequest
  , pub reply: ScoreStoryReplySender
}

// ===== ExtractCharacters =====

pub type ExtractCharactersReply
  = Result<
      crate::request::ExtractCharactersResponse,
      crate::error::ApiError
    >;
pub type ExtractCharactersReplySender
  = tokio::sync::mpsc::UnboundedSender
    <ExtractCharactersReply>;

pub struct ExtractCharactersArgs
{   pub request: crate::request::ExtractCharactersRequest
  , pub reply: ExtractCharactersReplySender
}

// ===== KillProcess =====

pub type KillProcessReply
  = Result<(), crate::error::ApiError>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== PlotcraftHand (sender side) =====

pub struct PlotcraftHand
{   pub continue_story_tx
      : tokio::sync::mpsc::UnboundedSender<ContinueStoryArgs>
  , pub detect_genre_tx
      : tokio::sync::mpsc::UnboundedSender<DetectGenreArgs>
  , pub generate_twist_tx
      : tokio::sync::mpsc::UnboundedSender<GenerateTwistArgs>
  , pub score_story_tx
      : tokio::sync::mpsc::UnboundedSender<ScoreStoryArgs>
  , pub extract_characters_tx
      : tokio::sync::mpsc::UnboundedSender
        <ExtractCharactersArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== PlotcraftFoot (receiver side) =====

pub struct PlotcraftFoot
{   pub continue_story_rx
      : tokio::sync::mpsc::UnboundedReceiver<ContinueStoryArgs>
  , pub detect_genre_rx
      : tokio::sync::mpsc::UnboundedReceiver<DetectGenreArgs>
  , pub generate_twist_rx
      : tokio::sync::mpsc::UnboundedReceiver<GenerateTwistArgs>
  , pub score_story_rx
      : tokio::sync::mpsc::UnboundedReceiver<ScoreStoryArgs>
  , pub extract_characters_rx
      : tokio::sync::mpsc::UnboundedReceiver
        <ExtractCharactersArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}
