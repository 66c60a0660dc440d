use log::{debug, error, info, trace, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

// ===== Story Client Actor =====

/// Commands for the StoryApiClient actor
pub enum StoryCommand
{   ContinueStory
    {   request: crate::request::StoryContinueRequest
      , reply: crate::ContinueStoryReplySender
    }
  , DetectGenre
    {   request: crate::request::GenreDetectRequest
      , reply: crate::DetectGenreReplySender
    }
  , GenerateTwist
    {   request: crate::request::TwistGenerateRequest
      , reply: crate::GenerateTwistReplySender
    }
  , ScoreStory
    {   request: crate::request::ScoreStoryRequest
      , reply: crate::ScoreStoryReplySender
    }
  , ExtractCharacters
    {   request: crate::request::ExtractCharactersRequest
      , reply: crate::ExtractCharactersReplySender
    }
  , Shutdown
}

/// Story API client state
pub struct StoryApiState
{   api_base: String
  , http_client: reqwest::Client
}

impl StoryApiState
{   pub fn new(config: &crate::config::BackendConfig)
      -> Self
    {   debug!("Creating StoryApiState");
        let api_base = crate::config::resolve_api_base(
          config.api_base.as_deref()
        );
        info!("Story API targeting: {}", api_base);
        StoryApiState
        {   api_base
          , http_client: reqwest::Client::new()
        }
    }

    /// Issue exactly one POST and decode the reply per
    /// the operation's declared shape. No retries, no
    /// timeout, no caching.
    async fn post_operation<Req, Resp>(
      &self
    , op: crate::request::Operation
    , request: &Req
    ) -> Result<Resp, crate::error::ApiError>
    where
      Req: Serialize
    , Resp: DeserializeOwned
    {   let url
          = format!("{}{}", self.api_base, op.path());
        trace!("POST {}", url);

        let response = self.http_client
          .post(&url)
          .header("Content-Type", "application/json")
          .json(request)
          .send()
          .await
          .map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            crate::decode::transport_error(&e)
          })?;

        let status = response.status();
        trace!("{} replied: {}", op.path(), status);

        let status_reason = status
          .canonical_reason()
          .unwrap_or("API request failed")
          .to_string();
        let body = response.text().await
          .unwrap_or_else(|_| String::new());

        if !status.is_success()
        {   return Err(crate::decode::decode_failure(
              status.as_u16(),
              &status_reason,
              &body
            ));
        }

        crate::decode::decode_success(
          op.shape(),
          status.as_u16(),
          &body
        )
    }

    async fn handle_continue_story(
      &self
    , request: crate::request::StoryContinueRequest
    ) -> Result<
        crate::request::StoryContinueResponse,
        crate::error::ApiError
      >
    {   debug!(
          "Handling continue_story ({} chars)",
          request.story.len()
        );
        self.post_operation(
          crate::request::Operation::ContinueStory,
          &request
        ).await
    }

    async fn handle_detect_genre(
      &self
    , request: crate::request::GenreDetectRequest
    ) -> Result<
        crate::request::GenreDetectResponse,
        crate::error::ApiError
      >
    {   debug!(
          "Handling detect_genre ({} chars)",
          request.text.len()
        );
        self.post_operation(
          crate::request::Operation::DetectGenre,
          &request
        ).await
    }

    async fn handle_generate_twist(
      &self
    , request: crate::request::TwistGenerateRequest
    ) -> Result<
        crate::request::TwistGenerateResponse,
        crate::error::ApiError
      >
    {   debug!(
          "Handling generate_twist ({})",
          request.effective_twist_type().as_str()
        );
        self.post_operation(
          crate::request::Operation::GenerateTwist,
          &request
        ).await
    }

    async fn handle_score_story(
      &self
    , request: crate::request::ScoreStoryRequest
    ) -> Result<
        crate::request::ScoreStoryResponse,
        crate::error::ApiError
      >
    {   debug!(
          "Handling score_story ({} chars)",
          request.text.len()
        );
        self.post_operation(
          crate::request::Operation::ScoreStory,
          &request
        ).await
    }

    async fn handle_extract_characters(
      &self
    , request: crate::request::ExtractCharactersRequest
    ) -> Result<
        crate::request::ExtractCharactersResponse,
        crate::error::ApiError
      >
    {   debug!(
          "Handling extract_characters ({} chars)",
          request.text.len()
        );
        let response: crate::request::ExtractCharactersResponse
          = self.post_operation(
              crate::request::Operation::ExtractCharacters,
              &request
            ).await?;

        if !response.is_consistent()
        {   warn!(
              "Character count {} does not match list \
               length {}",
              response.count,
              response.characters.len()
            );
        }

        Ok(response)
    }
}

/// Public story API client interface
pub struct StoryApiClient
{   tx: mpsc::UnboundedSender<StoryCommand>
  , _task: tokio::task::JoinHandle<()>
}

impl StoryApiClient
{   /// Create and spawn a new story client
    pub fn new(config: crate::config::BackendConfig)
      -> Self
    {   debug!("Creating StoryApiClient");
        let (cmd_tx, cmd_rx)
          = mpsc::unbounded_channel();

        let _task = tokio::spawn(async move {
          run_story_loop(cmd_rx, config).await;
        });

        StoryApiClient
        {   tx: cmd_tx
          , _task
        }
    }

    /// Queue a continuation request - returns immediately
    pub async fn continue_story(
      &self
    , request: crate::request::StoryContinueRequest
    , reply: crate::ContinueStoryReplySender
    ) -> Result<(), crate::error::ApiError>
    {   debug!("continue_story queued");
        self.tx.send(StoryCommand::ContinueStory {
          request,
          reply,
        }).map_err(|_| {
          error!("Story client disconnected");
          crate::error::ApiError::transport(
            "Story client disconnected".to_string()
          )
        })
    }

    /// Queue a genre detection - returns immediately
    pub async fn detect_genre(
      &self
    , request: crate::request::GenreDetectRequest
    , reply: crate::DetectGenreReplySender
    ) -> Result<(), crate::error::ApiError>
    {   debug!("detect_genre queued");
        self.tx.send(StoryCommand::DetectGenre {
          request,
          reply,
        }).map_err(|_| {
          error!("Story client disconnected");
          crate::error::ApiError::transport(
            "Story client disconnected".to_string()
          )
        })
    }

    /// Queue a twist generation - returns immediately
    pub async fn generate_twist(
      &self
    , request: crate::request::TwistGenerateRequest
    , reply: crate::GenerateTwistReplySender
    ) -> Result<(), crate::error::ApiError>
    {   debug!("generate_twist queued");
        self.tx.send(StoryCommand::GenerateTwist {
          request,
          reply,
        }).map_err(|_| {
          error!("Story client disconnected");
          crate::error::ApiError::transport(
            "Story client disconnected".to_string()
          )
        })
    }

    /// Queue a story scoring - returns immediately
    pub async fn score_story(
      &self
    , request: crate::request::ScoreStoryRequest
    , reply: crate::ScoreStoryReplySender
    ) -> Result<(), crate::error::ApiError>
    {   debug!("score_story queued");
        self.tx.send(StoryCommand::ScoreStory {
          request,
          reply,
        }).map_err(|_| {
          error!("Story client disconnected");
          crate::error::ApiError::transport(
            "Story client disconnected".to_string()
          )
        })
    }

    /// Queue a character extraction - returns immediately
    pub async fn extract_characters(
      &self
    , request: crate::request::ExtractCharactersRequest
    , reply: crate::ExtractCharactersReplySender
    ) -> Result<(), crate::error::ApiError>
    {   debug!("extract_characters queued");
        self.tx.send(StoryCommand::ExtractCharacters {
          request,
          reply,
        }).map_err(|_| {
          error!("Story client disconnected");
          crate::error::ApiError::transport(
            "Story client disconnected".to_string()
          )
        })
    }

    /// Shutdown the client
    pub async fn shutdown(self)
      -> Result<(), crate::error::ApiError>
    {   debug!("Shutting down StoryApiClient");
        self.tx.send(StoryCommand::Shutdown)
          .map_err(|_| {
            crate::error::ApiError::transport(
              "Client already shutdown".to_string()
            )
          })
    }
}

/// Main story client event loop. Commands are processed
/// in arrival order; an in-flight call is never cancelled
/// or retried.
async fn run_story_loop(
  mut cmd_rx: mpsc::UnboundedReceiver<StoryCommand>
, config: crate::config::BackendConfig
)
{   debug!("Starting story client loop");
    let state = StoryApiState::new(&config);

    loop
    { match cmd_rx.recv().await
      {   Some(StoryCommand::ContinueStory {
            request, reply
          }) => {
            debug!("Processing ContinueStory");
            let result = state
              .handle_continue_story(request)
              .await;
            let _ = reply.send(result);
          }
        , Some(StoryCommand::DetectGenre {
            request, reply
          }) => {
            debug!("Processing DetectGenre");
            let result = state
              .handle_detect_genre(request)
              .await;
            let _ = reply.send(result);
          }
        , Some(StoryCommand::GenerateTwist {
            request, reply
          }) => {
            debug!("Processing GenerateTwist");
            let result = state
              .handle_generate_twist(request)
              .await;
            let _ = reply.send(result);
          }
        , Some(StoryCommand::ScoreStory {
            request, reply
          }) => {
            debug!("Processing ScoreStory");
            let result = state
              .handle_score_story(request)
              .await;
            let _ = reply.send(result);
          }
        , Some(StoryCommand::ExtractCharacters {
            request, reply
          }) => {
            debug!("Processing ExtractCharacters");
            let result = state
              .handle_extract_characters(request)
              .await;
            let _ = reply.send(result);
          }
        , Some(StoryCommand::Shutdown) => {
            info!("Story client shutting down");
            break;
          }
        , None => {
            debug!("Command channel closed");
            break;
          }
      }
    }
}
