use tokio::sync::mpsc;
use log::{debug, error, info};
use crate::PlotcraftFoot;

/// Backend state for routing story operations
pub struct PlotcraftBackendState
{   pub story_client: crate::api::story::StoryApiClient
}

impl PlotcraftBackendState
{   /// Create a new backend state from configuration
    pub fn new(config: crate::config::BackendConfig)
      -> Self
    {   debug!("Initializing PlotcraftBackendState");
        let story_client
          = crate::api::story::StoryApiClient::new(config);
        PlotcraftBackendState
        {   story_client
        }
    }
}

/// Public API for the PlotCraft backend - owns the task
pub struct PlotcraftBackend
{   hand: crate::PlotcraftHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl PlotcraftBackend
{   /// Create and spawn a new backend
    /// Returns immediately - spawns background task
    pub fn new(config: crate::config::BackendConfig)
      -> Self
    {   debug!("Creating PlotcraftBackend with task ownership");

        let (continue_story_tx, continue_story_rx)
          = mpsc::unbounded_channel();
        let (detect_genre_tx, detect_genre_rx)
          = mpsc::unbounded_channel();
        let (generate_twist_tx, generate_twist_rx)
          = mpsc::unbounded_channel();
        let (score_story_tx, score_story_rx)
          = mpsc::unbounded_channel();
        let (extract_characters_tx, extract_characters_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::PlotcraftHand
        {   continue_story_tx: continue_story_tx.clone()
          , detect_genre_tx: detect_genre_tx.clone()
          , generate_twist_tx: generate_twist_tx.clone()
          , score_story_tx: score_story_tx.clone()
          , extract_characters_tx
              : extract_characters_tx.clone()
          , kill_process_tx: kill_process_tx.clone()
        };

        let foot = crate::PlotcraftFoot
        {   continue_story_rx
          , detect_genre_rx
          , generate_twist_rx
          , score_story_rx
          , extract_characters_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, config).await
        });

        PlotcraftBackend
        {   hand
          , _task_handle
        }
    }

    /// Queue a story continuation - returns almost
    /// immediately
    pub async fn continue_story(
      &self
    , request: crate::request::StoryContinueRequest
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ContinueStoryReply>,
        crate::error::ApiError
      >
    {   debug!("continue_story queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ContinueStoryArgs
        {   request
          , reply: reply_tx
        };

        self.hand.continue_story_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::ApiError::transport(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a genre detection - returns almost
    /// immediately
    pub async fn detect_genre(
      &self
    , request: crate::request::GenreDetectRequest
    ) -> Result<
        mpsc::UnboundedReceiver<crate::DetectGenreReply>,
        crate::error::ApiError
      >
    {   debug!("detect_genre queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::DetectGenreArgs
        {   request
          , reply: reply_tx
        };

        self.hand.detect_genre_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::ApiError::transport(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a twist generation - returns almost
    /// immediately
    pub async fn generate_twist(
      &self
    , request: crate::request::TwistGenerateRequest
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GenerateTwistReply>,
        crate::error::ApiError
      >
    {   debug!("generate_twist queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GenerateTwistArgs
        {   request
          , reply: reply_tx
        };

        self.hand.generate_twist_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::ApiError::transport(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a story scoring - returns almost immediately
    pub async fn score_story(
      &self
    , request: crate::request::ScoreStoryRequest
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ScoreStoryReply>,
        crate::error::ApiError
      >
    {   debug!("score_story queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ScoreStoryArgs
        {   request
          , reply: reply_tx
        };

        self.hand.score_story_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::ApiError::transport(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a character extraction - returns almost
    /// immediately
    pub async fn extract_characters(
      &self
    , request: crate::request::ExtractCharactersRequest
    ) -> Result<
        mpsc::UnboundedReceiver<
          crate::ExtractCharactersReply
        >,
        crate::error::ApiError
      >
    {   debug!("extract_characters queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ExtractCharactersArgs
        {   request
          , reply: reply_tx
        };

        self.hand.extract_characters_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::ApiError::transport(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::ApiError>
    {   debug!("Shutting down PlotcraftBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::ApiError::transport(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown unconfirmed");
            Err(crate::error::ApiError::transport(
              "Backend shutdown unconfirmed".to_string()
            ))
        }
    }
}

/// Main backend event loop
///
/// Design: tokio::select! is ONLY for fast queueing.
/// Each select arm immediately forwards to the story
/// client actor and returns. No awaiting on work.
async fn run_backend_loop(
  foot: crate::PlotcraftFoot
, config: crate::config::BackendConfig
)
{   debug!("Starting PlotcraftBackend event loop");
    let state = PlotcraftBackendState::new(config);
    let PlotcraftFoot
    {   mut continue_story_rx
      , mut detect_genre_rx
      , mut generate_twist_rx
      , mut score_story_rx
      , mut extract_characters_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = continue_story_rx.recv() => {
          debug!("Received ContinueStory");
          let _ = state.story_client
            .continue_story(cmd.request, cmd.reply)
            .await;
        }
      , Some(cmd) = detect_genre_rx.recv() => {
          debug!("Received DetectGenre");
          let _ = state.story_client
            .detect_genre(cmd.request, cmd.reply)
            .await;
        }
      , Some(cmd) = generate_twist_rx.recv() => {
          debug!("Received GenerateTwist");
          let _ = state.story_client
            .generate_twist(cmd.request, cmd.reply)
            .await;
        }
      , Some(cmd) = score_story_rx.recv() => {
          debug!("Received ScoreStory");
          let _ = state.story_client
            .score_story(cmd.request, cmd.reply)
            .await;
        }
      , Some(cmd) = extract_characters_rx.recv() => {
          debug!("Received ExtractCharacters");
          let _ = state.story_client
            .extract_characters(cmd.request, cmd.reply)
            .await;
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("PlotcraftBackend shutting down");
          break;
        }
      }
    }
}
