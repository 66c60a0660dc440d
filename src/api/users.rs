use log::{debug, error, info, trace};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ===== Wire Types =====

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord
{   pub id: String
  , pub email: String
  , #[serde(default)]
    pub name: Option<String>
  , #[serde(default)]
    pub image: Option<String>
  , #[serde(default)]
    pub provider: Option<String>
  , #[serde(default)]
    pub profile: Option<serde_json::Value>
}

impl UserRecord
{   /// Onboarding is outstanding until a profile exists
    pub fn needs_onboarding(&self) -> bool
    {   self.profile.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckUserResponse
{   pub exists: bool
  , #[serde(default)]
    pub user: Option<UserRecord>
}

impl CheckUserResponse
{   /// A missing record or a record without a profile
    /// both mean the onboarding step is still due
    pub fn needs_onboarding(&self) -> bool
    {   match &self.user
        {   Some(user) => user.needs_onboarding()
          , None => true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileResponse
{   pub success: bool
  , #[serde(default)]
    pub user: Option<UserRecord>
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest
{   pub id: String
  , pub name: Option<String>
  , pub email: String
  , pub image: Option<String>
  , pub provider: String
  , /// Always null at creation; onboarding fills it in
    pub profile: Option<serde_json::Value>
}

#[derive(Debug, Clone, Serialize)]
pub struct SendOtpRequest
{   pub email: String
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest
{   pub email: String
  , pub otp: String
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifyOtpResponse
{   /// Whether the verified address already had an
    /// account
    pub exists: bool
}

// ===== Reply aliases =====

pub type CheckUserReply
  = Result<CheckUserResponse, crate::error::ApiError>;
pub type ProfileReply
  = Result<ProfileResponse, crate::error::ApiError>;
pub type CreateUserReply
  = Result<serde_json::Value, crate::error::ApiError>;
pub type SendOtpReply
  = Result<serde_json::Value, crate::error::ApiError>;
pub type VerifyOtpReply
  = Result<VerifyOtpResponse, crate::error::ApiError>;

// ===== Users Client Actor =====

/// Commands for the UsersApiClient actor
pub enum UsersCommand
{   CheckUser
    {   email: String
      , reply: mpsc::UnboundedSender<CheckUserReply>
    }
  , GetProfile
    {   email: String
      , reply: mpsc::UnboundedSender<ProfileReply>
    }
  , CreateUser
    {   request: CreateUserRequest
      , reply: mpsc::UnboundedSender<CreateUserReply>
    }
  , SendOtp
    {   email: String
      , reply: mpsc::UnboundedSender<SendOtpReply>
    }
  , VerifyOtp
    {   email: String
      , otp: String
      , reply: mpsc::UnboundedSender<VerifyOtpReply>
    }
  , Shutdown
}

/// Users API client state
pub struct UsersApiState
{   api_base: String
  , http_client: reqwest::Client
}

impl UsersApiState
{   pub fn new(config: &crate::config::BackendConfig)
      -> Self
    {   debug!("Creating UsersApiState");
        let api_base = crate::config::resolve_api_base(
          config.api_base.as_deref()
        );
        info!("Users API targeting: {}", api_base);
        UsersApiState
        {   api_base
          , http_client: reqwest::Client::new()
        }
    }

    /// One GET with query parameters, bare-decoded
    async fn get_json<Resp: DeserializeOwned>(
      &self
    , path: &str
    , query: &[(&str, &str)]
    ) -> Result<Resp, crate::error::ApiError>
    {   let url = format!("{}{}", self.api_base, path);
        trace!("GET {}", url);

        let response = self.http_client
          .get(&url)
          .query(query)
          .send()
          .await
          .map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            crate::decode::transport_error(&e)
          })?;

        self.decode_response(path, response).await
    }

    /// One POST with a JSON body, bare-decoded
    async fn post_json<Req, Resp>(
      &self
    , path: &str
    , request: &Req
    ) -> Result<Resp, crate::error::ApiError>
    where
      Req: Serialize
    , Resp: DeserializeOwned
    {   let url = format!("{}{}", self.api_base, path);
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

        self.decode_response(path, response).await
    }

    async fn decode_response<Resp: DeserializeOwned>(
      &self
    , path: &str
    , response: reqwest::Response
    ) -> Result<Resp, crate::error::ApiError>
    {   let status = response.status();
        trace!("{} replied: {}", path, status);

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
          crate::decode::ResponseShape::Bare,
          status.as_u16(),
          &body
        )
    }

    async fn handle_check_user(&self, email: String)
      -> CheckUserReply
    {   debug!("Handling check_user for: {}", email);
        self.get_json(
          "/users/check",
          &[("email", email.as_str())]
        ).await
    }

    async fn handle_get_profile(&self, email: String)
      -> ProfileReply
    {   debug!("Handling get_profile for: {}", email);
        self.get_json(
          "/users/profile",
          &[("email", email.as_str())]
        ).await
    }

    async fn handle_create_user(
      &self
    , request: CreateUserRequest
    ) -> CreateUserReply
    {   debug!(
          "Handling create_user for: {}",
          request.email
        );
        self.post_json("/users", &request).await
    }

    async fn handle_send_otp(&self, email: String)
      -> SendOtpReply
    {   debug!("Handling send_otp for: {}", email);
        let request = SendOtpRequest
        {   email
        };
        self.post_json("/send-otp", &request).await
    }

    async fn handle_verify_otp(
      &self
    , email: String
    , otp: String
    ) -> VerifyOtpReply
    {   debug!("Handling verify_otp for: {}", email);
        let request = VerifyOtpRequest
        {   email
          , otp
        };
        self.post_json("/verify-otp", &request).await
    }
}

/// Public users API client interface
pub struct UsersApiClient
{   tx: mpsc::UnboundedSender<UsersCommand>
  , _task: tokio::task::JoinHandle<()>
}

impl UsersApiClient
{   /// Create and spawn a new users client
    pub fn new(config: crate::config::BackendConfig)
      -> Self
    {   debug!("Creating UsersApiClient");
        let (cmd_tx, cmd_rx)
          = mpsc::unbounded_channel();

        let _task = tokio::spawn(async move {
          run_users_loop(cmd_rx, config).await;
        });

        UsersApiClient
        {   tx: cmd_tx
          , _task
        }
    }

    /// Queue an existence check - returns the reply
    /// receiver immediately
    pub async fn check_user(&self, email: String)
      -> Result<
          mpsc::UnboundedReceiver<CheckUserReply>,
          crate::error::ApiError
        >
    {   debug!("check_user queued for: {}", email);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.tx.send(UsersCommand::CheckUser {
          email,
          reply: reply_tx,
        }).map_err(|_| {
          error!("Users client disconnected");
          crate::error::ApiError::transport(
            "Users client disconnected".to_string()
          )
        })?;

        Ok(reply_rx)
    }

    /// Queue a profile fetch - returns the reply
    /// receiver immediately
    pub async fn get_profile(&self, email: String)
      -> Result<
          mpsc::UnboundedReceiver<ProfileReply>,
          crate::error::ApiError
        >
    {   debug!("get_profile queued for: {}", email);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.tx.send(UsersCommand::GetProfile {
          email,
          reply: reply_tx,
        }).map_err(|_| {
          error!("Users client disconnected");
          crate::error::ApiError::transport(
            "Users client disconnected".to_string()
          )
        })?;

        Ok(reply_rx)
    }

    /// Queue a user creation - returns the reply
    /// receiver immediately
    pub async fn create_user(
      &self
    , request: CreateUserRequest
    ) -> Result<
          mpsc::UnboundedReceiver<CreateUserReply>,
          crate::error::ApiError
        >
    {   debug!("create_user queued");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.tx.send(UsersCommand::CreateUser {
          request,
          reply: reply_tx,
        }).map_err(|_| {
          error!("Users client disconnected");
          crate::error::ApiError::transport(
            "Users client disconnected".to_string()
          )
        })?;

        Ok(reply_rx)
    }

    /// Queue an OTP send - returns the reply receiver
    /// immediately
    pub async fn send_otp(&self, email: String)
      -> Result<
          mpsc::UnboundedReceiver<SendOtpReply>,
          crate::error::ApiError
        >
    {   debug!("send_otp queued for: {}", email);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.tx.send(UsersCommand::SendOtp {
          email,
          reply: reply_tx,
        }).map_err(|_| {
          error!("Users client disconnected");
          crate::error::ApiError::transport(
            "Users client disconnected".to_string()
          )
        })?;

        Ok(reply_rx)
    }

    /// Queue an OTP verification - returns the reply
    /// receiver immediately
    pub async fn verify_otp(
      &self
    , email: String
    , otp: String
    ) -> Result<
          mpsc::UnboundedReceiver<VerifyOtpReply>,
          crate::error::ApiError
        >
    {   debug!("verify_otp queued for: {}", email);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.tx.send(UsersCommand::VerifyOtp {
          email,
          otp,
          reply: reply_tx,
        }).map_err(|_| {
          error!("Users client disconnected");
          crate::error::ApiError::transport(
            "Users client disconnected".to_string()
          )
        })?;

        Ok(reply_rx)
    }

    /// Shutdown the client
    pub async fn shutdown(self)
      -> Result<(), crate::error::ApiError>
    {   debug!("Shutting down UsersApiClient");
        self.tx.send(UsersCommand::Shutdown)
          .map_err(|_| {
            crate::error::ApiError::transport(
              "Client already shutdown".to_string()
            )
          })
    }
}

/// Main users client event loop
async fn run_users_loop(
  mut cmd_rx: mpsc::UnboundedReceiver<UsersCommand>
, config: crate::config::BackendConfig
)
{   debug!("Starting users client loop");
    let state = UsersApiState::new(&config);

    loop
    { match cmd_rx.recv().await
      {   Some(UsersCommand::CheckUser {
            email, reply
          }) => {
            debug!("Processing CheckUser");
            let result
              = state.handle_check_user(email).await;
            let _ = reply.send(result);
          }
        , Some(UsersCommand::GetProfile {
            email, reply
          }) => {
            debug!("Processing GetProfile");
            let result
              = state.handle_get_profile(email).await;
            let _ = reply.send(result);
          }
        , Some(UsersCommand::CreateUser {
            request, reply
          }) => {
            debug!("Processing CreateUser");
            let result
              = state.handle_create_user(request).await;
            let _ = reply.send(result);
          }
        , Some(UsersCommand::SendOtp {
            email, reply
          }) => {
            debug!("Processing SendOtp");
            let result
              = state.handle_send_otp(email).await;
            let _ = reply.send(result);
          }
        , Some(UsersCommand::VerifyOtp {
            email, otp, reply
          }) => {
            debug!("Processing VerifyOtp");
            let result
              = state.handle_verify_otp(email, otp).await;
            let _ = reply.send(result);
          }
        , Some(UsersCommand::Shutdown) => {
            info!("Users client shutting down");
            break;
          }
        , None => {
            debug!("Command channel closed");
            break;
          }
      }
    }
}
