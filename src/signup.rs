//! Two-step email/OTP signup flow

use log::{debug, error, info, warn};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::storage::ClientStorage;
use crate::storage::KEY_EMAIL;

/// Seconds a user must wait between OTP sends
pub const RESEND_COOLDOWN_SECS: u64 = 30;

/// Generic fail-closed message for the email step
pub const SEND_OTP_FAILED_MSG: &str
  = "Failed to send OTP. Please try again.";

/// Which form the signup flow is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStep
{   Email
  , Otp
}

/// Outcome of the email step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStepOutcome
{   /// Code sent; the flow advanced to the OTP step
    OtpSent
  , /// Account already exists; route to login instead
    ExistingAccount
}

/// Outcome of a successful OTP verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome
{   /// The address already had an account; route to
    /// login, never treat as a fresh signup
    ExistingAccount
  , /// New account; the email was stashed for the
    /// onboarding flow to consume
    NewUser
}

// ===== Resend cooldown =====

/// Client-side cooldown between OTP sends. Cosmetic; the
/// backend owns real rate limiting.
#[derive(Debug)]
pub struct ResendCooldown
{   last_sent: Option<Instant>
  , period: Duration
}

impl ResendCooldown
{   pub fn new(period: Duration) -> Self
    {   ResendCooldown
        {   last_sent: None
          , period
        }
    }

    /// Whole seconds left before another send is allowed
    pub fn remaining_secs(&self) -> u64
    {   let since = match self.last_sent
        {   Some(at) => at.elapsed()
          , None => return 0
        };

        match self.period.checked_sub(since)
        {   Some(left) if !left.is_zero() => {
              left.as_secs().max(1)
            }
          , _ => 0
        }
    }

    pub fn ready(&self) -> bool
    {   self.remaining_secs() == 0
    }

    /// Record a successful send
    pub fn start(&mut self)
    {   self.last_sent = Some(Instant::now());
    }
}

impl Default for ResendCooldown
{   fn default() -> Self
    {   ResendCooldown::new(
          Duration::from_secs(RESEND_COOLDOWN_SECS)
        )
    }
}

// ===== Signup flow =====

/// Two-step signup state machine driving the users API.
/// The flow never reaches the OTP step without a
/// successful email step.
pub struct SignupFlow<S: ClientStorage>
{   step: SignupStep
  , email: String
  , cooldown: ResendCooldown
  , storage: S
}

impl<S: ClientStorage> SignupFlow<S>
{   pub fn new(storage: S) -> Self
    {   debug!("Creating SignupFlow");
        SignupFlow
        {   step: SignupStep::Email
          , email: String::new()
          , cooldown: ResendCooldown::default()
          , storage
        }
    }

    pub fn step(&self) -> SignupStep
    {   self.step
    }

    pub fn email(&self) -> &str
    {   &self.email
    }

    pub fn cooldown(&self) -> &ResendCooldown
    {   &self.cooldown
    }

    pub fn storage(&self) -> &S
    {   &self.storage
    }

    /// Step 1: check the address, then send a code to a
    /// new one. Fails closed: any backend problem in
    /// either call surfaces the generic retry message and
    /// leaves the flow on the email step.
    pub async fn submit_email(
      &mut self
    , users: &crate::api::users::UsersApiClient
    , email: &str
    ) -> Result<EmailStepOutcome, crate::error::ApiError>
    {   debug!("Signup email step for: {}", email);
        self.email = email.to_string();

        let mut check_rx = users
          .check_user(email.to_string())
          .await
          .map_err(fail_closed)?;
        let check = recv_reply(&mut check_rx)
          .await
          .and_then(|result| result)
          .map_err(fail_closed)?;

        if check.exists
        {   info!(
              "Account already exists for: {}", email
            );
            return Ok(EmailStepOutcome::ExistingAccount);
        }

        self.dispatch_otp(users).await?;
        self.step = SignupStep::Otp;
        info!("OTP sent; advancing to the OTP step");
        Ok(EmailStepOutcome::OtpSent)
    }

    /// Re-send the code. Refused while the cooldown is
    /// running; failures reuse the fail-closed message.
    pub async fn resend_otp(
      &mut self
    , users: &crate::api::users::UsersApiClient
    ) -> Result<(), crate::error::ApiError>
    {   if self.step != SignupStep::Otp
        {   error!("resend_otp outside the OTP step");
            return Err(crate::error::ApiError::transport(
              "No OTP step in progress".to_string()
            ));
        }

        if !self.cooldown.ready()
        {   let left = self.cooldown.remaining_secs();
            warn!("Resend refused; {}s left", left);
            return Err(crate::error::ApiError::transport(
              format!("Resend OTP in {}s", left)
            ));
        }

        self.dispatch_otp(users).await
    }

    /// Step 2: verify the entered code. Backend failures
    /// surface their detail message; a verified address
    /// that already has an account routes to login.
    pub async fn submit_otp(
      &mut self
    , users: &crate::api::users::UsersApiClient
    , otp: &str
    ) -> Result<VerifyOutcome, crate::error::ApiError>
    {   if self.step != SignupStep::Otp
        {   error!(
              "submit_otp before a successful email step"
            );
            return Err(crate::error::ApiError::transport(
              "No OTP step in progress".to_string()
            ));
        }

        debug!("Verifying OTP for: {}", self.email);
        let mut verify_rx = users
          .verify_otp(
            self.email.clone(),
            otp.to_string()
          )
          .await?;
        let verified = recv_reply(&mut verify_rx)
          .await
          .and_then(|result| result)?;

        if verified.exists
        {   info!(
              "Verified an existing account; routing to \
               login"
            );
            return Ok(VerifyOutcome::ExistingAccount);
        }

        if let Err(e)
          = self.storage.set(KEY_EMAIL, &self.email)
        {   warn!(
              "Failed to stash email for onboarding: {}",
              e
            );
        }
        info!("New account verified for: {}", self.email);
        Ok(VerifyOutcome::NewUser)
    }

    /// Return to the email form without clearing the
    /// entered address
    pub fn back(&mut self)
    {   debug!("Returning to the email step");
        self.step = SignupStep::Email;
    }

    async fn dispatch_otp(
      &mut self
    , users: &crate::api::users::UsersApiClient
    ) -> Result<(), crate::error::ApiError>
    {   let mut send_rx = users
          .send_otp(self.email.clone())
          .await
          .map_err(fail_closed)?;
        recv_reply(&mut send_rx)
          .await
          .and_then(|result| result)
          .map_err(fail_closed)?;

        self.cooldown.start();
        Ok(())
    }
}

/// Replace the backend's message with the generic retry
/// message while keeping the status
fn fail_closed(err: crate::error::ApiError)
  -> crate::error::ApiError
{   error!("Email step failed: {}", err);
    crate::error::ApiError::new(
      err.status,
      SEND_OTP_FAILED_MSG.to_string()
    )
}

async fn recv_reply<T>(
  rx: &mut mpsc::UnboundedReceiver<T>
) -> Result<T, crate::error::ApiError>
{   rx.recv().await.ok_or_else(|| {
      error!("Reply channel closed");
      crate::error::ApiError::transport(
        "Users client disconnected".to_string()
      )
    })
}
