//! Auth/session redirect gate and the onboarding
//! override state machine

use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::storage::ClientStorage;
use crate::storage::FLAG_SET;
use crate::storage::KEY_EMAIL;
use crate::storage::KEY_ONBOARDING_COMPLETE;

// ===== Session snapshot =====

/// Where the external auth provider is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus
{   Loading
  , Authenticated
  , Unauthenticated
}

/// Authenticated user as reported by the auth provider
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser
{   pub id: String
  , pub email: String
  , pub name: Option<String>
  , pub image: Option<String>
  , /// Profile-completion step still outstanding
    pub needs_onboarding: bool
  , pub profile: Option<serde_json::Value>
}

// ===== Routes =====

/// Client-side locations the gate routes between
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route
{   /// Main landing location
    Dashboard
  , Onboarding
  , Login
  , Other(String)
}

impl Route
{   pub fn as_path(&self) -> &str
    {   match self
        {   Route::Dashboard => "/dashboard"
          , Route::Onboarding => "/onboarding"
          , Route::Login => "/login"
          , Route::Other(path) => path
        }
    }

    pub fn from_path(path: &str) -> Route
    {   match path
        {   "/dashboard" => Route::Dashboard
          , "/onboarding" => Route::Onboarding
          , "/login" => Route::Login
          , other => Route::Other(other.to_string())
        }
    }
}

/// Outcome of one gate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction
{   /// No redirect this cycle
    Stay
  , /// Navigate to the given route
    Redirect(Route)
}

// ===== Onboarding override machine =====

/// How long a pending override may suppress session-based
/// redirects before it lapses
pub const DEFAULT_OVERRIDE_EXPIRY: Duration
  = Duration::from_secs(300);

/// Lifecycle of the just-completed-onboarding override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideState
{   /// No override in effect
    None
  , /// Profile completion reported; waiting for the next
    /// session refresh to confirm
    PendingConfirmation
  , /// Session confirmed; the stored flag was cleared
    Confirmed
}

/// Bridges the window between profile completion and the
/// asynchronous session refresh. Session data is stale
/// for one or more render cycles right after onboarding;
/// without the override the user would bounce back to the
/// onboarding page. A pending override that is never
/// confirmed lapses after the expiry so it cannot mask a
/// legitimate future onboarding requirement.
#[derive(Debug)]
pub struct OnboardingOverride
{   state: OverrideState
  , pending_since: Option<Instant>
  , expiry: Duration
}

impl OnboardingOverride
{   pub fn new(expiry: Duration) -> Self
    {   OnboardingOverride
        {   state: OverrideState::None
          , pending_since: None
          , expiry
        }
    }

    pub fn state(&self) -> OverrideState
    {   self.state
    }

    /// Arm after profile completion: persist the flag and
    /// open the confirmation window
    pub fn arm(&mut self, storage: &dyn ClientStorage)
    {   info!("Arming onboarding override");
        if let Err(e) = storage
            .set(KEY_ONBOARDING_COMPLETE, FLAG_SET)
        {   warn!(
              "Failed to persist onboarding flag: {}", e
            );
        }
        self.state = OverrideState::PendingConfirmation;
        self.pending_since = Some(Instant::now());
    }

    /// Whether the override currently suppresses
    /// session-based redirects. Storage errors read as
    /// flag-absent; an expired override lapses and drops
    /// the stored flag.
    pub fn is_pending(&mut self, storage: &dyn ClientStorage)
      -> bool
    {   let flag_present = storage
          .get(KEY_ONBOARDING_COMPLETE)
          .unwrap_or(None)
          .is_some();

        match self.state
        {   OverrideState::PendingConfirmation => {
              if !flag_present
              {   debug!(
                    "Onboarding flag gone; override cleared"
                  );
                  self.reset();
                  return false;
              }
              if self.expired()
              {   info!(
                    "Onboarding override never confirmed; \
                     lapsing after {:?}",
                    self.expiry
                  );
                  self.drop_flag(storage);
                  self.reset();
                  return false;
              }
              true
            }
          , _ => {
              if flag_present
              {   // Flag written by a previous process;
                  // date the window from now
                  debug!(
                    "Found persisted onboarding flag; \
                     entering pending state"
                  );
                  self.state
                    = OverrideState::PendingConfirmation;
                  self.pending_since = Some(Instant::now());
                  return true;
              }
              false
            }
        }
    }

    /// The session confirmed the completed state: clear
    /// the stored flag exactly once
    pub fn confirm(&mut self, storage: &dyn ClientStorage)
    {   if self.state != OverrideState::PendingConfirmation
        {   return;
        }
        info!(
          "Session confirms onboarding complete; \
           clearing override flag"
        );
        self.drop_flag(storage);
        self.state = OverrideState::Confirmed;
        self.pending_since = None;
    }

    fn expired(&self) -> bool
    {   match self.pending_since
        {   Some(since) => since.elapsed() > self.expiry
          , None => false
        }
    }

    fn reset(&mut self)
    {   self.state = OverrideState::None;
        self.pending_since = None;
    }

    fn drop_flag(&self, storage: &dyn ClientStorage)
    {   if let Err(e)
          = storage.remove(KEY_ONBOARDING_COMPLETE)
        {   warn!(
              "Failed to clear onboarding flag: {}", e
            );
        }
    }
}

// ===== Gate =====

/// Client-side redirect policy driven by the session
/// snapshot and the current location
pub struct AuthGate<S: ClientStorage>
{   storage: S
  , override_flag: OnboardingOverride
}

impl<S: ClientStorage> AuthGate<S>
{   pub fn new(storage: S) -> Self
    {   AuthGate::with_expiry(
          storage,
          DEFAULT_OVERRIDE_EXPIRY
        )
    }

    pub fn with_expiry(storage: S, expiry: Duration)
      -> Self
    {   debug!("Creating AuthGate");
        AuthGate
        {   storage
          , override_flag: OnboardingOverride::new(expiry)
        }
    }

    pub fn storage(&self) -> &S
    {   &self.storage
    }

    pub fn override_state(&self) -> OverrideState
    {   self.override_flag.state()
    }

    /// Report that the user just finished the onboarding
    /// form; suppresses the stale-session bounce until
    /// the session catches up
    pub fn complete_onboarding(&mut self)
    {   self.override_flag.arm(&self.storage);
    }

    /// Decide whether the current user must be
    /// redirected. Rules are evaluated in order; the
    /// first match wins.
    pub fn evaluate(
      &mut self
    , status: SessionStatus
    , user: Option<&SessionUser>
    , current: &Route
    ) -> GateAction
    {   // 1. Session still loading: pass through
        if status == SessionStatus::Loading
        {   debug!("Session loading; no redirect");
            return GateAction::Stay;
        }

        // 2. Override window: redirect home, confirm on
        //    arrival, and suppress the session rules
        if self.override_flag.is_pending(&self.storage)
        {   if *current != Route::Dashboard
            {   info!(
                  "Onboarding override set; redirecting \
                   to {}",
                  Route::Dashboard.as_path()
                );
                return GateAction::Redirect(
                  Route::Dashboard
                );
            }

            if status == SessionStatus::Authenticated
            {   if let Some(user) = user
                {   if !user.needs_onboarding
                    {   self.override_flag
                          .confirm(&self.storage);
                    }
                }
            }

            return GateAction::Stay;
        }

        // 3 + 4. Session-driven redirects
        if status == SessionStatus::Authenticated
        {   if let Some(user) = user
            {   if user.needs_onboarding
                  && *current != Route::Onboarding
                {   info!(
                      "User needs onboarding; redirecting \
                       to {}",
                      Route::Onboarding.as_path()
                    );
                    if let Err(e) = self.storage
                        .set(KEY_EMAIL, &user.email)
                    {   warn!(
                          "Failed to stash email: {}", e
                        );
                    }
                    return GateAction::Redirect(
                      Route::Onboarding
                    );
                }

                if !user.needs_onboarding
                  && *current == Route::Onboarding
                {   info!(
                      "Onboarding already complete; \
                       redirecting to {}",
                      Route::Dashboard.as_path()
                    );
                    return GateAction::Redirect(
                      Route::Dashboard
                    );
                }
            }
        }

        // 5. Nothing to do
        GateAction::Stay
    }
}
