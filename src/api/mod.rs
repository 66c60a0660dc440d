//! HTTP client actors for the PlotCraft backend and the
//! companion user/auth service

pub mod story;
pub mod users;

// Re-export for convenience
pub use story::StoryApiClient;
pub use users::UsersApiClient;
