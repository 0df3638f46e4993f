//! Session-related types.

use shopfloor_core::UserId;

/// Session keys for authentication data.
///
/// The session carries the same two values a shopper's browser session always
/// has: who they are and whether they are currently logged in.
pub mod keys {
    /// Key for the logged-in user's database ID.
    pub const USER_ID: &str = "user_id";

    /// Key for the logged-in flag.
    pub const LOGGED_IN: &str = "logged_in";
}

/// Request-scoped identity, read from the session once per request.
///
/// `user_id` is only populated when the session holds a user id *and* the
/// logged-in flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Option<UserId>,
}

impl RequestContext {
    /// A context for a logged-in user.
    #[must_use]
    pub const fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// A context with no logged-in user.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// Build a context from the raw session values.
    #[must_use]
    pub const fn from_session(user_id: Option<UserId>, logged_in: Option<bool>) -> Self {
        match (user_id, logged_in) {
            (Some(id), Some(true)) => Self::authenticated(id),
            _ => Self::anonymous(),
        }
    }
}
