//! Caller identity asserted by the upstream gateway.

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Optional header carrying the authenticated user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Authenticated caller attached to a request by the identity middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub name: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// Name shown to other users, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
