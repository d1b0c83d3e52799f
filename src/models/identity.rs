//! Identity domain model

/// Stored credentials and granted roles of a user.
///
/// Owned by the identity store; the authentication core only reads it.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Identity {
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Role identifiers in the order they were granted
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

// password_hash 不应出现在日志中
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}
