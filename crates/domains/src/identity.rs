//! Caller identity as resolved from a bearer token.

use serde::{Deserialize, Serialize};

use crate::models::{AgeGroup, Role, User, UserId};

/// Token payload. `role` and `age_group` stay as raw strings so that a token
/// carrying an unrecognised value still decodes; [`Identity::from_claims`]
/// applies the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated requester every service operation is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    /// `None` is the most restrictive value: nothing age-gated is visible.
    pub age_group: Option<AgeGroup>,
}

impl Identity {
    /// Missing or unparseable role falls back to `Standard`; missing or
    /// unparseable age group becomes `None`.
    pub fn from_claims(claims: &Claims) -> Self {
        let role = claims
            .role
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or(Role::Standard);
        let age_group = claims.age_group.as_deref().and_then(|a| a.parse().ok());

        Self {
            user_id: claims.sub.clone(),
            username: claims.name.clone(),
            role,
            age_group,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            age_group: Some(user.age_group),
        }
    }
}

/// Self-service account request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub age_group: AgeGroup,
}
