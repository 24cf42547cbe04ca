use crate::is_default;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
/// Probe used on start-up to find out whether the stored cookies are still valid.
pub const PROBE_PATH: &str = "/auth/me";

const AUTH_PREFIX: &str = "/auth/";

/// Auth endpoints are exempt from the CSRF header.
pub fn is_auth_path(path: &str) -> bool {
    path.starts_with(AUTH_PREFIX)
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    /// Assumed when the API leaves the role out.
    #[default]
    Student,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        match s.as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" | "faculty" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(anyhow!("Unknown role: {}", s)),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Teacher => f.write_str("teacher"),
            Role::Student => f.write_str("student"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// The login and probe endpoints answer either with the user itself or
/// with `{ "user": { .. } }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AuthPayload {
    Nested { user: AuthUser },
    Flat(AuthUser),
}

impl AuthPayload {
    pub fn into_user(self) -> AuthUser {
        match self {
            AuthPayload::Nested { user } => user,
            AuthPayload::Flat(user) => user,
        }
    }
}
