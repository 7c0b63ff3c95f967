use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    #[display("USER")]
    User,
    #[display("ADMIN")]
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// bcrypt hash. Responses go through `PublicUser`, which drops it.
    #[serde(rename = "password")]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// What the API returns for a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/// Signup payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serde_is_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let back: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(back, Role::User);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn public_user_has_no_password() {
        let u = User::new("Ada".into(), "ada@example.com".into(), "$2b$hash".into(), Role::User);
        let v = serde_json::to_value(PublicUser::from(&u)).unwrap();
        assert!(v.get("password").is_none());
        assert_eq!(v["email"], "ada@example.com");
    }

    #[test]
    fn new_user_role_defaults_to_user() {
        let nu: NewUser =
            serde_json::from_str(r#"{"name":"Bob","email":"b@x.io","password":"secret1"}"#).unwrap();
        assert_eq!(nu.role, Role::User);
    }
}
