use std::{collections::HashSet, fmt::Display, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};

/// Known roles - not hierarchical, a user carries all roles it has.
#[derive(Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug)]
pub struct UnknownRole(String);

impl Display for UnknownRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

pub trait Authorization {
    fn has_role(&self, role: Role) -> bool;

    fn has_any_role<I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = Role>,
    {
        roles.into_iter().any(|role| self.has_role(role))
    }

    fn has_all_roles<I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = Role>,
    {
        roles.into_iter().all(|role| self.has_role(role))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaim {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub roles: HashSet<Role>,
}

impl Authorization for UserClaim {
    fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClaim {
    pub sub: String,
    pub exp: u64,
    pub roles: HashSet<Role>,
}

impl ApiClaim {
    /// Claim without validity - expiration is set when the token is issued.
    pub fn new_expired<I>(sub: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        ApiClaim {
            sub: sub.into(),
            exp: 0,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

impl Authorization for ApiClaim {
    fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = until
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
    }

    fn check_validity(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        self.exp > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role() {
        let role: Role = "admin".parse().unwrap();
        assert_eq!(role.as_ref(), "admin");
        assert!("owner".parse::<Role>().is_err());
        let claim = ApiClaim {
            sub: "123".to_string(),
            exp: 1,
            roles: HashSet::from([Role::Admin, Role::User]),
        };
        assert!(claim.has_role(Role::Admin));
        assert!(claim.has_any_role([Role::Admin]));
        assert!(claim.has_all_roles([Role::Admin, Role::User]));
        assert_eq!(claim.user_id(), Some(123));
    }

    #[test]
    fn test_role_serialization() {
        let serialized = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(serialized, "\"admin\"");
        let parsed: Role = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
