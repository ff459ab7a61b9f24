use crate::domain::ids::UserId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Customer,
    Settler,
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "CUSTOMER",
            ActorRole::Settler => "SETTLER",
            ActorRole::System => "SYSTEM",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(ActorRole::Customer),
            "SETTLER" => Ok(ActorRole::Settler),
            "SYSTEM" => Ok(ActorRole::System),
            other => Err(CoreError::InvalidActor(other.to_string())),
        }
    }
}

/// The identity performing a transition. Always passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Customer(UserId),
    Settler(UserId),
    System,
}

impl Actor {
    pub fn role(&self) -> ActorRole {
        match self {
            Actor::Customer(_) => ActorRole::Customer,
            Actor::Settler(_) => ActorRole::Settler,
            Actor::System => ActorRole::System,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Actor::Customer(id) | Actor::Settler(id) => Some(id),
            Actor::System => None,
        }
    }

    /// Parses `customer:<id>`, `settler:<id>` or `system`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("system") {
            return Ok(Actor::System);
        }
        let (role, id) = trimmed
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidActor(trimmed.to_string()))?;
        let id = UserId::new(id).map_err(|_| CoreError::InvalidActor(trimmed.to_string()))?;
        match role.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Actor::Customer(id)),
            "settler" => Ok(Actor::Settler(id)),
            _ => Err(CoreError::InvalidActor(trimmed.to_string())),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Customer(id) => write!(f, "customer:{}", id),
            Actor::Settler(id) => write!(f, "settler:{}", id),
            Actor::System => f.write_str("system"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Actor, ActorRole};

    #[test]
    fn parse_actor_forms() {
        let customer = Actor::parse("customer:c1").unwrap();
        assert_eq!(customer.role(), ActorRole::Customer);
        assert_eq!(customer.user_id().unwrap().as_str(), "c1");

        let settler = Actor::parse("Settler: A").unwrap();
        assert_eq!(settler.to_string(), "settler:A");

        assert_eq!(Actor::parse("SYSTEM").unwrap(), Actor::System);
    }

    #[test]
    fn parse_actor_rejects_unknown_role() {
        assert!(Actor::parse("admin:x").is_err());
        assert!(Actor::parse("customer:").is_err());
        assert!(Actor::parse("customer").is_err());
    }
}
