//! Authorization boundary. The identity provider resolves bearer
//! credentials into a [`Caller`] before any client method runs; the core
//! trusts the role predicate and never re-derives it.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccessError {
    #[error("admin role required")]
    AdminRequired,
}

/// A resolved, authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn standard(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }

    pub fn require_admin(&self) -> Result<(), AccessError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AccessError::AdminRequired)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gate() {
        assert!(Caller::admin("staff_1").require_admin().is_ok());
        assert_eq!(
            Caller::standard("staff_2").require_admin(),
            Err(AccessError::AdminRequired)
        );
    }
}
