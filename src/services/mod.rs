pub mod availability;
pub mod booking;
pub mod fleet;

use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::utils::jwt::Claims;

/// Identity of the user performing an operation, resolved by the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

impl From<&Claims> for Caller {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_or_admin() {
        let owner = Uuid::new_v4();

        assert!(Caller::new(owner, UserRole::User).can_access(owner));
        assert!(Caller::new(Uuid::new_v4(), UserRole::Admin).can_access(owner));
        assert!(!Caller::new(Uuid::new_v4(), UserRole::User).can_access(owner));
    }
}
