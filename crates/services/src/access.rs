//! Staff-only access check applied to every API request.

use domains::{Result, User, UserRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The acting user exists and is staff.
    Permitted(User),
    Denied(Denial),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No identity was presented.
    Anonymous,
    /// The identity does not match any user record.
    UnknownUser,
    NotStaff,
}

impl Access {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Access::Permitted(_))
    }
}

/// Looks up the acting identity and permits it only if the user record
/// exists and is flagged staff. A missing record is a denial, not an error.
/// Repository failures propagate and never permit.
pub async fn check_staff(users: &dyn UserRepository, acting: Option<&str>) -> Result<Access> {
    let Some(username) = acting else {
        return Ok(Access::Denied(Denial::Anonymous));
    };

    let access = match users.find_by_username(username).await? {
        Some(user) if user.is_staff => Access::Permitted(user),
        Some(_) => Access::Denied(Denial::NotStaff),
        None => Access::Denied(Denial::UnknownUser),
    };

    if let Access::Denied(reason) = &access {
        tracing::debug!(username, ?reason, "access denied");
    }
    Ok(access)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockUserRepository;
    use mockall::predicate::eq;

    fn user(id: i64, username: &str, is_staff: bool) -> User {
        User {
            id,
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_staff,
            is_active: true,
            password_hash: String::new(),
        }
    }

    fn directory() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .with(eq("alice"))
            .returning(|_| Ok(Some(user(1, "alice", true))));
        users
            .expect_find_by_username()
            .with(eq("bob"))
            .returning(|_| Ok(Some(user(2, "bob", false))));
        users.expect_find_by_username().with(eq("carol")).returning(|_| Ok(None));
        users
    }

    #[tokio::test]
    async fn staff_user_is_permitted() {
        let access = check_staff(&directory(), Some("alice")).await.unwrap();
        assert!(access.is_permitted());
        assert!(matches!(access, Access::Permitted(u) if u.username == "alice"));
    }

    #[tokio::test]
    async fn non_staff_user_is_denied() {
        let access = check_staff(&directory(), Some("bob")).await.unwrap();
        assert_eq!(access, Access::Denied(Denial::NotStaff));
    }

    #[tokio::test]
    async fn unknown_user_is_denied_not_an_error() {
        let access = check_staff(&directory(), Some("carol")).await.unwrap();
        assert_eq!(access, Access::Denied(Denial::UnknownUser));
    }

    #[tokio::test]
    async fn anonymous_is_denied_without_lookup() {
        let users = MockUserRepository::new();
        let access = check_staff(&users, None).await.unwrap();
        assert_eq!(access, Access::Denied(Denial::Anonymous));
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .returning(|_| Err(domains::DomainError::Internal("db down".into())));
        assert!(check_staff(&users, Some("alice")).await.is_err());
    }
}
