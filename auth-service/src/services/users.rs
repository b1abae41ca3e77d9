use chrono::Utc;
use dashmap::DashMap;

use crate::models::User;
use crate::services::ServiceError;

/// Process-local user directory.
///
/// Backs the user-lookup contract the token core consumes: `{id, email,
/// first_name, last_name}` by id, used to re-embed fresh claims on
/// rotation. Memory-resident like the credential store.
#[derive(Debug, Default)]
pub struct UserStore {
    by_id: DashMap<String, User>,
    /// email (lowercased) -> user id
    by_email: DashMap<String, String>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user, enforcing email uniqueness.
    pub fn create(&self, user: User) -> Result<(), ServiceError> {
        let email_key = user.email.to_lowercase();
        // Claim the email index first; the entry API makes the claim atomic.
        match self.by_email.entry(email_key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ServiceError::Conflict(
                anyhow::anyhow!("Email already registered"),
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.by_id.insert(user.id.clone(), user);
                Ok(())
            }
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<User> {
        self.by_id.get(id).map(|u| u.clone())
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let id = self.by_email.get(&email.to_lowercase()).map(|e| e.clone())?;
        self.find_by_id(&id)
    }

    pub fn set_password_hash(&self, id: &str, password_hash: String) -> Result<(), ServiceError> {
        self.update(id, |user| {
            user.password_hash = password_hash;
        })
    }

    pub fn mark_verified(&self, id: &str) -> Result<(), ServiceError> {
        self.update(id, |user| {
            user.verified = true;
        })
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut User)) -> Result<(), ServiceError> {
        let mut user = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(anyhow::anyhow!("User not found")))?;
        f(&mut user);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new(
            email.to_string(),
            "hash".to_string(),
            "Test".to_string(),
            "User".to_string(),
        )
    }

    #[test]
    fn test_create_and_lookup() {
        let store = UserStore::new();
        let u = user("a@example.com");
        let id = u.id.clone();
        store.create(u).unwrap();

        assert_eq!(store.find_by_id(&id).unwrap().email, "a@example.com");
        assert_eq!(store.find_by_email("A@Example.COM").unwrap().id, id);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let store = UserStore::new();
        store.create(user("a@example.com")).unwrap();
        let err = store.create(user("a@example.com")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_mark_verified_and_set_password() {
        let store = UserStore::new();
        let u = user("a@example.com");
        let id = u.id.clone();
        store.create(u).unwrap();

        store.mark_verified(&id).unwrap();
        store.set_password_hash(&id, "hash2".to_string()).unwrap();

        let stored = store.find_by_id(&id).unwrap();
        assert!(stored.verified);
        assert_eq!(stored.password_hash, "hash2");
    }
}
