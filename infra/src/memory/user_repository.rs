use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use kw_core::domain::entities::user::User;
use kw_core::errors::{AuthError, DomainError};
use kw_core::repositories::UserRepository;

#[derive(Default)]
struct Users {
    by_id: HashMap<Uuid, User>,
    /// Lowercased email to id
    by_email: HashMap<String, Uuid>,
}

/// User store with a unique email index
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Users>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if users.by_email.contains_key(&user.email) {
            return Err(AuthError::UserAlreadyExists.into());
        }

        users.by_email.insert(user.email.clone(), user.id);
        users.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        let previous_email = match users.by_id.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => {
                return Err(DomainError::NotFound {
                    resource: format!("User with id {}", user.id),
                })
            }
        };

        if previous_email != user.email {
            if users.by_email.contains_key(&user.email) {
                return Err(AuthError::UserAlreadyExists.into());
            }
            users.by_email.remove(&previous_email);
            users.by_email.insert(user.email.clone(), user.id);
        }

        users.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut users = self.users.write().await;
        match users.by_id.remove(&id) {
            Some(user) => {
                users.by_email.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
