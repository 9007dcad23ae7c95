use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::{
    error::DomainError,
    user::{ProfileUpdate, User},
};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Clone)]
pub struct AuthService<R: UserRepository + 'static> {
    repo: Arc<R>,
    keys: JwtKeys,
}

impl<R> AuthService<R>
where
    R: UserRepository + 'static,
{
    pub fn new(repo: Arc<R>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        if self.repo.find_by_username(&username).await?.is_some() {
            return Err(DomainError::UserAlreadyExists(username));
        }
        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, email.to_lowercase(), hash);
        self.repo.create(user).await
    }

    /// Checks the credentials and issues a session token.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, String), DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// Saves the viewer's own identity fields and returns a token matching
    /// the (possibly renamed) account.
    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<(User, String), DomainError> {
        if let Some(other) = self.repo.find_by_username(&update.username).await? {
            if other.id != user_id {
                return Err(DomainError::UserAlreadyExists(update.username));
            }
        }
        let update = ProfileUpdate {
            email: update.email.to_lowercase(),
            ..update
        };
        let user = self
            .repo
            .update_profile(user_id, update)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(user_id.to_string()))?;
        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.keys
            .generate_token(user)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }
}
