//! In-memory user directory enforcing the same uniqueness rules as the
//! database constraints.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{
    NewUser, PasswordHash, User, UserAccount, UserChanges, UserId, UserParts,
};

use super::lock;

#[derive(Debug, Default)]
struct State {
    accounts: Vec<UserAccount>,
    next_created_at: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing timestamps keep "newest first" deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = self
            .next_created_at
            .map_or_else(Utc::now, |last| last + Duration::milliseconds(1));
        self.next_created_at = Some(now);
        now
    }

    fn position(&self, id: &UserId) -> Option<usize> {
        self.accounts.iter().position(|a| a.user.id() == id)
    }
}

/// Thread-safe user store for tests.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    state: Mutex<State>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        lock(&self.state).accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored hash for `username`, for asserting password changes.
    pub fn password_hash(&self, username: &str) -> Option<PasswordHash> {
        lock(&self.state)
            .accounts
            .iter()
            .find(|a| a.user.username().as_str() == username)
            .map(|a| a.password_hash.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut state = lock(&self.state);
        if state.accounts.iter().any(|a| a.user.username() == &user.username) {
            return Err(UserRepositoryError::username_conflict());
        }
        if state.accounts.iter().any(|a| a.user.email() == &user.email) {
            return Err(UserRepositoryError::email_conflict());
        }
        let created = User::new(UserParts {
            id: UserId::random(),
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            is_admin: user.is_admin,
            created_at: state.tick(),
        });
        state.accounts.push(UserAccount {
            user: created.clone(),
            password_hash: user.password_hash.clone(),
        });
        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .find_account_by_id(id)
            .await?
            .map(|account| account.user))
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        Ok(lock(&self.state)
            .accounts
            .iter()
            .find(|a| a.user.username().as_str() == username)
            .cloned())
    }

    async fn find_account_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        let state = lock(&self.state);
        Ok(state.position(id).map(|idx| state.accounts[idx].clone()))
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut users: Vec<User> = lock(&self.state)
            .accounts
            .iter()
            .map(|a| a.user.clone())
            .collect();
        users.sort_by_key(|user| std::cmp::Reverse(user.created_at()));
        Ok(users)
    }

    async fn update(
        &self,
        id: &UserId,
        changes: &UserChanges,
    ) -> Result<User, UserRepositoryError> {
        let mut state = lock(&self.state);
        let idx = state.position(id).ok_or_else(UserRepositoryError::not_found)?;
        if let Some(email) = &changes.email {
            let taken = state
                .accounts
                .iter()
                .any(|a| a.user.email() == email && a.user.id() != id);
            if taken {
                return Err(UserRepositoryError::email_conflict());
            }
        }
        let account = &mut state.accounts[idx];
        account.user = account.user.clone().with_changes(changes.clone());
        Ok(account.user.clone())
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError> {
        let mut state = lock(&self.state);
        let idx = state.position(id).ok_or_else(UserRepositoryError::not_found)?;
        state.accounts[idx].password_hash = hash.clone();
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserRepositoryError> {
        let mut state = lock(&self.state);
        let idx = state.position(id).ok_or_else(UserRepositoryError::not_found)?;
        state.accounts.remove(idx);
        Ok(())
    }

    async fn admin_exists(&self) -> Result<bool, UserRepositoryError> {
        Ok(lock(&self.state).accounts.iter().any(|a| a.user.is_admin()))
    }
}
