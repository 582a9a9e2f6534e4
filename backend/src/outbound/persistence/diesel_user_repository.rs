//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Uniqueness is left to the database: inserts and updates are attempted
//! directly and unique violations are translated by constraint name. Every
//! call is bounded by the pool's query timeout.

use std::future::Future;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{
    DisplayName, EmailAddress, NewUser, PasswordHash, User, UserAccount, UserChanges, UserId,
    UserParts, UserValidationError, Username,
};

use super::diesel_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation_constraint,
};
use super::models::{NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Constraint guarding unique usernames.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";
/// Constraint guarding unique email addresses.
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, UserRepositoryError>
    where
        F: Future<Output = Result<T, UserRepositoryError>>,
    {
        match self.pool.with_deadline(fut).await {
            Ok(result) => result,
            Err(elapsed) => {
                warn!(operation, timeout = ?elapsed.0, "user repository call timed out");
                Err(UserRepositoryError::timeout(operation))
            }
        }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

/// Map Diesel errors, translating unique violations by constraint name.
fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    match unique_violation_constraint(&error) {
        Some(USERNAME_CONSTRAINT) => return UserRepositoryError::username_conflict(),
        Some(EMAIL_CONSTRAINT) => return UserRepositoryError::email_conflict(),
        _ => {}
    }
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn row_to_account(row: UserRow) -> Result<UserAccount, UserRepositoryError> {
    let id = row.id;
    let invalid = move |err: UserValidationError| {
        UserRepositoryError::query(format!("stored user {id} is invalid: {err}"))
    };
    let user = User::new(UserParts {
        id: UserId::from_uuid(row.id),
        username: Username::new(&row.username).map_err(invalid)?,
        email: EmailAddress::new(&row.email).map_err(invalid)?,
        name: DisplayName::new(&row.name).map_err(invalid)?,
        is_admin: row.is_admin,
        created_at: row.created_at,
    });
    Ok(UserAccount {
        user,
        password_hash: PasswordHash::new(row.password_hash),
    })
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    row_to_account(row).map(|account| account.user)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        self.bounded("create user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row = NewUserRow {
                username: user.username.as_str(),
                email: user.email.as_str(),
                name: user.name.as_str(),
                password_hash: user.password_hash.as_str(),
                is_admin: user.is_admin,
            };
            let stored = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            row_to_user(stored)
        })
        .await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        self.find_account_by_id(id)
            .await
            .map(|account| account.map(|account| account.user))
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        self.bounded("find user by username", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            users::table
                .filter(users::username.eq(username))
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_account)
                .transpose()
        })
        .await
    }

    async fn find_account_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        self.bounded("find user by id", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            users::table
                .find(*id.as_uuid())
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_account)
                .transpose()
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        self.bounded("list users", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<UserRow> = users::table
                .order(users::created_at.desc())
                .select(UserRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_user).collect()
        })
        .await
    }

    async fn update(
        &self,
        id: &UserId,
        changes: &UserChanges,
    ) -> Result<User, UserRepositoryError> {
        self.bounded("update user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let update = UserUpdate {
                email: changes.email.as_ref().map(EmailAddress::as_str),
                name: changes.name.as_ref().map(DisplayName::as_str),
                is_admin: changes.is_admin,
            };
            diesel::update(users::table.find(*id.as_uuid()))
                .set(&update)
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(UserRepositoryError::not_found)
                .and_then(row_to_user)
        })
        .await
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError> {
        self.bounded("update password hash", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let affected = diesel::update(users::table.find(*id.as_uuid()))
                .set(users::password_hash.eq(hash.as_str()))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if affected == 0 {
                return Err(UserRepositoryError::not_found());
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserRepositoryError> {
        self.bounded("delete user", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let affected = diesel::delete(users::table.find(*id.as_uuid()))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if affected == 0 {
                return Err(UserRepositoryError::not_found());
            }
            Ok(())
        })
        .await
    }

    async fn admin_exists(&self) -> Result<bool, UserRepositoryError> {
        self.bounded("check for administrators", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::select(diesel::dsl::exists(
                users::table.filter(users::is_admin.eq(true)),
            ))
            .get_result::<bool>(&mut conn)
            .await
            .map_err(map_diesel_error)
        })
        .await
    }
}
