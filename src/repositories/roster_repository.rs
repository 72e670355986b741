// src/repositories/roster_repository.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{ROLE_STUDENT, User},
};

/// Student roster lookups and the admin mutations on it.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    /// All users with the student role, newest first.
    async fn list_students(&self) -> AppResult<Vec<User>>;
    /// Fails with `Conflict` when the nickname is taken.
    async fn create(&self, user: User) -> AppResult<User>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn set_hidden(&self, id: Uuid, hidden: bool) -> AppResult<Option<User>>;
}

const USER_COLUMNS: &str =
    "id, nickname, pin, role, first_name, last_name, hidden, desescolarizado, created_at";

pub struct PgRosterRepository {
    pool: PgPool,
}

impl PgRosterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterRepository for PgRosterRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch user {}: {:?}", id, e);
                AppError::from(e)
            })?;
        Ok(user)
    }

    async fn list_students(&self) -> AppResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at DESC, id"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ROLE_STUDENT)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list students: {:?}", e);
                AppError::from(e)
            })?;
        Ok(users)
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users
            (id, nickname, pin, role, first_name, last_name, hidden, desescolarizado, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.nickname)
            .bind(&user.pin)
            .bind(&user.role)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.hidden)
            .bind(user.desescolarizado)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("Nickname '{}' already exists", user.nickname))
                }
                other => {
                    tracing::error!("Failed to create student: {}", other);
                    other
                }
            })
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user {}: {:?}", id, e);
                AppError::from(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_hidden(&self, id: Uuid, hidden: bool) -> AppResult<Option<User>> {
        let sql = format!("UPDATE users SET hidden = $1 WHERE id = $2 RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(hidden)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update visibility of {}: {:?}", id, e);
                AppError::from(e)
            })?;
        Ok(user)
    }
}

#[derive(Default)]
pub struct InMemoryRosterRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryRosterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RosterRepository for InMemoryRosterRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn list_students(&self) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        let mut students: Vec<User> = users.values().filter(|u| u.is_student()).cloned().collect();
        students.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(students)
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.nickname == user.nickname) {
            return Err(AppError::Conflict(format!(
                "Nickname '{}' already exists",
                user.nickname
            )));
        }
        if users.contains_key(&user.id) {
            return Err(AppError::Conflict(format!("User '{}' already exists", user.id)));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut users = self.users.write().await;
        Ok(users.remove(&id).is_some())
    }

    async fn set_hidden(&self, id: Uuid, hidden: bool) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.hidden = hidden;
            user.clone()
        }))
    }
}
