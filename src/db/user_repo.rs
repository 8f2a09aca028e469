// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, common::tenant::TenantScope, models::auth::User};

const USER_COLUMNS: &str =
    "id, tenant_id, name, email, password_hash, is_tenant_admin, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Login: o e-mail é único no sistema todo, a empresa vem do registro encontrado
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Usado pelo middleware de autenticação (id vindo de um JWT assinado)
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY name, email"
        ))
        .bind(scope.tenant_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // Cria um usuário dentro da empresa do escopo.
    // E-mail duplicado vira `EmailAlreadyExists`.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        name: &str,
        email: &str,
        password_hash: &str,
        is_tenant_admin: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (tenant_id, name, email, password_hash, is_tenant_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(scope.tenant_id())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(is_tenant_admin)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("users_email_key") => AppError::EmailAlreadyExists,
                        Some(other) => AppError::UniqueConstraintViolation(other.to_string()),
                        None => AppError::UniqueConstraintViolation("users".into()),
                    };
                }
            }
            e.into()
        })?;

        Ok(user)
    }
}
