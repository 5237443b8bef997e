// db/roledb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::rolemodel::{Permission, Role};

#[async_trait]
pub trait RoleExt {
    async fn get_roles(&self) -> Result<Vec<Role>, sqlx::Error>;

    async fn get_role(&self, role_id: Uuid) -> Result<Option<Role>, sqlx::Error>;

    async fn create_role(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Role, sqlx::Error>;

    async fn delete_role(&self, role_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn get_permissions(&self) -> Result<Vec<Permission>, sqlx::Error>;

    async fn create_permission(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Permission, sqlx::Error>;

    async fn delete_permission(&self, permission_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, sqlx::Error>;

    /// Replaces the role's permission set.
    async fn set_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, sqlx::Error>;

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error>;

    /// Replaces the user's role memberships.
    async fn set_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<Vec<Role>, sqlx::Error>;

    async fn get_user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>;

    async fn get_permission_names_for_roles(
        &self,
        role_ids: &[Uuid],
    ) -> Result<Vec<String>, sqlx::Error>;
}

#[async_trait]
impl RoleExt for DBClient {
    async fn get_roles(&self) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_role(&self, role_id: Uuid) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles WHERE id = $1",
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_role(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Role, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_role(&self, role_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_permissions(&self) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_permission(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Permission, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_permission(&self, permission_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(permission_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.description, p.created_at
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn set_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_role_permissions(role_id).await
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.description, r.created_at
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn set_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<Vec<Role>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_user_roles(user_id).await
    }

    async fn get_user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT role_id FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_permission_names_for_roles(
        &self,
        role_ids: &[Uuid],
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT p.name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = ANY($1)
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
    }
}
