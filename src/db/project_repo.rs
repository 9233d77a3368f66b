// src/db/project_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::{db_utils::map_write_error, error::AppError},
    db::ProjectStore,
    models::project::{Project, ProjectPayload},
};

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.*, c.name AS client_name
            FROM projects p
            JOIN clients c ON p.client_id = c.id
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn list_projects_by_client(&self, client_id: i64) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.*, c.name AS client_name
            FROM projects p
            JOIN clients c ON p.client_id = c.id
            WHERE p.client_id = $1
            ORDER BY p.name ASC, p.id ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn find_project(&self, id: i64) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.*, c.name AS client_name
            FROM projects p
            JOIN clients c ON p.client_id = c.id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    // INSERT + JOIN numa única query (CTE), para já devolver o client_name
    async fn create_project(&self, project: &ProjectPayload) -> Result<Project, AppError> {
        let created = sqlx::query_as::<_, Project>(
            r#"
            WITH p AS (
                INSERT INTO projects (client_id, name, description, hourly_rate, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT p.*, c.name AS client_name
            FROM p
            JOIN clients c ON p.client_id = c.id
            "#,
        )
        .bind(project.client_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.hourly_rate)
        .bind(project.status_or_default())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Client"))?;

        Ok(created)
    }

    async fn update_project(&self, id: i64, project: &ProjectPayload) -> Result<Option<Project>, AppError> {
        let updated = sqlx::query_as::<_, Project>(
            r#"
            WITH p AS (
                UPDATE projects
                SET client_id = $1, name = $2, description = $3, hourly_rate = $4, status = $5
                WHERE id = $6
                RETURNING *
            )
            SELECT p.*, c.name AS client_name
            FROM p
            JOIN clients c ON p.client_id = c.id
            "#,
        )
        .bind(project.client_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.hourly_rate)
        .bind(project.status_or_default())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Client"))?;

        Ok(updated)
    }

    async fn delete_project(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
