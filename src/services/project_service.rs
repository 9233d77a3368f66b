// src/services/project_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::error::AppError,
    db::ProjectStore,
    models::project::{Project, ProjectPayload},
};

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        self.store.list_projects().await
    }

    pub async fn list_projects_by_client(&self, client_id: i64) -> Result<Vec<Project>, AppError> {
        self.store.list_projects_by_client(client_id).await
    }

    pub async fn get_project(&self, id: i64) -> Result<Project, AppError> {
        self.store
            .find_project(id)
            .await?
            .ok_or_else(|| AppError::not_found("Project"))
    }

    pub async fn create_project(&self, payload: ProjectPayload) -> Result<Project, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        self.store.create_project(&payload).await
    }

    pub async fn update_project(&self, id: i64, payload: ProjectPayload) -> Result<Project, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        self.store
            .update_project(id, &payload)
            .await?
            .ok_or_else(|| AppError::not_found("Project"))
    }

    pub async fn delete_project(&self, id: i64) -> Result<(), AppError> {
        self.store.delete_project(id).await?;
        Ok(())
    }
}
