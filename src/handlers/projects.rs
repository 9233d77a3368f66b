// src/handlers/projects.rs

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::{deleted, MessageResponse},
    models::{
        invoice::InvoiceSummary,
        project::{Project, ProjectPayload},
    },
};

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    responses((status = 200, description = "Projetos, mais recentes primeiro", body = Vec<Project>)),
    security(("api_jwt" = []))
)]
pub async fn list_projects(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let projects = app_state.project_service.list_projects().await?;
    Ok(Json(projects))
}

// GET /api/projects/{id}
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "Projeto", body = Project),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let project = app_state.project_service.get_project(id).await?;
    Ok(Json(project))
}

// POST /api/projects
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = ProjectPayload,
    responses(
        (status = 201, description = "Projeto criado", body = Project),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let project = app_state.project_service.create_project(payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

// PUT /api/projects/{id}
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    request_body = ProjectPayload,
    responses(
        (status = 200, description = "Projeto atualizado", body = Project),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Projeto ou cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let project = app_state.project_service.update_project(id, payload).await?;
    Ok(Json(project))
}

// DELETE /api/projects/{id}
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses((status = 200, description = "Projeto e faturas apagados", body = MessageResponse)),
    security(("api_jwt" = []))
)]
pub async fn delete_project(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    app_state.project_service.delete_project(id).await?;
    tracing::info!(project_id = id, "Projeto apagado (cascata nas faturas)");
    Ok(deleted("Project"))
}

// GET /api/projects/{id}/invoices
#[utoipa::path(
    get,
    path = "/api/projects/{id}/invoices",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses((status = 200, description = "Faturas do projeto", body = Vec<InvoiceSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_project_invoices(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let invoices = app_state.invoice_service.list_invoices_by_project(id).await?;
    Ok(Json(invoices))
}
