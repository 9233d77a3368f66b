// src/handlers/clients.rs

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
        client::{Client, ClientPayload},
        invoice::InvoiceSummary,
        project::Project,
    },
};

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    responses((status = 200, description = "Clientes em ordem alfabética", body = Vec<Client>)),
    security(("api_jwt" = []))
)]
pub async fn list_clients(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.client_service.list_clients().await?;
    Ok(Json(clients))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let client = app_state.client_service.get_client(id).await?;
    Ok(Json(client))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    payload: Result<Json<ClientPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let client = app_state.client_service.create_client(payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = i64, Path, description = "ID do cliente")),
    request_body = ClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Client),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ClientPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let client = app_state.client_service.update_client(id, payload).await?;
    Ok(Json(client))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses((status = 200, description = "Cliente, projetos e faturas apagados", body = MessageResponse)),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    app_state.client_service.delete_client(id).await?;
    tracing::info!(client_id = id, "Cliente apagado (cascata em projetos e faturas)");
    Ok(deleted("Client"))
}

// GET /api/clients/{id}/projects
#[utoipa::path(
    get,
    path = "/api/clients/{id}/projects",
    tag = "Clients",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses((status = 200, description = "Projetos do cliente", body = Vec<Project>)),
    security(("api_jwt" = []))
)]
pub async fn list_client_projects(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let projects = app_state.project_service.list_projects_by_client(id).await?;
    Ok(Json(projects))
}

// GET /api/clients/{id}/invoices
#[utoipa::path(
    get,
    path = "/api/clients/{id}/invoices",
    tag = "Clients",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses((status = 200, description = "Faturas do cliente", body = Vec<InvoiceSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_client_invoices(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let invoices = app_state.invoice_service.list_invoices_by_client(id).await?;
    Ok(Json(invoices))
}
