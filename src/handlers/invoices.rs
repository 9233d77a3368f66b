// src/handlers/invoices.rs

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
    middleware::auth::AuthenticatedUser,
    models::invoice::{InvoiceDetail, InvoicePayload, InvoiceSummary, StatusChange, StatusPayload},
};

// =============================================================================
//  LEITURA
// =============================================================================

// GET /api/invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    responses((status = 200, description = "Faturas, mais recentes primeiro", body = Vec<InvoiceSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let invoices = app_state.invoice_service.list_invoices().await?;
    Ok(Json(invoices))
}

// GET /api/invoices/{id}
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = i64, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura com itens e contato do cliente", body = InvoiceDetail),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let invoice = app_state.invoice_service.get_invoice(id).await?;
    Ok(Json(invoice))
}

// =============================================================================
//  ESCRITA
// =============================================================================

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = InvoicePayload,
    responses(
        (status = 201, description = "Fatura criada e numerada", body = InvoiceDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente ou projeto não encontrado"),
        (status = 409, description = "Não foi possível alocar um número")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<InvoicePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let detail = app_state
        .invoice_service
        .create_invoice(payload.invoice, payload.items)
        .await?;

    let totals = detail.invoice.totals().rounded();
    tracing::info!(
        invoice_number = %detail.invoice.invoice_number,
        items = detail.items.len(),
        subtotal = %totals.subtotal,
        tax = %totals.tax_amount,
        total = %totals.total,
        user = %user.username,
        "Fatura criada"
    );

    Ok((StatusCode::CREATED, Json(detail)))
}

// PUT /api/invoices/{id}
#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = i64, Path, description = "ID da fatura")),
    request_body = InvoicePayload,
    responses(
        (status = 200, description = "Fatura e itens substituídos", body = InvoiceDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Fatura, cliente ou projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<InvoicePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let detail = app_state
        .invoice_service
        .update_invoice(id, payload.invoice, payload.items)
        .await?;

    tracing::info!(
        invoice_number = %detail.invoice.invoice_number,
        total = %detail.invoice.totals().rounded().total,
        "Fatura atualizada"
    );

    Ok(Json(detail))
}

// PUT /api/invoices/{id}/status
#[utoipa::path(
    put,
    path = "/api/invoices/{id}/status",
    tag = "Invoices",
    params(("id" = i64, Path, description = "ID da fatura")),
    request_body = StatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = StatusChange),
        (status = 400, description = "Status desconhecido"),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let change = app_state
        .invoice_service
        .update_invoice_status(id, &payload.status)
        .await?;

    tracing::info!(invoice_id = id, status = %change.status, "Status da fatura alterado");

    Ok(Json(change))
}

// DELETE /api/invoices/{id}
#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = i64, Path, description = "ID da fatura")),
    responses((status = 200, description = "Fatura e itens apagados", body = MessageResponse)),
    security(("api_jwt" = []))
)]
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    app_state.invoice_service.delete_invoice(id).await?;
    tracing::info!(invoice_id = id, user = %user.username, "Fatura apagada");
    Ok(deleted("Invoice"))
}
