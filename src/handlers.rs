pub mod auth;
pub mod clients;
pub mod invoices;
pub mod projects;

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Corpo de resposta dos DELETE.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Invoice deleted successfully")]
    pub message: String,
}

pub(crate) fn deleted(entity: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("{} deleted successfully", entity),
    })
}
