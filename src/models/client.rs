// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{blank_to_none, validate_not_blank};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Client {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Acme Painting Co.")]
    pub name: String,
    #[schema(example = "billing@acme.test")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Usado tanto no POST quanto no PUT
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ClientPayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Acme Painting Co.")]
    pub name: String,

    #[validate(email(message = "Invalid email address."))]
    #[schema(example = "billing@acme.test")]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ClientPayload {
    /// Limpa espaços e transforma strings vazias em `None` antes da validação.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: blank_to_none(self.email),
            phone: blank_to_none(self.phone),
            address: blank_to_none(self.address),
        }
    }
}
