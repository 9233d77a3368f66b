// src/models/project.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::{blank_to_none, validate_not_blank};

// Mapeia o CREATE TYPE project_status do banco
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Inactive,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    #[schema(example = 1)]
    pub id: i64,
    pub client_id: i64,
    #[schema(example = "Office repaint")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 45.0)]
    pub hourly_rate: Option<Decimal>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,

    // Projeção de leitura (JOIN com clients), nunca gravado na tabela
    #[sqlx(default)]
    pub client_name: Option<String>,
}

fn validate_hourly_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("Hourly rate cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProjectPayload {
    #[schema(example = 1)]
    pub client_id: i64,

    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Office repaint")]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_hourly_rate"))]
    #[schema(example = 45.0)]
    pub hourly_rate: Option<Decimal>,

    // Ausente = "active"
    pub status: Option<ProjectStatus>,
}

impl ProjectPayload {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: blank_to_none(self.description),
            ..self
        }
    }

    pub fn status_or_default(&self) -> ProjectStatus {
        self.status.unwrap_or_default()
    }
}
