// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Helpers de tradução de erros do Postgres
// ---

/// Converte um erro de escrita do sqlx no tipo de erro da aplicação.
///
/// - `unique_violation` vira `Conflict` (o chamador pode tentar de novo);
/// - `foreign_key_violation` vira `NotFound` para a entidade referenciada;
/// - o resto continua sendo `DatabaseError`.
pub(crate) fn map_write_error(e: sqlx::Error, referenced: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique constraint");
            return AppError::Conflict(format!("Duplicate value violates {}", constraint));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::not_found(referenced);
        }
    }
    AppError::DatabaseError(e)
}
