// src/services/auth.rs

use std::{collections::HashMap, sync::Arc};

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    models::auth::{AuthUser, Claims},
};

/// Validade do token emitido no login.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct AuthService {
    // username -> hash bcrypt
    credentials: Arc<HashMap<String, String>>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(credentials: HashMap<String, String>, jwt_secret: String) -> Self {
        Self {
            credentials: Arc::new(credentials),
            jwt_secret,
        }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<String, AppError> {
        // Usuário desconhecido e senha errada dão o mesmo erro
        let password_hash = self
            .credentials
            .get(username)
            .cloned()
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(username)
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthUser, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        // Token antigo de um usuário removido do AUTH_USERS não vale mais
        if !self.credentials.contains_key(&token_data.claims.sub) {
            return Err(AppError::InvalidToken);
        }

        Ok(AuthUser { username: token_data.claims.sub })
    }

    fn create_token(&self, username: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(TOKEN_TTL_HOURS);

        let claims = Claims {
            sub: username.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
