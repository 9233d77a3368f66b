// src/config.rs

use std::{collections::HashMap, env, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{ClientRepository, InvoiceRepository, MemoryStore, ProjectRepository},
    services::{AuthService, ClientService, InvoiceService, ProjectService},
};

// =============================================================================
//  CONFIGURAÇÃO (variáveis de ambiente)
// =============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    // username -> hash bcrypt
    pub auth_users: HashMap<String, String>,
    pub port: u16,
    pub static_dir: String,
    pub db_max_connections: u32,
}

impl Settings {
    /// Lê o `.env` (se existir) e depois o ambiente do processo.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{} must be set", key));

        let auth_users = parse_auth_users(&required("AUTH_USERS")?).context("AUTH_USERS is invalid")?;

        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => 5000,
        };

        let db_max_connections: u32 = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => 5,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            auth_users,
            port,
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "dist".to_string()),
            db_max_connections,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("could not connect to DATABASE_URL")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.auth_users.clone(), self.jwt_secret.clone())
    }
}

/// `user:hash,user2:hash2`. O hash bcrypt tem `$` mas não tem `:` nem `,`.
/// Lista vazia é aceita e desliga todos os logins.
fn parse_auth_users(raw: &str) -> anyhow::Result<HashMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (user, hash) = entry
                .split_once(':')
                .ok_or_else(|| anyhow!("entry '{}' is not in user:hash form", entry))?;
            let (user, hash) = (user.trim(), hash.trim());
            if user.is_empty() || hash.is_empty() {
                return Err(anyhow!("entry '{}' has an empty user or hash", entry));
            }
            Ok((user.to_string(), hash.to_string()))
        })
        .collect()
}

// =============================================================================
//  ESTADO COMPARTILHADO
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub client_service: ClientService,
    pub project_service: ProjectService,
    pub invoice_service: InvoiceService,
}

impl AppState {
    // --- Monta o gráfico de dependências sobre o Postgres ---
    pub fn postgres(pool: PgPool, auth_service: AuthService) -> Self {
        Self {
            auth_service,
            client_service: ClientService::new(Arc::new(ClientRepository::new(pool.clone()))),
            project_service: ProjectService::new(Arc::new(ProjectRepository::new(pool.clone()))),
            invoice_service: InvoiceService::new(Arc::new(InvoiceRepository::new(pool))),
        }
    }

    // Os três serviços compartilham o mesmo store, então as cascatas funcionam
    pub fn in_memory(auth_service: AuthService) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            auth_service,
            client_service: ClientService::new(store.clone()),
            project_service: ProjectService::new(store.clone()),
            invoice_service: InvoiceService::new(store),
        }
    }
}
