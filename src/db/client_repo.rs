// src/db/client_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::ClientStore,
    models::client::{Client, ClientPayload},
};

// O repositório de clientes, responsável por todas as interações com a tabela 'clients'
#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStore for ClientRepository {
    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    async fn find_client(&self, id: i64) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    async fn create_client(&self, client: &ClientPayload) -> Result<Client, AppError> {
        let created = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, email, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_client(&self, id: i64, client: &ClientPayload) -> Result<Option<Client>, AppError> {
        let updated = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = $1, email = $2, phone = $3, address = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    // Projetos, faturas e itens saem junto pelo ON DELETE CASCADE
    async fn delete_client(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
