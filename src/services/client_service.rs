// src/services/client_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::error::AppError,
    db::ClientStore,
    models::client::{Client, ClientPayload},
};

#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn ClientStore>,
}

impl ClientService {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        self.store.list_clients().await
    }

    pub async fn get_client(&self, id: i64) -> Result<Client, AppError> {
        self.store
            .find_client(id)
            .await?
            .ok_or_else(|| AppError::not_found("Client"))
    }

    pub async fn create_client(&self, payload: ClientPayload) -> Result<Client, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        self.store.create_client(&payload).await
    }

    pub async fn update_client(&self, id: i64, payload: ClientPayload) -> Result<Client, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        self.store
            .update_client(id, &payload)
            .await?
            .ok_or_else(|| AppError::not_found("Client"))
    }

    /// Apaga o cliente e, em cascata, os projetos e faturas dele.
    /// Id inexistente não é erro.
    pub async fn delete_client(&self, id: i64) -> Result<(), AppError> {
        self.store.delete_client(id).await?;
        Ok(())
    }
}
