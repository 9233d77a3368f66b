// src/db/store.rs

// Portas de persistência. Os services só conhecem estes traits; as
// implementações são os repositórios Postgres e o MemoryStore (testes).
//
// Regras que toda implementação precisa cumprir:
// - cada método de escrita é atômico (tudo ou nada);
// - apagar cliente apaga projetos e faturas; apagar projeto apaga faturas;
//   apagar fatura apaga os itens;
// - `update_*` devolve `None` quando o id não existe, `delete_*` devolve
//   quantas linhas saíram (0 não é erro).

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{
        client::{Client, ClientPayload},
        invoice::{InvoiceDetail, InvoiceDraft, InvoiceStatus, InvoiceSummary, StatusChange},
        project::{Project, ProjectPayload},
    },
    services::numbering::NumberSeries,
};

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<Client>, AppError>;
    async fn find_client(&self, id: i64) -> Result<Option<Client>, AppError>;
    async fn create_client(&self, client: &ClientPayload) -> Result<Client, AppError>;
    async fn update_client(&self, id: i64, client: &ClientPayload) -> Result<Option<Client>, AppError>;
    async fn delete_client(&self, id: i64) -> Result<u64, AppError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, AppError>;
    async fn list_projects_by_client(&self, client_id: i64) -> Result<Vec<Project>, AppError>;
    async fn find_project(&self, id: i64) -> Result<Option<Project>, AppError>;
    /// `NotFound("Client")` se o cliente não existir.
    async fn create_project(&self, project: &ProjectPayload) -> Result<Project, AppError>;
    async fn update_project(&self, id: i64, project: &ProjectPayload) -> Result<Option<Project>, AppError>;
    async fn delete_project(&self, id: i64) -> Result<u64, AppError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Lê os números já usados na série, escolhe o próximo livre
    /// (`NumberSeries::next_number`) e grava cabeçalho + itens, tudo na mesma
    /// transação. Número gravado por um concorrente -> `AppError::Conflict`.
    async fn insert_invoice(&self, series: &NumberSeries, draft: &InvoiceDraft) -> Result<InvoiceDetail, AppError>;

    /// Atualiza o cabeçalho e troca todos os itens. Não mexe no número.
    async fn update_invoice(&self, id: i64, draft: &InvoiceDraft) -> Result<Option<InvoiceDetail>, AppError>;

    async fn update_invoice_status(
        &self,
        id: i64,
        status: InvoiceStatus,
    ) -> Result<Option<StatusChange>, AppError>;

    async fn delete_invoice(&self, id: i64) -> Result<u64, AppError>;

    async fn find_invoice(&self, id: i64) -> Result<Option<InvoiceDetail>, AppError>;

    /// Mais recentes primeiro.
    async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError>;
    async fn list_invoices_by_client(&self, client_id: i64) -> Result<Vec<InvoiceSummary>, AppError>;
    async fn list_invoices_by_project(&self, project_id: i64) -> Result<Vec<InvoiceSummary>, AppError>;
}
