// src/db/memory_store.rs

// Implementação em memória dos três stores.
//
// Serve para os testes e para rodar a API sem Postgres. Todas as tabelas
// ficam atrás de um único RwLock: cada operação segura o lock de escrita do
// começo ao fim, o que dá a mesma atomicidade das transações do banco.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::{ClientStore, InvoiceStore, ProjectStore},
    models::{
        client::{Client, ClientPayload},
        invoice::{
            Invoice, InvoiceDetail, InvoiceDraft, InvoiceItem, InvoiceStatus, InvoiceSummary,
            StatusChange,
        },
        project::{Project, ProjectPayload},
    },
    services::numbering::NumberSeries,
};

#[derive(Debug, Clone)]
struct StoredItem {
    invoice_id: i64,
    item: InvoiceItem,
}

#[derive(Debug, Default)]
struct Tables {
    clients: BTreeMap<i64, Client>,
    projects: BTreeMap<i64, Project>,
    invoices: BTreeMap<i64, Invoice>,
    // Chave = id do item; a ordem do BTreeMap é a ordem de inserção
    items: BTreeMap<i64, StoredItem>,

    client_seq: i64,
    project_seq: i64,
    invoice_seq: i64,
    item_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn project_view(&self, project: &Project) -> Project {
        Project {
            client_name: self.clients.get(&project.client_id).map(|c| c.name.clone()),
            ..project.clone()
        }
    }

    fn summary(&self, invoice: &Invoice) -> Option<InvoiceSummary> {
        let client = self.clients.get(&invoice.client_id)?;
        let project = self.projects.get(&invoice.project_id)?;
        Some(InvoiceSummary {
            invoice: invoice.clone(),
            client_name: client.name.clone(),
            project_name: project.name.clone(),
        })
    }

    fn detail(&self, id: i64) -> Option<InvoiceDetail> {
        let invoice = self.invoices.get(&id)?;
        let client = self.clients.get(&invoice.client_id)?;
        let project = self.projects.get(&invoice.project_id)?;
        let items = self
            .items
            .values()
            .filter(|stored| stored.invoice_id == id)
            .map(|stored| stored.item.clone())
            .collect();

        Some(InvoiceDetail {
            invoice: invoice.clone(),
            client_name: client.name.clone(),
            project_name: project.name.clone(),
            client_address: client.address.clone(),
            client_email: client.email.clone(),
            client_phone: client.phone.clone(),
            items,
        })
    }

    // Mais recentes primeiro; empate de timestamp desempata pelo id
    fn summaries(&self, keep: impl Fn(&Invoice) -> bool) -> Vec<InvoiceSummary> {
        let mut invoices: Vec<&Invoice> = self.invoices.values().filter(|i| keep(i)).collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        invoices.into_iter().filter_map(|i| self.summary(i)).collect()
    }

    // Equivalente às FKs: o INSERT/UPDATE falharia no Postgres
    fn check_references(&self, draft: &InvoiceDraft) -> Result<(), AppError> {
        if !self.clients.contains_key(&draft.client_id) || !self.projects.contains_key(&draft.project_id) {
            return Err(AppError::not_found("Client or project"));
        }
        Ok(())
    }

    fn replace_items(&mut self, invoice_id: i64, draft: &InvoiceDraft) {
        self.items.retain(|_, stored| stored.invoice_id != invoice_id);
        for line in &draft.items {
            let id = next_id(&mut self.item_seq);
            self.items.insert(
                id,
                StoredItem {
                    invoice_id,
                    item: InvoiceItem {
                        id,
                        description: line.description().to_string(),
                        quantity: line.quantity(),
                        rate: line.rate(),
                        amount: line.amount(),
                    },
                },
            );
        }
    }

    fn remove_invoices(&mut self, doomed: impl Fn(&Invoice) -> bool) {
        let ids: Vec<i64> = self
            .invoices
            .values()
            .filter(|i| doomed(i))
            .map(|i| i.id)
            .collect();
        for id in &ids {
            self.invoices.remove(id);
        }
        self.items.retain(|_, stored| !ids.contains(&stored.invoice_id));
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let tables = self.tables.read().await;
        let mut clients: Vec<Client> = tables.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(clients)
    }

    async fn find_client(&self, id: i64) -> Result<Option<Client>, AppError> {
        Ok(self.tables.read().await.clients.get(&id).cloned())
    }

    async fn create_client(&self, client: &ClientPayload) -> Result<Client, AppError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.client_seq);
        let created = Client {
            id,
            name: client.name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            address: client.address.clone(),
            created_at: Utc::now(),
        };
        tables.clients.insert(id, created.clone());
        Ok(created)
    }

    async fn update_client(&self, id: i64, client: &ClientPayload) -> Result<Option<Client>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.clients.get_mut(&id) else {
            return Ok(None);
        };
        existing.name = client.name.clone();
        existing.email = client.email.clone();
        existing.phone = client.phone.clone();
        existing.address = client.address.clone();
        Ok(Some(existing.clone()))
    }

    async fn delete_client(&self, id: i64) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        if tables.clients.remove(&id).is_none() {
            return Ok(0);
        }

        // ON DELETE CASCADE: projetos do cliente e faturas (do cliente ou desses projetos)
        let project_ids: Vec<i64> = tables
            .projects
            .values()
            .filter(|p| p.client_id == id)
            .map(|p| p.id)
            .collect();
        tables.projects.retain(|_, p| p.client_id != id);
        tables.remove_invoices(|i| i.client_id == id || project_ids.contains(&i.project_id));

        Ok(1)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables.projects.values().map(|p| tables.project_view(p)).collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(projects)
    }

    async fn list_projects_by_client(&self, client_id: i64) -> Result<Vec<Project>, AppError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| p.client_id == client_id)
            .map(|p| tables.project_view(p))
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn find_project(&self, id: i64) -> Result<Option<Project>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.get(&id).map(|p| tables.project_view(p)))
    }

    async fn create_project(&self, project: &ProjectPayload) -> Result<Project, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.clients.contains_key(&project.client_id) {
            return Err(AppError::not_found("Client"));
        }

        let id = next_id(&mut tables.project_seq);
        let created = Project {
            id,
            client_id: project.client_id,
            name: project.name.clone(),
            description: project.description.clone(),
            hourly_rate: project.hourly_rate,
            status: project.status_or_default(),
            created_at: Utc::now(),
            client_name: None,
        };
        tables.projects.insert(id, created.clone());
        Ok(tables.project_view(&created))
    }

    async fn update_project(&self, id: i64, project: &ProjectPayload) -> Result<Option<Project>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&id) {
            return Ok(None);
        }
        if !tables.clients.contains_key(&project.client_id) {
            return Err(AppError::not_found("Client"));
        }

        let Some(existing) = tables.projects.get_mut(&id) else {
            return Ok(None);
        };
        existing.client_id = project.client_id;
        existing.name = project.name.clone();
        existing.description = project.description.clone();
        existing.hourly_rate = project.hourly_rate;
        existing.status = project.status_or_default();

        let updated = existing.clone();
        Ok(Some(tables.project_view(&updated)))
    }

    async fn delete_project(&self, id: i64) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        if tables.projects.remove(&id).is_none() {
            return Ok(0);
        }
        tables.remove_invoices(|i| i.project_id == id);
        Ok(1)
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert_invoice(&self, series: &NumberSeries, draft: &InvoiceDraft) -> Result<InvoiceDetail, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_references(draft)?;

        let invoice_number = series.next_number(tables.invoices.values().map(|i| i.invoice_number.as_str()));

        // UNIQUE(invoice_number)
        if tables.invoices.values().any(|i| i.invoice_number == invoice_number) {
            return Err(AppError::Conflict(format!(
                "Invoice number {} already exists",
                invoice_number
            )));
        }

        let id = next_id(&mut tables.invoice_seq);
        tables.invoices.insert(
            id,
            Invoice {
                id,
                invoice_number,
                client_id: draft.client_id,
                project_id: draft.project_id,
                issue_date: draft.issue_date,
                due_date: draft.due_date,
                status: draft.status,
                notes: draft.notes.clone(),
                subtotal: draft.totals.subtotal,
                tax_rate: draft.tax_rate,
                tax_amount: draft.totals.tax_amount,
                total_amount: draft.totals.total,
                po_number: draft.po_number.clone(),
                terms: Some(draft.terms.clone()),
                created_at: Utc::now(),
            },
        );
        tables.replace_items(id, draft);

        tables
            .detail(id)
            .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("invoice {} vanished", id)))
    }

    async fn update_invoice(&self, id: i64, draft: &InvoiceDraft) -> Result<Option<InvoiceDetail>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.invoices.contains_key(&id) {
            return Ok(None);
        }
        tables.check_references(draft)?;

        if let Some(invoice) = tables.invoices.get_mut(&id) {
            invoice.client_id = draft.client_id;
            invoice.project_id = draft.project_id;
            invoice.issue_date = draft.issue_date;
            invoice.due_date = draft.due_date;
            invoice.status = draft.status;
            invoice.notes = draft.notes.clone();
            invoice.subtotal = draft.totals.subtotal;
            invoice.tax_rate = draft.tax_rate;
            invoice.tax_amount = draft.totals.tax_amount;
            invoice.total_amount = draft.totals.total;
            invoice.po_number = draft.po_number.clone();
            invoice.terms = Some(draft.terms.clone());
        }
        tables.replace_items(id, draft);

        Ok(tables.detail(id))
    }

    async fn update_invoice_status(
        &self,
        id: i64,
        status: InvoiceStatus,
    ) -> Result<Option<StatusChange>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.invoices.get_mut(&id).map(|invoice| {
            invoice.status = status;
            StatusChange { id, status }
        }))
    }

    async fn delete_invoice(&self, id: i64) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let existed = tables.invoices.contains_key(&id);
        tables.remove_invoices(|i| i.id == id);
        Ok(u64::from(existed))
    }

    async fn find_invoice(&self, id: i64) -> Result<Option<InvoiceDetail>, AppError> {
        Ok(self.tables.read().await.detail(id))
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
        Ok(self.tables.read().await.summaries(|_| true))
    }

    async fn list_invoices_by_client(&self, client_id: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        Ok(self.tables.read().await.summaries(|i| i.client_id == client_id))
    }

    async fn list_invoices_by_project(&self, project_id: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        Ok(self.tables.read().await.summaries(|i| i.project_id == project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    async fn seed(store: &MemoryStore) -> (i64, i64) {
        let client = store
            .create_client(&ClientPayload {
                name: "Acme".into(),
                email: Some("ap@acme.test".into()),
                phone: None,
                address: Some("1 Main St".into()),
            })
            .await
            .unwrap();
        let project = store
            .create_project(&ProjectPayload {
                client_id: client.id,
                name: "Lobby".into(),
                description: None,
                hourly_rate: None,
                status: None,
            })
            .await
            .unwrap();
        (client.id, project.id)
    }

    fn draft(client_id: i64, project_id: i64, items: serde_json::Value) -> InvoiceDraft {
        InvoiceDraft::build(
            serde_json::from_value(json!({
                "client_id": client_id,
                "project_id": project_id,
                "issue_date": "2025-10-01",
                "due_date": "2025-10-31",
            }))
            .unwrap(),
            serde_json::from_value(items).unwrap(),
        )
        .unwrap()
    }

    fn october() -> NumberSeries {
        NumberSeries::for_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
    }

    #[tokio::test]
    async fn insert_steps_over_numbers_left_behind_by_deletes() {
        let store = MemoryStore::new();
        let (client_id, project_id) = seed(&store).await;
        let d = draft(client_id, project_id, json!([]));

        let first = store.insert_invoice(&october(), &d).await.unwrap();
        let second = store.insert_invoice(&october(), &d).await.unwrap();
        assert_eq!(first.invoice.invoice_number, "INV-2510-001");
        assert_eq!(second.invoice.invoice_number, "INV-2510-002");

        // Sem a 001 a contagem volta a 1, mas a 002 continua ocupada
        store.delete_invoice(first.invoice.id).await.unwrap();
        let third = store.insert_invoice(&october(), &d).await.unwrap();
        assert_eq!(third.invoice.invoice_number, "INV-2510-003");
        assert_eq!(store.list_invoices().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_project_is_not_found_and_writes_nothing() {
        let store = MemoryStore::new();
        let (client_id, _) = seed(&store).await;

        let err = store
            .insert_invoice(&october(), &draft(client_id, 999, json!([])))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn items_keep_insertion_order() {
        let store = MemoryStore::new();
        let (client_id, project_id) = seed(&store).await;
        let d = draft(
            client_id,
            project_id,
            json!([
                { "description": "Primer", "quantity": 2, "rate": 15 },
                { "description": "Paint", "quantity": 10, "rate": 25 },
                { "description": "Labor", "quantity": 8, "rate": 40 }
            ]),
        );

        let detail = store.insert_invoice(&october(), &d).await.unwrap();
        let names: Vec<&str> = detail.items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(names, ["Primer", "Paint", "Labor"]);
        assert_eq!(detail.invoice.subtotal, Decimal::new(600, 0));
        assert_eq!(detail.client_address.as_deref(), Some("1 Main St"));
    }

    #[tokio::test]
    async fn deleting_a_project_cascades_to_its_invoices() {
        let store = MemoryStore::new();
        let (client_id, project_id) = seed(&store).await;
        let d = draft(client_id, project_id, json!([{ "description": "Paint", "quantity": 1, "rate": 1 }]));
        store.insert_invoice(&october(), &d).await.unwrap();

        assert_eq!(store.delete_project(project_id).await.unwrap(), 1);
        assert!(store.list_invoices_by_project(project_id).await.unwrap().is_empty());
        assert!(store.tables.read().await.items.is_empty());
        assert!(store.find_client(client_id).await.unwrap().is_some());
    }
}
