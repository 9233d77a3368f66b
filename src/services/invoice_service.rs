// src/services/invoice_service.rs

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::{
    common::error::AppError,
    db::InvoiceStore,
    models::invoice::{
        InvoiceDetail, InvoiceDraft, InvoiceHeader, InvoiceStatus, InvoiceSummary, LineItemInput,
        StatusChange,
    },
    services::numbering::{NumberSeries, MAX_NUMBERING_ATTEMPTS},
};

#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    /// Cria a fatura com número da série do mês corrente (data local do servidor).
    pub async fn create_invoice(
        &self,
        header: InvoiceHeader,
        items: Vec<LineItemInput>,
    ) -> Result<InvoiceDetail, AppError> {
        self.create_invoice_at(Local::now().date_naive(), header, items).await
    }

    /// Igual a `create_invoice`, com a data de numeração explícita.
    ///
    /// A série vem da data de criação, não do `issue_date`. Cada tentativa roda
    /// numa transação nova (o Postgres aborta a transação depois de um erro) e
    /// relê os números da série, então quem perdeu a corrida pega o seguinte.
    pub async fn create_invoice_at(
        &self,
        today: NaiveDate,
        header: InvoiceHeader,
        items: Vec<LineItemInput>,
    ) -> Result<InvoiceDetail, AppError> {
        // 1. Valida tudo antes de tocar no store
        let draft = InvoiceDraft::build(header, items)?;
        let series = NumberSeries::for_date(today);

        // 2. Grava; colisão = outro request gravou o mesmo número antes
        let mut attempt = 0;
        loop {
            match self.store.insert_invoice(&series, &draft).await {
                Err(AppError::Conflict(_)) if attempt + 1 < MAX_NUMBERING_ATTEMPTS => {
                    attempt += 1;
                    tracing::warn!(series = series.prefix(), attempt, "Número de fatura em uso, tentando de novo");
                }
                Err(AppError::Conflict(_)) => {
                    return Err(AppError::Conflict(format!(
                        "Could not allocate an invoice number in series {} after {} attempts",
                        series.prefix(),
                        MAX_NUMBERING_ATTEMPTS
                    )));
                }
                other => return other,
            }
        }
    }

    /// Substitui cabeçalho e itens. O número e o `created_at` não mudam.
    pub async fn update_invoice(
        &self,
        id: i64,
        header: InvoiceHeader,
        items: Vec<LineItemInput>,
    ) -> Result<InvoiceDetail, AppError> {
        let draft = InvoiceDraft::build(header, items)?;
        self.store
            .update_invoice(id, &draft)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice"))
    }

    pub async fn update_invoice_status(&self, id: i64, status: &str) -> Result<StatusChange, AppError> {
        let status: InvoiceStatus = status
            .parse()
            .map_err(|message: String| AppError::invalid_field("status", message))?;

        self.store
            .update_invoice_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice"))
    }

    /// Apaga a fatura e os itens. Id inexistente não é erro.
    pub async fn delete_invoice(&self, id: i64) -> Result<(), AppError> {
        self.store.delete_invoice(id).await?;
        Ok(())
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get_invoice(&self, id: i64) -> Result<InvoiceDetail, AppError> {
        self.store
            .find_invoice(id)
            .await?
            .ok_or_else(|| AppError::not_found("Invoice"))
    }

    pub async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
        self.store.list_invoices().await
    }

    pub async fn list_invoices_by_client(&self, client_id: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        self.store.list_invoices_by_client(client_id).await
    }

    pub async fn list_invoices_by_project(&self, project_id: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        self.store.list_invoices_by_project(project_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{ClientStore, MemoryStore, ProjectStore},
        models::{client::ClientPayload, invoice::InvoiceDraft, project::ProjectPayload},
    };
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::task::JoinSet;

    fn oct_17() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 17).unwrap()
    }

    async fn seeded() -> (Arc<MemoryStore>, i64, i64) {
        let store = Arc::new(MemoryStore::new());
        let client = store
            .create_client(&ClientPayload { name: "Acme".into(), email: None, phone: None, address: None })
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
        (store, client.id, project.id)
    }

    fn header(client_id: i64, project_id: i64) -> InvoiceHeader {
        serde_json::from_value(json!({
            "client_id": client_id,
            "project_id": project_id,
            "issue_date": "2025-10-01",
            "due_date": "2025-10-31",
            "tax_rate": 8,
        }))
        .unwrap()
    }

    fn items(raw: serde_json::Value) -> Vec<LineItemInput> {
        serde_json::from_value(raw).unwrap()
    }

    #[tokio::test]
    async fn numbers_are_sequential_within_the_month() {
        let (store, c, p) = seeded().await;
        let service = InvoiceService::new(store);

        let first = service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap();
        let second = service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap();
        let november = service
            .create_invoice_at(NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(), header(c, p), vec![])
            .await
            .unwrap();

        assert_eq!(first.invoice.invoice_number, "INV-2510-001");
        assert_eq!(second.invoice.invoice_number, "INV-2510-002");
        assert_eq!(november.invoice.invoice_number, "INV-2511-001");
    }

    #[tokio::test]
    async fn gap_left_by_a_delete_is_stepped_over() {
        let (store, c, p) = seeded().await;
        let service = InvoiceService::new(store);

        let first = service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap();
        service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap();
        service.delete_invoice(first.invoice.id).await.unwrap();

        let third = service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap();
        assert_eq!(third.invoice.invoice_number, "INV-2510-003");
    }

    #[tokio::test]
    async fn month_keeps_numbering_after_leading_invoices_are_deleted() {
        let (store, c, p) = seeded().await;
        let service = InvoiceService::new(store);

        let mut created = Vec::new();
        for _ in 0..10 {
            created.push(service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap());
        }
        for detail in &created[..5] {
            service.delete_invoice(detail.invoice.id).await.unwrap();
        }

        let mut next = Vec::new();
        for _ in 0..3 {
            let detail = service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap();
            next.push(detail.invoice.invoice_number);
        }
        assert_eq!(next, ["INV-2510-011", "INV-2510-012", "INV-2510-013"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_contiguous_numbers() {
        let (store, c, p) = seeded().await;
        let service = Arc::new(InvoiceService::new(store));

        let mut tasks = JoinSet::new();
        for _ in 0..12 {
            let service = service.clone();
            tasks.spawn(async move { service.create_invoice_at(oct_17(), header(c, p), vec![]).await });
        }

        let mut numbers = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            numbers.push(joined.unwrap().unwrap().invoice.invoice_number);
        }
        numbers.sort();

        let expected: Vec<String> = (1..=12).map(|n| format!("INV-2510-{n:03}")).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test]
    async fn invalid_payload_writes_nothing() {
        let (store, c, p) = seeded().await;
        let service = InvoiceService::new(store);

        let err = service
            .create_invoice_at(
                oct_17(),
                header(c, p),
                items(json!([{ "description": "Paint", "quantity": -1, "rate": 25 }])),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(service.list_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_items_and_keeps_number() {
        let (store, c, p) = seeded().await;
        let service = InvoiceService::new(store);

        let created = service
            .create_invoice_at(
                oct_17(),
                header(c, p),
                items(json!([
                    { "description": "Paint", "quantity": 10, "rate": 25 },
                    { "description": "Primer", "quantity": 1, "rate": 5 }
                ])),
            )
            .await
            .unwrap();

        let updated = service
            .update_invoice(
                created.invoice.id,
                header(c, p),
                items(json!([{ "description": "Labor", "quantity": 2, "rate": 50 }])),
            )
            .await
            .unwrap();

        assert_eq!(updated.invoice.invoice_number, created.invoice.invoice_number);
        assert_eq!(updated.invoice.created_at, created.invoice.created_at);
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.invoice.subtotal, Decimal::new(100, 0));
        assert_eq!(updated.invoice.total_amount, Decimal::new(108, 0));
    }

    #[tokio::test]
    async fn status_change_touches_only_the_status() {
        let (store, c, p) = seeded().await;
        let service = InvoiceService::new(store);
        let created = service
            .create_invoice_at(
                oct_17(),
                header(c, p),
                items(json!([{ "description": "Paint", "quantity": 10, "rate": 25 }])),
            )
            .await
            .unwrap();

        let change = service.update_invoice_status(created.invoice.id, "Paid").await.unwrap();
        assert_eq!(change.status, InvoiceStatus::Paid);

        let after = service.get_invoice(created.invoice.id).await.unwrap();
        assert_eq!(after.invoice.status, InvoiceStatus::Paid);
        assert_eq!(after.invoice.total_amount, created.invoice.total_amount);
        assert_eq!(after.items, created.items);
    }

    #[tokio::test]
    async fn unknown_status_and_missing_invoice_are_reported() {
        let (store, c, p) = seeded().await;
        let service = InvoiceService::new(store);
        let created = service.create_invoice_at(oct_17(), header(c, p), vec![]).await.unwrap();

        assert!(matches!(
            service.update_invoice_status(created.invoice.id, "sent").await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.update_invoice_status(999, "paid").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.get_invoice(999).await, Err(AppError::NotFound(_))));
        assert!(service.delete_invoice(999).await.is_ok());
    }

    // Store que sempre colide: simula um concorrente que nunca perde a corrida.
    struct AlwaysTaken {
        calls: AtomicU32,
    }

    #[async_trait]
    impl InvoiceStore for AlwaysTaken {
        async fn insert_invoice(&self, _series: &NumberSeries, _draft: &InvoiceDraft) -> Result<InvoiceDetail, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Conflict("taken".into()))
        }
        async fn update_invoice(&self, _: i64, _: &InvoiceDraft) -> Result<Option<InvoiceDetail>, AppError> {
            Ok(None)
        }
        async fn update_invoice_status(&self, _: i64, _: InvoiceStatus) -> Result<Option<StatusChange>, AppError> {
            Ok(None)
        }
        async fn delete_invoice(&self, _: i64) -> Result<u64, AppError> {
            Ok(0)
        }
        async fn find_invoice(&self, _: i64) -> Result<Option<InvoiceDetail>, AppError> {
            Ok(None)
        }
        async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
            Ok(vec![])
        }
        async fn list_invoices_by_client(&self, _: i64) -> Result<Vec<InvoiceSummary>, AppError> {
            Ok(vec![])
        }
        async fn list_invoices_by_project(&self, _: i64) -> Result<Vec<InvoiceSummary>, AppError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_conflict() {
        let store = Arc::new(AlwaysTaken { calls: AtomicU32::new(0) });
        let service = InvoiceService::new(store.clone());

        let err = service.create_invoice_at(oct_17(), header(1, 1), vec![]).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), MAX_NUMBERING_ATTEMPTS);
    }
}
