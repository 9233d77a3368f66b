// src/db/invoice_repo.rs

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::{
    common::{db_utils::map_write_error, error::AppError},
    db::InvoiceStore,
    models::invoice::{
        InvoiceDetail, InvoiceDraft, InvoiceItem, InvoiceRow, InvoiceStatus, InvoiceSummary,
        LineItem, StatusChange,
    },
    services::numbering::NumberSeries,
};

// Projeção base das listagens: fatura + nomes (JOIN), nunca gravados na fatura.
const SUMMARY_SELECT: &str = r#"
    SELECT i.*, c.name AS client_name, p.name AS project_name
    FROM invoices i
    JOIN clients c ON i.client_id = c.id
    JOIN projects p ON i.project_id = p.id
"#;

const DETAIL_SELECT: &str = r#"
    SELECT
        i.*,
        c.name AS client_name,
        c.address AS client_address,
        c.email AS client_email,
        c.phone AS client_phone,
        p.name AS project_name
    FROM invoices i
    JOIN clients c ON i.client_id = c.id
    JOIN projects p ON i.project_id = p.id
    WHERE i.id = $1
"#;

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  HELPERS (sempre dentro da transação de quem chama)
    // =========================================================================

    async fn insert_items(
        conn: &mut PgConnection,
        invoice_id: i64,
        items: &[LineItem],
    ) -> Result<(), AppError> {
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (invoice_id, position, description, quantity, rate, amount)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(invoice_id)
            .bind(position as i32)
            .bind(item.description())
            .bind(item.quantity())
            .bind(item.rate())
            .bind(item.amount())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    async fn fetch_detail(conn: &mut PgConnection, id: i64) -> Result<Option<InvoiceDetail>, AppError> {
        let row = sqlx::query_as::<_, InvoiceRow>(DETAIL_SELECT)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT id, description, quantity, rate, amount
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(row.into_detail(items)))
    }

    async fn fetch_summaries(&self, filter: &str, id: Option<i64>) -> Result<Vec<InvoiceSummary>, AppError> {
        let sql = format!("{SUMMARY_SELECT} {filter} ORDER BY i.created_at DESC, i.id DESC");

        let mut query = sqlx::query_as::<_, InvoiceRow>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(InvoiceRow::into_summary).collect())
    }
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn insert_invoice(&self, series: &NumberSeries, draft: &InvoiceDraft) -> Result<InvoiceDetail, AppError> {
        // 1. Abre a transação. Qualquer `?` daqui pra baixo faz rollback no drop.
        let mut tx = self.pool.begin().await?;

        // 2. Números já usados no mês -> próximo livre
        let taken: Vec<String> =
            sqlx::query_scalar("SELECT invoice_number FROM invoices WHERE invoice_number LIKE $1")
                .bind(series.like_pattern())
                .fetch_all(&mut *tx)
                .await?;

        let invoice_number = series.next_number(taken.iter().map(String::as_str));

        // 3. Cabeçalho. UNIQUE(invoice_number) -> Conflict; FK -> NotFound
        let invoice_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (
                invoice_number, client_id, project_id, issue_date, due_date, status,
                notes, subtotal, tax_rate, tax_amount, total_amount, po_number, terms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&invoice_number)
        .bind(draft.client_id)
        .bind(draft.project_id)
        .bind(draft.issue_date)
        .bind(draft.due_date)
        .bind(draft.status)
        .bind(&draft.notes)
        .bind(draft.totals.subtotal)
        .bind(draft.tax_rate)
        .bind(draft.totals.tax_amount)
        .bind(draft.totals.total)
        .bind(&draft.po_number)
        .bind(&draft.terms)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Client or project"))?;

        // 4. Itens
        Self::insert_items(&mut *tx, invoice_id, &draft.items).await?;

        // 5. Relê a visão completa ainda dentro da transação
        let detail = Self::fetch_detail(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| anyhow!("invoice {} not visible inside its own transaction", invoice_id))?;

        tx.commit().await?;

        Ok(detail)
    }

    async fn update_invoice(&self, id: i64, draft: &InvoiceDraft) -> Result<Option<InvoiceDetail>, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = $1, project_id = $2, issue_date = $3, due_date = $4, status = $5,
                notes = $6, subtotal = $7, tax_rate = $8, tax_amount = $9, total_amount = $10,
                po_number = $11, terms = $12
            WHERE id = $13
            "#,
        )
        .bind(draft.client_id)
        .bind(draft.project_id)
        .bind(draft.issue_date)
        .bind(draft.due_date)
        .bind(draft.status)
        .bind(&draft.notes)
        .bind(draft.totals.subtotal)
        .bind(draft.tax_rate)
        .bind(draft.totals.tax_amount)
        .bind(draft.totals.total)
        .bind(&draft.po_number)
        .bind(&draft.terms)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Client or project"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        // Troca completa dos itens, nunca um "diff"
        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        Self::insert_items(&mut *tx, id, &draft.items).await?;

        let detail = Self::fetch_detail(&mut *tx, id).await?;

        tx.commit().await?;

        Ok(detail)
    }

    async fn update_invoice_status(
        &self,
        id: i64,
        status: InvoiceStatus,
    ) -> Result<Option<StatusChange>, AppError> {
        let change = sqlx::query_as::<_, StatusChange>(
            "UPDATE invoices SET status = $1 WHERE id = $2 RETURNING id, status",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(change)
    }

    async fn delete_invoice(&self, id: i64) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn find_invoice(&self, id: i64) -> Result<Option<InvoiceDetail>, AppError> {
        // Cabeçalho e itens vêm do mesmo snapshot, então um update concorrente
        // nunca aparece pela metade.
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let detail = Self::fetch_detail(&mut *tx, id).await?;

        tx.commit().await?;

        Ok(detail)
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
        self.fetch_summaries("", None).await
    }

    async fn list_invoices_by_client(&self, client_id: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        self.fetch_summaries("WHERE i.client_id = $1", Some(client_id)).await
    }

    async fn list_invoices_by_project(&self, project_id: i64) -> Result<Vec<InvoiceSummary>, AppError> {
        self.fetch_summaries("WHERE i.project_id = $1", Some(project_id)).await
    }
}
