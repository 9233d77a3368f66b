// src/models/invoice.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    models::blank_to_none,
    services::totals::{InvoiceTotals, StoredTotals},
};

pub const DEFAULT_TERMS: &str = "Net 30";

// --- ENUMS ---

// Mapeia o CREATE TYPE invoice_status do banco
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// O status chega como texto livre, então a validação contra o enum é nossa
// (e não um 422 genérico do extrator Json).
impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(format!(
                "Unknown invoice status '{}'. Expected one of: draft, pending, paid, overdue.",
                other
            )),
        }
    }
}

// --- LEITURA (projeções) ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Invoice {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "INV-2510-001")]
    pub invoice_number: String,
    pub client_id: i64,
    pub project_id: i64,
    #[schema(value_type = String, format = Date, example = "2025-10-01")]
    pub issue_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-10-31")]
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    #[schema(example = 250.0)]
    pub subtotal: Decimal,
    #[schema(example = 8.0)]
    pub tax_rate: Decimal,
    #[schema(example = 20.0)]
    pub tax_amount: Decimal,
    #[schema(example = 270.0)]
    pub total_amount: Decimal,
    pub po_number: Option<String>,
    #[schema(example = "Net 30")]
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals {
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total: self.total_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InvoiceItem {
    pub id: i64,
    #[schema(example = "Paint")]
    pub description: String,
    #[schema(example = 10.0)]
    pub quantity: Decimal,
    #[schema(example = 25.0)]
    pub rate: Decimal,
    #[schema(example = 250.0)]
    pub amount: Decimal,
}

/// Linha da listagem: fatura + nomes de cliente e projeto.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub client_name: String,
    pub project_name: String,
}

/// Fatura completa (tela de detalhe / PDF): contato do cliente + itens na ordem de inserção.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub client_name: String,
    pub project_name: String,
    pub client_address: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub items: Vec<InvoiceItem>,
}

// Linha crua do Postgres. Faturas antigas (de antes dos impostos) têm
// subtotal/tax_rate/tax_amount NULL; os padrões são aplicados só aqui.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    pub id: i64,
    pub invoice_number: String,
    pub client_id: i64,
    pub project_id: i64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub subtotal: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub total_amount: Decimal,
    pub po_number: Option<String>,
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,

    pub client_name: String,
    pub project_name: String,
    #[sqlx(default)]
    pub client_address: Option<String>,
    #[sqlx(default)]
    pub client_email: Option<String>,
    #[sqlx(default)]
    pub client_phone: Option<String>,
}

impl InvoiceRow {
    fn split(self) -> (Invoice, String, String, Option<String>, Option<String>, Option<String>) {
        let (tax_rate, totals) = StoredTotals {
            subtotal: self.subtotal,
            tax_rate: self.tax_rate,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
        }
        .resolve();

        let invoice = Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            client_id: self.client_id,
            project_id: self.project_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            status: self.status,
            notes: self.notes,
            subtotal: totals.subtotal,
            tax_rate,
            tax_amount: totals.tax_amount,
            total_amount: totals.total,
            po_number: self.po_number,
            terms: self.terms,
            created_at: self.created_at,
        };

        (
            invoice,
            self.client_name,
            self.project_name,
            self.client_address,
            self.client_email,
            self.client_phone,
        )
    }

    pub fn into_summary(self) -> InvoiceSummary {
        let (invoice, client_name, project_name, ..) = self.split();
        InvoiceSummary { invoice, client_name, project_name }
    }

    pub fn into_detail(self, items: Vec<InvoiceItem>) -> InvoiceDetail {
        let (invoice, client_name, project_name, client_address, client_email, client_phone) =
            self.split();
        InvoiceDetail {
            invoice,
            client_name,
            project_name,
            client_address,
            client_email,
            client_phone,
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct StatusChange {
    pub id: i64,
    pub status: InvoiceStatus,
}

// --- ESCRITA (payloads) ---

/// Número vindo de formulário: aceita `10`, `10.5` ou `"10.5"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    pub fn to_decimal(&self) -> Option<Decimal> {
        let raw = match self {
            NumericInput::Number(n) => n.to_string(),
            NumericInput::Text(s) => s.trim().to_string(),
        };
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .ok()
    }
}

impl From<Decimal> for NumericInput {
    fn from(value: Decimal) -> Self {
        NumericInput::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InvoiceHeader {
    #[validate(range(min = 1, message = "A client is required."))]
    #[schema(example = 1)]
    pub client_id: i64,

    #[validate(range(min = 1, message = "A project is required."))]
    #[schema(example = 1)]
    pub project_id: i64,

    #[schema(value_type = String, format = Date, example = "2025-10-01")]
    pub issue_date: NaiveDate,

    #[schema(value_type = String, format = Date, example = "2025-10-31")]
    pub due_date: NaiveDate,

    // Ausente = "draft"
    #[schema(example = "draft")]
    pub status: Option<String>,

    pub notes: Option<String>,

    // Ausente = 0
    #[schema(value_type = Option<f64>, example = 8.0)]
    pub tax_rate: Option<NumericInput>,

    #[schema(example = "PO-7781")]
    pub po_number: Option<String>,

    // Ausente = "Net 30"
    #[schema(example = "Net 30")]
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineItemInput {
    #[serde(default)]
    #[schema(example = "Paint")]
    pub description: String,

    #[schema(value_type = Option<f64>, example = 10.0)]
    pub quantity: Option<NumericInput>,

    #[schema(value_type = Option<f64>, example = 25.0)]
    pub rate: Option<NumericInput>,
}

/// Corpo de `POST /api/invoices` e `PUT /api/invoices/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InvoicePayload {
    pub invoice: InvoiceHeader,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusPayload {
    #[serde(default)]
    #[schema(example = "paid")]
    pub status: String,
}

// --- DOMÍNIO VALIDADO ---

/// Item já validado. O `amount` é sempre derivado de quantidade x valor,
/// por isso os campos não são públicos.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    description: String,
    quantity: Decimal,
    rate: Decimal,
    amount: Decimal,
}

impl LineItem {
    /// `None` se quantidade x valor estourar o intervalo do `Decimal`.
    pub fn new(description: impl Into<String>, quantity: Decimal, rate: Decimal) -> Option<Self> {
        let amount = quantity.checked_mul(rate)?;
        Some(Self { description: description.into(), quantity, rate, amount })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Fatura pronta para gravar: cabeçalho normalizado, itens validados e totais calculados.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub client_id: i64,
    pub project_id: i64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub tax_rate: Decimal,
    pub po_number: Option<String>,
    pub terms: String,
    pub items: Vec<LineItem>,
    pub totals: InvoiceTotals,
}

fn field_error(message: String) -> ValidationError {
    let mut err = ValidationError::new("invalid");
    err.message = Some(message.into());
    err
}

impl InvoiceDraft {
    /// Valida cabeçalho + itens e calcula os totais. Nada é gravado se falhar.
    pub fn build(header: InvoiceHeader, items: Vec<LineItemInput>) -> Result<Self, AppError> {
        let mut errors = header.validate().err().unwrap_or_else(ValidationErrors::new);

        let status = match header.status.as_deref().map(str::trim) {
            None | Some("") => InvoiceStatus::default(),
            Some(raw) => raw.parse::<InvoiceStatus>().unwrap_or_else(|message| {
                errors.add("status", field_error(message));
                InvoiceStatus::default()
            }),
        };

        let tax_rate = match &header.tax_rate {
            None => Decimal::ZERO,
            Some(raw) => match raw.to_decimal() {
                Some(rate) if rate >= Decimal::ZERO && rate <= Decimal::ONE_HUNDRED => rate,
                _ => {
                    errors.add(
                        "tax_rate",
                        field_error("Tax rate must be a number between 0 and 100.".into()),
                    );
                    Decimal::ZERO
                }
            },
        };

        if header.due_date < header.issue_date {
            errors.add(
                "due_date",
                field_error("Due date cannot be earlier than the issue date.".into()),
            );
        }

        let mut line_items = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let position = idx + 1;

            if item.description.trim().is_empty() {
                errors.add("items", field_error(format!("Item {}: description is required.", position)));
            }

            let quantity = item.quantity.as_ref().and_then(NumericInput::to_decimal);
            if !matches!(quantity, Some(q) if q > Decimal::ZERO) {
                errors.add(
                    "items",
                    field_error(format!("Item {}: quantity must be a number greater than 0.", position)),
                );
            }

            let rate = item.rate.as_ref().and_then(NumericInput::to_decimal);
            if !matches!(rate, Some(r) if r >= Decimal::ZERO) {
                errors.add(
                    "items",
                    field_error(format!("Item {}: rate must be a non-negative number.", position)),
                );
            }

            if let (Some(quantity), Some(rate)) = (quantity, rate) {
                match LineItem::new(item.description.trim(), quantity, rate) {
                    Some(line) => line_items.push(line),
                    None => errors.add(
                        "items",
                        field_error(format!("Item {}: amount is out of range.", position)),
                    ),
                }
            }
        }

        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        let totals = InvoiceTotals::compute(&line_items, tax_rate).ok_or_else(|| {
            AppError::invalid_field("items", "Invoice totals are out of range.")
        })?;

        Ok(Self {
            client_id: header.client_id,
            project_id: header.project_id,
            issue_date: header.issue_date,
            due_date: header.due_date,
            status,
            notes: blank_to_none(header.notes),
            tax_rate,
            po_number: blank_to_none(header.po_number),
            terms: blank_to_none(header.terms).unwrap_or_else(|| DEFAULT_TERMS.to_string()),
            items: line_items,
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn header(tax_rate: Option<serde_json::Value>) -> InvoiceHeader {
        serde_json::from_value(json!({
            "client_id": 1,
            "project_id": 2,
            "issue_date": "2025-10-01",
            "due_date": "2025-10-31",
            "tax_rate": tax_rate,
        }))
        .unwrap()
    }

    fn item(value: serde_json::Value) -> LineItemInput {
        serde_json::from_value(value).unwrap()
    }

    fn field_messages(err: AppError, field: &str) -> Vec<String> {
        match err {
            AppError::ValidationError(errors) => errors
                .field_errors()
                .iter()
                .find(|(name, _)| name.to_string() == field)
                .map(|(_, errs)| {
                    errs.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn paint_scenario_builds_expected_totals() {
        let draft = InvoiceDraft::build(
            header(Some(json!(8))),
            vec![item(json!({ "description": "Paint", "quantity": 10, "rate": 25 }))],
        )
        .unwrap();

        assert_eq!(draft.totals.subtotal, Decimal::new(250, 0));
        assert_eq!(draft.totals.tax_amount, Decimal::new(20, 0));
        assert_eq!(draft.totals.total, Decimal::new(270, 0));
        assert_eq!(draft.status, InvoiceStatus::Draft);
        assert_eq!(draft.terms, DEFAULT_TERMS);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let draft = InvoiceDraft::build(
            header(Some(json!("7.5"))),
            vec![item(json!({ "description": "Labor", "quantity": "2.5", "rate": "40" }))],
        )
        .unwrap();

        assert_eq!(draft.items[0].amount(), Decimal::new(100, 0));
        assert_eq!(draft.tax_rate, Decimal::new(75, 1));
    }

    #[test]
    fn missing_tax_rate_defaults_to_zero() {
        let draft = InvoiceDraft::build(header(None), vec![]).unwrap();
        assert_eq!(draft.tax_rate, Decimal::ZERO);
        assert_eq!(draft.totals, InvoiceTotals::default());
    }

    #[test]
    fn caller_supplied_amount_is_ignored() {
        let draft = InvoiceDraft::build(
            header(None),
            vec![item(json!({ "description": "Paint", "quantity": 3, "rate": 5, "amount": 999 }))],
        )
        .unwrap();
        assert_eq!(draft.items[0].amount(), Decimal::new(15, 0));
        assert_eq!(draft.totals.total, Decimal::new(15, 0));
    }

    #[rstest]
    #[case(json!({ "description": "", "quantity": 1, "rate": 1 }), "Item 1: description is required.")]
    #[case(json!({ "description": "x", "quantity": "ten", "rate": 1 }), "Item 1: quantity must be a number greater than 0.")]
    #[case(json!({ "description": "x", "quantity": 0, "rate": 1 }), "Item 1: quantity must be a number greater than 0.")]
    #[case(json!({ "description": "x", "quantity": 1 }), "Item 1: rate must be a non-negative number.")]
    #[case(json!({ "description": "x", "quantity": 1, "rate": -3 }), "Item 1: rate must be a non-negative number.")]
    fn invalid_items_are_rejected(#[case] raw: serde_json::Value, #[case] expected: &str) {
        let err = InvoiceDraft::build(header(None), vec![item(raw)]).unwrap_err();
        assert!(field_messages(err, "items").contains(&expected.to_string()));
    }

    #[test]
    fn zero_rate_is_allowed() {
        let draft = InvoiceDraft::build(
            header(None),
            vec![item(json!({ "description": "Courtesy visit", "quantity": 1, "rate": 0 }))],
        )
        .unwrap();
        assert_eq!(draft.totals.total, Decimal::ZERO);
    }

    #[rstest]
    #[case(json!(-1))]
    #[case(json!(100.5))]
    #[case(json!("abc"))]
    fn tax_rate_outside_range_is_rejected(#[case] raw: serde_json::Value) {
        let err = InvoiceDraft::build(header(Some(raw)), vec![]).unwrap_err();
        assert_eq!(field_messages(err, "tax_rate").len(), 1);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut h = header(None);
        h.status = Some("sent".into());
        let err = InvoiceDraft::build(h, vec![]).unwrap_err();
        assert_eq!(field_messages(err, "status").len(), 1);
    }

    #[test]
    fn due_date_before_issue_date_is_rejected() {
        let mut h = header(None);
        h.due_date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let err = InvoiceDraft::build(h, vec![]).unwrap_err();
        assert_eq!(field_messages(err, "due_date").len(), 1);
    }

    #[test]
    fn legacy_row_without_tax_fields_falls_back_to_total() {
        let row = InvoiceRow {
            id: 7,
            invoice_number: "INV-2301-001".into(),
            client_id: 1,
            project_id: 1,
            issue_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2023, 2, 4).unwrap(),
            status: InvoiceStatus::Paid,
            notes: None,
            subtotal: None,
            tax_rate: None,
            tax_amount: None,
            total_amount: Decimal::new(1200, 0),
            po_number: None,
            terms: None,
            created_at: Utc::now(),
            client_name: "Acme".into(),
            project_name: "Lobby".into(),
            client_address: None,
            client_email: None,
            client_phone: None,
        };

        let summary = row.into_summary();
        assert_eq!(summary.invoice.subtotal, Decimal::new(1200, 0));
        assert_eq!(summary.invoice.tax_rate, Decimal::ZERO);
        assert_eq!(summary.invoice.tax_amount, Decimal::ZERO);
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("PAID".parse::<InvoiceStatus>(), Ok(InvoiceStatus::Paid));
        assert!("void".parse::<InvoiceStatus>().is_err());
    }
}
