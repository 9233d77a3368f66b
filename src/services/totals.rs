// src/services/totals.rs

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::invoice::LineItem;

/// Subtotal, imposto e total de uma fatura.
///
/// Os valores guardados têm precisão total; o arredondamento para 2 casas
/// acontece só na apresentação (`rounded`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    /// subtotal = soma dos itens, imposto = subtotal x (taxa / 100), total = subtotal + imposto.
    ///
    /// Retorna `None` se algum passo estourar o intervalo do `Decimal`.
    pub fn compute(items: &[LineItem], tax_rate_percent: Decimal) -> Option<Self> {
        let subtotal = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount()))?;
        let tax_amount = subtotal.checked_mul(tax_rate_percent.checked_div(Decimal::ONE_HUNDRED)?)?;
        let total = subtotal.checked_add(tax_amount)?;

        Some(Self { subtotal, tax_amount, total })
    }

    pub fn rounded(&self) -> Self {
        let round = |d: Decimal| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            subtotal: round(self.subtotal),
            tax_amount: round(self.tax_amount),
            total: round(self.total),
        }
    }
}

/// Colunas de totais como estão no banco. Faturas criadas antes dos campos
/// de imposto só têm `total_amount`.
#[derive(Debug, Clone, Copy)]
pub struct StoredTotals {
    pub subtotal: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub total_amount: Decimal,
}

impl StoredTotals {
    /// Aplica os padrões de faturas antigas: taxa 0, imposto 0 e subtotal = total - imposto.
    pub fn resolve(self) -> (Decimal, InvoiceTotals) {
        let tax_rate = self.tax_rate.unwrap_or(Decimal::ZERO);
        let tax_amount = self.tax_amount.unwrap_or(Decimal::ZERO);
        let subtotal = self
            .subtotal
            .unwrap_or_else(|| self.total_amount - tax_amount);

        (
            tax_rate,
            InvoiceTotals {
                subtotal,
                tax_amount,
                total: self.total_amount,
            },
        )
    }
}
