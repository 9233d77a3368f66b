// src/services/numbering.rs

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

/// Quantas vezes o `InvoiceService` tenta gravar uma fatura quando o número colide.
pub const MAX_NUMBERING_ATTEMPTS: u32 = 5;

/// Série mensal de numeração: `INV-{AA}{MM}`.
///
/// O número final é `INV-{AA}{MM}-{NNN}`, onde NNN = (faturas existentes com
/// o prefixo) + 1. Se esse número já estiver gravado (buraco deixado por
/// fatura apagada), avança até o primeiro livre. Conflito no INSERT só
/// acontece com um concorrente, e a nova tentativa recalcula tudo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberSeries {
    prefix: String,
}

impl NumberSeries {
    pub fn for_date(date: NaiveDate) -> Self {
        let year = date.year().rem_euclid(100);
        Self {
            prefix: format!("INV-{:02}{:02}", year, date.month()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Padrão para `invoice_number LIKE $1`. O prefixo não tem `%` nem `_`.
    pub fn like_pattern(&self) -> String {
        format!("{}%", self.prefix)
    }

    pub fn contains(&self, invoice_number: &str) -> bool {
        invoice_number.starts_with(&self.prefix)
    }

    /// `taken` = números já gravados na série, lidos na mesma transação do INSERT.
    pub fn next_number<'a>(&self, taken: impl IntoIterator<Item = &'a str>) -> String {
        let mut count: u64 = 0;
        let mut used = HashSet::new();
        for number in taken {
            if !self.contains(number) {
                continue;
            }
            count += 1;
            if let Some(sequence) = self.sequence_of(number) {
                used.insert(sequence);
            }
        }

        let mut sequence = count + 1;
        while used.contains(&sequence) {
            sequence += 1;
        }
        format!("{}-{:03}", self.prefix, sequence)
    }

    fn sequence_of(&self, invoice_number: &str) -> Option<u64> {
        invoice_number
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?
            .parse()
            .ok()
    }
}
