// messages.rs
// Human-readable receipt messages in the tenant's working language.

use serde::{Deserialize, Serialize};

use crate::receipt_book::{MAX_RECEIPT_NUMBER, ReceiptBookStats, ReceiptError, Validation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Es,
}

impl Lang {
    /// Picks the first supported language from an `Accept-Language` value.
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .find_map(|tag| match tag.split('-').next() {
                Some("en") => Some(Lang::En),
                Some("es") => Some(Lang::Es),
                _ => None,
            })
    }
}

pub fn rejection_message(lang: Lang, err: &ReceiptError) -> String {
    match (lang, err) {
        (Lang::En, ReceiptError::OutOfRange { number, start, end }) => {
            format!("Receipt number {number} is outside this book's range ({start} - {end})")
        }
        (Lang::Es, ReceiptError::OutOfRange { number, start, end }) => {
            format!("El recibo {number} está fuera del rango del talonario ({start} - {end})")
        }
        (Lang::En, ReceiptError::AlreadyUsed { number }) => {
            format!("Receipt number {number} has already been used")
        }
        (Lang::Es, ReceiptError::AlreadyUsed { number }) => {
            format!("El recibo {number} ya fue utilizado")
        }
        (Lang::En, ReceiptError::BookCompleted) => "This receipt book is completed".to_string(),
        (Lang::Es, ReceiptError::BookCompleted) => "Este talonario ya está completo".to_string(),
        (Lang::En, ReceiptError::BookInactive) => "This receipt book is not active".to_string(),
        (Lang::Es, ReceiptError::BookInactive) => "Este talonario no está activo".to_string(),
        (Lang::En, ReceiptError::InvalidRange { start, end }) => {
            format!(
                "Invalid receipt range {start} - {end}: numbers run from 0 to {MAX_RECEIPT_NUMBER} and the end must be greater than the start"
            )
        }
        (Lang::Es, ReceiptError::InvalidRange { start, end }) => {
            format!(
                "Rango inválido {start} - {end}: los números van de 0 a {MAX_RECEIPT_NUMBER} y el final debe ser mayor que el inicio"
            )
        }
    }
}

pub fn validation_message(lang: Lang, number: i64, validation: &Validation) -> String {
    if let Some(err) = &validation.rejection {
        return rejection_message(lang, err);
    }
    match (lang, validation.is_sequential) {
        (Lang::En, true) => format!("Receipt number {number} is valid"),
        (Lang::Es, true) => format!("El recibo {number} es válido"),
        (Lang::En, false) => {
            format!("Receipt number {number} is valid but out of sequence")
        }
        (Lang::Es, false) => {
            format!("El recibo {number} es válido pero no es el siguiente en secuencia")
        }
    }
}

pub fn stats_message(lang: Lang, stats: &ReceiptBookStats) -> String {
    let missing = stats.missing_numbers.len();
    match lang {
        Lang::En => format!(
            "{} of {} receipts used ({}%), {} missing, {} out of sequence",
            stats.used_count,
            stats.total_numbers,
            stats.completion_percentage,
            missing,
            stats.sequential_breaks
        ),
        Lang::Es => format!(
            "{} de {} recibos usados ({}%), {} faltantes, {} fuera de secuencia",
            stats.used_count,
            stats.total_numbers,
            stats.completion_percentage,
            missing,
            stats.sequential_breaks
        ),
    }
}
