use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    JPY,
    CHF,
    CNY,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CNY => "CNY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "CAD" => Ok(Currency::CAD),
            "AUD" => Ok(Currency::AUD),
            "JPY" => Ok(Currency::JPY),
            "CHF" => Ok(Currency::CHF),
            "CNY" => Ok(Currency::CNY),
            other => Err(format!("unsupported currency code '{other}'")),
        }
    }
}

/// Structured data extracted from a receipt image by the vision
/// collaborator. Every field is best-effort; `confidence_score` tells the
/// workflow engine how much to trust the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub vendor_name: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub total_amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub receipt_number: Option<String>,
    pub tax_amount: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    /// Extraction confidence in [0, 1].
    pub confidence_score: f64,
}

impl ReceiptData {
    /// Minimum usable extraction: vendor, date and total all present.
    pub fn has_required_data(&self) -> bool {
        self.vendor_name.as_deref().is_some_and(|v| !v.is_empty())
            && self.transaction_date.is_some()
            && self.total_amount.is_some()
    }

    /// Consistency problems in the extracted amounts. Informational; the
    /// workflow engine records these but does not block on them.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let (Some(subtotal), Some(tax), Some(total)) =
            (self.subtotal, self.tax_amount, self.total_amount)
        {
            let calculated = subtotal + tax;
            let tolerance = Decimal::new(1, 2); // 0.01
            if (calculated - total).abs() > tolerance {
                errors.push(format!(
                    "total amount ({total}) does not match subtotal + tax ({calculated})"
                ));
            }
        }

        if let Some(total) = self.total_amount {
            if total <= Decimal::ZERO {
                errors.push("total amount must be greater than zero".to_string());
            }
        }

        errors
    }

    /// Standardized filename stem derived from the extracted fields,
    /// `YYYYMMDD_Vendor_Name_USD123.45`. Unknown parts get placeholder
    /// markers so the result is always usable for renaming.
    pub fn suggested_filename(&self) -> String {
        let date_part = self
            .transaction_date
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_else(|| "NODATE".to_string());

        let vendor_part = self
            .vendor_name
            .as_deref()
            .map(clean_vendor_for_filename)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "UNKNOWN_VENDOR".to_string());

        let amount_part = match self.total_amount {
            Some(amount) => {
                let currency = self.currency.map(|c| c.as_str()).unwrap_or("USD");
                format!("{currency}{amount:.2}")
            }
            None => "AMOUNT_UNKNOWN".to_string(),
        };

        format!("{date_part}_{vendor_part}_{amount_part}")
    }
}

fn clean_vendor_for_filename(vendor: &str) -> String {
    let cleaned: String = vendor
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    cleaned.trim().replace(' ', "_").chars().take(20).collect()
}
