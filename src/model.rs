use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Days between the issue date and the due date.
pub const PAYMENT_TERM_DAYS: u64 = 15;

/// Format used for every date printed on the invoice, e.g. `16 January 2024`.
pub const DATE_FORMAT: &str = "%d %B %Y";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub address: String,
    pub city_st_zip: String,
    pub phone: String,
    pub email: String,
    pub logo: PathBuf,
    pub signature: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PartyContact {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

/// One billable row. `rate` is kept as entered and parsed at render time.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LineItem {
    #[serde(default)]
    pub date: String,
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub rate: String,
}

impl LineItem {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        rate: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            location: location.into(),
            rate: rate.into(),
        }
    }
}

/// Everything collected from the user before a number is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub company: CompanyProfile,
    pub customer: PartyContact,
    pub signatory: String,
    pub issue_date: NaiveDate,
    pub items: Vec<LineItem>,
}

impl InvoiceDraft {
    pub fn due_date(&self) -> NaiveDate {
        due_date_for(self.issue_date)
    }
}

pub fn due_date_for(issue_date: NaiveDate) -> NaiveDate {
    issue_date
        .checked_add_days(Days::new(PAYMENT_TERM_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// A draft paired with its allocated number. Lives for a single render.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub draft: InvoiceDraft,
    pub number: u64,
}

impl InvoiceRecord {
    pub fn new(draft: InvoiceDraft, number: u64) -> Self {
        Self { draft, number }
    }

    pub fn due_date(&self) -> NaiveDate {
        self.draft.due_date()
    }

    pub fn subtotal(&self) -> Result<Decimal> {
        sum_rates(&self.draft.items)
    }
}

/// Adds up the rates in input order. Fails on the first rate that does not
/// parse and on a total beyond what `Decimal` can hold.
pub fn sum_rates(items: &[LineItem]) -> Result<Decimal> {
    items
        .iter()
        .enumerate()
        .try_fold(Decimal::ZERO, |total, (index, item)| {
            let rate = parse_rate(&item.rate).ok_or_else(|| Error::InvalidRate {
                index,
                rate: item.rate.clone(),
            })?;
            total
                .checked_add(rate)
                .ok_or(Error::AmountOverflow { index })
        })
}

/// Customer and line items read from a TOML draft file, for generating an
/// invoice without prompts.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DraftInput {
    pub customer: PartyContact,
    pub signatory: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl DraftInput {
    /// Completes the draft. The signatory defaults to the company name and the
    /// date to `today`.
    pub fn into_draft(self, company: CompanyProfile, today: NaiveDate) -> InvoiceDraft {
        let signatory = self
            .signatory
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| company.name.clone());
        InvoiceDraft {
            company,
            customer: self.customer,
            signatory,
            issue_date: self.date.unwrap_or(today),
            items: self.items,
        }
    }
}

/// Parses a rate as a non-negative decimal. Surrounding whitespace is ignored.
pub fn parse_rate(raw: &str) -> Option<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .ok()
        .filter(|rate| !rate.is_sign_negative())
}

/// Two decimal places, midpoint away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}
