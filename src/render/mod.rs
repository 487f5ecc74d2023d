//! Invoice document rendering.
//!
//! Rendering is split in two steps. [`Renderer::prepare`] checks everything
//! that can fail because of user input or missing files: required fields,
//! rates and the two images. [`PreparedInvoice::render`] then only needs the
//! invoice number, so a caller can allocate the number between the two steps
//! and never burn a number on an invoice that cannot be produced.

pub mod layout;
pub mod metrics;
mod pdf;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{AssetKind, Error, Result};
use crate::model::{InvoiceDraft, InvoiceRecord, sum_rates};

pub use layout::{Mark, Page, layout};

use pdf::Assets;

/// Produces invoice PDFs. Holds no state, so one renderer can serve any
/// number of invoices.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn prepare(&self, draft: &InvoiceDraft) -> Result<PreparedInvoice> {
        validate(draft)?;
        let assets = Assets {
            logo: load_image(AssetKind::Logo, &draft.company.logo)?,
            signature: load_image(AssetKind::Signature, &draft.company.signature)?,
        };
        Ok(PreparedInvoice {
            draft: draft.clone(),
            assets,
        })
    }

    pub fn render(&self, record: &InvoiceRecord) -> Result<Vec<u8>> {
        self.prepare(&record.draft)?.render(record.number)
    }
}

/// A draft that passed validation, with its images decoded.
#[derive(Debug, Clone)]
pub struct PreparedInvoice {
    draft: InvoiceDraft,
    assets: Assets,
}

impl PreparedInvoice {
    pub fn render(&self, number: u64) -> Result<Vec<u8>> {
        let record = InvoiceRecord::new(self.draft.clone(), number);
        let page = layout(&record)?;
        pdf::paint(&format!("Invoice {number}"), &page, &self.assets)
    }
}

/// Checks required fields, rates and the total. Stops at the first problem.
pub fn validate(draft: &InvoiceDraft) -> Result<()> {
    let required = [
        ("company name", &draft.company.name),
        ("company address", &draft.company.address),
        ("company city", &draft.company.city_st_zip),
        ("phone number", &draft.company.phone),
        ("customer name", &draft.customer.name),
        ("authorized signatory", &draft.signatory),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(Error::Validation(*field));
    }
    if draft.items.is_empty() {
        return Err(Error::Validation("line items"));
    }

    sum_rates(&draft.items).map(|_| ())
}

fn load_image(kind: AssetKind, path: &Path) -> Result<image::DynamicImage> {
    let bytes = fs::read(path).map_err(|source| Error::AssetNotFound {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    debug!(%kind, path = %path.display(), size = bytes.len(), "loaded image");
    image::load_from_memory(&bytes).map_err(|e| Error::InvalidImage {
        kind,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
