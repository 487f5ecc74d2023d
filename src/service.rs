//! Generation pipeline: validate, allocate a number, render, write.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use regex::Regex;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::InvoiceDraft;
use crate::render::Renderer;
use crate::sequence::InvoiceSequence;
use crate::settings::Workspace;

static INVOICE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Invoice_(\d+)\.pdf$").expect("static regex"));

pub fn invoice_file_name(number: u64) -> String {
    format!("Invoice_{number}.pdf")
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInvoice {
    pub number: u64,
    pub path: PathBuf,
}

/// An invoice already present in the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedInvoice {
    pub number: u64,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

pub struct InvoiceService {
    sequence: InvoiceSequence,
    renderer: Renderer,
    output_dir: PathBuf,
}

impl InvoiceService {
    pub fn new(sequence: InvoiceSequence, renderer: Renderer, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            sequence,
            renderer,
            output_dir: output_dir.into(),
        }
    }

    pub fn for_workspace(workspace: &Workspace) -> Self {
        Self::new(
            InvoiceSequence::new(&workspace.counter_file),
            Renderer::new(),
            &workspace.output_dir,
        )
    }

    pub fn sequence(&self) -> &InvoiceSequence {
        &self.sequence
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_path(&self, number: u64) -> PathBuf {
        self.output_dir.join(invoice_file_name(number))
    }

    /// Produces one invoice. Nothing is allocated or written unless the draft
    /// passes validation and both images load. The number is persisted before
    /// the document is written.
    pub fn generate(&self, draft: &InvoiceDraft) -> Result<GeneratedInvoice> {
        let prepared = self.renderer.prepare(draft)?;

        self.sequence.ensure_initialized()?;
        let number = self.sequence.allocate_next()?;

        let bytes = prepared.render(number)?;
        let path = self.output_path(number);
        write_atomically(&path, &bytes)?;

        info!(number, path = %path.display(), size = bytes.len(), "invoice written");
        Ok(GeneratedInvoice { number, path })
    }

    /// Invoices in the output directory, ordered by number. Files that do not
    /// follow the `Invoice_<n>.pdf` naming are skipped.
    pub fn list(&self) -> Result<Vec<IssuedInvoice>> {
        if !self.output_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;

        let mut invoices = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(number) = INVOICE_FILE
                .captures(name)
                .and_then(|caps| caps[1].parse::<u64>().ok())
            else {
                continue;
            };
            let modified = entry.metadata().and_then(|m| m.modified()).ok();
            invoices.push(IssuedInvoice {
                number,
                path: entry.path(),
                modified,
            });
        }
        invoices.sort_by_key(|invoice| invoice.number);
        Ok(invoices)
    }
}

/// Writes `bytes` to a hidden sibling first and renames it over `path`, so a
/// failed write never leaves a truncated document behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = dir.join(format!(".{file_name}.partial"));

    let written = File::create(&partial)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&partial, path));

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&partial) {
            warn!(path = %partial.display(), error = %cleanup, "could not remove partial file");
        }
        return Err(Error::io(path, e));
    }
    Ok(())
}
