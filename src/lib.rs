//! Invoice generation: a company settings loader, a durable invoice number
//! counter and a single-page PDF renderer, tied together by [`InvoiceService`].

pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod sequence;
pub mod service;
pub mod settings;

pub use config::Settings;
pub use error::{AssetKind, Error, ErrorKind, Result};
pub use model::{CompanyProfile, InvoiceDraft, InvoiceRecord, LineItem, PartyContact};
pub use render::{PreparedInvoice, Renderer};
pub use sequence::InvoiceSequence;
pub use service::{GeneratedInvoice, InvoiceService, IssuedInvoice};
pub use settings::{AppSettings, Workspace};
