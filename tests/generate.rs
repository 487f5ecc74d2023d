//! End-to-end generation against a throwaway workspace.

use std::fs;

use chrono::NaiveDate;
use image::RgbImage;
use invoicegen::{
    ErrorKind, InvoiceDraft, InvoiceRecord, InvoiceService, LineItem, PartyContact, Renderer,
    Workspace, config,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn workspace() -> (TempDir, Workspace) {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    RgbImage::new(16, 8).save(dir.path().join("logo.png")).unwrap();
    RgbImage::new(24, 8).save(dir.path().join("signature.png")).unwrap();
    fs::write(
        &ws.config_file,
        "companyimage_file_name=logo.png\n\
         signature_file_name=signature.png\n\
         company_name=Acme Cleaning\n\
         address=1 Main St\n\
         city_st_zip=Springfield, IL 62701\n\
         phone_no=555-0100\n\
         email=billing@acme.test\n\
         customer_name=Jane Doe\n",
    )
    .unwrap();
    (dir, ws)
}

fn draft(ws: &Workspace) -> InvoiceDraft {
    let settings = config::load(&ws.config_file).unwrap();
    InvoiceDraft {
        signatory: settings.company.name.clone(),
        company: settings.company,
        customer: PartyContact {
            name: settings.customer.name,
            email: "jane@example.test".into(),
            address: "9 Elm St".into(),
            city: "Shelbyville".into(),
        },
        issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        items: vec![
            LineItem::new("01/02/2024", "Deep clean", "Office", "10.00"),
            LineItem::new("01/03/2024", "Windows", "Office", "20.50"),
            LineItem::new("01/04/2024", "Carpet", "Lobby", "5.25"),
        ],
    }
}

fn output_files(ws: &Workspace) -> Vec<String> {
    match fs::read_dir(&ws.output_dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn generates_numbered_invoices() {
    let (_dir, ws) = workspace();
    let service = InvoiceService::for_workspace(&ws);

    let first = service.generate(&draft(&ws)).unwrap();
    let second = service.generate(&draft(&ws)).unwrap();

    assert_eq!(first.number, 1);
    assert_eq!(second.number, 2);
    assert_eq!(first.path, ws.output_dir.join("Invoice_1.pdf"));
    assert!(fs::read(&second.path).unwrap().starts_with(b"%PDF-"));
    assert_eq!(fs::read_to_string(&ws.counter_file).unwrap(), "2");

    let listed: Vec<u64> = service.list().unwrap().iter().map(|i| i.number).collect();
    assert_eq!(listed, vec![1, 2]);
}

#[test]
fn continues_from_existing_counter() {
    let (_dir, ws) = workspace();
    fs::write(&ws.counter_file, "99").unwrap();
    let service = InvoiceService::for_workspace(&ws);

    let generated = service.generate(&draft(&ws)).unwrap();
    assert_eq!(generated.number, 100);
    assert_eq!(service.sequence().current().unwrap(), 100);
}

#[test]
fn empty_customer_name_consumes_nothing() {
    let (_dir, ws) = workspace();
    let service = InvoiceService::for_workspace(&ws);
    service.sequence().ensure_initialized().unwrap();

    let mut bad = draft(&ws);
    bad.customer.name.clear();

    let err = service.generate(&bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(service.sequence().current().unwrap(), 0);
    assert!(output_files(&ws).is_empty());
}

#[test]
fn bad_rate_produces_no_artifact() {
    let (_dir, ws) = workspace();
    let service = InvoiceService::for_workspace(&ws);
    service.sequence().ensure_initialized().unwrap();

    let mut bad = draft(&ws);
    bad.items[2].rate = "abc".into();

    let err = service.generate(&bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(service.sequence().current().unwrap(), 0);
    assert!(output_files(&ws).is_empty());
}

#[test]
fn overflowing_total_consumes_nothing() {
    let (_dir, ws) = workspace();
    let service = InvoiceService::for_workspace(&ws);
    service.sequence().ensure_initialized().unwrap();

    let mut bad = draft(&ws);
    bad.items[0].rate = "79228162514264337593543950335".into();
    bad.items[1].rate = "1".into();

    let err = service.generate(&bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(service.sequence().current().unwrap(), 0);
    assert!(output_files(&ws).is_empty());
}

#[test]
fn missing_logo_is_caught_before_allocation() {
    let (dir, ws) = workspace();
    fs::remove_file(dir.path().join("logo.png")).unwrap();
    let service = InvoiceService::for_workspace(&ws);
    service.sequence().ensure_initialized().unwrap();

    let err = service.generate(&draft(&ws)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AssetNotFound);
    assert_eq!(service.sequence().current().unwrap(), 0);
    assert!(output_files(&ws).is_empty());
}

#[test]
fn corrupt_counter_stops_generation() {
    let (_dir, ws) = workspace();
    fs::write(&ws.counter_file, "oops").unwrap();
    let service = InvoiceService::for_workspace(&ws);

    let err = service.generate(&draft(&ws)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptCounter);
    assert_eq!(fs::read_to_string(&ws.counter_file).unwrap(), "oops");
    assert!(output_files(&ws).is_empty());
}

#[test]
fn renderer_works_on_a_bare_record() {
    let (_dir, ws) = workspace();
    let record = InvoiceRecord::new(draft(&ws), 5);

    assert_eq!(record.subtotal().unwrap(), dec!(35.75));
    assert_eq!(record.due_date(), NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    let bytes = Renderer::new().render(&record).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn malformed_config_line_is_rejected() {
    let (_dir, ws) = workspace();
    fs::write(&ws.config_file, "company_name=Acme\nthis line has no separator\n").unwrap();

    let err = config::load(&ws.config_file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
