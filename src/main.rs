use chrono::{DateTime, Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand};
use comfy_table::{Attribute, Cell, Table};
use inquire::validator::Validation;
use inquire::{Confirm, CustomUserError, DateSelect, InquireError, Text};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing_subscriber::EnvFilter;

use invoicegen::config::{self, Settings};
use invoicegen::model::{DATE_FORMAT, DraftInput, parse_rate};
use invoicegen::settings::{self as app_settings, expand_home_dir};
use invoicegen::{
    AppSettings, CompanyProfile, Error, ErrorKind, InvoiceDraft, InvoiceService, LineItem,
    PartyContact, Workspace,
};

// ==========================================
// Constants & Embeds
// ==========================================

// Written by `init` when the data root has no config.txt yet
const DEFAULT_CONFIG: &str = include_str!("../config.example.txt");

// ==========================================
// Structs & Enums
// ==========================================

#[derive(Parser)]
#[command(name = "invoicegen", about = "Generate numbered PDF invoices")]
struct Cli {
    /// Data directory holding config.txt, the counter and invoices/
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new invoice
    New {
        /// Read customer and line items from a TOML draft instead of prompting
        #[arg(long)]
        from: Option<PathBuf>,
        /// Do not open the generated PDF
        #[arg(long)]
        no_open: bool,
    },
    /// List generated invoices
    List,
    /// Open output folder
    Open,
    /// Configure data directory
    Config,
    /// Create config.txt and the invoice counter in the data directory
    Init,
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        return;
    };

    if let Err(e) = run(command, cli.data_root) {
        eprintln!("❌ {}: {}", describe(e.kind()), e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(command: Commands, data_root: Option<PathBuf>) -> invoicegen::Result<()> {
    match command {
        Commands::New { from, no_open } => {
            let (workspace, service) = open_workspace(data_root)?;
            let settings = config::load(&workspace.config_file)?;
            let draft = match from {
                Some(path) => draft_from_file(&path, settings.company)?,
                None => collect_draft(&settings),
            };

            let generated = service.generate(&draft)?;
            println!(
                "✅ Invoice {} generated successfully and saved as {}",
                generated.number,
                generated.path.display()
            );
            if !no_open {
                open_and_reveal(&generated.path);
            }
        }
        Commands::List => {
            let (_, service) = open_workspace(data_root)?;
            list_invoices(&service)?;
        }
        Commands::Open => {
            let (_, service) = open_workspace(data_root)?;
            let dir = service.output_dir();
            fs::create_dir_all(dir).map_err(|e| Error::Io { path: dir.to_path_buf(), source: e })?;
            println!("🚀 Opening: {:?}", dir);
            open_path(dir);
        }
        Commands::Config => {
            setup_config_wizard()?;
        }
        Commands::Init => {
            let (workspace, _) = open_workspace(data_root)?;
            init_workspace(&workspace)?;
        }
    }
    Ok(())
}

// Resolves the data root (flag, then settings.toml, then the wizard) and makes
// sure the invoice counter exists.
fn open_workspace(data_root: Option<PathBuf>) -> invoicegen::Result<(Workspace, InvoiceService)> {
    let workspace = match data_root {
        Some(root) => Workspace::new(expand_home_dir(&root.to_string_lossy())),
        None => match app_settings::load(&app_settings::config_path())? {
            Some(settings) => settings.workspace(),
            None => setup_config_wizard()?.workspace(),
        },
    };
    let service = InvoiceService::for_workspace(&workspace);
    service.sequence().ensure_initialized()?;
    Ok((workspace, service))
}

fn describe(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Configuration => "Configuration error",
        ErrorKind::Validation => "Missing information",
        ErrorKind::AssetNotFound => "Image not found",
        ErrorKind::Render => "Could not render invoice",
        ErrorKind::CorruptCounter => "Invoice counter is corrupt",
        ErrorKind::Io => "File error",
    }
}

// ==========================================
// 1. Draft Collection
// ==========================================

fn draft_from_file(path: &Path, company: CompanyProfile) -> invoicegen::Result<InvoiceDraft> {
    let content = fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let input: DraftInput = toml::from_str(&content).map_err(|e| Error::ConfigSyntax {
        path: path.to_path_buf(),
        line: e.span().map(|span| line_of(&content, span.start)).unwrap_or(0),
        reason: e.message().to_string(),
    })?;
    Ok(input.into_draft(company, Local::now().date_naive()))
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset.min(content.len())].matches('\n').count() + 1
}

fn collect_draft(settings: &Settings) -> InvoiceDraft {
    let company = confirm_company(&settings.company);

    println!("\n--- Bill To ---");
    let defaults = &settings.customer;
    let name = ask(Text::new("Customer Name:").with_default(&defaults.name).prompt());
    let email = ask(Text::new("Customer Email (Optional):").with_default(&defaults.email).prompt());
    let address = ask(Text::new("Customer Address (Optional):").with_default(&defaults.address).prompt());
    let city = if defaults.city.trim().is_empty() {
        city_line_from_zip()
    } else {
        ask(Text::new("Customer City:").with_default(&defaults.city).prompt())
    };

    let signatory = ask(
        Text::new("Authorized Signatory:")
            .with_default(&company.name)
            .prompt(),
    );

    let issue_date = ask(
        DateSelect::new("Invoice Date:")
            .with_default(Local::now().date_naive())
            .prompt(),
    );

    let items = enter_line_items(issue_date);

    InvoiceDraft {
        company,
        customer: PartyContact { name, email, address, city },
        signatory,
        issue_date,
        items,
    }
}

fn confirm_company(company: &CompanyProfile) -> CompanyProfile {
    println!("\n--- Company Details ---");
    println!("{}\n{}\n{}\n{}", company.name, company.address, company.city_st_zip, company.phone);
    let keep = ask(Confirm::new("Use these company details?").with_default(true).prompt());
    if keep {
        return company.clone();
    }

    CompanyProfile {
        name: ask(Text::new("Company Name:").with_default(&company.name).prompt()),
        address: ask(Text::new("Address:").with_default(&company.address).prompt()),
        city_st_zip: ask(Text::new("City, State ZIP:").with_default(&company.city_st_zip).prompt()),
        phone: ask(Text::new("Phone No:").with_default(&company.phone).prompt()),
        ..company.clone()
    }
}

fn city_line_from_zip() -> String {
    let zip = ask(Text::new("Customer Zip Code (Leave empty to skip lookup):").prompt());
    let mut default_line = String::new();

    if !zip.trim().is_empty() {
        if let Ok(results) = zipcodes::matching(zip.trim(), None) {
            if let Some(info) = results.first() {
                println!("🚀 Found: {}, {}", info.city, info.state);
                default_line = format!("{}, {} {}", info.city, info.state, zip.trim());
            }
        }
    }

    ask(Text::new("Customer City:").with_default(&default_line).prompt())
}

fn enter_line_items(issue_date: NaiveDate) -> Vec<LineItem> {
    let mut items = Vec::new();
    println!("\n--- Enter Line Items ---");
    println!("(Leave Description empty to finish)");

    let default_date = issue_date.format("%m/%d/%Y").to_string();
    loop {
        let description = ask(Text::new("Description (leave empty to finish):").prompt());
        if description.trim().is_empty() {
            break;
        }

        let date = ask(Text::new("Date:").with_default(&default_date).prompt());
        let location = ask(Text::new("Location:").prompt());
        let rate = ask(
            Text::new("Rate ($):")
                .with_validator(|input: &str| -> Result<Validation, CustomUserError> {
                    if parse_rate(input).is_some() {
                        Ok(Validation::Valid)
                    } else {
                        Ok(Validation::Invalid("Enter a non-negative amount, e.g. 120.50".into()))
                    }
                })
                .prompt(),
        );

        items.push(LineItem { date, description, location, rate: rate.trim().to_string() });
    }
    items
}

// Prompt cancelled (Esc / Ctrl-C): leave without touching anything
fn ask<T>(answer: Result<T, InquireError>) -> T {
    match answer {
        Ok(value) => value,
        Err(_) => {
            println!("Cancelled.");
            std::process::exit(0);
        }
    }
}

// ==========================================
// 2. List Logic
// ==========================================

fn list_invoices(service: &InvoiceService) -> invoicegen::Result<()> {
    let invoices = service.list()?;
    let issued = service.sequence().current()?;

    if invoices.is_empty() {
        println!("(None found)");
    } else {
        let mut table = Table::new();
        table.set_header(vec![Cell::new("No."), Cell::new("File"), Cell::new("Generated")]);
        for invoice in &invoices {
            let generated = invoice
                .modified
                .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            let file = invoice
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            table.add_row(vec![Cell::new(invoice.number), Cell::new(file), Cell::new(generated)]);
        }
        println!("{table}");
    }

    let mut summary = Table::new();
    summary.add_row(vec![
        Cell::new("Invoices issued").add_attribute(Attribute::Bold),
        Cell::new(issued),
    ]);
    summary.add_row(vec![
        Cell::new("Next number").add_attribute(Attribute::Bold),
        Cell::new(issued + 1),
    ]);
    println!("{summary}");
    println!("Today: {}", Local::now().date_naive().format(DATE_FORMAT));
    Ok(())
}

// ==========================================
// 3. Config & Utilities
// ==========================================

fn setup_config_wizard() -> invoicegen::Result<AppSettings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let path = app_settings::config_path();
    let current = app_settings::load(&path).ok().flatten();
    let default_val = current
        .map(|s| s.data_root)
        .unwrap_or_else(|| "~/Documents/Invoices".to_string());

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Invoice Data Directory")
        .pick_folder();

    let new_root = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        ask(Text::new("Enter Data Directory:").with_default(&default_val).prompt())
    };

    let settings = AppSettings { data_root: new_root };
    app_settings::save(&path, &settings)?;
    println!("✅ Settings saved to {}", path.display());
    Ok(settings)
}

fn init_workspace(workspace: &Workspace) -> invoicegen::Result<()> {
    fs::create_dir_all(&workspace.output_dir).map_err(|e| Error::Io {
        path: workspace.output_dir.clone(),
        source: e,
    })?;

    if workspace.config_file.exists() {
        println!("✅ Found {}", workspace.config_file.display());
    } else {
        fs::write(&workspace.config_file, DEFAULT_CONFIG).map_err(|e| Error::Io {
            path: workspace.config_file.clone(),
            source: e,
        })?;
        println!("✨ Wrote default {}. Edit it with your company details.", workspace.config_file.display());
    }
    println!("✅ Invoice counter ready at {}", workspace.counter_file.display());
    Ok(())
}

fn open_path(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}

// Helper: Open file and reveal in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(format!("/select,{}", path.to_string_lossy())).spawn().ok();

    open_path(path);
}
