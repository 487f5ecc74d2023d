//! Loader for the flat `key=value` company settings file.
//!
//! Each non-blank line holds one setting, split on the first `=`. Keys and
//! values are trimmed. Unknown keys are ignored and a repeated key keeps its
//! last value. Relative image paths resolve against the file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{CompanyProfile, PartyContact};

/// What `config.txt` provides: the issuing company and default customer fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub company: CompanyProfile,
    pub customer: PartyContact,
}

pub fn load(path: &Path) -> Result<Settings> {
    if !path.is_file() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let content = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        Error::ConfigSyntax {
            path: path.to_path_buf(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            reason: "not valid UTF-8 text".to_string(),
        }
    })?;
    let mut settings = parse(&content, path)?;

    if let Some(base) = path.parent() {
        settings.company.logo = resolve_asset(base, &settings.company.logo);
        settings.company.signature = resolve_asset(base, &settings.company.signature);
    }
    Ok(settings)
}

/// Parses settings text. `origin` only appears in error messages.
pub fn parse(content: &str, origin: &Path) -> Result<Settings> {
    let mut settings = Settings::default();
    let mut seen: Vec<&str> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let syntax_error = |reason: &str| Error::ConfigSyntax {
            path: origin.to_path_buf(),
            line: idx + 1,
            reason: reason.to_string(),
        };

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| syntax_error("expected `key=value`"))?;
        let key = key.trim();
        let value = value.trim().to_string();
        if key.is_empty() {
            return Err(syntax_error("missing key before `=`"));
        }

        if seen.contains(&key) {
            warn!(key, line = idx + 1, "duplicate setting, keeping the last value");
        } else {
            seen.push(key);
        }

        match key {
            "companyimage_file_name" => settings.company.logo = PathBuf::from(value),
            "signature_file_name" => settings.company.signature = PathBuf::from(value),
            "company_name" => settings.company.name = value,
            "address" => settings.company.address = value,
            "city_st_zip" => settings.company.city_st_zip = value,
            "phone_no" => settings.company.phone = value,
            "email" => settings.company.email = value,
            "customer_name" => settings.customer.name = value,
            "customer_email" => settings.customer.email = value,
            "customer_address" => settings.customer.address = value,
            "customer_city" => settings.customer.city = value,
            other => debug!(key = other, "ignoring unknown setting"),
        }
    }

    Ok(settings)
}

fn resolve_asset(base: &Path, asset: &Path) -> PathBuf {
    if asset.as_os_str().is_empty() || asset.is_absolute() {
        asset.to_path_buf()
    } else {
        base.join(asset)
    }
}
