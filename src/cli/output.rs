//! Output formatting for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{CredentialBinding, SmtpAuthentication, StoredCredential};
use crate::secrets::CredentialOption;

/// Secret-free view of a record
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub path: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password_set: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<String>,
}

impl RecordSummary {
    pub fn new(path: &std::path::Path, record: &SmtpAuthentication) -> Self {
        match record.binding() {
            CredentialBinding::Legacy(legacy) => Self {
                path: path.display().to_string(),
                state: "legacy",
                username: legacy.username().map(str::to_string),
                password_set: legacy.password().is_some(),
                credentials_id: None,
            },
            CredentialBinding::Referenced(id) => Self {
                path: path.display().to_string(),
                state: "referenced",
                username: None,
                password_set: false,
                credentials_id: Some(id.to_string()),
            },
        }
    }
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Print credential options as a table
pub fn print_options_table(options: &[CredentialOption]) {
    println!();
    println!("{:<38} {}", "ID", "Label");
    println!("{}", "-".repeat(80));

    for option in options {
        println!("{:<38} {}", option.id, truncate(&option.label, 40));
    }
}

/// Print one credential without its secret
pub fn print_credential(credential: &StoredCredential) {
    println!("ID:          {}", credential.id);
    println!("Kind:        {:?}", credential.kind());
    println!("Scope:       {}", credential.scope);
    println!("Username:    {}", credential.username);
    println!("Password:    ******");
    println!("Description: {}", credential.description);
}

/// Truncate a string to a maximum length
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
