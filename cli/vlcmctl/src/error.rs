//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;
use vlcm_vapi::WaitError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// A 404; the server message is shown as is, `lookup` only feeds the hint.
    #[error("{source}")]
    NotFound {
        lookup: String,
        source: vlcm_vapi::Error,
    },

    #[error(transparent)]
    Api(#[from] vlcm_vapi::Error),
}

impl CliError {
    /// Tag a 404 with the identifiers that were looked up.
    pub fn not_found_as(lookup: impl FnOnce() -> String) -> impl FnOnce(vlcm_vapi::Error) -> Self {
        move |err| {
            if err.is_not_found() {
                CliError::NotFound {
                    lookup: lookup(),
                    source: err,
                }
            } else {
                CliError::Api(err)
            }
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    let (message, hint) = error_report(err);
    eprintln!("{} {}", "Error:".red().bold(), message);

    if let Some(hint) = hint {
        eprintln!("\n{}", hint.as_str().yellow());
    }
}

/// Uncolored error line and optional hint.
fn error_report(err: &anyhow::Error) -> (String, Option<String>) {
    (err.to_string(), hint_for(err))
}

fn hint_for(err: &anyhow::Error) -> Option<String> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::NotFound { lookup, .. } => Some(format!(
                "Hint: Looked up {}. Check the identifiers; list commands show valid ids.",
                lookup
            )),
            CliError::Api(api_err) => api_hint(api_err),
        };
    }

    if let Some(api_err) = err.downcast_ref::<vlcm_vapi::Error>() {
        return api_hint(api_err);
    }

    match err.downcast_ref::<WaitError>() {
        Some(WaitError::Cancelled { task_id, .. }) => Some(format!(
            "Hint: The task keeps running on the server. Resume with `vlcmctl task wait --task-id {}`.",
            task_id
        )),
        Some(WaitError::Fetch { source, .. }) => api_hint(source),
        None => None,
    }
}

fn api_hint(err: &vlcm_vapi::Error) -> Option<String> {
    match err {
        vlcm_vapi::Error::Http { status: 401, .. } => Some(
            "Hint: Pass a valid session with --session-id or VLCM_SESSION_ID.".to_string(),
        ),
        vlcm_vapi::Error::Http { status: 403, .. } => {
            Some("Hint: You may not have permission for this operation.".to_string())
        }
        vlcm_vapi::Error::Transport(_) => Some(
            "Hint: Check your network connection and --url. Use --insecure for self-signed certificates."
                .to_string(),
        ),
        _ => None,
    }
}
