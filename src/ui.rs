// UI layer: terminal prompts for values the command line left out, the
// download progress bar, and the end-of-run summary.

use crate::gallery::FetchReport;
use anyhow::{bail, Result};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

pub const DEFAULT_COMMIT_MESSAGE: &str = "Update";

/// Progress bar for the download phase, or a hidden one when disabled or
/// when stderr is not a terminal.
pub fn download_progress(enabled: bool) -> ProgressBar {
    if !enabled || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Use the given session value, or ask for it with hidden input.
pub fn session_or_prompt(session: Option<String>) -> Result<String> {
    if let Some(s) = session.filter(|s| !s.is_empty()) {
        return Ok(s);
    }
    if !std::io::stdin().is_terminal() {
        bail!("no session cookie given; pass --cookie or set GALLERY_SESSION");
    }
    let s: String = Password::new().with_prompt("PHPSESSID cookie").interact()?;
    Ok(s)
}

/// Use the given commit message, or ask for one.
pub fn message_or_prompt(message: Option<String>) -> Result<String> {
    if let Some(m) = message.filter(|m| !m.trim().is_empty()) {
        return Ok(m);
    }
    if !std::io::stdin().is_terminal() {
        return Ok(DEFAULT_COMMIT_MESSAGE.to_string());
    }
    let m: String = Input::new()
        .with_prompt("Commit message")
        .default(DEFAULT_COMMIT_MESSAGE.to_string())
        .interact_text()?;
    Ok(m)
}

/// Process exit status for a finished gallery run. Partial failure still
/// exits 0 unless `strict` is set.
pub fn exit_code(report: &FetchReport, strict: bool) -> i32 {
    if strict && !report.is_complete() {
        1
    } else {
        0
    }
}

/// Human-readable summary of a gallery run.
pub fn summary(report: &FetchReport) -> String {
    let mut out = format!(
        "Downloaded {} of {} images to {}\nImage URLs saved to {}",
        report.downloaded,
        report.records.len(),
        report.output_dir.display(),
        report.manifest_path.display(),
    );
    if !report.failures.is_empty() {
        out.push_str(&format!("\n{} problem(s):", report.failures.len()));
        for failure in &report.failures {
            out.push_str(&format!("\n  - {failure}"));
        }
    }
    out
}
