//! CLI - Command Line Interface for resolvarr
//!
//! Designed for automation and scripting. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # List vendors and their status
//! resolvarr providers
//!
//! # Enable a vendor
//! resolvarr enable rd --api-key XXXX
//!
//! # Check which hashes a vendor has cached
//! resolvarr check tt1877830 --provider rd --hashes aaaa...,bbbb...
//!
//! # Resolve a magnet to a playable URL
//! resolvarr resolve "magnet:?xt=urn:btih:..." --provider rd --title "The Batman"
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Provider not configured
    ProviderNotConfigured = 4,
    /// Nothing resolved
    NotAvailable = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// resolvarr - debrid source checking and resolution
///
/// Every operation is scriptable; pipe with --json for automation.
#[derive(Parser, Debug)]
#[command(
    name = "resolvarr",
    version,
    about = "Debrid cache checking and source resolution",
    after_help = "EXAMPLES:\n\
                  resolvarr providers                         List vendor status\n\
                  resolvarr enable rd --api-key XXXX          Enable a vendor\n\
                  resolvarr check tt1877830 -p rd --hashes .. Check cached hashes\n\
                  resolvarr resolve <magnet> -p rd -t Title   Resolve to a URL"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List debrid vendors and their configuration status
    #[command(visible_alias = "p")]
    Providers,

    /// Enable a vendor and store its API key
    Enable(EnableCmd),

    /// Disable a vendor
    Disable(DisableCmd),

    /// Check which info-hashes a vendor has cached
    #[command(visible_alias = "c")]
    Check(CheckCmd),

    /// Resolve a magnet or hoster URL to a playable link
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),
}

/// Enable a vendor and store its API key
#[derive(Args, Debug)]
pub struct EnableCmd {
    /// Vendor short code (rd, pm, ad, tb, oc, ed) or name
    #[arg(required = true)]
    pub provider: String,

    /// Vendor API key
    #[arg(long, short = 'k')]
    pub api_key: Option<String>,

    /// Keep resolved torrents in the vendor cloud
    #[arg(long)]
    pub store_torrents: bool,

    /// Keep resolved usenet transfers in the vendor cloud
    #[arg(long)]
    pub store_usenet: bool,
}

/// Disable a vendor
#[derive(Args, Debug)]
pub struct DisableCmd {
    /// Vendor short code (rd, pm, ad, tb, oc, ed) or name
    #[arg(required = true)]
    pub provider: String,
}

/// Check which info-hashes a vendor has cached
#[derive(Args, Debug)]
pub struct CheckCmd {
    /// IMDB ID of the media (e.g., tt1877830)
    #[arg(required = true)]
    pub imdb_id: String,

    /// Vendor to check against
    #[arg(long, short = 'p', required = true)]
    pub provider: String,

    /// Comma-separated 40-char hex info-hashes
    #[arg(long, required = true)]
    pub hashes: String,

    /// Season number (for episodes)
    #[arg(long, short = 's')]
    pub season: Option<u32>,

    /// Episode number (for episodes)
    #[arg(long, short = 'e')]
    pub episode: Option<u32>,
}

impl CheckCmd {
    pub fn hash_list(&self) -> Vec<String> {
        self.hashes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Resolve a magnet or hoster URL to a playable link
#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// Magnet URI, info-hash or hoster URL
    #[arg(required = true)]
    pub locator: String,

    /// Vendor to resolve through
    #[arg(long, short = 'p', required = true)]
    pub provider: String,

    /// Media title (extras filtering)
    #[arg(long, short = 't', default_value = "")]
    pub title: String,

    /// Season number (for episodes)
    #[arg(long, short = 's')]
    pub season: Option<u32>,

    /// Episode number (for episodes)
    #[arg(long, short = 'e')]
    pub episode: Option<u32>,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// IMDB ID Validation
// =============================================================================

/// Validate IMDB ID format (tt followed by digits)
pub fn validate_imdb_id(id: &str) -> Result<&str, &'static str> {
    if id.starts_with("tt") && id.len() >= 9 && id[2..].chars().all(|c| c.is_ascii_digit()) {
        Ok(id)
    } else {
        Err("Invalid IMDB ID format (expected tt followed by 7+ digits)")
    }
}

// =============================================================================
// Tests
// =============================================================================
