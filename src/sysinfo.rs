//! System information shown on the placeholder card and offered for copying.
//!
//! Copying goes to the system clipboard. Without one (headless, SSH) the text is
//! written to a file in the data directory instead.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// Where [`SystemInfo::copy`] put the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyTarget {
    Clipboard,
    File {
        path: PathBuf,
        /// Why the clipboard was skipped, when it was tried.
        clipboard_error: Option<String>,
    },
}

/// Lazily opened system clipboard. Kept open for the life of the panel since
/// some platforms drop the contents with the last handle.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn set_text(&mut self, text: &str) -> Result<(), arboard::Error> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        self.inner.insert(clipboard).set_text(text.to_owned())
    }
}

/// Shipped alongside the binary.
pub const KNOWN_ISSUES_DOC: &str = "docs/KNOWN_ISSUES.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub arch: String,
    pub os: String,
    pub family: String,
    pub panel_version: String,
    pub terminal: String,
    pub truecolor: bool,
}

impl SystemInfo {
    pub fn detect() -> Self {
        let colorterm = std::env::var("COLORTERM").unwrap_or_default();
        Self {
            arch: std::env::consts::ARCH.to_string(),
            os: std::env::consts::OS.to_string(),
            family: std::env::consts::FAMILY.to_string(),
            panel_version: env!("CARGO_PKG_VERSION").to_string(),
            terminal: std::env::var("TERM").unwrap_or_else(|_| "unknown".to_string()),
            truecolor: matches!(colorterm.as_str(), "truecolor" | "24bit"),
        }
    }

    pub fn is_linux_arm(&self) -> bool {
        self.os == "linux" && (self.arch.contains("aarch64") || self.arch.contains("arm"))
    }

    /// `(label, value)` rows for the placeholder card.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CPU architecture", self.arch.clone()),
            ("Operating system", format!("{} ({})", self.os, self.family)),
            ("Panel version", self.panel_version.clone()),
            ("Terminal", self.terminal.clone()),
            (
                "Truecolor support",
                if self.truecolor { "✓ Yes" } else { "✗ No" }.to_string(),
            ),
        ]
    }

    /// `(title, text)` warnings that apply to this system.
    pub fn warnings(&self) -> Vec<(&'static str, &'static str)> {
        let mut warnings = Vec::new();
        if self.is_linux_arm() {
            warnings.push((
                "System not supported",
                "Linux ARM systems are currently not supported by the extension runtime.",
            ));
        }
        if !self.truecolor {
            warnings.push((
                "Limited colors",
                "The terminal does not advertise truecolor; theme colors are approximated.",
            ));
        }
        warnings
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        out.push_str("agentpanel System Information\n");
        out.push_str("=============================\n\n");
        out.push_str("Plugin status: initializing...\n\n");
        for (label, value) in self.rows() {
            out.push_str(&format!("  {label}: {value}\n"));
        }
        out.push('\n');
        for (title, text) in self.warnings() {
            out.push_str(&format!("Warning: {title}\n   {text}\n\n"));
        }
        out.push_str(&format!(
            "Tip: if this panel keeps showing for a long time, check the known issues: {KNOWN_ISSUES_DOC}\n"
        ));
        out
    }

    /// Puts [`plain_text`](Self::plain_text) on the clipboard, or in
    /// `dir/system-info.txt` when there is no clipboard to use.
    pub fn copy(&self, clipboard: Option<&mut SystemClipboard>, dir: &Path) -> Result<CopyTarget> {
        let text = self.plain_text();
        let clipboard_error = match clipboard {
            None => None,
            Some(clipboard) => match clipboard.set_text(&text) {
                Ok(()) => return Ok(CopyTarget::Clipboard),
                Err(err) => {
                    tracing::warn!("clipboard unavailable, writing system info to a file: {err}");
                    Some(err.to_string())
                }
            },
        };

        let path = self.write_to(dir)?;
        Ok(CopyTarget::File {
            path,
            clipboard_error,
        })
    }

    /// Writes [`plain_text`](Self::plain_text) to `dir/system-info.txt`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join("system-info.txt");
        fs::write(&path, self.plain_text())?;
        Ok(path)
    }
}
