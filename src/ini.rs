// CLASSIFICATION: COMMUNITY
// Filename: ini.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// devboot · Configuration Text Reader
//
// Reads the sectioned key=value format used by device
// configuration files:
//
//   [global]
//   devices = hammerhead,bullhead
//   ; comment
//   cmdline = console=ttyMSM0   ; inline comment
//
// Every entry is handed to a callback as
// `(line, section, key, value)`. The callback decides whether the
// entry is acceptable; rejected and malformed lines are collected
// and parsing always runs to the end of the input.
// ─────────────────────────────────────────────────────────────

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while reading configuration text.
#[derive(Debug, Error)]
pub enum IniError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// One or more lines were malformed or rejected by the handler.
    /// `lines` is sorted and never empty.
    #[error("parse error on line {} ({} line(s) rejected)", first_line(.lines), .lines.len())]
    Rejected { lines: Vec<usize> },
}

fn first_line(lines: &[usize]) -> usize {
    lines.first().copied().unwrap_or(0)
}

/// Read `path` and feed every entry to `handler`.
pub fn parse_file<F>(path: &Path, handler: F) -> Result<(), IniError>
where
    F: FnMut(usize, &str, &str, &str) -> bool,
{
    let text = fs::read_to_string(path).map_err(|source| IniError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&text, handler)
}

/// Parse configuration text, calling `handler(line, section, key, value)`
/// for every entry. Line numbers start at 1.
///
/// A line indented with whitespace directly following an entry continues
/// that entry: the handler is called again with the same section and key.
pub fn parse_str<F>(text: &str, mut handler: F) -> Result<(), IniError>
where
    F: FnMut(usize, &str, &str, &str) -> bool,
{
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut section = String::new();
    let mut prev_key: Option<String> = None;
    let mut bad = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        if raw.starts_with(char::is_whitespace) {
            if let Some(key) = prev_key.as_deref() {
                let value = strip_inline_comment(trimmed).trim_end();
                if !handler(lineno, &section, key, value) {
                    bad.push(lineno);
                }
                continue;
            }
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            match rest.find(']') {
                Some(end) => {
                    section = rest[..end].trim().to_string();
                    prev_key = None;
                }
                None => bad.push(lineno),
            }
            continue;
        }

        let body = strip_inline_comment(trimmed);
        match body.find(['=', ':']) {
            Some(pos) if !body[..pos].trim().is_empty() => {
                let key = body[..pos].trim();
                let value = body[pos + 1..].trim();
                if !handler(lineno, &section, key, value) {
                    bad.push(lineno);
                }
                prev_key = Some(key.to_string());
            }
            _ => bad.push(lineno),
        }
    }

    if bad.is_empty() {
        Ok(())
    } else {
        Err(IniError::Rejected { lines: bad })
    }
}

/// Cut a `;` comment that follows whitespace.
fn strip_inline_comment(s: &str) -> &str {
    let bytes = s.as_bytes();
    for i in 1..bytes.len() {
        if bytes[i] == b';' && bytes[i - 1].is_ascii_whitespace() {
            return s[..i].trim_end();
        }
    }
    s
}
