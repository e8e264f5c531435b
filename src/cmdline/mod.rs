// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// devboot · Kernel Command Line
//
// Parses the command line the running kernel was booted with so
// selected parameters can be carried over to the next kernel.
//
// Example cmdline:
//
//   console=ttyMSM0,115200 androidboot.mode=charger quiet
//
// # Public API
// * [`KernelCmdline`] – read-only view of parsed parameters
// * [`assemble::build_cmdline`] – command line for the next kernel
// ─────────────────────────────────────────────────────────────

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

/// Command line assembly for the next kernel.
pub mod assemble;

pub use assemble::{build_cmdline, CMDLINE_MAX};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    key: String,
    value: Option<String>,
}

/// Parameters of a kernel command line in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelCmdline {
    params: Vec<Param>,
}

impl KernelCmdline {
    /// Split on whitespace outside double quotes. A token is either a bare
    /// `key` or `key=value`; quotes around a value are dropped.
    ///
    /// ```
    /// use devboot::cmdline::KernelCmdline;
    ///
    /// let cl = KernelCmdline::parse("root=/dev/sda1 quiet");
    /// assert_eq!(cl.get_value("root"), Some("/dev/sda1"));
    /// assert!(cl.has_key("quiet"));
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut params = Vec::new();
        for token in tokens(text) {
            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k, Some(unquote(v).to_string())),
                None => (token, None),
            };
            let key = key.trim_matches('"');
            if key.is_empty() {
                debug!("skipping cmdline token {token:?} without key");
                continue;
            }
            params.push(Param {
                key: key.to_string(),
                value,
            });
        }
        Self { params }
    }

    /// Read `<proc_root>/cmdline`.
    pub fn from_proc(proc_root: &Path) -> io::Result<Self> {
        fs::read_to_string(proc_root.join("cmdline")).map(|s| Self::parse(&s))
    }

    /// `true` if `key` appears, bare or with a value.
    pub fn has_key(&self, key: &str) -> bool {
        self.params.iter().any(|p| p.key == key)
    }

    /// Value of the last `key=value` occurrence.
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|p| p.key == key && p.value.is_some())
            .and_then(|p| p.value.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = None;
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        }
        if c.is_whitespace() && !quoted {
            if let Some(s) = start.take() {
                out.push(&text[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(&text[s..]);
    }
    out
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .map(|v| v.strip_suffix('"').unwrap_or(v))
        .unwrap_or(value)
}
