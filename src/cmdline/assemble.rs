// CLASSIFICATION: COMMUNITY
// Filename: assemble.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Command line for the next kernel.

use log::warn;

use super::KernelCmdline;
use crate::config::GlobalConfig;

/// Size of the kernel's command line buffer, terminator included.
pub const CMDLINE_MAX: usize = 1024;

const LIMIT: usize = CMDLINE_MAX - 1;

/// Build `root=<root> <tail>` followed by the preserved parameters.
///
/// `tail` is `platform_tail` when present, else the configured `cmdline`,
/// else empty. Each key of `keep_cmdline_keys` found in `current` is
/// appended in declaration order, as `key=value` or as a bare `key`. The
/// result never exceeds [`CMDLINE_MAX`]` - 1` bytes and is only ever cut
/// between tokens.
pub fn build_cmdline(
    config: &GlobalConfig,
    root: &str,
    platform_tail: Option<&str>,
    current: Option<&KernelCmdline>,
) -> String {
    let tail = platform_tail.or(config.cmdline.as_deref()).unwrap_or("");
    let mut out = truncate_at_token(&format!("root={root} {tail}"), LIMIT);

    let Some(current) = current else {
        return out;
    };
    for key in &config.keep_cmdline_keys {
        let piece = match current.get_value(key) {
            Some(value) => format!(" {key}={}", quote(value)),
            None if current.has_key(key) => format!(" {key}"),
            None => continue,
        };
        if out.len() + piece.len() > LIMIT {
            warn!("command line full, dropping {key} and any later kept keys");
            break;
        }
        out.push_str(&piece);
    }
    out
}

fn quote(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Cut `s` to at most `max` bytes at the last whitespace that fits.
fn truncate_at_token(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .take_while(|&(i, _)| i <= max)
        .filter(|&(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    warn!("command line longer than {max} bytes, truncated at byte {cut}");
    s[..cut].trim_end().to_string()
}
