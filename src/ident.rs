// src/ident.rs
//! JSON key → Go identifier derivation.
//!
//! Pure and deterministic. The empty string is the explicit sentinel for
//! "this key cannot be represented as a Go identifier"; callers drop such
//! fields/declarations silently (see `lower::dropped_keys` for the report).

use once_cell::sync::Lazy;
use regex::Regex;

static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

// Initialisms kept fully upper-cased, per Go naming convention.
static INITIALISMS: &[&str] = &[
    "acl", "api", "ascii", "cpu", "css", "dns", "eof", "guid", "html", "http",
    "https", "id", "ip", "json", "os", "rpc", "sla", "smtp", "sql", "ssh",
    "tcp", "tls", "ttl", "udp", "ui", "uid", "uuid", "uri", "url", "utf8",
    "vm", "xml", "xsrf", "xss",
];

/// Derive an exported Go identifier from an arbitrary JSON key.
///
/// Returns `""` when the key has no representable content (no ASCII letter
/// survives scrubbing). Leading digits are stripped so the result is a legal
/// identifier; interior digits are kept (`"address1"` → `Address1`).
pub fn derive_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in WORDS.find_iter(raw) {
        out.push_str(&cap_word(word.as_str()));
    }
    let out = out.trim_start_matches(|c: char| c.is_ascii_digit());
    if out.chars().any(|c| c.is_ascii_alphabetic()) {
        out.to_string()
    } else {
        String::new()
    }
}

fn cap_word(word: &str) -> String {
    if INITIALISMS.contains(&word.to_ascii_lowercase().as_str()) {
        return word.to_ascii_uppercase();
    }
    // Upper-case the first letter; anything before it (digits) passes through.
    let mut out = String::with_capacity(word.len());
    let mut capitalized = false;
    for ch in word.chars() {
        if !capitalized && ch.is_ascii_alphabetic() {
            out.push(ch.to_ascii_uppercase());
            capitalized = true;
        } else {
            out.push(ch);
        }
    }
    out
}
