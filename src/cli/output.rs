//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success, checkmarks, additions
//! - Red: errors, removals
//! - Yellow: warnings, changes
//! - Cyan: paths, commands, names, hints
//! - Bold: headers, important values
//! - Dimmed: secondary info

use console::style;
use std::fmt::Display;

const RULE_WIDTH: usize = 56;

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn paint(text: &str, f: impl FnOnce(console::StyledObject<&str>) -> console::StyledObject<&str>) -> String {
    if colors_enabled() {
        f(style(text)).to_string()
    } else {
        text.to_string()
    }
}

/// Print a success message with checkmark.
///
/// Example: `✓ pushed 3 changes`
pub fn success(msg: &str) {
    println!("{} {}", paint("✓", |s| s.green()), msg);
}

/// Print an error message to stderr.
///
/// Example: `✗ not linked`
pub fn error(msg: &str) {
    eprintln!("{} {}", paint("✗", |s| s.red()), msg);
}

/// Print a warning message.
pub fn warn(msg: &str) {
    println!("{} {}", paint("⚠", |s| s.yellow()), msg);
}

/// Print a hint message to stderr.
///
/// Example: `→ run: dotsync link <project-id>`
pub fn hint(msg: &str) {
    eprintln!("{} {}", paint("→", |s| s.cyan()), paint(msg, |s| s.cyan()));
}

/// Print a bold header.
pub fn header(title: &str) {
    println!("{}", paint(title, |s| s.bold()));
}

/// Print a key-value pair (label dimmed, value bold).
///
/// Example: `  stage   development`
pub fn kv(label: &str, value: impl Display) {
    let label = format!("{:<8}", label);
    println!(
        "  {}  {}",
        paint(&label, |s| s.dim()),
        paint(&value.to_string(), |s| s.bold())
    );
}

/// Print one changed name with a marker: `+` added, `~` changed, `-` removed,
/// `=` kept.
pub fn change(marker: char, name: &str) {
    let line = format!("{} {}", marker, name);
    let painted = match marker {
        '+' => paint(&line, |s| s.green()),
        '-' => paint(&line, |s| s.red()),
        '~' => paint(&line, |s| s.yellow()),
        _ => paint(&line, |s| s.dim()),
    };
    println!("  {}", painted);
}

/// Print a horizontal rule separator.
pub fn rule() {
    println!("{}", paint(&"─".repeat(RULE_WIDTH), |s| s.dim()));
}

/// Format a path in cyan.
pub fn path(p: &str) -> String {
    paint(p, |s| s.cyan())
}

/// Format a command in green.
pub fn cmd(c: &str) -> String {
    paint(c, |s| s.green())
}

/// Format a variable name in cyan.
pub fn key(k: &str) -> String {
    paint(k, |s| s.cyan())
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    println!("{}", paint(msg, |s| s.dim()));
}

/// Print a section header with a separator line.
pub fn section(title: &str) {
    println!();
    header(title);
    rule();
}

/// Short form of a fingerprint for display.
///
/// `(empty)` for the empty sentinel, `unknown` for a missing hash.
pub fn hash(h: Option<&str>) -> String {
    match h {
        None => "unknown".to_string(),
        Some("") => "(empty)".to_string(),
        Some(h) => h.chars().take(12).collect(),
    }
}
