//! Styled terminal output utilities.

use owo_colors::OwoColorize;

/// Print a header/title
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.chars().count()).dimmed());
    println!();
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print a warning message
pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a step indicator
pub fn step(current: usize, total: usize, text: &str) {
    println!("{} {}", format!("[{}/{}]", current, total).dimmed(), text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Style text as dimmed
pub fn style_dim(text: &str) -> String {
    text.dimmed().to_string()
}
