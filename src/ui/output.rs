use crate::diagnostic::{Diagnostic, Severity};
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().heading.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().label.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().ok.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().accent.clone()),
        label.style(theme().label.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().heading.clone()));
}

/// One diagnostic on stderr, colored by severity
pub fn diagnostic(d: &Diagnostic) {
    let icon = match d.severity {
        Severity::Error => Icons::CROSS,
        Severity::Warning => Icons::WARN,
    };
    let label = format!("{}[{}]", d.severity.as_str(), d.kind.as_str());
    eprintln!(
        "{} {} {}: {}",
        icon,
        label.style(theme().severity(d.severity)),
        d.directory.style(theme().scope.clone()),
        d.detail
    );
}

pub fn file_new(path: &str) {
    println!("{} {}", Icons::NEW.style(theme().ok.clone()), path);
}

pub fn file_unchanged(path: &str) {
    println!("  {}", path.style(theme().unchanged.clone()));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label.clone()), value);
}
