use colored::Colorize;
use std::fmt;

use crate::ledger::{NotificationSink, Severity};

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

impl From<Severity> for MessageKind {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => MessageKind::Info,
            Severity::Success => MessageKind::Success,
            Severity::Warning => MessageKind::Warning,
            Severity::Error => MessageKind::Error,
        }
    }
}

fn style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Info => format!("INFO: [i] {text}"),
        MessageKind::Success => format!("SUCCESS: [+] {text}").bright_green().to_string(),
        MessageKind::Warning => format!("WARNING: [!] {text}").bright_yellow().to_string(),
        MessageKind::Error => format!("ERROR: [x] {text}").bright_red().to_string(),
        MessageKind::Hint => format!("  hint: {text}").dimmed().to_string(),
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{formatted}"),
        _ => println!("{formatted}"),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Prints left-aligned columns sized to the widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    let render = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    println!("{}", render(headers.to_vec()).bold());
    for row in rows {
        println!("{}", render(row.iter().map(String::as_str).collect()));
    }
}

/// Prints account notifications for one customer, tagged with the customer's name.
pub struct ConsoleSink {
    label: String,
}

impl ConsoleSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, message: &str, severity: Severity) {
        print(severity.into(), format!("[{}] {}", self.label, message));
    }
}
