//! Format-neutral page model shared by the HTML and PDF writers.

use chrono::{Datelike, NaiveDate};

/// One printable clinical document, ready for a writer.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintableDocument {
    pub title: &'static str,
    /// Right-hand block of the page header (patient, age, dates).
    pub header: Vec<HeaderLine>,
    pub blocks: Vec<Block>,
    /// Signature lines, one inner vec per row.
    pub signatures: Vec<Vec<Signature>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLine {
    pub label: &'static str,
    pub value: String,
}

impl HeaderLine {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self { label, value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `Label: value` on one line.
    Field { label: &'static str, value: String },
    /// Several label/value pairs sharing one line.
    FieldRow(Vec<(&'static str, String)>),
    /// Subheading followed by free text; line breaks are kept.
    Section { heading: &'static str, body: String },
    Heading(&'static str),
    Paragraph(String),
    /// Bold paragraph.
    Statement(String),
    /// Small print.
    Notice(String),
}

impl Block {
    pub fn field(label: &'static str, value: impl Into<String>) -> Self {
        Block::Field { label, value: value.into() }
    }

    pub fn section(heading: &'static str, body: impl Into<String>) -> Self {
        Block::Section { heading, body: body.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub caption: Option<String>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), caption: None }
    }

    pub fn captioned(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: Some(caption.into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Spanish dates
// ═══════════════════════════════════════════════════════════

const MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];

const WEEKDAYS: [&str; 7] = ["lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo"];

/// "15 de marzo de 2024"
pub fn long_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), MONTHS[date.month0() as usize], date.year())
}

/// "viernes, 15 de marzo de 2024"
pub fn long_date_with_weekday(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
    format!("{weekday}, {}", long_date(date))
}

/// Long form of an ISO date typed by a user; anything unparseable is
/// printed as given.
pub fn long_date_from_iso(text: &str) -> String {
    match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
        Ok(date) => long_date(date),
        Err(_) => text.to_string(),
    }
}

/// Greedy word wrap on character count.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut width = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if width + len + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            width = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            width += 1;
        }
        current.push_str(word);
        width += len;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
