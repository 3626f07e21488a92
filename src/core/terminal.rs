use console::{Emoji, style};

use crate::core::session::NoticeLevel;

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static LEAF: Emoji<'_, '_> = Emoji("🍃 ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_notice(level: NoticeLevel, msg: &str) {
    match level {
        NoticeLevel::Info => print_info(msg),
        NoticeLevel::Warning => print_warn(msg),
        NoticeLevel::Error => print_error(msg),
    }
}

pub fn print_step(step: &str) {
    println!("{} {}", SPARKLE, style(step).bold());
}

pub fn print_banner() {
    println!();
    println!("{}{}", LEAF, style("mongo-chat").bold().green());
    println!(
        "{}",
        style("Ask your database in plain language. Nothing runs until you approve it.").dim()
    );
    println!();
}

pub fn print_goodbye() {
    println!("\n{} {}", SPARKLE, style("Bye!").bold().cyan());
}

/// A titled block of aligned `name  description` rows.
pub struct GuideSection {
    title: String,
    rows: Vec<GuideRow>,
}

enum GuideRow {
    Command(String, String),
    Text(String),
    Blank,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.rows
            .push(GuideRow::Command(name.to_string(), description.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.rows.push(GuideRow::Text(text.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.rows.push(GuideRow::Blank);
        self
    }

    pub fn print(&self) {
        let width = self
            .rows
            .iter()
            .filter_map(|row| match row {
                GuideRow::Command(name, _) => Some(name.chars().count()),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        println!("{}", style(&self.title).bold().underlined());
        for row in &self.rows {
            match row {
                GuideRow::Command(name, description) => {
                    let padded = format!("{:<width$}", name, width = width);
                    println!("  {}  {}", style(padded).green(), style(description).dim());
                }
                GuideRow::Text(text) => println!("  {}", text),
                GuideRow::Blank => println!(),
            }
        }
        println!();
    }
}
