use crate::core::Conversion;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Focused,
    ResultValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Focused => style(text).cyan().bold(),
        StyleType::ResultValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Creates a ticking spinner with a message, for waits of unknown length.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Unstyled result lines: converted amount, the exchange rate unless it is
/// exactly 1, and the rate date when known.
pub fn conversion_lines(result: &Conversion, from: &str) -> Vec<String> {
    let mut lines = vec![format!("{:.2} {}", result.amount, result.currency)];
    if result.rate != 1.0 {
        lines.push(format!(
            "1 {} = {:.4} {}",
            from, result.rate, result.currency
        ));
    }
    if let Some(date) = result.date {
        lines.push(format!("Rates as of {date}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_lines_include_rate() {
        let result = Conversion {
            amount: 92.5,
            currency: "EUR".to_string(),
            rate: 0.925,
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 17),
        };
        assert_eq!(
            conversion_lines(&result, "USD"),
            vec![
                "92.50 EUR".to_string(),
                "1 USD = 0.9250 EUR".to_string(),
                "Rates as of 2024-05-17".to_string(),
            ]
        );
    }

    #[test]
    fn test_unit_rate_hides_rate_line() {
        let result = Conversion {
            amount: 50.0,
            currency: "GBP".to_string(),
            rate: 1.0,
            date: None,
        };
        assert_eq!(conversion_lines(&result, "GBP"), vec!["50.00 GBP".to_string()]);
    }
}
