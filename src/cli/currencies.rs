use super::ui;
use crate::core::picker::{NO_RESULTS, filter_catalog};
use crate::core::{Catalog, ConvertError, RateService};
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

/// Builds the listing table, or `None` when nothing matches `filter`.
pub fn catalog_table(catalog: &Catalog, filter: Option<&str>) -> Option<Table> {
    let entries = filter_catalog(catalog, filter.unwrap_or(""));
    if entries.is_empty() {
        return None;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Code"), ui::header_cell("Name")]);
    for (code, name) in entries {
        table.add_row(vec![Cell::new(code), Cell::new(name)]);
    }
    Some(table)
}

pub async fn run(service: &dyn RateService, filter: Option<&str>) -> Result<()> {
    let spinner = ui::new_spinner("Loading currencies...");
    let catalog = service.list_currencies().await;
    spinner.finish_and_clear();
    let catalog = catalog.context(ConvertError::CurrencyListLoad)?;

    match catalog_table(&catalog, filter) {
        Some(table) => println!("{table}"),
        None => println!("{}", ui::style_text(NO_RESULTS, ui::StyleType::Subtle)),
    }
    Ok(())
}
