use super::ui;
use crate::core::Snapshot;
use crate::repository::RateRepository;
use anyhow::{Context, Result};
use comfy_table::Cell;

impl Snapshot {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "{}\n\nLast fetch: {}\n\n",
            ui::style_text("Rate Snapshot", ui::StyleType::Title),
            ui::timestamp_text(self.last_fetch_time)
        );

        let mut metals = ui::new_styled_table();
        metals.set_header(vec![ui::header_cell("Metal"), ui::header_cell("Price (USD)")]);
        for metal in &self.metals {
            metals.add_row(vec![
                Cell::new(&metal.name),
                ui::amount_cell(metal.price_usd, 2),
            ]);
        }
        output.push_str(&metals.to_string());
        output.push_str("\n\n");

        let mut currencies = ui::new_styled_table();
        currencies.set_header(vec![
            ui::header_cell("Code"),
            ui::header_cell("Name"),
            ui::header_cell("Symbol"),
            ui::header_cell("Rate to USD"),
        ]);
        for currency in &self.currencies {
            currencies.add_row(vec![
                Cell::new(&currency.code),
                Cell::new(&currency.name),
                Cell::new(&currency.symbol),
                ui::amount_cell(currency.rate_to_usd, 6),
            ]);
        }
        output.push_str(&currencies.to_string());

        if self.currencies.is_empty() && self.metals.is_empty() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text("Store is empty, run `ratekeeper seed` first", ui::StyleType::Subtle)
            ));
        }
        output
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize snapshot")
    }
}

pub async fn run(repository: &RateRepository, json: bool) -> Result<()> {
    let snapshot = repository.snapshot().await?;
    if json {
        println!("{}", snapshot.to_json()?);
    } else {
        println!("{}", snapshot.display_as_table());
    }
    Ok(())
}
