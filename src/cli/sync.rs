use super::ui;
use crate::core::MetalKind;
use crate::sync::{CycleOutcome, SeedReport, SyncService};
use anyhow::{Result, bail};
use comfy_table::Cell;

impl CycleOutcome {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Step"),
            ui::header_cell("Status"),
            ui::header_cell("Detail"),
        ]);

        for kind in MetalKind::ALL {
            let result = self.metal(kind);
            let detail = match result {
                Ok(price) => format!("{price:.2} USD"),
                Err(e) => e.to_string(),
            };
            table.add_row(vec![
                Cell::new(kind.name()),
                ui::status_cell(result.is_ok()),
                Cell::new(detail),
            ]);
        }

        let detail = match &self.currencies {
            Ok(report) => format!(
                "{} updated, {} unknown, {} rejected",
                report.updated, report.skipped, report.rejected
            ),
            Err(e) => e.to_string(),
        };
        table.add_row(vec![
            Cell::new("currencies"),
            ui::status_cell(self.currencies.is_ok()),
            Cell::new(detail),
        ]);
        table.add_row(vec![
            Cell::new("fetch log"),
            ui::status_cell(self.logged),
            Cell::new(format!("{} pruned", self.pruned)),
        ]);

        let status = if self.success {
            ui::style_text("success", ui::StyleType::Success)
        } else {
            ui::style_text("partial failure", ui::StyleType::Error)
        };
        format!(
            "Sync at {}: {}\n\n{}",
            ui::timestamp_text(Some(self.fetched_at)),
            status,
            table
        )
    }
}

impl SeedReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Record"), ui::header_cell("Value")]);
        table.add_row(vec![
            Cell::new("currencies"),
            Cell::new(format!("{} ({} live rates)", self.currency_count, self.live_rates)),
        ]);
        table.add_row(vec![
            Cell::new("gold"),
            Cell::new(format!("{:.2} USD", self.gold_price)),
        ]);
        table.add_row(vec![
            Cell::new("silver"),
            Cell::new(format!("{:.2} USD", self.silver_price)),
        ]);

        let status = if self.success {
            ui::style_text("all providers answered", ui::StyleType::Success)
        } else {
            ui::style_text("fallback values used", ui::StyleType::Error)
        };
        format!(
            "{}: {}\n\n{}",
            ui::style_text("Seed", ui::StyleType::Title),
            status,
            table
        )
    }
}

/// Runs one cycle in the foreground and fails the command if any step failed.
pub async fn run(service: &SyncService) -> Result<()> {
    let pb = ui::new_spinner("Syncing rates...");
    let outcome = service.run_cycle().await;
    pb.finish_and_clear();

    println!("{}", outcome.display_as_table());
    if !outcome.success {
        bail!("Sync cycle finished with failures");
    }
    Ok(())
}

pub async fn seed(service: &SyncService) -> Result<()> {
    let pb = ui::new_spinner("Seeding rate store...");
    let report = service.seed().await;
    pb.finish_and_clear();

    println!("{}", report?.display_as_table());
    Ok(())
}
