use super::ui;
use crate::core::config::AppConfig;
use crate::core::snapshot::Snapshot;
use crate::fetcher::SnapshotSource;
use crate::metrics::{self, MetricSet};
use anyhow::Result;
use comfy_table::Cell;

impl MetricSet {
    /// Renders the metrics as a table. `snapshot` tells failed rate lookups
    /// apart from genuine zero rates.
    pub fn display_as_table(&self, snapshot: &Snapshot) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell("Name"),
            ui::header_cell("Available"),
            ui::header_cell("Reserved"),
            ui::header_cell("Total"),
            ui::header_cell("Rate (EUR)"),
            ui::header_cell("Value (EUR)"),
        ]);

        for metric in &self.currencies {
            let code = metric.unit.to_lowercase();
            let rate_missing = matches!(snapshot.eur_rates().get(&code), Some(None));
            let attributes = &metric.attributes;

            let rate = if rate_missing {
                ui::na_cell()
            } else {
                ui::number_cell(format!("{:.2}", attributes.eur_rate))
            };

            table.add_row(vec![
                Cell::new(&metric.unit),
                Cell::new(&attributes.currency_name),
                ui::number_cell(format!("{:.8}", attributes.available_amount)),
                ui::number_cell(format!("{:.8}", attributes.reserved_amount)),
                ui::number_cell(format!("{:.8}", attributes.total_amount)),
                rate,
                ui::number_cell(format!("{:.2}", attributes.eur_balance)),
            ]);
        }

        let mut output = format!(
            "Account: {}\n\n",
            ui::style_text("bitcoin.de", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());

        let total_style = if self.available {
            ui::StyleType::TotalValue
        } else {
            ui::StyleType::Error
        };
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text(&self.total.name, ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2} EUR", self.total.state), total_style)
        ));
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Updated {}", self.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")),
                ui::StyleType::Subtle
            )
        ));
        if !self.available {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    "Latest refresh failed; showing the previous values.",
                    ui::StyleType::Error
                )
            ));
        }

        output
    }
}

/// Prints metrics either as a table or as a single JSON document.
pub fn print_metrics(metrics: &MetricSet, snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(metrics)?);
    } else {
        println!("{}", metrics.display_as_table(snapshot));
    }
    Ok(())
}

/// Refreshes once and prints the result.
pub async fn run(config: &AppConfig, source: &dyn SnapshotSource, json: bool) -> Result<()> {
    let spinner = ui::new_spinner("Fetching bitcoin.de balances...");
    let result = source.refresh(&config.currencies).await;
    spinner.finish_and_clear();

    let snapshot = result?;
    let metrics = metrics::build_metrics(&snapshot, &config.currencies, true);
    print_metrics(&metrics, &snapshot, json)
}
