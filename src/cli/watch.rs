use super::{balance, ui};
use crate::coordinator::Coordinator;
use crate::core::config::AppConfig;
use crate::fetcher::SnapshotSource;
use crate::metrics;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Re-reads the currency selection from the config file so edits apply on
/// the next cycle. A broken file keeps the current selection.
fn reload_selection(coordinator: &Coordinator, config_path: &Path) {
    match AppConfig::load_from_path(config_path) {
        Ok(config) => coordinator.set_selection(config.currencies),
        Err(e) => warn!(error = %e, "Could not reload config; keeping current currency selection"),
    }
}

/// Runs the refresh loop until Ctrl-C, printing metrics after every cycle.
pub async fn run(
    config: &AppConfig,
    config_path: &Path,
    source: Arc<dyn SnapshotSource>,
    json: bool,
) -> Result<()> {
    let coordinator = Arc::new(Coordinator::new(
        source,
        config.currencies.clone(),
        config.update_interval(),
    ));
    let mut reader = coordinator.reader();

    let mut runner = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "Failed to listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                })
                .await
        })
    };

    loop {
        tokio::select! {
            finished = &mut runner => {
                finished?;
                break;
            }
            changed = reader.changed() => {
                let Ok(state) = changed else {
                    runner.abort();
                    break;
                };
                let selection = coordinator.selection();
                match (metrics::from_state(&state, &selection), &state.snapshot) {
                    (Some(metric_set), Some(snapshot)) => {
                        if !json {
                            ui::print_separator();
                        }
                        balance::print_metrics(&metric_set, snapshot, json)?;
                    }
                    _ => {
                        let reason = state.last_error.as_deref().unwrap_or("unknown error");
                        eprintln!(
                            "{}",
                            ui::style_text(
                                &format!("No data yet, refresh failed: {reason}"),
                                ui::StyleType::Error
                            )
                        );
                    }
                }

                reload_selection(&coordinator, config_path);
            }
        }
    }

    info!("Stopped watching");
    Ok(())
}
