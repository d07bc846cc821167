use gwplan_core::model::player::format_price;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::orchestrator::PlanResponse;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize plan: {0}")]
    Json(#[from] serde_json::Error),
}

fn ensure_parent(path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReportError::Io {
            context: "creating report directory",
            source: e,
        })?;
    }
    Ok(())
}

pub fn write_json(response: &PlanResponse, path: impl AsRef<Path>) -> Result<(), ReportError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(response)?;
    fs::write(path, json).map_err(|e| ReportError::Io {
        context: "writing plan json",
        source: e,
    })
}

pub fn render_summary(response: &PlanResponse) -> String {
    let mut rows = String::new();
    rows.push_str(&format!(
        "# Transfer Plan for {} (GW{})\n\n",
        response.manager, response.current_gameweek.0
    ));
    rows.push_str(&format!(
        "Objective: {} | Depth: {} | Chips: {} | Bank: {} | Free transfers: {}\n\n",
        response.objective.label(),
        response.depth.label(),
        response.chip_mode,
        format_price(response.squad.bank),
        response.squad.free_transfers
    ));

    rows.push_str("## Held squad forecast\n\n");
    rows.push_str("| Gameweek | Formation | Captain | Vice | Decision | Predicted | Bench |\n");
    rows.push_str("|----------|-----------|---------|------|----------|-----------|-------|\n");
    for forecast in &response.forecasts {
        rows.push_str(&format!(
            "| {gw} | {formation} | {captain} | {vice} | {decision} | {total:.2} | {bench:.2} |\n",
            gw = forecast.gameweek,
            formation = forecast.formation,
            captain = forecast.captain,
            vice = forecast.vice_captain,
            decision = if forecast.captain_decision { "yes" } else { "no" },
            total = forecast.predicted_total,
            bench = forecast.bench_score,
        ));
    }

    if !response.chip_suggestions.is_empty() {
        rows.push_str("\n## Chip suggestions\n\n");
        rows.push_str("| Chip | Gameweek | Est. gain |\n");
        rows.push_str("|------|----------|-----------|\n");
        for suggestion in &response.chip_suggestions {
            rows.push_str(&format!(
                "| {} | {} | {:+.2} |\n",
                suggestion.chip.label(),
                suggestion.gameweek,
                suggestion.estimated_gain
            ));
        }
    }

    if !response.recommendations.is_empty() {
        rows.push_str("\n## Recommended transfers\n\n");
        rows.push_str("| Out | In | GW gain | Horizon gain | Hit | Net |\n");
        rows.push_str("|-----|----|---------|--------------|-----|-----|\n");
        for rec in &response.recommendations {
            rows.push_str(&format!(
                "| {} | {} | {:+.2} | {:+.2} | {} | {:+.2} |\n",
                rec.transfer.out,
                rec.transfer.incoming,
                rec.gameweek_gain,
                rec.horizon_gain,
                rec.hit_cost,
                rec.net_gain
            ));
        }
    }

    if !response.solved {
        rows.push_str("\nPath search skipped.\n");
        return rows;
    }

    rows.push_str("\n## Ranked paths\n\n");
    if let Some(hold) = response.hold_total {
        rows.push_str(&format!("Hold baseline: {hold:.2}\n\n"));
    }
    rows.push_str("| Rank | Total | vs Hold | Hits | Transfers | Chips | Moves |\n");
    rows.push_str("|------|-------|---------|------|-----------|-------|-------|\n");
    for (rank, path) in response.paths.iter().enumerate() {
        let chips: Vec<String> = path
            .chips_used()
            .iter()
            .map(|(gw, chip)| format!("{} {gw}", chip.label()))
            .collect();
        let moves: Vec<String> = path
            .gameweeks
            .iter()
            .filter(|gw| !gw.transfers.is_empty())
            .map(|gw| {
                let swaps: Vec<String> = gw
                    .transfers
                    .iter()
                    .map(|t| format!("{}→{}", t.out, t.incoming))
                    .collect();
                format!("{}: {}", gw.gameweek, swaps.join(", "))
            })
            .collect();
        rows.push_str(&format!(
            "| {rank} | {total:.2} | {delta:+.2} | {hits} | {count} | {chips} | {moves} |\n",
            rank = rank + 1,
            total = path.total_score,
            delta = path.score_vs_hold,
            hits = path.hit_points,
            count = path.transfer_count(),
            chips = if chips.is_empty() {
                "-".to_string()
            } else {
                chips.join(", ")
            },
            moves = if moves.is_empty() {
                "hold".to_string()
            } else {
                moves.join("; ")
            },
        ));
    }

    if let Some(comparison) = response.chip_comparison.as_ref() {
        rows.push_str(&format!(
            "\nChip comparison: {:.2} with chips vs {:.2} without ({:+.2})\n",
            comparison.with_chips, comparison.without_chips, comparison.delta
        ));
    }
    if response.truncated {
        rows.push_str("\n_Search budget exhausted: results are best effort._\n");
    }
    rows
}

pub fn write_summary(response: &PlanResponse, path: impl AsRef<Path>) -> Result<(), ReportError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, render_summary(response)).map_err(|e| ReportError::Io {
        context: "writing summary markdown",
        source: e,
    })
}
