//! Post-ingestion prompt: view the player's matches, export them, or quit.

use std::io::{BufRead, Write};
use std::thread;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;

use crate::db::{MatchRow, Repository};
use crate::error::AppError;

const MENU: &str = "\nAvailable options:\n\
                    1. View matches as table\n\
                    2. Export matches to CSV\n\
                    3. Exit\n";
const PROMPT: &str = "\nChoose an option (1-3): ";

/// Forward the lines of `reader` from a detached thread. A read blocked on
/// a terminal does not keep the runtime alive.
pub fn spawn_line_reader<R>(reader: R) -> UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    rx
}

/// Serve the menu for `puuid` until the user exits or input ends.
pub async fn run<W: Write>(
    repo: &Repository,
    puuid: &str,
    input: &mut UnboundedReceiver<String>,
    out: &mut W,
) -> Result<(), AppError> {
    loop {
        write!(out, "{MENU}{PROMPT}")?;
        out.flush()?;

        let Some(line) = input.recv().await else {
            debug!("Input closed, leaving menu");
            writeln!(out)?;
            return Ok(());
        };

        match line.trim() {
            "1" => {
                let rows = repo.matches_for_player(puuid).await?;
                writeln!(out, "\nMatches:\n{}", render_table(&rows))?;
            }
            "2" => {
                let path = repo.export_csv(Some(puuid), None).await?;
                writeln!(out, "\nData exported to: {}", path.display())?;
            }
            "3" => return Ok(()),
            _ => writeln!(out, "Invalid option!")?,
        }
    }
}

/// Column-aligned text table, one line per match.
pub fn render_table(rows: &[MatchRow]) -> String {
    if rows.is_empty() {
        return "No matches stored.".to_string();
    }

    let header = [
        "Match", "Date", "Mode", "Result", "KDA", "CS", "Gold", "Duration",
    ]
    .map(String::from);

    let body: Vec<[String; 8]> = rows
        .iter()
        .map(|row| {
            [
                row.match_id.clone(),
                row.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                row.game_mode.clone(),
                if row.win { "Win" } else { "Loss" }.to_string(),
                row.kda(),
                row.cs.to_string(),
                row.gold.to_string(),
                row.duration_formatted(),
            ]
        })
        .collect();

    let mut widths = header.each_ref().map(|h| h.chars().count());
    for line in &body {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String; 8]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let separator = widths.map(|w| "-".repeat(w)).join("  ");

    let mut table = vec![format_line(&header), separator];
    table.extend(body.iter().map(format_line));
    table.join("\n")
}
