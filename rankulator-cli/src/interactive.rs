/// Terminal presentation of batches and parsing of the user's picks.
use rand::Rng;
use rankulator_core::{Batch, Item, Pool, Progress, RankingSession, Selection};
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// What the user asked for on one prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 0-based positions within the displayed batch, deduplicated.
    Pick(Vec<usize>),
    Skip,
    All,
    Quit,
}

/// How the interactive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// User quit or input ended before the last batch.
    Aborted,
}

/// Parse one input line against a batch of `batch_len` items.
///
/// Numbers are 1-based as displayed and may be separated by spaces or commas.
pub fn parse_command(line: &str, batch_len: usize) -> Result<Command, String> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" | "s" | "skip" => return Ok(Command::Skip),
        "a" | "all" => return Ok(Command::All),
        "q" | "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let mut picks = BTreeSet::new();
    for token in line.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        let n: usize = token
            .parse()
            .map_err(|_| format!("\"{token}\" is not a number"))?;
        if n == 0 || n > batch_len {
            return Err(format!("{n} is out of range (1-{batch_len})"));
        }
        picks.insert(n - 1);
    }
    Ok(Command::Pick(picks.into_iter().collect()))
}

/// Build the engine selection for a parsed command. `None` for `Quit`.
pub fn selection_for(command: &Command, batch: &Batch) -> Option<Selection> {
    match command {
        Command::Pick(positions) => Some(Selection::from_ids(
            positions.iter().map(|&pos| batch.item_ids[pos].clone()),
        )),
        Command::Skip => Some(Selection::none()),
        Command::All => Some(Selection::all(batch)),
        Command::Quit => None,
    }
}

/// "Name (QB, KC)" style label.
pub fn describe_item(item: &Item) -> String {
    let details: Vec<&str> = item
        .position
        .as_deref()
        .into_iter()
        .chain(item.metadata.get("team").map(String::as_str))
        .collect();
    if details.is_empty() {
        item.name.clone()
    } else {
        format!("{} ({})", item.name, details.join(", "))
    }
}

fn progress_bar(progress: &Progress, width: usize) -> String {
    let filled = (progress.fraction_complete() * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled.min(width)))
}

pub fn render_batch(out: &mut impl Write, batch: &Batch, pool: &Pool, progress: &Progress) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Batch {}/{} | {} phase: {} {} {:.0}%",
        progress.batch_index + 1,
        progress.total_batches,
        capitalize(batch.phase.label()),
        batch.phase.description(),
        progress_bar(progress, 20),
        progress.fraction_complete() * 100.0,
    )?;
    for (i, id) in batch.item_ids.iter().enumerate() {
        let label = pool.get(id).map(describe_item).unwrap_or_else(|| id.clone());
        writeln!(out, "  {:>2}) {}", i + 1, label)?;
    }
    write!(out, "Pick favorites (e.g. \"1 3\"), Enter to skip, \"a\" for all, \"q\" to quit: ")?;
    out.flush()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drive `session` to completion from line-based input.
///
/// Invalid lines re-prompt the same batch without touching scores. End of
/// input counts as quitting.
pub fn run_session<R, I, W>(session: &mut RankingSession<R>, input: &mut I, out: &mut W) -> io::Result<Outcome>
where
    R: Rng,
    I: BufRead,
    W: Write,
{
    while !session.is_complete() {
        let progress = session.progress();
        session.next_batch().map_err(io::Error::other)?;
        let Some(batch) = session.live_batch().cloned() else {
            return Err(io::Error::other("scheduler produced no batch"));
        };

        loop {
            render_batch(out, &batch, session.pool(), &progress)?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(Outcome::Aborted);
            }

            let command = match parse_command(&line, batch.len()) {
                Ok(command) => command,
                Err(msg) => {
                    writeln!(out, "  {msg}")?;
                    continue;
                }
            };
            let Some(selection) = selection_for(&command, &batch) else {
                return Ok(Outcome::Aborted);
            };

            let deltas = session.submit(&selection).map_err(io::Error::other)?;
            for d in &deltas {
                debug!(id = %d.id, delta = d.delta, score = d.score, "Score update");
            }
            break;
        }
    }
    Ok(Outcome::Completed)
}
