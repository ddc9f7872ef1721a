// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Command-line harness for the symposion table.
// Run with: cargo run -p symposion-runtime -- --policy ordered --meals 5

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use symposion_core::{PolicyKind, Table, TableConfig};

mod run_file;

use run_file::RunFile;

#[derive(Parser, Debug)]
#[command(
    name = "symposion",
    version,
    about = "Seats a ring of philosopher threads and prints their transcript"
)]
struct Cli {
    /// Arbitration policy: naive, ordered, or monitor.
    #[arg(short, long)]
    policy: Option<String>,

    /// Meals each philosopher eats before leaving.
    #[arg(short, long)]
    meals: Option<u32>,

    /// Ring size; seats beyond the five classic names become numbered guests.
    #[arg(short, long)]
    seats: Option<usize>,

    /// Thinking pause in milliseconds.
    #[arg(long)]
    think_ms: Option<u64>,

    /// Eating pause in milliseconds.
    #[arg(long)]
    eat_ms: Option<u64>,

    /// Abort the run if it has not finished after this many milliseconds.
    /// Useful when watching the naive policy deadlock.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// TOML run configuration; command-line flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => RunFile::load(path)?,
        None => RunFile::default(),
    };
    let deadline = cli
        .deadline_ms
        .or(file.deadline_ms)
        .map(Duration::from_millis);
    let config = build_config(&cli, file)?;

    let (table, events) = Table::new(config).context("could not set the table")?;

    // print the transcript as it happens; the channel disconnects once the
    // table and all philosophers are done, which ends this thread
    let printer = thread::spawn(move || {
        for event in events.iter() {
            println!("{event}");
        }
    });

    let report = table
        .run_with_deadline(deadline)
        .context("the banquet did not finish")?;
    let _ = printer.join();

    log::info!(
        "{} meal(s) served in {:?}",
        report.meals_served,
        report.elapsed
    );
    Ok(())
}

/// Merges the command line over the config file over the defaults.
fn build_config(cli: &Cli, file: RunFile) -> Result<TableConfig> {
    let mut config = match (cli.seats, file.names, file.seats) {
        (Some(seats), _, _) => TableConfig::with_seats(seats),
        (None, Some(names), _) => TableConfig {
            names,
            ..TableConfig::default()
        },
        (None, None, Some(seats)) => TableConfig::with_seats(seats),
        (None, None, None) => TableConfig::default(),
    };

    if let Some(name) = cli.policy.as_deref().or(file.policy.as_deref()) {
        config.policy = match PolicyKind::from_name(name) {
            Some(kind) => kind,
            None => bail!("unknown policy '{name}', expected naive, ordered, or monitor"),
        };
    }
    if let Some(meals) = cli.meals.or(file.meals) {
        config.meals = meals;
    }
    if let Some(think_ms) = cli.think_ms.or(file.think_ms) {
        config.think_time = Duration::from_millis(think_ms);
    }
    if let Some(eat_ms) = cli.eat_ms.or(file.eat_ms) {
        config.eat_time = Duration::from_millis(eat_ms);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("symposion").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_seat_the_classic_table() {
        let config = build_config(&cli(&[]), RunFile::default()).unwrap();
        assert_eq!(config.seats(), 5);
        assert_eq!(config.policy, PolicyKind::Monitor);
        assert_eq!(config.meals, 5);
    }

    #[test]
    fn flags_override_the_file() {
        let file: RunFile = toml::from_str("policy = \"monitor\"\nmeals = 9").unwrap();
        let config = build_config(&cli(&["--policy", "naive", "--seats", "8"]), file).unwrap();
        assert_eq!(config.policy, PolicyKind::Naive);
        assert_eq!(config.seats(), 8);
        // the file still supplies what the command line left unset
        assert_eq!(config.meals, 9);
    }

    #[test]
    fn file_names_take_the_table_shape() {
        let file: RunFile =
            toml::from_str("names = [\"Hypatia\", \"Zeno\", \"Epicurus\"]").unwrap();
        let config = build_config(&cli(&[]), file).unwrap();
        assert_eq!(config.names, ["Hypatia", "Zeno", "Epicurus"]);
    }

    #[test]
    fn an_unknown_policy_is_rejected() {
        let result = build_config(&cli(&["--policy", "fifo"]), RunFile::default());
        assert!(result.is_err());
    }
}
