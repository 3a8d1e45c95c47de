//! gridwire CLI - interactive terminal session over a reactive grid

mod session;
mod table;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gridwire::prelude::*;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridwire")]
#[command(author, version, about = "Edit a reactive grid of cells from the terminal")]
struct Cli {
    /// Grid options as JSON (flags below override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of rows (1-65536)
    #[arg(short, long)]
    rows: Option<u32>,

    /// Number of columns (1-26)
    #[arg(long)]
    columns: Option<u16>,

    /// How edits reach dependent cells
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Maximum propagation depth below an edited cell
    #[arg(long)]
    max_depth: Option<usize>,

    /// Run commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    EveryPath,
    Topological,
}

impl From<StrategyArg> for Propagation {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::EveryPath => Propagation::EveryPath,
            StrategyArg::Topological => Propagation::Topological,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let options = load_options(&cli)?;
    let mut grid = Grid::with_options(options).context("Invalid grid options")?;
    let stdout = io::stdout();

    match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script '{}'", path.display()))?;
            session::run(&mut grid, BufReader::new(file), stdout.lock(), false)
        }
        None => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            if interactive {
                eprintln!(
                    "{}x{} grid, {:?} propagation. Type 'help' for commands.",
                    grid.options().rows,
                    grid.options().columns,
                    grid.options().strategy
                );
            }
            session::run(&mut grid, stdin.lock(), stdout.lock(), interactive)
        }
    }
}

/// Build grid options from the config file, then apply flag overrides
fn load_options(cli: &Cli) -> Result<GridOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            serde_json::from_str::<GridOptions>(&text)
                .with_context(|| format!("Failed to parse config '{}'", path.display()))?
        }
        None => GridOptions::default(),
    };

    if let Some(rows) = cli.rows {
        options.rows = rows;
    }
    if let Some(columns) = cli.columns {
        options.columns = columns;
    }
    if let Some(strategy) = cli.strategy {
        options.strategy = strategy.into();
    }
    if let Some(max_depth) = cli.max_depth {
        options.max_depth = max_depth;
    }

    log::debug!("grid options: {:?}", options);
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gridwire").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let options = load_options(&parse(&[])).unwrap();
        assert_eq!(options, GridOptions::default());
    }

    #[test]
    fn test_flags_set_options() {
        let cli = parse(&["--rows", "4", "--columns", "3", "--strategy", "topological"]);
        let options = load_options(&cli).unwrap();
        assert_eq!(options.rows, 4);
        assert_eq!(options.columns, 3);
        assert_eq!(options.strategy, Propagation::Topological);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"rows": 5, "columns": 2, "strategy": "topological"}}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let cli = parse(&["--config", path, "--columns", "4", "--max-depth", "7"]);
        let options = load_options(&cli).unwrap();

        assert_eq!(
            options,
            GridOptions {
                rows: 5,
                columns: 4,
                strategy: Propagation::Topological,
                max_depth: 7,
            }
        );
    }

    #[test]
    fn test_bad_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "rows = 5").unwrap();
        let path = file.path().to_str().unwrap();

        let err = load_options(&parse(&["--config", path])).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let options = load_options(&parse(&["--rows", "4000000000"])).unwrap();
        assert!(Grid::with_options(options).is_err());
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let result = Cli::try_parse_from(["gridwire", "--strategy", "breadth-first"]);
        assert!(result.is_err());
    }
}
