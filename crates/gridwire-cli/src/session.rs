//! Command parsing and execution for a terminal session

use crate::table;
use anyhow::{bail, Result};
use gridwire::prelude::*;
use lazy_regex::regex_captures;
use std::io::{BufRead, Write};

pub const HELP: &str = "\
Commands:
  set <ID> <text>   edit a cell (text starting with '=' is a formula)
  get <ID>          show a cell's value
  edit <ID>         show what the editor holds for a cell
  deps <ID>         show which cells a cell reads and is read by
  show              print the whole grid
  help              print this message
  quit              leave the session";

/// One line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { id: String, text: String },
    Get(String),
    Edit(String),
    Deps(String),
    Show,
    Help,
    Quit,
}

/// Whether the session keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse a line of input; blank lines and `#` comments give `None`
///
/// Everything after the single space following the id of a `set` is the
/// cell text, surrounding whitespace included.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim_start();
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if let Some((_, id, text)) = regex_captures!(r"^set\s+(\S+)(?: (.*))?$", line) {
        return Ok(Some(Command::Set {
            id: id.to_string(),
            text: text.to_string(),
        }));
    }

    if let Some((_, verb, id)) = regex_captures!(r"^(get|edit|deps)\s+(\S+)\s*$", line) {
        let id = id.to_string();
        return Ok(Some(match verb {
            "get" => Command::Get(id),
            "edit" => Command::Edit(id),
            _ => Command::Deps(id),
        }));
    }

    let command = match line.trim_end() {
        "show" => Command::Show,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "set" => bail!("usage: set <ID> <text>"),
        verb @ ("get" | "edit" | "deps") => bail!("usage: {} <ID>", verb),
        other => bail!("unknown command '{}', try 'help'", other),
    };
    Ok(Some(command))
}

/// Run one command against the grid, writing its output to `out`
pub fn execute<W: Write>(grid: &mut Grid, command: Command, out: &mut W) -> Result<Flow> {
    match command {
        Command::Set { id, text } => {
            let report = grid.on_edit(&id, &text)?;
            let addr = grid.locate(&id)?;
            writeln!(
                out,
                "{} = {} (refreshed {} cell{})",
                addr,
                grid.display_value(&id)?,
                report.cells_refreshed,
                if report.cells_refreshed == 1 { "" } else { "s" }
            )?;
            for diagnostic in &report.diagnostics {
                writeln!(out, "warning: {}", diagnostic)?;
            }
        }
        Command::Get(id) => {
            let addr = grid.locate(&id)?;
            writeln!(out, "{} = {}", addr, grid.display_value(&id)?)?;
        }
        Command::Edit(id) => {
            let addr = grid.locate(&id)?;
            writeln!(out, "{}: {}", addr, grid.raw_text(&id)?)?;
        }
        Command::Deps(id) => {
            let addr = grid.locate(&id)?;
            writeln!(out, "{} reads: {}", addr, id_list(&grid.precedents_of(&id)?))?;
            writeln!(out, "{} is read by: {}", addr, id_list(&grid.dependents_of(&id)?))?;
        }
        Command::Show => write!(out, "{}", table::render(grid))?,
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn id_list(cells: &[CellAddress]) -> String {
    if cells.is_empty() {
        return "(none)".to_string();
    }
    cells
        .iter()
        .map(CellAddress::to_a1_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read commands until `quit` or end of input
///
/// A failing command prints its error and the session carries on.
pub fn run<R: BufRead, W: Write>(grid: &mut Grid, input: R, mut out: W, prompt: bool) -> Result<()> {
    let mut lines = input.lines();
    let mut number = 0;
    loop {
        if prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line?;
        number += 1;

        let outcome = parse_command(&line)
            .and_then(|command| command.map_or(Ok(Flow::Continue), |c| execute(grid, c, &mut out)));

        match outcome {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => {
                log::debug!("line {}: {:#}", number, err);
                writeln!(out, "error: {:#}", err)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn session(script: &str) -> String {
        session_with(Grid::new(), script)
    }

    fn session_with(mut grid: Grid, script: &str) -> String {
        let mut out = Vec::new();
        run(&mut grid, Cursor::new(script), &mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_set_keeps_text_verbatim() {
        assert_eq!(
            parse_command("set A1   spaced text ").unwrap(),
            Some(Command::Set {
                id: "A1".into(),
                text: "  spaced text ".into()
            })
        );
        assert_eq!(
            parse_command("set b2 =SUM(A1:A3)").unwrap(),
            Some(Command::Set {
                id: "b2".into(),
                text: "=SUM(A1:A3)".into()
            })
        );
    }

    #[test]
    fn test_parse_set_without_text_clears() {
        assert_eq!(
            parse_command("set C3").unwrap(),
            Some(Command::Set {
                id: "C3".into(),
                text: String::new()
            })
        );
    }

    #[test]
    fn test_parse_single_id_commands() {
        assert_eq!(parse_command("get A1").unwrap(), Some(Command::Get("A1".into())));
        assert_eq!(parse_command("  edit B2 ").unwrap(), Some(Command::Edit("B2".into())));
        assert_eq!(parse_command("deps C3").unwrap(), Some(Command::Deps("C3".into())));
        assert_eq!(parse_command("show").unwrap(), Some(Command::Show));
        assert_eq!(parse_command("quit").unwrap(), Some(Command::Quit));
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_skips_blank_lines_and_comments() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# set A1 1").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("set").unwrap_err().to_string(), "usage: set <ID> <text>");
        assert_eq!(parse_command("get").unwrap_err().to_string(), "usage: get <ID>");
        assert_eq!(parse_command("get A1 B1").unwrap_err().to_string(), "unknown command 'get A1 B1', try 'help'");
        assert_eq!(parse_command("frobnicate").unwrap_err().to_string(), "unknown command 'frobnicate', try 'help'");
    }

    #[test]
    fn test_set_reports_value_and_refresh_count() {
        let output = session("set A1 2\nset B1 =A1*3\nset A1 5\n");
        assert_eq!(
            output,
            "A1 = 2 (refreshed 1 cell)\n\
             B1 = 6 (refreshed 1 cell)\n\
             A1 = 5 (refreshed 2 cells)\n"
        );
    }

    #[test]
    fn test_get_and_edit() {
        let output = session("set a1 4\nset A2 =a1/0\nget A2\nedit A2\nedit A1\nget B5\n");
        assert_eq!(
            output,
            "A1 = 4 (refreshed 1 cell)\n\
             A2 = #DIV/0! (refreshed 1 cell)\n\
             A2 = #DIV/0!\n\
             A2: =a1/0\n\
             A1: 4\n\
             B5 = \n"
        );
    }

    #[test]
    fn test_deps() {
        let output = session("set C1 =A1+B1\ndeps C1\ndeps A1\n");
        assert_eq!(
            output,
            "C1 = 0 (refreshed 1 cell)\n\
             C1 reads: A1, B1\n\
             C1 is read by: (none)\n\
             A1 reads: (none)\n\
             A1 is read by: C1\n"
        );
    }

    #[test]
    fn test_cycles_are_reported_as_warnings() {
        let output = session("set A1 =B1\nset B1 =A1\n");
        assert!(output.contains("warning: circular reference:"), "{}", output);
    }

    #[test]
    fn test_errors_do_not_end_the_session() {
        let output = session("set Z99 1\nbogus\nset A1 1\n");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("error: "));
        assert_eq!(lines[1], "error: unknown command 'bogus', try 'help'");
        assert_eq!(lines[2], "A1 = 1 (refreshed 1 cell)");
    }

    #[test]
    fn test_quit_stops_reading() {
        let output = session("set A1 1\nquit\nset A2 2\n");
        assert_eq!(output, "A1 = 1 (refreshed 1 cell)\n");
    }

    #[test]
    fn test_show_prints_table() {
        let grid = Grid::with_options(GridOptions::with_size(2, 2)).unwrap();
        let output = session_with(grid, "set A1 1\nset B2 hi\nshow\n");
        assert!(output.ends_with("  | A | B\n1 | 1 |\n2 |   | hi\n"), "{}", output);
    }
}
