//! Command scripts that drive a sheet.
//!
//! One command per line:
//!
//! ```text
//! # comment
//! A1: 5
//! A2: =A1+3
//! clear A1
//! print values
//! print texts
//! value A2
//! text A2
//! size
//! ```

use std::io::Write;

use cellgraph_core::{Position, Sheet};
use log::debug;

use crate::config::OutputMode;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set a cell from input text (possibly empty).
    Set(Position, String),
    Clear(Position),
    Print(OutputMode),
    Value(Position),
    Text(Position),
    Size,
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str, line_num: usize) -> Result<Option<Command>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    // "CELLREF: TEXT" sets a cell; everything after the colon belongs to the text.
    if let Some((cell_ref, text)) = line.split_once(':')
        && let Some(pos) = Position::from_a1(cell_ref.trim())
    {
        return Ok(Some(Command::Set(pos, text.trim_start().to_string())));
    }

    let (keyword, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, arg)) => (keyword, arg.trim()),
        None => (trimmed, ""),
    };
    let parse_error = |message: String| AppError::Parse {
        line: line_num,
        message,
    };
    let cell_arg = || {
        Position::from_a1(arg).ok_or_else(|| parse_error(format!("Invalid cell reference: {}", arg)))
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "clear" => Command::Clear(cell_arg()?),
        "value" => Command::Value(cell_arg()?),
        "text" => Command::Text(cell_arg()?),
        "size" if arg.is_empty() => Command::Size,
        "print" => match arg.parse::<OutputMode>() {
            Ok(OutputMode::None) | Err(_) => {
                return Err(parse_error(format!(
                    "Expected 'print values' or 'print texts', got 'print {}'",
                    arg
                )));
            }
            Ok(mode) => Command::Print(mode),
        },
        _ => {
            return Err(parse_error(
                "Expected 'CELLREF: TEXT' or a command (clear, value, text, print, size)"
                    .to_string(),
            ));
        }
    };
    Ok(Some(command))
}

/// Apply one command, writing any requested output to `out`.
pub fn execute<W: Write>(sheet: &mut Sheet, command: &Command, out: &mut W) -> Result<()> {
    debug!("executing {:?}", command);
    match command {
        Command::Set(pos, text) => sheet.set_cell(*pos, text)?,
        Command::Clear(pos) => sheet.clear_cell(*pos)?,
        Command::Print(mode) => print_sheet(sheet, *mode, out)?,
        Command::Value(pos) => writeln!(out, "{}", sheet.value(*pos)?)?,
        Command::Text(pos) => writeln!(out, "{}", sheet.text(*pos)?)?,
        Command::Size => writeln!(out, "{}", sheet.printable_size())?,
    }
    Ok(())
}

pub fn print_sheet<W: Write>(sheet: &Sheet, mode: OutputMode, out: &mut W) -> Result<()> {
    match mode {
        OutputMode::Values => sheet.print_values(out)?,
        OutputMode::Texts => sheet.print_texts(out)?,
        OutputMode::None => {}
    }
    Ok(())
}

/// Outcome of running a whole script.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Run every line of `script` against `sheet`.
///
/// Failing lines are reported to `errors` as `line N: message`. With
/// `stop_on_error` the first failure ends the run.
pub fn run_script<W: Write, E: Write>(
    sheet: &mut Sheet,
    script: &str,
    stop_on_error: bool,
    out: &mut W,
    errors: &mut E,
) -> std::io::Result<RunSummary> {
    let mut summary = RunSummary::default();
    for (idx, line) in script.lines().enumerate() {
        let line_num = idx + 1;
        let result = match parse_line(line, line_num) {
            Ok(Some(command)) => execute(sheet, &command, out).map(|_| true),
            Ok(None) => Ok(false),
            Err(err) => Err(err),
        };
        match result {
            Ok(true) => summary.executed += 1,
            Ok(false) => {}
            Err(err) => {
                summary.failed += 1;
                writeln!(errors, "line {}: {}", line_num, err)?;
                if stop_on_error {
                    break;
                }
            }
        }
    }
    Ok(summary)
}
