use std::io::{self, BufRead, Write};

use crate::error::AppResult;

pub enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

/// Asks for a replacement of `current`: Enter keeps it, `-` clears it.
pub fn prompt_update(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    Ok(parse_update(&read_line(&mut io::stdin().lock())?))
}

/// Asks for a single value. Empty input yields an empty string.
pub fn prompt_value(label: &str) -> AppResult<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;
    read_line(&mut io::stdin().lock())
}

fn read_line(input: &mut impl BufRead) -> AppResult<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn parse_update(input: &str) -> PromptAction {
    if input.is_empty() {
        PromptAction::Keep
    } else if input == "-" {
        PromptAction::Clear
    } else {
        PromptAction::Set(input.to_string())
    }
}
