//! Edit scripts: a line-per-command text form of [`EditEvent`]s, used by
//! the command-line driver to replay editing sessions.
//!
//! ```text
//! # comments and blank lines are ignored
//! cursor 0 5
//! enter
//! type hello\sworld
//! paste one\ntwo
//! codeblock rust
//! heading 2
//! focus 3 4
//! replace foo bar
//! ```
//!
//! Text arguments accept `\n`, `\t`, `\s` (space) and `\\` escapes.

use crate::document::CursorPosition;
use crate::editor::EditEvent;
use crate::error::ScriptError;
use crate::search::SearchOptions;

/// Parse a whole script. Line numbers in errors are 1-based.
///
/// # Errors
/// Returns [`ScriptError::Parse`] for the first malformed command.
pub fn parse_script(text: &str) -> Result<Vec<EditEvent>, ScriptError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(i, line)| {
            parse_command(line.trim()).map_err(|message| ScriptError::Parse {
                line: i + 1,
                message,
            })
        })
        .collect()
}

fn parse_command(line: &str) -> Result<EditEvent, String> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();
    match command {
        "enter" => no_args(&args, EditEvent::Enter),
        "backspace" => no_args(&args, EditEvent::Backspace),
        "delete" => no_args(&args, EditEvent::Delete),
        "type" => Ok(EditEvent::InsertText(unescape(rest)?)),
        "paste" => Ok(EditEvent::Paste(unescape(rest)?)),
        "codeblock" => match args.as_slice() {
            [] => Ok(EditEvent::InsertCodeBlock(None)),
            [language] => Ok(EditEvent::InsertCodeBlock(Some((*language).to_string()))),
            _ => Err("codeblock takes at most one language".to_string()),
        },
        "heading" => match args.as_slice() {
            [level] => Ok(EditEvent::SetHeadingLevel(number(level)?)),
            _ => Err("heading takes a level".to_string()),
        },
        "cursor" => match args.as_slice() {
            [line, offset] => Ok(EditEvent::MoveCursor(CursorPosition::new(
                number(line)?,
                number(offset)?,
            ))),
            _ => Err("cursor takes a line and an offset".to_string()),
        },
        "focus" => match args.as_slice() {
            [line, offset] => Ok(EditEvent::Focus {
                line: number(line)?,
                rendered_offset: number(offset)?,
            }),
            _ => Err("focus takes a line and a rendered offset".to_string()),
        },
        "replace" => match args.as_slice() {
            [query, replacement] => Ok(EditEvent::ReplaceAll {
                query: unescape(query)?,
                replacement: unescape(replacement)?,
                options: SearchOptions {
                    case_sensitive: true,
                    ..SearchOptions::default()
                },
            }),
            _ => Err("replace takes a query and a replacement".to_string()),
        },
        other => Err(format!("unknown command '{other}'")),
    }
}

fn no_args(args: &[&str], event: EditEvent) -> Result<EditEvent, String> {
    if args.is_empty() {
        Ok(event)
    } else {
        Err(format!("unexpected arguments: {}", args.join(" ")))
    }
}

fn number<T: std::str::FromStr>(arg: &str) -> Result<T, String> {
    arg.parse().map_err(|_| format!("'{arg}' is not a valid number"))
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("dangling backslash".to_string()),
        }
    }
    Ok(out)
}
