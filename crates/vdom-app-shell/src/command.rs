use vdom_core::ActionValue;

use crate::ShellError;

/// One line of shell input.
///
/// ```text
/// click <selector> [index]
/// input <selector> <text...>
/// dispatch <action> [arg...]
/// html | tree | quit
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum ShellCommand {
    Click { selector: String, index: usize },
    Input { selector: String, text: String },
    Dispatch { action: String, args: Vec<ActionValue> },
    Html,
    Tree,
    Quit,
}

impl ShellCommand {
    /// Parses one line. Blank lines and `//` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ShellError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(None);
        }
        let invalid = || ShellError::Command {
            line: line.to_owned(),
        };
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();
        let command = match verb {
            "click" => {
                let mut parts = rest.split_whitespace();
                let selector = parts.next().ok_or_else(invalid)?.to_owned();
                let index = match parts.next() {
                    Some(index) => index.parse().map_err(|_| invalid())?,
                    None => 0,
                };
                Self::Click { selector, index }
            }
            "input" => {
                let (selector, text) = rest.split_once(' ').unwrap_or((rest, ""));
                if selector.is_empty() {
                    return Err(invalid());
                }
                Self::Input {
                    selector: selector.to_owned(),
                    text: text.to_owned(),
                }
            }
            "dispatch" => {
                let mut parts = rest.split_whitespace();
                let action = parts.next().ok_or_else(invalid)?.to_owned();
                Self::Dispatch {
                    action,
                    args: parts.map(parse_arg).collect(),
                }
            }
            "html" => Self::Html,
            "tree" => Self::Tree,
            "quit" | "exit" => Self::Quit,
            _ => return Err(invalid()),
        };
        Ok(Some(command))
    }
}

fn parse_arg(arg: &str) -> ActionValue {
    match arg {
        "true" => ActionValue::Bool(true),
        "false" => ActionValue::Bool(false),
        _ => match arg.parse::<f64>() {
            Ok(number) if number.is_finite() => ActionValue::Number(number),
            _ => ActionValue::Text(arg.to_owned()),
        },
    }
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
