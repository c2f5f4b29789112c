//! Interactive edit session over an extraction result.

use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use metacanvas_canvas::Canvas;
use metacanvas_domain::traits::{LlmProvider, SchemaSource};
use rustyline::error::ReadlineError;
use rustyline::{Config as EditorConfig, DefaultEditor};
use serde_json::Value;
use std::path::PathBuf;

/// Run the edit session until `done` or end of input.
pub async fn run_repl<L, S>(canvas: &Canvas<L, S>, formatter: &Formatter, history_size: usize) -> Result<()>
where
    L: LlmProvider + 'static,
    S: SchemaSource,
{
    println!("{}", formatter.info("Edit session - Type 'help' for commands, 'done' to finish"));
    println!();

    let editor_config = EditorConfig::builder()
        .max_history_size(history_size)
        .map_err(|e| CliError::Config(format!("Invalid history size: {}", e)))?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config).map_err(|e| {
        CliError::Io(std::io::Error::other(format!("Failed to initialize editor: {}", e)))
    })?;

    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    loop {
        match editor.readline("metacanvas> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Done) => break,
                    Ok(ReplCommand::Help) => print_help(formatter),
                    Ok(command) => {
                        if let Err(e) = execute_repl_command(command, canvas, formatter).await {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => eprintln!("{}", formatter.error(&e.to_string())),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'done' to finish"));
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    editor.save_history(&history_path).ok();
    Ok(())
}

/// Edit session command.
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Done,
    Help,
    Show,
    Json,
    Set { field_id: String, value: Value },
    Clear { field_id: String },
    ContentType { schema_file: String },
    Rerun,
}

/// Parse an edit session line.
fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "done" | "exit" | "quit" | "q" => Ok(ReplCommand::Done),
        "help" | "?" => Ok(ReplCommand::Help),
        "show" | "ls" => Ok(ReplCommand::Show),
        "json" => Ok(ReplCommand::Json),
        "rerun" => Ok(ReplCommand::Rerun),
        "set" => {
            let (field_id, raw) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| CliError::InvalidInput("Usage: set <field> <value>".to_string()))?;
            Ok(ReplCommand::Set {
                field_id: field_id.to_string(),
                value: parse_value(raw.trim()),
            })
        }
        "clear" if !rest.is_empty() => Ok(ReplCommand::Clear {
            field_id: rest.to_string(),
        }),
        "clear" => Err(CliError::InvalidInput("Usage: clear <field>".to_string())),
        "type" if !rest.is_empty() => Ok(ReplCommand::ContentType {
            schema_file: rest.to_string(),
        }),
        "type" => Err(CliError::InvalidInput("Usage: type <schema.json>".to_string())),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            command
        ))),
    }
}

/// JSON when the input parses as JSON, otherwise the text itself.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn execute_repl_command<L, S>(
    command: ReplCommand,
    canvas: &Canvas<L, S>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + 'static,
    S: SchemaSource,
{
    match command {
        ReplCommand::Show => {
            let table = formatter.with_format(OutputFormat::Table);
            println!("{}", table.format_state(&canvas.state())?);
        }
        ReplCommand::Json => println!("{}", canvas.metadata_json()?),
        ReplCommand::Set { field_id, value } => {
            canvas.update_field_value(&field_id, value).await?;
            println!("{}", formatter.success(&format!("Updated {}", field_id)));
            println!("{}", formatter.summary(&canvas.state()));
        }
        ReplCommand::Clear { field_id } => {
            canvas.update_field_value(&field_id, Value::Null).await?;
            println!("{}", formatter.success(&format!("Cleared {}", field_id)));
        }
        ReplCommand::ContentType { schema_file } => {
            canvas.change_content_type_manually(&schema_file).await?;
            println!("{}", formatter.summary(&canvas.state()));
        }
        ReplCommand::Rerun => {
            let text = canvas.state().source_text.clone();
            canvas.start_extraction(&text).await?;
            println!("{}", formatter.summary(&canvas.state()));
        }
        ReplCommand::Done | ReplCommand::Help => {}
    }
    Ok(())
}

fn get_history_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    let metacanvas_dir = home.join(".metacanvas");
    std::fs::create_dir_all(&metacanvas_dir)?;
    Ok(metacanvas_dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  show, ls                  - Show all fields");
    println!("  json                      - Print the enriched metadata document");
    println!("  set <field> <value>       - Set a field (JSON or plain text)");
    println!("                              sub-fields as <parent>.<sub>");
    println!("  clear <field>             - Empty a field");
    println!("  type <schema.json>        - Switch the special schema and re-extract");
    println!("  rerun                     - Run the whole extraction again");
    println!("  help, ?                   - Show this help");
    println!("  done, exit, q             - Finish and print the result");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_repl_command("set schema:offers.amount 45").unwrap(),
            ReplCommand::Set {
                field_id: "schema:offers.amount".to_string(),
                value: json!(45),
            }
        );
        assert_eq!(
            parse_repl_command("set cclom:title Workshop KI in Berlin").unwrap(),
            ReplCommand::Set {
                field_id: "cclom:title".to_string(),
                value: json!("Workshop KI in Berlin"),
            }
        );
        assert_eq!(
            parse_repl_command(r#"set tags ["KI", "Bildung"]"#).unwrap(),
            ReplCommand::Set {
                field_id: "tags".to_string(),
                value: json!(["KI", "Bildung"]),
            }
        );
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(parse_repl_command("done").unwrap(), ReplCommand::Done);
        assert_eq!(parse_repl_command("ls").unwrap(), ReplCommand::Show);
        assert_eq!(
            parse_repl_command("type course.json").unwrap(),
            ReplCommand::ContentType {
                schema_file: "course.json".to_string()
            }
        );
        assert_eq!(
            parse_repl_command("clear format").unwrap(),
            ReplCommand::Clear {
                field_id: "format".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_repl_command("set title").is_err());
        assert!(parse_repl_command("type").is_err());
        assert!(parse_repl_command("frobnicate").is_err());
    }
}
