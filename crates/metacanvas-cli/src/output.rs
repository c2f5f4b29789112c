//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use metacanvas_canvas::serialize::metadata_json;
use metacanvas_canvas::{CanvasFieldState, CanvasState};
use metacanvas_domain::FieldStatus;
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest value shown in a table cell
const MAX_CELL_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Same color setting, different format.
    pub fn with_format(&self, format: OutputFormat) -> Self {
        Self::new(format, self.color_enabled)
    }

    /// Format an extraction result.
    pub fn format_state(&self, state: &CanvasState) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(metadata_json(state)?),
            OutputFormat::Table => Ok(self.format_state_table(state)),
            OutputFormat::Quiet => Ok(format!("{}/{}", state.filled_fields, state.total_fields)),
        }
    }

    /// Format fields as a table, grouped like the canvas groups them.
    fn format_state_table(&self, state: &CanvasState) -> String {
        if state.total_fields == 0 {
            return self.colorize("No fields loaded.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Group", "Field", "Status", "Value", "Confidence"]);

        for group in &state.field_groups {
            let group_name = format!("{} / {}", group.schema_name, group.label);
            for field in group.field_ids.iter().filter_map(|id| state.field(id)) {
                self.push_field(&mut builder, &group_name, field, "");
                for sub in &field.sub_fields {
                    self.push_field(&mut builder, &group_name, sub, "  ↳ ");
                }
            }
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!("{}\n{}", table, self.summary(state))
    }

    fn push_field(&self, builder: &mut Builder, group: &str, field: &CanvasFieldState, indent: &str) {
        let value = match (&field.status, &field.extraction_error) {
            (FieldStatus::Error, Some(message)) => message.clone(),
            _ => display_value(&field.value),
        };
        let confidence = if field.is_filled() {
            format!("{:.0}%", field.confidence * 100.0)
        } else {
            String::new()
        };

        builder.push_record([
            group.to_string(),
            format!("{}{}", indent, field.definition.label),
            self.status(field.status),
            truncate(&value, MAX_CELL_WIDTH),
            confidence,
        ]);
    }

    /// One-line fill summary.
    pub fn summary(&self, state: &CanvasState) -> String {
        let content_type = state
            .selected_content_type
            .as_deref()
            .unwrap_or("none");
        let line = format!(
            "{}/{} fields filled ({:.0}%), content type: {}",
            state.filled_fields, state.total_fields, state.extraction_progress, content_type
        );
        if state.filled_fields == state.total_fields {
            self.success(&line)
        } else {
            self.info(&line)
        }
    }

    /// Colorized status label.
    pub fn status(&self, status: FieldStatus) -> String {
        let color = match status {
            FieldStatus::Filled => "green",
            FieldStatus::Error => "red",
            FieldStatus::Extracting => "cyan",
            FieldStatus::Empty => "",
        };
        self.colorize(status.as_str(), color)
    }

    /// Format a list of special schemas.
    pub fn schema_list(&self, schemas: &[(String, Option<String>)]) -> String {
        if schemas.is_empty() {
            return self.warning("No special schemas found");
        }
        schemas
            .iter()
            .map(|(file, label)| match label {
                Some(label) => format!("{}  {}", self.colorize(file, "cyan"), label),
                None => self.colorize(file, "cyan"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Human-readable field value: strings unquoted, arrays comma-separated.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
