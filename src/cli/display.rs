use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::functions::AutomationFunction;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_function_list(&self, functions: &[Arc<dyn AutomationFunction>]) {
        if functions.is_empty() {
            println!("{}", style("No functions registered.").dim());
            return;
        }

        self.print_header("Available functions");
        for function in functions {
            println!("{} {}", style("-").dim(), style(function.name()).bold());
            println!("  {}", function.description());

            let schema = function.schema();
            let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                println!();
                continue;
            };
            let required: Vec<&str> = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            println!("  {}", style("Parameters:").dim());
            for (param, details) in properties {
                let kind = details.get("type").and_then(Value::as_str).unwrap_or("any");
                let requirement = if required.contains(&param.as_str()) {
                    style("(required)").yellow()
                } else {
                    style("(optional)").dim()
                };
                println!("    - {param}: {kind} {requirement}");
                if let Some(description) = details.get("description").and_then(Value::as_str) {
                    println!("      {}", style(description).dim());
                }
            }
            println!();
        }
    }

    pub fn print_function_detail(&self, function: &dyn AutomationFunction) -> serde_json::Result<()> {
        self.print_header(&format!("Function: {}", function.name()));
        println!("Description: {}", function.description());
        println!();
        println!("{}", style("Schema:").bold());
        println!("{}", serde_json::to_string_pretty(&function.schema())?);
        Ok(())
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(spinner.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
