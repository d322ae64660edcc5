use console::style;
use mcphost_core::{AgentOutcome, ToolDescriptor, TraceEntry};
use serde_json::Value;
use std::collections::BTreeMap;

pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

pub fn print_tools(tools: &BTreeMap<String, Vec<ToolDescriptor>>) {
    if tools.is_empty() {
        println!("  {}", style("(no tools)").dim());
        return;
    }

    for (server_id, descriptors) in tools {
        println!("{}", style(format!("[{}]", server_id)).cyan().bold());
        if descriptors.is_empty() {
            println!("  {}", style("(no tools)").dim());
        }
        for tool in descriptors {
            println!("  {} {}", style(&tool.name).green(), style(&tool.description).dim());
        }
    }
}

pub fn print_schema(server_id: &str, tool: &ToolDescriptor) {
    println!(
        "{} {}",
        style(format!("{}::{}", server_id, tool.name)).cyan().bold(),
        style(&tool.description).dim()
    );
    print_json(&tool.input_schema);
}

fn trace_line(entry: &TraceEntry) -> String {
    match entry {
        TraceEntry::Call { .. } => format!(
            "{}::{} → {}",
            entry.server_id(),
            entry.name(),
            style("ok").green()
        ),
        TraceEntry::Error { error, .. } => format!(
            "{}::{} → {}",
            entry.server_id(),
            entry.name(),
            style(format!("ERROR: {}", error)).red()
        ),
    }
}

pub fn print_outcome(outcome: &AgentOutcome) {
    println!();
    if outcome.completed {
        println!("{}", outcome.final_text);
    } else {
        println!("{}", style(&outcome.final_text).yellow());
    }

    if !outcome.trace.is_empty() {
        println!();
        println!("{}", style("Trace:").dim());
        for entry in &outcome.trace {
            println!("  {}", trace_line(entry));
        }
    }
    println!();
}

pub fn print_steps(steps: &[String]) {
    for step in steps {
        if step.starts_with("[WARNING]") {
            println!("  {} {}", style("!").yellow(), step);
        } else {
            println!("  {} {}", style("✓").green(), step);
        }
    }
}
