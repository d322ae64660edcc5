use crate::manager::ToolClientManager;
use crate::traits::ToolDescriptor;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Render the discovered tools as pretty JSON keyed by server id.
pub fn render_catalog(tools: &BTreeMap<String, Vec<ToolDescriptor>>) -> String {
    let mut display = Map::new();
    for (server_id, descriptors) in tools {
        let entries: Vec<Value> = descriptors
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.input_schema,
                })
            })
            .collect();
        display.insert(server_id.clone(), Value::Array(entries));
    }

    serde_json::to_string_pretty(&Value::Object(display)).unwrap_or_else(|_| "{}".to_string())
}

/// Query the manager once and render its catalog.
pub async fn build_catalog(manager: &ToolClientManager) -> String {
    render_catalog(&manager.list_tools(None).await)
}

pub fn system_instruction(catalog: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are an agent that can use tools exposed by tool servers to reach the user's goal.\n");
    prompt.push_str("These servers and tools are available (JSON):\n\n");
    let _ = writeln!(prompt, "{}\n", catalog);

    prompt.push_str("## How to work\n\n");
    prompt.push_str("1) Think briefly about what to do.\n");
    prompt.push_str("2) If you NEED a tool, reply with ONLY this, nothing before or after:\n");
    prompt.push_str("### CALL {\"server_id\":\"<sid>\",\"name\":\"<tool_name>\",\"arguments\":{ ... JSON ... }} ###\n");
    prompt.push_str("3) When you have the final answer for the user, reply with ONLY:\n");
    prompt.push_str("### FINAL {\"text\":\"...answer for the user...\"} ###\n\n");

    prompt.push_str("## Rules\n\n");
    prompt.push_str("- Arguments must be VALID JSON matching the tool's input_schema.\n");
    prompt.push_str("- Do not invent servers or tools.\n");
    prompt.push_str("- One CALL per reply. Tool results arrive as OBSERVATION messages.\n");
    prompt.push_str("- If you get an error, fix the arguments and call the tool again.\n");
    prompt.push_str("- Do not repeat the catalog in your replies.\n");
    prompt.push_str(
        "- To create a README and commit it, use fs.write_file and then the git tools in sequence.\n",
    );

    prompt
}
