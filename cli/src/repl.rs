use crate::render;
use console::style;
use mcphost_core::{AgentLoop, BackendMode, ToolClientManager};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Servers,
    Tools(Option<String>),
    Schema { server: String, tool: String },
    Call { server: String, tool: String, args: Value },
    Scenario,
    Log,
    Quit,
}

/// Parse a `:`-prefixed line. `Err` carries a usage message.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let body = line.trim().trim_start_matches(':');
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    match name {
        "help" | "h" | "?" => Ok(Command::Help),
        "servers" => Ok(Command::Servers),
        "tools" => Ok(Command::Tools(
            Some(rest.to_string()).filter(|s| !s.is_empty()),
        )),
        "schema" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(server), Some(tool)) => Ok(Command::Schema {
                    server: server.to_string(),
                    tool: tool.to_string(),
                }),
                _ => Err("usage: :schema <server> <tool>".to_string()),
            }
        }
        "call" => {
            let usage = "usage: :call <server> <tool> <json-args>";
            let (server, rest) = rest.split_once(char::is_whitespace).ok_or(usage)?;
            let (tool, raw_args) = match rest.trim().split_once(char::is_whitespace) {
                Some((tool, args)) => (tool, args.trim()),
                None => (rest.trim(), ""),
            };
            if tool.is_empty() {
                return Err(usage.to_string());
            }
            let args = if raw_args.is_empty() {
                json!({})
            } else {
                serde_json::from_str(raw_args).map_err(|e| format!("invalid JSON args: {}", e))?
            };
            Ok(Command::Call {
                server: server.to_string(),
                tool: tool.to_string(),
                args,
            })
        }
        "scenario" => Ok(Command::Scenario),
        "log" => Ok(Command::Log),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command :{} (try :help)", other)),
    }
}

pub struct Repl {
    manager: Arc<ToolClientManager>,
    agent: Option<AgentLoop>,
    /// Why `agent` is missing, shown when the user types free text.
    agent_unavailable: Option<String>,
    history_path: PathBuf,
}

impl Repl {
    pub fn new(manager: Arc<ToolClientManager>, history_path: PathBuf) -> Self {
        Self {
            manager,
            agent: None,
            agent_unavailable: None,
            history_path,
        }
    }

    pub fn with_agent(mut self, agent: anyhow::Result<AgentLoop>) -> Self {
        match agent {
            Ok(agent) => self.agent = Some(agent),
            Err(e) => self.agent_unavailable = Some(e.to_string()),
        }
        self
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.load_history(&self.history_path);

        self.print_welcome();

        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    if line.starts_with(':') {
                        match parse_command(line) {
                            Ok(Command::Quit) => break,
                            Ok(command) => self.execute(command).await,
                            Err(usage) => println!("{}", style(usage).yellow()),
                        }
                        continue;
                    }

                    if !self.ask_agent(line).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        let _ = rl.save_history(&self.history_path);
        println!("Bye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", style("mcphost").cyan().bold());
        println!(
            "  log:       {}",
            style(self.manager.log_path().display()).dim()
        );
        println!(
            "  workspace: {}",
            style(self.manager.workspace().display()).dim()
        );
        if let Some(reason) = &self.agent_unavailable {
            println!(
                "  {} chat unavailable ({}); tool commands still work",
                style("!").yellow(),
                reason
            );
        }
        println!("  Type :help for commands, :q to exit.");
        println!();
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  :help                         Show this help");
        println!("  :servers                      List connected servers");
        println!("  :tools [server]               List tools");
        println!("  :schema <server> <tool>       Show a tool's input schema");
        println!("  :call <server> <tool> <json>  Call a tool directly");
        println!("  :scenario                     Run the README + commit demo");
        println!("  :log                          Show the interaction log path");
        println!("  :q                            Exit");
        println!("Anything else is sent to the agent.");
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Help => self.print_help(),
            Command::Servers => {
                let mode = match self.manager.mode() {
                    BackendMode::Protocol => "protocol",
                    BackendMode::Builtin => "builtin",
                };
                println!("mode: {}", style(mode).cyan());
                for id in self.manager.server_ids().await {
                    println!("  {}", id);
                }
            }
            Command::Tools(server) => {
                render::print_tools(&self.manager.list_tools(server.as_deref()).await)
            }
            Command::Schema { server, tool } => {
                match self.manager.get_schema(&server, &tool).await {
                    Ok(descriptor) => render::print_schema(&server, &descriptor),
                    Err(e) => println!("{}", style(e).red()),
                }
            }
            Command::Call { server, tool, args } => {
                match self.manager.call_tool(&server, &tool, args).await {
                    Ok(result) => render::print_json(&result),
                    Err(e) => println!("{}", style(format!("ERROR: {}", e)).red()),
                }
            }
            Command::Scenario => match self.manager.run_scenario().await {
                Ok(steps) => render::print_steps(&steps),
                Err(e) => println!("{}", style(format!("Scenario failed: {:#}", e)).red()),
            },
            Command::Log => println!("{}", self.manager.log_path().display()),
            Command::Quit => {}
        }
    }

    /// Returns false when the user interrupted with Ctrl-C.
    async fn ask_agent(&mut self, text: &str) -> bool {
        let Some(agent) = self.agent.as_mut() else {
            println!(
                "{}",
                style(format!(
                    "Chat is unavailable: {}",
                    self.agent_unavailable.as_deref().unwrap_or("not configured")
                ))
                .yellow()
            );
            return true;
        };

        tokio::select! {
            result = agent.run(text) => {
                match result {
                    Ok(outcome) => render::print_outcome(&outcome),
                    Err(e) => println!("{}", style(format!("Error: {:#}", e)).red()),
                }
                true
            }
            _ = tokio::signal::ctrl_c() => {
                println!("^C");
                false
            }
        }
    }
}
