use async_trait::async_trait;
use mcphost_core::agent::STEP_LIMIT_MESSAGE;
use mcphost_core::{
    AgentLoop, ChatSession, ClientMode, InteractionLogger, ManagerOptions, ToolClientManager,
    TraceEntry,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Replays canned model replies and records every prompt it was sent.
struct ScriptedChat {
    replies: VecDeque<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedChat {
    fn new(replies: Vec<String>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                replies: replies.into(),
                prompts: prompts.clone(),
            },
            prompts,
        )
    }
}

#[async_trait]
impl ChatSession for ScriptedChat {
    async fn start(&mut self, _system_prompt: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn ask(&mut self, text: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(text.to_string());
        self.replies
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
    }
}

async fn builtin_manager(tmp: &TempDir) -> Arc<ToolClientManager> {
    let logger = Arc::new(InteractionLogger::open(tmp.path().join("logs/interactions.jsonl")).unwrap());
    let options = ManagerOptions {
        mode: ClientMode::Auto,
        servers: vec![],
        workspace_dir: tmp.path().join("workspace"),
        request_timeout: Duration::from_secs(10),
    };
    Arc::new(ToolClientManager::start(options, logger).await)
}

fn read_log(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn call(server: &str, tool: &str, args: Value) -> String {
    format!(
        "### CALL {} ###",
        json!({"server_id": server, "name": tool, "arguments": args})
    )
}

fn final_reply(text: &str) -> String {
    format!("### FINAL {} ###", json!({ "text": text }))
}

#[tokio::test]
async fn write_file_then_final() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("x/a.md");
    let manager = builtin_manager(&tmp).await;
    let (chat, _) = ScriptedChat::new(vec![
        call(
            "fs",
            "write_file",
            json!({"path": target.to_string_lossy(), "content": "hi"}),
        ),
        final_reply("done"),
    ]);

    let outcome = AgentLoop::new(Box::new(chat), manager)
        .run("write hi to a.md")
        .await
        .unwrap();

    assert_eq!(outcome.final_text, "done");
    assert!(outcome.completed);
    assert_eq!(outcome.trace.len(), 1);
    match &outcome.trace[0] {
        TraceEntry::Call {
            server_id, name, ..
        } => {
            assert_eq!(server_id, "fs");
            assert_eq!(name, "write_file");
        }
        other => panic!("expected call entry, got {:?}", other),
    }
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "hi");
}

#[tokio::test]
async fn malformed_replies_use_exactly_the_budget() {
    let tmp = TempDir::new().unwrap();
    let manager = builtin_manager(&tmp).await;
    let (chat, prompts) = ScriptedChat::new(vec![
        "I think I should write a file.".into(),
        "Okay, writing it now.".into(),
        "Done, I guess?".into(),
        final_reply("never reached"),
    ]);

    let outcome = AgentLoop::new(Box::new(chat), manager)
        .with_max_steps(3)
        .run("do it")
        .await
        .unwrap();

    assert!(!outcome.completed);
    assert_eq!(outcome.final_text, STEP_LIMIT_MESSAGE);
    assert!(outcome.trace.is_empty());
    assert_eq!(prompts.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn second_commit_is_recorded_as_error_and_loop_continues() {
    if which::which("git").is_err() {
        eprintln!("git not on PATH, skipping");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let manager = builtin_manager(&tmp).await;
    let readme = tmp.path().join("workspace/README.md");
    let (chat, prompts) = ScriptedChat::new(vec![
        call(
            "fs",
            "write_file",
            json!({"path": readme.to_string_lossy(), "content": "# demo\n"}),
        ),
        call("git", "git_init", json!({})),
        call("git", "git_add_all", json!({})),
        call("git", "git_commit", json!({"message": "first"})),
        call("git", "git_commit", json!({"message": "second"})),
        final_reply("committed once"),
    ]);

    let outcome = AgentLoop::new(Box::new(chat), manager)
        .run("create a README and commit it")
        .await
        .unwrap();

    assert!(outcome.completed);
    assert_eq!(outcome.final_text, "committed once");
    assert_eq!(outcome.trace.len(), 5);
    assert!(outcome.trace[..4].iter().all(|e| !e.is_error()));
    assert!(outcome.trace[4].is_error());
    assert_eq!(outcome.trace[4].name(), "git_commit");

    let prompts = prompts.lock().unwrap();
    assert!(prompts[5].starts_with("ERROR running tool git:git_commit:"));
}

#[tokio::test]
async fn every_call_is_paired_with_one_terminal_record() {
    let tmp = TempDir::new().unwrap();
    let manager = builtin_manager(&tmp).await;
    let dir = tmp.path().join("made");
    let (chat, _) = ScriptedChat::new(vec![
        call("fs", "mkdir", json!({"path": dir.to_string_lossy()})),
        call("fs", "read_file", json!({"path": dir.to_string_lossy()})),
        call("weather", "forecast", json!({"city": "Lima"})),
        call("fs", "no_such_tool", json!({})),
        final_reply("finished"),
    ]);

    let outcome = AgentLoop::new(Box::new(chat), manager.clone())
        .run("exercise the tools")
        .await
        .unwrap();
    assert_eq!(outcome.trace.len(), 4);
    assert_eq!(outcome.trace.iter().filter(|e| e.is_error()).count(), 3);

    let records = read_log(manager.log_path());
    let dispatch: Vec<&str> = records
        .iter()
        .map(|r| r["event"].as_str().unwrap())
        .filter(|e| e.starts_with("tools/") && *e != "tools/list" && *e != "tools/list_error")
        .collect();

    assert_eq!(
        dispatch,
        vec![
            "tools/call",
            "tools/response",
            "tools/call",
            "tools/error",
            "tools/call",
            "tools/error",
            "tools/call",
            "tools/error",
        ]
    );
    assert!(records.iter().all(|r| r["ts"].is_f64()));
    assert_eq!(records[0]["event"], "sdk_unavailable");
}
