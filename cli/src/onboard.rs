use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use mcphost_core::config::{ClientMode, Config, get_config_path};

const PROVIDERS: &[&str] = &["openai", "openrouter", "ollama"];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<String> {
    let selection = Select::new()
        .with_prompt("Select your chat provider")
        .items(PROVIDERS)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    Ok(PROVIDERS[selection].to_string())
}

fn setup_api_key(provider: &str) -> Result<String> {
    if provider == "ollama" {
        println!("  {} Ollama runs locally, no API key needed", style("✓").green());
        return Ok(String::new());
    }

    let api_key: String = Input::new()
        .with_prompt(format!("Enter your {} API key", provider))
        .interact_text()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        return Err(anyhow::anyhow!("API key cannot be empty"));
    }

    Ok(api_key.trim().to_string())
}

fn setup_model(provider: &str) -> Result<String> {
    let models: &[&str] = match provider {
        "openrouter" => &["openai/gpt-4o-mini", "anthropic/claude-3.5-sonnet", "google/gemini-flash-1.5"],
        "ollama" => &["llama3.1", "qwen2.5", "mistral"],
        _ => &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini"],
    };

    let selection = Select::new()
        .with_prompt("Select your model")
        .items(models)
        .default(0)
        .interact()
        .context("Failed to select model")?;

    Ok(models[selection].to_string())
}

fn setup_client_mode() -> Result<ClientMode> {
    let modes = [
        ("auto", "use servers.yaml when it lists servers, else built-in tools"),
        ("protocol", "always talk to configured tool servers"),
        ("builtin", "always use the built-in fs/git tools"),
    ];
    let items: Vec<String> = modes
        .iter()
        .map(|(name, help)| format!("{:<9} {}", name, help))
        .collect();

    let selection = Select::new()
        .with_prompt("Select tool client mode")
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to select client mode")?;

    Ok(match selection {
        1 => ClientMode::Protocol,
        2 => ClientMode::Builtin,
        _ => ClientMode::Auto,
    })
}

pub fn run_onboard() -> Result<Config> {
    println!();
    println!("  {}", style("Welcome to mcphost!").white().bold());
    println!(
        "  {}",
        style("This wizard configures the chat provider and tool mode.").dim()
    );

    print_step(1, 4, "Provider");
    let provider = setup_provider()?;

    print_step(2, 4, "API Key");
    let api_key = setup_api_key(&provider)?;

    print_step(3, 4, "Model");
    let model = setup_model(&provider)?;

    print_step(4, 4, "Tools");
    let client_mode = setup_client_mode()?;

    let config = Config {
        provider: Some(provider),
        api_key,
        model,
        client_mode,
        ..Default::default()
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(get_config_path().display()).cyan()
    );
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("mcphost chat").cyan().bold()
    );
    println!();

    Ok(config)
}
