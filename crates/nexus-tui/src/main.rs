use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use nexus_core::{
    AvatarRequestController, Config, ConversationStore, HostedClient, FALLBACK_REPLY,
};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::{App, SessionInfo};
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "ai-nexus")]
#[command(version, about = "Chat with Gemini and generate avatars from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Ask {
        /// Message text
        text: String,
    },
    /// Generate an avatar and print its image link
    Avatar {
        /// Description of the picture
        prompt: String,
    },
    /// Show the config file location and settings, creating it if missing
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let log_path = logging::init_file_logging()?;
            tracing::info!(log = %log_path.display(), "starting ai-nexus");
            let config = Config::load_or_default();
            run_tui(&config).await
        }
        Commands::Ask { text } => {
            logging::init_stderr_logging();
            let config = Config::load_or_default();
            ask(&config, &text).await
        }
        Commands::Avatar { prompt } => {
            logging::init_stderr_logging();
            let config = Config::load_or_default();
            avatar(&config, &prompt).await
        }
        Commands::Config => {
            logging::init_stderr_logging();
            show_config()
        }
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    let client = HostedClient::from_config(config)?;
    let info = SessionInfo {
        model: client.model().to_string(),
        key_source: config.key_source(),
        image_options: config.image_options(),
        image_delay: config.image_delay(),
    };

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(Arc::new(client), info, events.sender());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event)?;
    }
    Ok(())
}

async fn ask(config: &Config, text: &str) -> Result<()> {
    let client = HostedClient::from_config(config)?;
    let mut conversation = ConversationStore::new();

    let Some(reply) = conversation.submit_and_wait(&client, text).await else {
        bail!("nothing to send: message is empty");
    };

    println!("{}", reply.text());
    if reply.text() == FALLBACK_REPLY {
        bail!("the language model request failed (run with RUST_LOG=nexus_core=debug for details)");
    }
    Ok(())
}

async fn avatar(config: &Config, prompt: &str) -> Result<()> {
    let client = HostedClient::from_config(config)?;
    let mut controller = AvatarRequestController::new(config.image_options());

    let locator = controller
        .generate_and_wait(&client, prompt, config.image_delay())
        .await
        .map(str::to_string);

    match locator {
        Some(locator) => {
            println!("{locator}");
            Ok(())
        }
        None if prompt.trim().is_empty() => bail!("nothing to generate: prompt is empty"),
        None => bail!("{}", controller.error().unwrap_or("image generation failed")),
    }
}

fn show_config() -> Result<()> {
    let path = Config::get_config_path()?;
    let config = if path.exists() {
        Config::load_from(&path)?
    } else {
        let config = Config::default();
        config.save()?;
        println!("Created {}", path.display());
        config
    };

    println!("Config file:  {}", path.display());
    println!("API key:      {}", config.key_source().unwrap_or("not set (GEMINI_API_KEY)"));
    println!("Model:        {}", config.model);
    println!("API base URL: {}", config.api_base_url);
    println!("Image URL:    {}", config.image_base_url);
    println!(
        "Image size:   {}x{} (watermark {})",
        config.image_width,
        config.image_height,
        if config.suppress_watermark { "off" } else { "on" }
    );
    println!(
        "Image wait:   {} ms{}",
        config.image_delay_ms,
        if config.verify_images { ", then verified" } else { "" }
    );
    Ok(())
}
