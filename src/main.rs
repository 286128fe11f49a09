use anyhow::Result;

mod app;
mod client;
mod config;
mod handler;
mod logging;
mod markdown;
mod message;
mod session;
mod tui;
mod ui;
mod wrap;

use app::App;
use client::IdeaClient;
use config::Config;
use markdown::{MarkdownRenderer, TerminalMarkdown};
use session::Session;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init();

    let config = Config::load()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load config, using defaults");
            Config::new()
        })
        .with_env_overrides();

    let client = IdeaClient::new(config.base_url(), config.request_timeout())?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %client.endpoint(),
        markdown = config.markdown_enabled(),
        "centelha starting"
    );

    let renderer: Option<Box<dyn MarkdownRenderer>> = if config.markdown_enabled() {
        Some(Box::new(TerminalMarkdown))
    } else {
        None
    };
    let mut app = App::new(renderer, config.base_url());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, client).await;

    tui::restore()?;
    if let Err(ref e) = result {
        tracing::error!(error = %e, "event loop failed");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, client: IdeaClient) -> Result<()> {
    let mut events = EventHandler::new();
    let mut session = Session::new(client);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        session.step(app, event).await;
    }

    session.abort();
    Ok(())
}
