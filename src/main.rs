use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use std::io;
use std::path::PathBuf;
use tokio::sync::mpsc;

mod commands;
mod config;
mod ui;
mod utils;

use crate::{
    commands::UserCommand,
    config::Settings,
    ui::{PromptPurpose, TerminalUi, UiAction},
};
use chatline::filter::ViewMode;
use chatline::location::FixedLocation;
use chatline::palette;
use chatline::presenter::{Notice, Presenter};
use chatline::transport::{HttpTransport, PushEvent};
use chatline::{ClientResult, SyncController};

type Controller = SyncController<HttpTransport, TerminalUi>;

/// Seconds a notice stays on screen
const NOTICE_TIMEOUT_SECS: u64 = 8;

/// Command line arguments for chatline
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "chatline: a terminal client for a message history server with live push updates."
)]
struct Args {
    /// Server base URL, e.g. http://localhost:7070 (overrides CHATLINE_SERVER and the settings file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Directory holding settings.json
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    /// Messages per history page
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Fixed position for geo sharing, as "lat,lon"
    #[arg(long, value_name = "LAT,LON")]
    location: Option<String>,

    /// Write the effective settings back to settings.json
    #[arg(long)]
    save: bool,
}

fn effective_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load()?;
    settings.apply_env();

    if let Some(server) = &args.server {
        settings.server_url = server.clone();
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
    if let Some(log_file) = &args.log_file {
        settings.log_file = log_file.clone();
    }
    if let Some(location) = &args.location {
        settings.location = Some(location.clone());
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(dir) = &args.config_dir {
        config::set_config_dir_override(dir.clone());
    }
    let settings = effective_settings(&args)?;

    utils::setup_logging(Some(settings.log_file.as_path()), LevelFilter::Debug)?;
    info!("chatline starting up");
    info!("Logging to file: {}", settings.log_file.display());

    if args.save {
        settings.save()?;
    }

    let location = FixedLocation::new(settings.geo_point()?);
    let mut transport = HttpTransport::new(&settings.server_url)
        .with_context(|| format!("Invalid server address {}", settings.server_url))?;

    println!("Connecting to {}... please wait...\n", settings.server_url);

    let mut chat_ui = TerminalUi::new();

    // Without push we still have history, just no live updates
    let push_rx = match transport.connect_push().await {
        Ok(rx) => Some(rx),
        Err(e) => {
            warn!("Push channel unavailable: {}", e);
            chat_ui.notify(Notice::error(format!("Live updates unavailable: {}", e)));
            None
        }
    };

    let mut controller = SyncController::new(transport, chat_ui)
        .with_page_size(settings.page_size)
        .with_location(Box::new(location));

    if let Err(e) = controller.load_latest().await {
        warn!("Initial history load failed: {}", e);
    }

    let mut terminal = ui::setup_terminal()?;
    let result = run_main_loop(&mut controller, &mut terminal, push_rx).await;
    ui::restore_terminal(terminal)?;

    println!("Chat session ended.");
    result
}

/// Run the main event loop
async fn run_main_loop(
    controller: &mut Controller,
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    mut push_rx: Option<mpsc::Receiver<PushEvent>>,
) -> Result<()> {
    loop {
        refresh_status(controller);
        terminal.draw(|f| controller.presenter().draw(f))?;
        controller.presenter_mut().clean_notices(NOTICE_TIMEOUT_SECS);

        // Apply pushes in arrival order before looking at input
        if let Some(rx) = push_rx.as_mut() {
            while let Ok(event) = rx.try_recv() {
                controller.handle_push(event).await;
            }
        }

        let action = match controller.presenter_mut().handle_input()? {
            Some(action) => action,
            None => continue,
        };

        match action {
            UiAction::Quit | UiAction::Command(UserCommand::Quit) => break,
            action => {
                if let Err(e) = dispatch(controller, action).await {
                    // Already shown to the user by the controller
                    debug!("Action failed: {}", e);
                }
            }
        }
    }

    info!("Leaving main loop");
    Ok(())
}

fn refresh_status(controller: &mut Controller) {
    let view = match &controller.session().view {
        ViewMode::Category(category) => category.to_string(),
        ViewMode::Search(query) => format!("search \"{}\"", query),
    };
    let encryption = controller.encryption_enabled();
    let connected = controller.transport().is_push_open();
    controller.presenter_mut().set_status(&view, encryption, connected);
}

async fn dispatch(controller: &mut Controller, action: UiAction) -> ClientResult<()> {
    match action {
        UiAction::LoadOlder => load_older(controller).await,
        UiAction::Passphrase {
            purpose: PromptPurpose::SendText(text),
            passphrase,
        } => controller.send_text(&text, passphrase.as_deref()).map(|_| ()),
        UiAction::Passphrase {
            purpose: PromptPurpose::Decrypt(id),
            passphrase: Some(passphrase),
        } => controller.decrypt(&id, &passphrase).map(|_| ()),
        UiAction::Passphrase { .. } => Ok(()),
        UiAction::Command(command) => run_command(controller, command).await,
        UiAction::Quit => Ok(()),
    }
}

async fn load_older(controller: &mut Controller) -> ClientResult<()> {
    if !controller.load_older().await? {
        controller
            .presenter_mut()
            .notify(Notice::info("No older messages"));
    }
    Ok(())
}

async fn run_command(controller: &mut Controller, command: UserCommand) -> ClientResult<()> {
    debug!("Running {:?}", command);
    match command {
        UserCommand::Text(text) => {
            if controller.encryption_enabled() {
                controller
                    .presenter_mut()
                    .ask_passphrase(PromptPurpose::SendText(text));
                Ok(())
            } else {
                controller.send_text(&text, None).map(|_| ())
            }
        }
        UserCommand::Filter(category) => {
            controller.set_filter(category);
            Ok(())
        }
        UserCommand::Search(query) => controller.search(&query).await,
        UserCommand::Older => load_older(controller).await,
        UserCommand::Favorite(id) => {
            controller.toggle_favorite(id);
            Ok(())
        }
        UserCommand::Pin(id) => {
            controller.pin(id);
            Ok(())
        }
        UserCommand::Unpin => {
            controller.unpin();
            Ok(())
        }
        UserCommand::Send(paths) => controller.send_files(&paths, false).await.map(|_| ()),
        UserCommand::Zip(paths) => controller.send_files(&paths, true).await.map(|_| ()),
        UserCommand::Voice(path) => controller.send_voice(&path).await,
        UserCommand::Geo => controller.send_geo().await,
        UserCommand::Sticker(index) => controller.send_sticker(index),
        UserCommand::Emoji(index) => {
            let chat_ui = controller.presenter_mut();
            match palette::emoji(index) {
                Some(emoji) => chat_ui.insert_text(emoji),
                None => chat_ui.notify(Notice::error(format!("No emoji #{}", index + 1))),
            }
            Ok(())
        }
        UserCommand::Encrypt => {
            let on = controller.toggle_encryption();
            let text = if on {
                "Encryption on: you will be asked for a passphrase when sending"
            } else {
                "Encryption off"
            };
            controller.presenter_mut().notify(Notice::info(text));
            Ok(())
        }
        UserCommand::Decrypt { id, passphrase } => match passphrase {
            Some(passphrase) => controller.decrypt(&id, &passphrase).map(|_| ()),
            None => {
                controller
                    .presenter_mut()
                    .ask_passphrase(PromptPurpose::Decrypt(id));
                Ok(())
            }
        },
        UserCommand::Import(path) => controller.import_file(&path).await.map(|_| ()),
        UserCommand::Export => {
            let url = controller.export_url();
            controller
                .presenter_mut()
                .notify(Notice::info(format!("Export available at {}", url)));
            Ok(())
        }
        UserCommand::Help => {
            controller.presenter_mut().show_help();
            Ok(())
        }
        UserCommand::Quit => Ok(()),
    }
}
