//! Single-threaded event loop.
//!
//! stdin lines, fetch results and Ctrl-C all arrive as `RuntimeMessage`s on
//! one channel. The loop thread owns the session; fetch workers only send.

use crate::commands::{self, HELP, Input};
use crate::render;
use anyhow::{Context, Result};
use quran_reader_core::config::AppConfig;
use quran_reader_core::controller::{FetchRequest, FetchResponse, FetchTarget};
use quran_reader_core::gateway::{AlQuranCloudGateway, ContentGateway};
use quran_reader_core::playback::RodioOutput;
use quran_reader_core::session::{ReaderSession, SessionEvent};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub enum RuntimeMessage {
    Input(String),
    Fetched(FetchResponse),
    Quit,
}

pub fn run(config: AppConfig) -> Result<()> {
    let gateway: Arc<dyn ContentGateway> =
        Arc::new(AlQuranCloudGateway::from_config(&config).context("Building content gateway")?);
    let output = RodioOutput::new(Duration::from_secs(config.request_timeout_secs))?;
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let mut session = ReaderSession::open(config, gateway, Box::new(output));

    let (tx, rx) = mpsc::channel();
    let quit_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = quit_tx.send(RuntimeMessage::Quit);
    })
    .context("Installing Ctrl-C handler")?;
    spawn_stdin_reader(tx.clone())?;

    println!("type 'help' for commands");
    let startup = session.startup_requests();
    dispatch(&session, &tx, startup);

    loop {
        match rx.recv_timeout(poll_interval) {
            Ok(RuntimeMessage::Input(line)) => {
                if !handle_line(&mut session, &tx, &line) {
                    break;
                }
            }
            Ok(RuntimeMessage::Fetched(response)) => {
                let target = response.target;
                let event = session.on_fetch_complete(response);
                if target != FetchTarget::SectionList || event.snapshot.error.is_some() {
                    render::print_listing(&event.snapshot);
                }
            }
            Ok(RuntimeMessage::Quit) => {
                info!("Quit requested");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if session.tick() {
                    render::print_status(&session.snapshot());
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    session.shutdown();
    Ok(())
}

/// Returns false when the loop should exit.
fn handle_line(session: &mut ReaderSession, tx: &Sender<RuntimeMessage>, line: &str) -> bool {
    let input = match commands::parse_line(line) {
        Ok(Some(input)) => input,
        Ok(None) => return true,
        Err(err) => {
            println!("! {err:#}");
            return true;
        }
    };
    match input {
        Input::Session(command) => {
            let event = session.apply_command(command);
            report(&event);
            dispatch(session, tx, event.fetches);
        }
        Input::ShowSections => render::print_sections(&session.snapshot()),
        Input::ShowBookmarks => render::print_bookmarks(&session.snapshot()),
        Input::ShowStatus => render::print_status(&session.snapshot()),
        Input::ShowJson => match serde_json::to_string_pretty(&session.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => warn!("Failed to serialize snapshot: {err}"),
        },
        Input::Help => println!("{HELP}"),
        Input::Quit => return false,
    }
    true
}

fn report(event: &SessionEvent) {
    debug!(action = event.action, fetches = event.fetches.len(), "Applied command");
    let snapshot = &event.snapshot;
    match event.action {
        "reader_set_search_filter" => render::print_sections(snapshot),
        "reader_toggle_bookmark" | "reader_update_note" | "reader_save_note" => {
            render::print_bookmarks(snapshot)
        }
        _ if event.fetches.is_empty() => render::print_status(snapshot),
        _ => {}
    }
}

fn dispatch(session: &ReaderSession, tx: &Sender<RuntimeMessage>, requests: Vec<FetchRequest>) {
    for request in requests {
        let gateway = session.gateway();
        let worker_tx = tx.clone();
        let worker_request = request.clone();
        let spawned = thread::Builder::new()
            .name("content-fetch".to_string())
            .spawn(move || {
                let response = worker_request.execute(gateway.as_ref());
                let _ = worker_tx.send(RuntimeMessage::Fetched(response));
            });
        if let Err(err) = spawned {
            warn!("Failed to spawn fetch worker, fetching inline: {err}");
            let response = request.execute(session.gateway().as_ref());
            let _ = tx.send(RuntimeMessage::Fetched(response));
        }
    }
}

fn spawn_stdin_reader(tx: Sender<RuntimeMessage>) -> Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(RuntimeMessage::Input(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!("Failed to read stdin: {err}");
                        break;
                    }
                }
            }
            let _ = tx.send(RuntimeMessage::Quit);
        })
        .context("Spawning stdin reader")?;
    Ok(())
}
