//! Line-oriented stdin front end: drives the selection, triggers captures,
//! and hands finished stills to the user.

use crate::catalog::{AssetFetcher, TextureCatalog};
use crate::overlay::{BlendIntensity, SelectionCell};
use crate::snapshot::{deliver, CaptureOutcome, CaptureSession, Delivery, SessionState};
use anyhow::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Iris(String),
    Density(BlendIntensity),
    Capture,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`; try list, iris <id>, density <0.2|0.4|0.7>, capture, quit")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("{0}")]
    BadIntensity(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Command::Capture);
        };
        let arg = words.next();

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(Command::List),
            "capture" | "c" => Ok(Command::Capture),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "iris" => arg
                .map(|id| Command::Iris(id.to_string()))
                .ok_or(CommandError::MissingArgument("iris")),
            "density" => {
                let value = arg.ok_or(CommandError::MissingArgument("density"))?;
                value
                    .parse()
                    .map(Command::Density)
                    .map_err(CommandError::BadIntensity)
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Where finished captures go
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    pub dir: PathBuf,
    pub share: bool,
}

/// Read commands until `quit` or end of input.
pub async fn run<F>(
    catalog: Arc<TextureCatalog>,
    selection: Arc<SelectionCell>,
    session: Arc<CaptureSession<F>>,
    delivery: DeliveryOptions,
) -> Result<()>
where
    F: AssetFetcher + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_state = session.subscribe();
    let (outcome_tx, mut outcomes) = mpsc::unbounded_channel();
    let mut shown_countdown = None;

    print_catalog(&catalog, &selection);
    println!("Press Enter to capture, or type a command (list, iris <id>, density <value>, quit).");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(Command::List) => print_catalog(&catalog, &selection),
                    Ok(Command::Iris(id)) => {
                        if catalog.texture(&id).is_some() {
                            selection.select_texture(id);
                        } else {
                            println!("No loaded iris texture with id `{id}`");
                        }
                    }
                    Ok(Command::Density(intensity)) => selection.set_intensity(intensity),
                    Ok(Command::Capture) => match session.trigger() {
                        Ok(handle) => {
                            let tx = outcome_tx.clone();
                            tokio::spawn(async move {
                                match handle.await {
                                    Ok(outcome) => {
                                        let _ = tx.send(outcome);
                                    }
                                    Err(err) => tracing::error!("Capture task failed: {}", err),
                                }
                            });
                        }
                        Err(rejected) => println!("Capture not started: {rejected}"),
                    },
                    Err(err) => println!("{err}"),
                }
            }
            changed = session_state.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *session_state.borrow_and_update();
                match state {
                    SessionState::Running { countdown, .. } => {
                        if countdown > 0 && shown_countdown != Some(countdown) {
                            println!("{countdown}...");
                        }
                        shown_countdown = Some(countdown);
                    }
                    SessionState::Idle => shown_countdown = None,
                }
            }
            Some(outcome) = outcomes.recv() => {
                // Saving and opening touch the disk; keep them off the input loop
                let delivery = delivery.clone();
                tokio::task::spawn_blocking(move || present(outcome, &delivery));
            }
        }
    }

    Ok(())
}

fn print_catalog(catalog: &TextureCatalog, selection: &SelectionCell) {
    let current = selection.latest();
    println!("Iris textures:");
    for record in catalog.records() {
        let marker = if record.id == current.texture_id { '*' } else { ' ' };
        println!(" {marker} {:<12} {}", record.id, record.title);
    }
    println!("Density: {}", current.intensity);
}

fn present(outcome: CaptureOutcome, options: &DeliveryOptions) {
    match outcome {
        CaptureOutcome::Artifact(mut artifact) => {
            let taken = artifact.created_at().format("%H:%M:%S").to_string();
            match deliver(&mut artifact, &options.dir, options.share) {
                Ok(delivery) => {
                    let verb = match delivery {
                        Delivery::Shared(_) => "opened",
                        Delivery::Saved(_) => "saved",
                    };
                    let location = artifact.url().unwrap_or_default();
                    println!("Capture from {taken} {verb}: {location}");
                }
                Err(err) => {
                    tracing::error!("Failed to save capture: {}", err);
                    println!("Could not save the capture ({err}). Try again.");
                }
            }
        }
        CaptureOutcome::NoArtifact(failure) => {
            println!("Capture failed: {failure}. Try again.");
        }
    }
}
