//! GGP Spectator Server
//!
//! Runs the submission pipeline against an in-memory store and replays a
//! short demo match through it, the way a game host would report one.

use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ggp_spectator::{
    core::clock::{Clock, SystemClock},
    InMemoryMatchStore, MatchValidator, SpectatorConfig, SubmissionOutcome, UpdateCoordinator,
    VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let level = if cfg!(feature = "debug-tracing") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string())),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("GGP Spectator Server v{}", VERSION);

    let config = SpectatorConfig::from_env();
    info!(
        "Allowed repositories: {}",
        if config.allowed_repositories.is_empty() {
            "any".to_string()
        } else {
            config.allowed_repositories.join(", ")
        }
    );
    info!("Feed capacity: {}", config.feed_capacity);

    let coordinator = UpdateCoordinator::new(
        config,
        MatchValidator::default(),
        Arc::new(InMemoryMatchStore::new()),
    );

    let mut updates = coordinator.subscribe();
    let spectator = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => info!(
                    key = %update.key,
                    completed = update.completed,
                    "spectators notified"
                ),
                Err(RecvError::Lagged(missed)) => warn!("spectator lagged, missed {} updates", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    demo_match(&coordinator)?;

    drop(coordinator);
    spectator.await?;
    Ok(())
}

/// Report a short two-player match the way a host would.
fn demo_match(coordinator: &UpdateCoordinator<InMemoryMatchStore>) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let start = SystemClock.now_millis();
    let auth_token = uuid::Uuid::new_v4().to_string();
    let mut value = json!({
        "matchId": "demo.ticTacToe",
        "startTime": start,
        "randomToken": uuid::Uuid::new_v4().simple().to_string(),
        "startClock": 30,
        "playClock": 10,
        "gameMetaURL": "http://games.ggp.org/base/games/ticTacToe/v0/",
        "gameRoleNames": ["xplayer", "oplayer"],
        "playerNamesFromHost": ["", ""],
        "states": ["((control xplayer) (cell 1 1 b) (cell 1 2 b) (cell 1 3 b))"],
        "moves": [],
        "stateTimes": [start]
    });

    let outcome = coordinator.submit(&value.to_string(), &auth_token)?;
    let key = outcome.key().clone();
    info!("Match key: {}", key);

    let plays = [
        ["(mark 1 1)", "noop"],
        ["noop", "(mark 1 2)"],
        ["(mark 1 3)", "noop"],
    ];
    let mut sent = vec![value.clone()];
    for (round, joint_move) in plays.iter().enumerate() {
        value = play_round(value, round, joint_move, start);
        if round == 0 {
            value["playerNamesFromHost"] = json!(["Alice", "Bob"]);
        }
        coordinator.submit(&value.to_string(), &auth_token)?;
        sent.push(value.clone());
    }

    // A stale retransmission from a host is acknowledged but dropped.
    let stale = &sent[sent.len() - 2];
    match coordinator.submit(&stale.to_string(), &auth_token)? {
        SubmissionOutcome::Discarded(_) => info!("Stale update discarded"),
        other => warn!("Stale update unexpectedly accepted: {:?}", other),
    }

    value["isCompleted"] = json!(true);
    value["goalValues"] = json!([100, 0]);
    coordinator.submit(&value.to_string(), &auth_token)?;

    info!("=== Match Results ===");
    if let Some(document) = coordinator.latest(&key)? {
        info!("Final document: {}", document.to_json_string());
    }
    for entry in coordinator.recent_matches()? {
        info!("Recent: {} at {}", entry.key, entry.updated_at);
    }
    Ok(())
}

fn play_round(mut value: Value, round: usize, joint_move: &[&str; 2], start: i64) -> Value {
    let marker = if round % 2 == 0 { "x" } else { "o" };
    let control = if round % 2 == 0 { "oplayer" } else { "xplayer" };
    let state = format!(
        "((control {}) (cell 1 1 {}) (step {}))",
        control,
        marker,
        round + 1
    );
    let at = start + 1_000 * (round as i64 + 1);

    if let Some(states) = value["states"].as_array_mut() {
        states.push(json!(state));
    }
    if let Some(moves) = value["moves"].as_array_mut() {
        moves.push(json!(joint_move));
    }
    if let Some(times) = value["stateTimes"].as_array_mut() {
        times.push(json!(at));
    }
    value
}
