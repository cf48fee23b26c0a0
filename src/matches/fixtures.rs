//! Shared match documents for tests.

use serde_json::{json, Value};

use super::document::MatchDocument;

/// Clock value tests pin "now" to: one day after the base match started.
pub const TEST_NOW_MILLIS: i64 = 1_300_086_400_000;

/// The minimal valid freshly created match.
pub fn base_match() -> Value {
    json!({
        "matchId": "m1",
        "startTime": 1_300_000_000_000_i64,
        "randomToken": "abcdefghijkl",
        "startClock": 30,
        "playClock": 10,
        "gameMetaURL": "http://x/game/v1",
        "states": ["(s0)"],
        "moves": [],
        "stateTimes": [1_300_000_000_000_i64]
    })
}

/// A two-player match that has played `rounds` rounds.
pub fn two_player_match(rounds: usize) -> Value {
    let mut value = base_match();
    value["gameRoleNames"] = json!(["xplayer", "oplayer"]);
    value["states"] = json!(["((cell 1 1 b) (cell 1 2 b) (control xplayer))"]);
    for round in 0..rounds {
        value = advance(value, round);
    }
    value
}

/// Append one round: a state, a joint move and a state time in lock-step.
pub fn advance(mut value: Value, round: usize) -> Value {
    let time = 1_300_000_000_000_i64 + 1_000 * (round as i64 + 1);
    let control = if round % 2 == 0 { "oplayer" } else { "xplayer" };
    let state = format!("((cell 1 1 x) (step {}) (control {}))", round + 1, control);

    value["states"].as_array_mut().unwrap().push(json!(state));
    value["moves"]
        .as_array_mut()
        .unwrap()
        .push(json!([format!("(mark 1 {})", round + 1), "noop"]));
    value["stateTimes"].as_array_mut().unwrap().push(json!(time));
    value
}

/// Wrap a value as a document.
pub fn doc(value: Value) -> MatchDocument {
    MatchDocument::from_value(value).unwrap()
}
