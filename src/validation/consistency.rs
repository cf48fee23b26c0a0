//! Internal Consistency
//!
//! Checks a single document against itself: schema, allow-list, array
//! shapes, timestamps and the host signature. Nothing here looks at a
//! previously stored version.

use serde_json::Value;

use crate::core::symbol::symbol_set;
use crate::matches::descriptor::MatchDescriptor;
use crate::matches::document::MatchDocument;
use crate::matches::fields;
use crate::signing::verifier::SignatureVerifier;

use super::error::ConsistencyError;
use super::time::check_reasonable_time;

/// Run every single-document check, failing on the first violation.
pub(crate) fn check_internal_consistency(
    doc: &MatchDocument,
    now_millis: i64,
    verifier: &dyn SignatureVerifier,
) -> Result<(), ConsistencyError> {
    if let Some(path) = doc.as_map().iter().find_map(|(k, v)| find_null(v, k)) {
        return Err(ConsistencyError::new(format!("null value at {}", path)));
    }

    if let Some(unknown) = doc.keys().find(|key| !fields::is_allowed_field(key)) {
        return Err(ConsistencyError::new(format!("unknown field {}", unknown)));
    }

    let desc = MatchDescriptor::decode(doc)?;

    if !is_versioned_url(desc.game_meta_url) {
        return Err(ConsistencyError::new(format!(
            "unversioned game URL {}",
            desc.game_meta_url
        )));
    }

    check_lengths(&desc)?;
    check_states(&desc)?;
    check_player_counts(&desc)?;

    if desc.goal_values.is_some() && !desc.completed() {
        return Err(ConsistencyError::new(
            "goalValues present but isCompleted is not true",
        ));
    }

    check_times(&desc, now_millis)?;
    check_signature(doc, &desc, verifier)
}

/// Path of the first `null` inside `value`, if any.
fn find_null(value: &Value, path: &str) -> Option<String> {
    match value {
        Value::Null => Some(path.to_string()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_null(item, &format!("{}[{}]", path, i))),
        Value::Object(map) => map
            .iter()
            .find_map(|(k, v)| find_null(v, &format!("{}.{}", path, k))),
        _ => None,
    }
}

/// Does the URL end in a version segment `/vN`, optionally followed by `/`?
pub fn is_versioned_url(url: &str) -> bool {
    let url = url.strip_suffix('/').unwrap_or(url);
    let last = match url.rsplit_once('/') {
        Some((_, last)) => last,
        None => return false,
    };
    match last.strip_prefix('v') {
        Some(digits) => !digits.is_empty() && digits.parse::<u64>().is_ok(),
        None => false,
    }
}

fn check_lengths(desc: &MatchDescriptor<'_>) -> Result<(), ConsistencyError> {
    let states = desc.states.len();
    if states == 0 {
        return Err(ConsistencyError::new("states is empty"));
    }
    if desc.state_times.len() != states {
        return Err(ConsistencyError::new(format!(
            "states has {} entries but stateTimes has {}",
            states,
            desc.state_times.len()
        )));
    }
    if desc.moves.len() + 1 != states {
        return Err(ConsistencyError::new(format!(
            "states has {} entries but moves has {}; expected {}",
            states,
            desc.moves.len(),
            states - 1
        )));
    }
    if let Some(errors) = &desc.errors {
        if errors.len() != states {
            return Err(ConsistencyError::new(format!(
                "states has {} entries but errors has {}",
                states,
                errors.len()
            )));
        }
    }
    Ok(())
}

/// Every state is a list of facts, so later updates can be compared to it.
fn check_states(desc: &MatchDescriptor<'_>) -> Result<(), ConsistencyError> {
    for (i, state) in desc.states.iter().enumerate() {
        symbol_set(state).map_err(|e| {
            ConsistencyError::new(format!("states[{}] is not a valid state: {}", i, e))
        })?;
    }
    Ok(())
}

/// Every per-player array must agree on the number of players.
fn check_player_counts(desc: &MatchDescriptor<'_>) -> Result<(), ConsistencyError> {
    let mut sized: Vec<(String, usize)> = Vec::new();

    for (i, round) in desc.moves.iter().enumerate() {
        sized.push((format!("moves[{}]", i), round.len()));
    }
    if let Some(errors) = &desc.errors {
        for (i, row) in errors.iter().enumerate() {
            sized.push((format!("errors[{}]", i), row.len()));
        }
    }
    if let Some(values) = &desc.goal_values {
        sized.push((fields::GOAL_VALUES.to_string(), values.len()));
    }
    if let Some(names) = &desc.player_names_from_host {
        sized.push((fields::PLAYER_NAMES_FROM_HOST.to_string(), names.len()));
    }
    if let Some(roles) = &desc.game_role_names {
        sized.push((fields::GAME_ROLE_NAMES.to_string(), roles.len()));
    }
    if let Some(human) = &desc.is_player_human {
        sized.push((fields::IS_PLAYER_HUMAN.to_string(), human.len()));
    }

    let mut iter = sized.iter();
    let (first_name, players) = match iter.next() {
        Some(first) => first,
        None => return Ok(()),
    };
    for (name, len) in iter {
        if len != players {
            return Err(ConsistencyError::new(format!(
                "player count mismatch: {} has {} but {} has {}",
                first_name, players, name, len
            )));
        }
    }
    Ok(())
}

fn check_times(desc: &MatchDescriptor<'_>, now_millis: i64) -> Result<(), ConsistencyError> {
    check_reasonable_time(desc.start_time, now_millis)
        .map_err(|e| ConsistencyError::new(format!("startTime: {}", e)))?;

    let mut previous = desc.start_time;
    for (i, &time) in desc.state_times.iter().enumerate() {
        check_reasonable_time(time, now_millis)
            .map_err(|e| ConsistencyError::new(format!("stateTimes[{}]: {}", i, e)))?;
        if time < previous {
            return Err(ConsistencyError::new(format!(
                "time sequence goes backward at stateTimes[{}]: {} < {}",
                i, time, previous
            )));
        }
        previous = time;
    }
    Ok(())
}

fn check_signature(
    doc: &MatchDocument,
    desc: &MatchDescriptor<'_>,
    verifier: &dyn SignatureVerifier,
) -> Result<(), ConsistencyError> {
    match (desc.match_host_pk, desc.match_host_signature) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(ConsistencyError::new(
            "matchHostSignature present without matchHostPK",
        )),
        (Some(_), None) => Err(ConsistencyError::new(
            "matchHostPK present without matchHostSignature",
        )),
        (Some(_), Some(_)) => match verifier.verify(doc) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ConsistencyError::new(
                "matchHostSignature does not verify against matchHostPK",
            )),
            Err(e) => Err(ConsistencyError::new(format!(
                "matchHostSignature could not be checked: {}",
                e
            ))),
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================
