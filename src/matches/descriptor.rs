//! Typed view of a match document.
//!
//! A [`MatchDescriptor`] exists only for documents whose known fields all
//! decode to their schema types. Vendor `x-` fields are not part of the view.

use serde_json::Value;

use super::document::{
    expect_array_of, expect_bool, expect_i64, expect_str, MatchDocument,
    SchemaError,
};
use super::fields;

/// Schema-checked borrow of a [`MatchDocument`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDescriptor<'a> {
    /// Match identifier.
    pub match_id: &'a str,
    /// Start time (epoch ms).
    pub start_time: i64,
    /// Random token.
    pub random_token: &'a str,
    /// Start clock (seconds).
    pub start_clock: i64,
    /// Play clock (seconds).
    pub play_clock: i64,
    /// Versioned game metadata URL.
    pub game_meta_url: &'a str,
    /// State history, initial state first.
    pub states: Vec<&'a str>,
    /// One entry per round, one move per player.
    pub moves: Vec<Vec<&'a str>>,
    /// Time each state was reached (epoch ms).
    pub state_times: Vec<i64>,
    /// Per-state, per-player errors.
    pub errors: Option<Vec<Vec<&'a str>>>,
    /// Final goal values, one per player.
    pub goal_values: Option<Vec<i64>>,
    /// Completion flag.
    pub is_completed: Option<bool>,
    /// Abort flag.
    pub is_aborted: Option<bool>,
    /// Role names.
    pub game_role_names: Option<Vec<&'a str>>,
    /// Player names reported by the host.
    pub player_names_from_host: Option<Vec<&'a str>>,
    /// Human flags.
    pub is_player_human: Option<Vec<bool>>,
    /// Host public key.
    pub match_host_pk: Option<&'a str>,
    /// Host signature.
    pub match_host_signature: Option<&'a str>,
    /// Game name.
    pub game_name: Option<&'a str>,
    /// Rulesheet hash.
    pub game_rulesheet_hash: Option<&'a str>,
    /// Tournament name.
    pub tournament_name_from_host: Option<&'a str>,
    /// Analysis clock (seconds).
    pub analysis_clock: Option<i64>,
    /// Preview clock (seconds).
    pub preview_clock: Option<i64>,
    /// Ranking weight.
    pub weight: Option<f64>,
    /// Scrambled flag.
    pub scrambled: Option<bool>,
}

fn string_rows<'a>(value: &'a Value, path: &str) -> Result<Vec<Vec<&'a str>>, SchemaError> {
    expect_array_of(value, path, |row, row_path| expect_array_of(row, row_path, expect_str))
}

fn optional_with<'a, T>(
    doc: &'a MatchDocument,
    name: &str,
    decode: impl Fn(&'a Value, &str) -> Result<T, SchemaError>,
) -> Result<Option<T>, SchemaError> {
    doc.field(name)
        .optional(name)?
        .map(|value| decode(value, name))
        .transpose()
}

impl<'a> MatchDescriptor<'a> {
    /// Decode every known field of `doc`.
    pub fn decode(doc: &'a MatchDocument) -> Result<Self, SchemaError> {
        // Presence of every required field is reported before any type error.
        for name in fields::REQUIRED_FIELDS {
            doc.field(name).require(name)?;
        }

        let states_value = doc.field(fields::STATES).require(fields::STATES)?;
        let moves_value = doc.field(fields::MOVES).require(fields::MOVES)?;
        let times_value = doc.field(fields::STATE_TIMES).require(fields::STATE_TIMES)?;

        Ok(Self {
            match_id: doc.required_str(fields::MATCH_ID)?,
            start_time: doc.required_i64(fields::START_TIME)?,
            random_token: doc.required_str(fields::RANDOM_TOKEN)?,
            start_clock: doc.required_i64(fields::START_CLOCK)?,
            play_clock: doc.required_i64(fields::PLAY_CLOCK)?,
            game_meta_url: doc.required_str(fields::GAME_META_URL)?,
            states: expect_array_of(states_value, fields::STATES, expect_str)?,
            moves: string_rows(moves_value, fields::MOVES)?,
            state_times: expect_array_of(times_value, fields::STATE_TIMES, expect_i64)?,
            errors: optional_with(doc, fields::ERRORS, string_rows)?,
            goal_values: optional_with(doc, fields::GOAL_VALUES, |v, p| {
                expect_array_of(v, p, expect_i64)
            })?,
            is_completed: doc.optional_bool(fields::IS_COMPLETED)?,
            is_aborted: doc.optional_bool(fields::IS_ABORTED)?,
            game_role_names: optional_with(doc, fields::GAME_ROLE_NAMES, |v, p| {
                expect_array_of(v, p, expect_str)
            })?,
            player_names_from_host: optional_with(doc, fields::PLAYER_NAMES_FROM_HOST, |v, p| {
                expect_array_of(v, p, expect_str)
            })?,
            is_player_human: optional_with(doc, fields::IS_PLAYER_HUMAN, |v, p| {
                expect_array_of(v, p, expect_bool)
            })?,
            match_host_pk: doc.optional_str(fields::MATCH_HOST_PK)?,
            match_host_signature: doc.optional_str(fields::MATCH_HOST_SIGNATURE)?,
            game_name: doc.optional_str(fields::GAME_NAME)?,
            game_rulesheet_hash: doc.optional_str(fields::GAME_RULESHEET_HASH)?,
            tournament_name_from_host: doc.optional_str(fields::TOURNAMENT_NAME_FROM_HOST)?,
            analysis_clock: doc.optional_i64(fields::ANALYSIS_CLOCK)?,
            preview_clock: doc.optional_i64(fields::PREVIEW_CLOCK)?,
            weight: doc.optional_number(fields::WEIGHT)?,
            scrambled: doc.optional_bool(fields::SCRAMBLED)?,
        })
    }

    /// Number of players implied by the first round of moves, if any.
    pub fn players_from_moves(&self) -> Option<usize> {
        self.moves.first().map(|round| round.len())
    }

    /// Has the host marked this match completed?
    pub fn completed(&self) -> bool {
        self.is_completed == Some(true)
    }
}
