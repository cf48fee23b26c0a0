//! Match document field names.

/// Match identifier chosen by the host.
pub const MATCH_ID: &str = "matchId";
/// Epoch milliseconds when the match started.
pub const START_TIME: &str = "startTime";
/// Host-chosen random token disambiguating matches.
pub const RANDOM_TOKEN: &str = "randomToken";
/// Start clock in seconds.
pub const START_CLOCK: &str = "startClock";
/// Play clock in seconds.
pub const PLAY_CLOCK: &str = "playClock";
/// State history, initial state first.
pub const STATES: &str = "states";
/// Per-round joint moves.
pub const MOVES: &str = "moves";
/// Epoch milliseconds at which each state was reached.
pub const STATE_TIMES: &str = "stateTimes";
/// Versioned URL of the game's metadata.
pub const GAME_META_URL: &str = "gameMetaURL";
/// Public key of the match host.
pub const MATCH_HOST_PK: &str = "matchHostPK";
/// Host signature over the document.
pub const MATCH_HOST_SIGNATURE: &str = "matchHostSignature";
/// Whether the match has finished.
pub const IS_COMPLETED: &str = "isCompleted";
/// Whether the match was abandoned.
pub const IS_ABORTED: &str = "isAborted";
/// Final goal value per player.
pub const GOAL_VALUES: &str = "goalValues";
/// Per-state, per-player error strings.
pub const ERRORS: &str = "errors";
/// Role name per player.
pub const GAME_ROLE_NAMES: &str = "gameRoleNames";
/// Player name per player, as reported by the host.
pub const PLAYER_NAMES_FROM_HOST: &str = "playerNamesFromHost";
/// Whether each player is a human.
pub const IS_PLAYER_HUMAN: &str = "isPlayerHuman";
/// Display name of the game.
pub const GAME_NAME: &str = "gameName";
/// Hash of the game rulesheet.
pub const GAME_RULESHEET_HASH: &str = "gameRulesheetHash";
/// Tournament the match belongs to.
pub const TOURNAMENT_NAME_FROM_HOST: &str = "tournamentNameFromHost";
/// Analysis clock in seconds.
pub const ANALYSIS_CLOCK: &str = "analysisClock";
/// Preview clock in seconds.
pub const PREVIEW_CLOCK: &str = "previewClock";
/// Ranking weight.
pub const WEIGHT: &str = "weight";
/// Whether game symbols were scrambled.
pub const SCRAMBLED: &str = "scrambled";

/// Prefix for vendor extension fields, which are never checked.
pub const EXTENSION_PREFIX: &str = "x-";

/// Fields every document must carry.
pub const REQUIRED_FIELDS: &[&str] = &[
    MATCH_ID,
    START_TIME,
    RANDOM_TOKEN,
    START_CLOCK,
    PLAY_CLOCK,
    STATES,
    MOVES,
    STATE_TIMES,
    GAME_META_URL,
];

/// Every field name a document may use besides `x-` extensions.
pub const KNOWN_FIELDS: &[&str] = &[
    MATCH_ID,
    START_TIME,
    RANDOM_TOKEN,
    START_CLOCK,
    PLAY_CLOCK,
    STATES,
    MOVES,
    STATE_TIMES,
    GAME_META_URL,
    MATCH_HOST_PK,
    MATCH_HOST_SIGNATURE,
    IS_COMPLETED,
    IS_ABORTED,
    GOAL_VALUES,
    ERRORS,
    GAME_ROLE_NAMES,
    PLAYER_NAMES_FROM_HOST,
    IS_PLAYER_HUMAN,
    GAME_NAME,
    GAME_RULESHEET_HASH,
    TOURNAMENT_NAME_FROM_HOST,
    ANALYSIS_CLOCK,
    PREVIEW_CLOCK,
    WEIGHT,
    SCRAMBLED,
];

/// Fields that define a match's identity and ground rules; they never
/// change between versions of the same match.
pub const INVARIANT_FIELDS: &[&str] = &[
    MATCH_ID,
    START_TIME,
    RANDOM_TOKEN,
    MATCH_HOST_PK,
    START_CLOCK,
    PLAY_CLOCK,
    GAME_META_URL,
    GAME_NAME,
    GAME_RULESHEET_HASH,
];

/// Is `name` a known field or a vendor extension?
pub fn is_allowed_field(name: &str) -> bool {
    name.starts_with(EXTENSION_PREFIX) || KNOWN_FIELDS.contains(&name)
}
