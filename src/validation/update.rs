//! Update Rules
//!
//! Compare a submitted document with the stored version of the same match.
//! Identity and ground-rule fields never change; history arrays only grow.

use serde_json::Value;

use crate::core::symbol::symbol_set;
use crate::matches::document::MatchDocument;
use crate::matches::fields;

use super::error::ValidationError;

/// How an array may change length between versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Growth {
    /// Length is fixed once present.
    Fixed,
    /// New elements may be appended; none removed.
    AppendOnly,
}

/// How two elements at the same index are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    /// Exact JSON equality.
    Literal,
    /// Same set of top-level state facts.
    SymbolSet,
}

#[derive(Debug, Clone, Copy)]
struct ArrayRule {
    field: &'static str,
    growth: Growth,
    comparison: Comparison,
    /// An element may change from `""` to a non-empty string.
    allow_reveal: bool,
}

impl ArrayRule {
    const fn new(field: &'static str, growth: Growth, comparison: Comparison) -> Self {
        Self { field, growth, comparison, allow_reveal: false }
    }

    const fn revealing(mut self) -> Self {
        self.allow_reveal = true;
        self
    }
}

const FORWARD_ONLY_RULES: &[ArrayRule] = &[
    ArrayRule::new(fields::GAME_ROLE_NAMES, Growth::Fixed, Comparison::Literal),
    ArrayRule::new(fields::IS_PLAYER_HUMAN, Growth::Fixed, Comparison::Literal),
    ArrayRule::new(fields::PLAYER_NAMES_FROM_HOST, Growth::Fixed, Comparison::Literal).revealing(),
    ArrayRule::new(fields::MOVES, Growth::AppendOnly, Comparison::Literal),
    ArrayRule::new(fields::ERRORS, Growth::AppendOnly, Comparison::Literal),
    ArrayRule::new(fields::STATE_TIMES, Growth::AppendOnly, Comparison::Literal),
    ArrayRule::new(fields::STATES, Growth::AppendOnly, Comparison::SymbolSet),
];

fn render(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "absent".to_string(),
    }
}

/// Identity and ground-rule fields are identical in both versions.
pub(crate) fn check_invariants(
    old: &MatchDocument,
    new: &MatchDocument,
) -> Result<(), ValidationError> {
    for &field in fields::INVARIANT_FIELDS {
        let (before, after) = (old.get(field), new.get(field));
        if before != after {
            return Err(ValidationError::new(format!(
                "{} changed from {} to {}",
                field,
                render(before),
                render(after)
            )));
        }
    }
    Ok(())
}

/// History only moves forward and a completed match stays completed.
pub(crate) fn check_forward_only(
    old: &MatchDocument,
    new: &MatchDocument,
) -> Result<(), ValidationError> {
    if old.optional_bool(fields::IS_COMPLETED)? == Some(true)
        && new.optional_bool(fields::IS_COMPLETED)? != Some(true)
    {
        return Err(ValidationError::new(format!(
            "match is completed; isCompleted cannot become {}",
            render(new.get(fields::IS_COMPLETED))
        )));
    }

    for rule in FORWARD_ONLY_RULES {
        check_array(rule, old, new)?;
    }
    Ok(())
}

fn check_array(
    rule: &ArrayRule,
    old: &MatchDocument,
    new: &MatchDocument,
) -> Result<(), ValidationError> {
    let before = match old.optional_array(rule.field)? {
        Some(before) => before,
        None => return Ok(()),
    };
    let after = new
        .optional_array(rule.field)?
        .ok_or_else(|| ValidationError::new(format!("{} was removed", rule.field)))?;

    match rule.growth {
        Growth::Fixed if after.len() != before.len() => {
            return Err(ValidationError::new(format!(
                "{} changed length from {} to {}",
                rule.field,
                before.len(),
                after.len()
            )));
        }
        Growth::AppendOnly if after.len() < before.len() => {
            return Err(ValidationError::new(format!(
                "{} shrank from {} to {}",
                rule.field,
                before.len(),
                after.len()
            )));
        }
        _ => {}
    }

    for (i, (was, now)) in before.iter().zip(after).enumerate() {
        if !elements_match(rule, was, now, i)? {
            return Err(ValidationError::new(format!(
                "{}[{}] changed from {} to {}",
                rule.field, i, was, now
            )));
        }
    }
    Ok(())
}

fn elements_match(
    rule: &ArrayRule,
    was: &Value,
    now: &Value,
    index: usize,
) -> Result<bool, ValidationError> {
    match rule.comparison {
        Comparison::Literal => {
            if was == now {
                return Ok(true);
            }
            let revealed = matches!(
                (was, now),
                (Value::String(a), Value::String(b)) if a.is_empty() && !b.is_empty()
            );
            Ok(rule.allow_reveal && revealed)
        }
        Comparison::SymbolSet => {
            let (a, b) = match (was.as_str(), now.as_str()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Ok(was == now),
            };
            let parse = |text: &str| {
                symbol_set(text).map_err(|e| {
                    ValidationError::new(format!(
                        "{}[{}] is not a valid state: {}",
                        rule.field, index, e
                    ))
                })
            };
            Ok(parse(a)? == parse(b)?)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::fixtures::{advance, base_match, doc, two_player_match};
    use serde_json::json;

    fn forward(old: Value, new: Value) -> Result<(), ValidationError> {
        check_forward_only(&doc(old), &doc(new))
    }

    #[test]
    fn test_identical_documents_pass() {
        let value = two_player_match(2);
        assert_eq!(check_invariants(&doc(value.clone()), &doc(value.clone())), Ok(()));
        assert_eq!(forward(value.clone(), value), Ok(()));
    }

    #[test]
    fn test_adding_host_key_breaks_invariants() {
        let mut signed = base_match();
        signed["matchHostPK"] = json!("0MIIBIjAN");
        let err = check_invariants(&doc(base_match()), &doc(signed)).unwrap_err();
        assert!(err.reason.starts_with("matchHostPK changed from absent"), "{}", err);
    }

    #[test]
    fn test_each_invariant_field_checked() {
        for (field, value) in [
            ("matchId", json!("m2")),
            ("startTime", json!(1_300_000_000_001_i64)),
            ("randomToken", json!("zzzzzzzzzzzz")),
            ("startClock", json!(31)),
            ("playClock", json!(11)),
            ("gameMetaURL", json!("http://x/game/v2")),
            ("gameName", json!("chess")),
            ("gameRulesheetHash", json!("abc")),
        ] {
            let mut changed = base_match();
            changed[field] = value;
            let err = check_invariants(&doc(base_match()), &doc(changed)).unwrap_err();
            assert!(err.reason.starts_with(field), "{}", err);
        }
    }

    #[test]
    fn test_lock_step_append_passes() {
        let old = two_player_match(2);
        let new = advance(old.clone(), 2);
        assert_eq!(forward(old, new), Ok(()));
    }

    #[test]
    fn test_truncation_fails() {
        let old = two_player_match(2);
        for field in ["moves", "stateTimes", "states"] {
            let mut new = old.clone();
            new[field].as_array_mut().unwrap().pop();
            let err = forward(old.clone(), new).unwrap_err();
            assert!(err.reason.contains("shrank"), "{}: {}", field, err);
        }
    }

    #[test]
    fn test_permuted_state_is_unchanged() {
        let mut old = base_match();
        old["states"] = json!(["(a b c)"]);
        let mut new = old.clone();
        new["states"] = json!(["(c a b)"]);
        assert_eq!(forward(old, new), Ok(()));
    }

    #[test]
    fn test_permuted_move_is_rejected() {
        let mut old = two_player_match(1);
        old["moves"] = json!([["(a b c)", "noop"]]);
        let mut new = old.clone();
        new["moves"] = json!([["(c a b)", "noop"]]);
        let err = forward(old, new).unwrap_err();
        assert!(err.reason.starts_with("moves[0]"), "{}", err);
    }

    #[test]
    fn test_changed_state_fact_is_rejected() {
        let old = two_player_match(1);
        let mut new = old.clone();
        new["states"][1] = json!("((cell 1 1 o) (step 1) (control oplayer))");
        assert!(forward(old, new).unwrap_err().reason.starts_with("states[1]"));
    }

    #[test]
    fn test_unparseable_state_is_rejected() {
        let old = two_player_match(1);
        let mut new = old.clone();
        new["states"][0] = json!("((cell 1 1 b)");
        assert!(forward(old, new).unwrap_err().reason.contains("not a valid state"));
    }

    #[test]
    fn test_deeply_nested_state_is_an_error() {
        let depth = 100_000;
        let mut old = base_match();
        old["states"] = json!([format!("{}{}", "(".repeat(depth), ")".repeat(depth))]);
        let err = forward(old.clone(), old).unwrap_err();
        assert!(err.reason.contains("nested too deeply"), "{}", err);
    }

    #[test]
    fn test_fixed_length_fields() {
        let mut old = two_player_match(1);
        old["isPlayerHuman"] = json!([true, false]);
        let mut new = old.clone();
        new["isPlayerHuman"] = json!([true, false, false]);
        assert!(forward(old.clone(), new).unwrap_err().reason.contains("changed length"));

        let mut new = old.clone();
        new["gameRoleNames"] = json!(["oplayer", "xplayer"]);
        assert!(forward(old, new).is_err());
    }

    #[test]
    fn test_absent_to_present_allowed_but_not_back() {
        let old = two_player_match(1);
        let mut new = old.clone();
        new["errors"] = json!([["", ""], ["", ""]]);
        assert_eq!(forward(old.clone(), new.clone()), Ok(()));

        assert_eq!(forward(new, old).unwrap_err().reason, "errors was removed");
    }

    #[test]
    fn test_errors_are_append_only() {
        let mut old = two_player_match(1);
        old["errors"] = json!([["", ""], ["", ""]]);
        let mut new = advance(old.clone(), 1);
        new["errors"] = json!([["", ""], ["", ""], ["timeout", ""]]);
        assert_eq!(forward(old.clone(), new), Ok(()));

        let mut rewritten = old.clone();
        rewritten["errors"][1][1] = json!("illegal move");
        assert!(forward(old, rewritten).is_err());
    }

    #[test]
    fn test_player_names_may_be_revealed_once() {
        let mut old = two_player_match(1);
        old["playerNamesFromHost"] = json!(["", "bob"]);
        let mut new = old.clone();
        new["playerNamesFromHost"] = json!(["alice", "bob"]);
        assert_eq!(forward(old, new.clone()), Ok(()));

        let mut renamed = new.clone();
        renamed["playerNamesFromHost"] = json!(["carol", "bob"]);
        assert!(forward(new.clone(), renamed).is_err());

        let mut hidden = new.clone();
        hidden["playerNamesFromHost"] = json!(["", "bob"]);
        assert!(forward(new, hidden).is_err());
    }

    #[test]
    fn test_reveal_exception_only_for_player_names() {
        let mut old = two_player_match(1);
        old["gameRoleNames"] = json!(["", "oplayer"]);
        let mut new = old.clone();
        new["gameRoleNames"] = json!(["xplayer", "oplayer"]);
        assert!(forward(old, new).is_err());
    }

    #[test]
    fn test_completed_match_cannot_reopen() {
        let mut old = two_player_match(2);
        old["isCompleted"] = json!(true);

        let mut reopened = advance(old.clone(), 2);
        reopened["isCompleted"] = json!(false);
        let err = forward(old.clone(), reopened).unwrap_err();
        assert!(err.reason.contains("completed"), "{}", err);

        let mut dropped = old.clone();
        dropped.as_object_mut().unwrap().remove("isCompleted");
        assert!(forward(old.clone(), dropped).is_err());

        assert_eq!(forward(old.clone(), old), Ok(()));
    }
}
