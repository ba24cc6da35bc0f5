//! # Model Output Parsing
//!
//! Models are asked for a single JSON object naming an action and its
//! arguments, but real outputs wander: prose around the object, single
//! quotes, Python-style literals. Parsing recovers in three tiers and
//! never fails; when nothing salvageable remains the caller gets a fixed
//! ask-again action instead of an error.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Message returned when no tier can recover a structured action.
const FALLBACK_MESSAGE: &str =
    "I'm sorry, I didn't understand that. Could you please rephrase your request?";

/// A structured action recovered from model output.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Merge the given fields into the conversation's booking state.
    UpdateState { args: Map<String, Value> },
    /// Send a message back to the user.
    RespondToUser { message: String },
}

impl AgentAction {
    /// The fixed ask-again action used when parsing cannot recover anything.
    pub fn fallback() -> Self {
        AgentAction::RespondToUser {
            message: FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Wire form carried in a context's `output` slot.
    pub fn to_value(&self) -> Value {
        match self {
            AgentAction::UpdateState { args } => serde_json::json!({
                "action": "update_state",
                "args": args,
            }),
            AgentAction::RespondToUser { message } => serde_json::json!({
                "action": "respond_to_user",
                "args": { "message": message },
            }),
        }
    }

    /// Parse the wire form back out of a context's `output` slot.
    pub fn from_value(value: &Value) -> Option<Self> {
        parse_strict(&value.to_string())
    }
}

#[derive(Deserialize)]
struct WireAction {
    action: String,
    #[serde(default)]
    args: Map<String, Value>,
}

/// Recover an [`AgentAction`] from raw model output.
///
/// Tier 1 parses the trimmed text as a JSON object. Tier 2 retries on the
/// slice between the first `{` and the last `}`, dropping surrounding
/// prose. Tier 3 normalizes common model dialect on that slice (single
/// quotes, `True`/`False`/`None`) and parses once more. If all tiers fail
/// the result is [`AgentAction::fallback`].
pub fn parse_agent_action(raw: &str) -> AgentAction {
    let trimmed = raw.trim();

    if let Some(action) = parse_strict(trimmed) {
        return action;
    }

    let Some(slice) = object_slice(trimmed) else {
        debug!("No JSON object found in model output, using fallback");
        return AgentAction::fallback();
    };

    if let Some(action) = parse_strict(slice) {
        return action;
    }

    if let Some(action) = parse_strict(&normalize_dialect(slice)) {
        debug!("Recovered model output after dialect normalization");
        return action;
    }

    debug!("Model output unparseable at every tier, using fallback");
    AgentAction::fallback()
}

fn parse_strict(text: &str) -> Option<AgentAction> {
    let wire: WireAction = serde_json::from_str(text).ok()?;
    match wire.action.as_str() {
        "update_state" => Some(AgentAction::UpdateState { args: wire.args }),
        "respond_to_user" => {
            let message = wire.args.get("message").and_then(Value::as_str)?;
            Some(AgentAction::RespondToUser {
                message: message.to_string(),
            })
        }
        _ => None,
    }
}

/// The slice from the first `{` to the last `}`, if both are present in
/// order.
fn object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Rewrite Python-flavored literals into JSON. Quote replacement is
/// character-wise and does not honor escapes, which matches the lenient
/// last-resort nature of this tier.
fn normalize_dialect(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix("True") {
            out.push_str("true");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("False") {
            out.push_str("false");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("None") {
            out.push_str("null");
            rest = stripped;
        } else if let Some(c) = rest.chars().next() {
            out.push(if c == '\'' { '"' } else { c });
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_update_state() {
        let action = parse_agent_action(
            r#"{"action": "update_state", "args": {"pickup_location": "airport", "confirmed": true}}"#,
        );
        let AgentAction::UpdateState { args } = action else {
            panic!("expected update_state");
        };
        assert_eq!(args.get("pickup_location").unwrap(), &json!("airport"));
        assert_eq!(args.get("confirmed").unwrap(), &json!(true));
    }

    #[test]
    fn test_strict_respond_to_user() {
        let action = parse_agent_action(
            r#"{"action": "respond_to_user", "args": {"message": "Where to?"}}"#,
        );
        assert_eq!(
            action,
            AgentAction::RespondToUser {
                message: "Where to?".to_string()
            }
        );
    }

    #[test]
    fn test_surrounding_prose_is_dropped() {
        let action = parse_agent_action(
            r#"Sure, here is the action you asked for:
            {"action": "update_state", "args": {"destination": "old town"}}
            Let me know if you need anything else!"#,
        );
        let AgentAction::UpdateState { args } = action else {
            panic!("expected update_state");
        };
        assert_eq!(args.get("destination").unwrap(), &json!("old town"));
    }

    #[test]
    fn test_python_dialect_is_normalized() {
        let action = parse_agent_action(
            "{'action': 'update_state', 'args': {'confirmed': True, 'special_requests': None}}",
        );
        let AgentAction::UpdateState { args } = action else {
            panic!("expected update_state");
        };
        assert_eq!(args.get("confirmed").unwrap(), &json!(true));
        assert_eq!(args.get("special_requests").unwrap(), &Value::Null);
    }

    #[test]
    fn test_garbage_falls_back_to_rephrase() {
        let action = parse_agent_action("here's your data {bad json");
        assert_eq!(action, AgentAction::fallback());
        let AgentAction::RespondToUser { message } = action else {
            panic!("fallback must be respond_to_user");
        };
        assert!(message.contains("rephrase"));
    }

    #[test]
    fn test_unknown_action_name_falls_back() {
        let action = parse_agent_action(r#"{"action": "launch_rocket", "args": {}}"#);
        assert_eq!(action, AgentAction::fallback());
    }

    #[test]
    fn test_wire_value_survives_a_context_hop() {
        let mut args = Map::new();
        args.insert("pickup_time".to_string(), json!("18:30"));
        let action = AgentAction::UpdateState { args };
        assert_eq!(AgentAction::from_value(&action.to_value()), Some(action));
    }

    #[test]
    fn test_empty_output_falls_back() {
        assert_eq!(parse_agent_action(""), AgentAction::fallback());
        assert_eq!(parse_agent_action("   \n  "), AgentAction::fallback());
    }
}
