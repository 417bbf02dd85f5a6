use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::ReactionKind;

/// Button payloads carried in callback data. Encoded as `_`-separated
/// fields: `react_<kind>_<postExternalId>_<commentId>` and
/// `reply_<postExternalId>_<commentId>`. The reaction vocabulary contains
/// no `_`, so the encoding is unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    React {
        kind: ReactionKind,
        post_external_id: i64,
        comment_id: i64,
    },
    Reply {
        post_external_id: i64,
        comment_id: i64,
    },
}

#[derive(Debug, Error)]
#[error("malformed callback payload: {0}")]
pub struct CallbackParseError(pub String);

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::React {
                kind,
                post_external_id,
                comment_id,
            } => format!("react_{}_{}_{}", kind.as_str(), post_external_id, comment_id),
            CallbackAction::Reply {
                post_external_id,
                comment_id,
            } => format!("reply_{}_{}", post_external_id, comment_id),
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for CallbackAction {
    type Err = CallbackParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CallbackParseError(s.to_string());
        let mut parts = s.split('_');

        match parts.next() {
            Some("react") => {
                let kind = parts
                    .next()
                    .and_then(|k| k.parse::<ReactionKind>().ok())
                    .ok_or_else(malformed)?;
                let post_external_id = parse_id(parts.next()).ok_or_else(malformed)?;
                let comment_id = parse_id(parts.next()).ok_or_else(malformed)?;
                if parts.next().is_some() {
                    return Err(malformed());
                }
                Ok(CallbackAction::React {
                    kind,
                    post_external_id,
                    comment_id,
                })
            }
            Some("reply") => {
                let post_external_id = parse_id(parts.next()).ok_or_else(malformed)?;
                let comment_id = parse_id(parts.next()).ok_or_else(malformed)?;
                if parts.next().is_some() {
                    return Err(malformed());
                }
                Ok(CallbackAction::Reply {
                    post_external_id,
                    comment_id,
                })
            }
            _ => Err(malformed()),
        }
    }
}

fn parse_id(field: Option<&str>) -> Option<i64> {
    field.and_then(|f| f.parse::<i64>().ok())
}
