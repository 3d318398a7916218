//! Core types used throughout the client
//!
//! Identifiers are opaque strings handed out by the recommendation service.
//! The client never parses them; it only requires them to be non-empty
//! before putting them on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User ID - opaque, server-assigned.
///
/// # Constraints:
/// - **Non-empty** whenever it is sent to the server
/// - **Unique** within one `/users` listing
pub type UserId = String;

/// Ad ID - opaque, server-assigned, unique within the ad inventory
pub type AdId = String;

/// Number of recommendations requested per fetch
pub type TopK = u32;

/// Kind of user/ad interaction the operator can record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    Click,
    View,
    Purchase,
    Ignore,
}

impl InteractionAction {
    pub const ALL: [InteractionAction; 4] = [
        InteractionAction::Click,
        InteractionAction::View,
        InteractionAction::Purchase,
        InteractionAction::Ignore,
    ];

    /// Path segment used by `POST /interaction/{user}/{ad}/{action}`
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::Click => "click",
            InteractionAction::View => "view",
            InteractionAction::Purchase => "purchase",
            InteractionAction::Ignore => "ignore",
        }
    }

    /// Past-tense label for notifications ("user_1 clicked ad_2")
    pub fn label(&self) -> &'static str {
        match self {
            InteractionAction::Click => "clicked",
            InteractionAction::View => "viewed",
            InteractionAction::Purchase => "purchased",
            InteractionAction::Ignore => "ignored",
        }
    }
}

impl fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "invalid action '{}', expected one of: click, view, purchase, ignore",
                    s
                )
            })
    }
}
