//! Wire events exchanged with clients.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`;
//! payload-less events omit `data`.

use battle_core::{Health, PlayerId, TurnCounter};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Event sent by a client. Every variant names the sending player.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Setup { address: PlayerId },
    PlayerAttack { address: PlayerId },
    PlayerDefend { address: PlayerId },
    ResetBattle { address: PlayerId },
}

impl ClientEvent {
    pub fn address(&self) -> &PlayerId {
        match self {
            ClientEvent::Setup { address }
            | ClientEvent::PlayerAttack { address }
            | ClientEvent::PlayerDefend { address }
            | ClientEvent::ResetBattle { address } => address,
        }
    }
}

/// Event pushed to a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Connected,
    BattleStart,
    #[serde(rename_all = "camelCase")]
    TurnUpdate {
        current_turn: TurnCounter,
        player_turn: bool,
    },
    #[serde(rename_all = "camelCase")]
    HealthUpdate {
        player_health: Health,
        opponent_health: Health,
    },
    BattleEnd { winner: BattleWinner },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Outcome carried by `battleEnd`. Serialized as a bare string: either the
/// winning player's identifier or a fixed sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BattleWinner {
    Player(PlayerId),
    OpponentDisconnected,
    Reset,
    Aborted,
}

impl BattleWinner {
    pub fn as_str(&self) -> &str {
        match self {
            BattleWinner::Player(player) => player.as_str(),
            BattleWinner::OpponentDisconnected => "Opponent disconnected",
            BattleWinner::Reset => "Battle reset",
            BattleWinner::Aborted => "Battle aborted",
        }
    }
}

impl fmt::Display for BattleWinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BattleWinner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
