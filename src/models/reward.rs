use super::redemption::Redemption;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a channel-point reward does once redeemed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardAction {
    WriteToMatrix,
    Water,
    Throwback,
    Thanos,
    Hulk,
    Mac,
    Technicolor,
    Hacker,
}

/// Effects in the same lane never overlap; they run one after another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    Unqueued,
    Background,
    Facecam,
}

impl RewardAction {
    pub fn lane(self) -> Lane {
        match self {
            RewardAction::WriteToMatrix => Lane::Unqueued,
            RewardAction::Water => Lane::Background,
            RewardAction::Throwback
            | RewardAction::Thanos
            | RewardAction::Hulk
            | RewardAction::Mac
            | RewardAction::Technicolor
            | RewardAction::Hacker => Lane::Facecam,
        }
    }

    /// Name of the scene item enabled in the `Facecam` scene, for facecam
    /// overlays.
    pub fn facecam_item(self) -> Option<&'static str> {
        match self {
            RewardAction::Throwback => Some("Throwback"),
            RewardAction::Thanos => Some("Thanos"),
            RewardAction::Hulk => Some("Hulk"),
            RewardAction::Mac => Some("Mac"),
            RewardAction::Technicolor => Some("Color Change"),
            RewardAction::Hacker => Some("Hacker"),
            RewardAction::WriteToMatrix | RewardAction::Water => None,
        }
    }

    /// How long a facecam overlay occupies its lane.
    pub fn facecam_duration(self) -> Duration {
        match self {
            RewardAction::Hacker => Duration::from_secs(130),
            _ => Duration::from_secs(40),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueuedRedemption {
    pub action: RewardAction,
    pub redemption: Redemption,
}
