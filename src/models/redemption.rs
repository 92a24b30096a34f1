use super::emote::EmoteData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use twitch_types::UserId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Event data of a `channel-channel_points_custom_reward_redemption-add`
/// message relayed by Tau.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Redemption {
    #[serde(default)]
    pub id: String,
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub user_input_emotes: Option<Vec<EmoteData>>,
    pub reward: Reward,
    #[serde(default)]
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl Redemption {
    pub fn emotes(&self) -> &[EmoteData] {
        self.user_input_emotes.as_deref().unwrap_or_default()
    }
}
