use crate::models::{clone_interaction::Streamer, redemption::Redemption, reward::Lane};

#[derive(Debug)]
pub enum AppEvent {
    Redemption(Redemption),
    Obs(ObsEvent),
    /// The effect at the head of a lane has run its course.
    EffectComplete(Lane),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObsEvent {
    Connected,
    Disconnected,
    StateLoaded {
        current_scene: String,
        roscodes_item_id: Option<i64>,
        streamer: Streamer,
    },
    SceneChanged(String),
    SceneItemToggled {
        scene_name: String,
        scene_item_id: i64,
        enabled: bool,
    },
}
