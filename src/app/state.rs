use crate::{
    effects::{background::BackgroundQueue, facecam::FacecamQueue},
    models::clone_interaction::Streamer,
};
use rand::{SeedableRng, rngs::StdRng};

/// What we last heard from OBS.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ObsState {
    pub connected: bool,
    pub current_scene: String,
    pub streamer: Streamer,
    pub roscodes_item_id: Option<i64>,
}

/// Everything the reducer owns. Lives on the runner task only.
pub struct AppState {
    pub obs: ObsState,
    pub background: BackgroundQueue,
    pub facecam: FacecamQueue,
    pub rng: StdRng,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            obs: ObsState::default(),
            background: BackgroundQueue::default(),
            facecam: FacecamQueue::default(),
            rng,
        }
    }
}
