pub mod background;
pub mod facecam;
pub mod queue;
pub mod requests;

use crate::{
    core::obs::ObsRequest,
    models::{redemption::Redemption, reward::Lane},
};
use std::time::Duration;

/// Side effects requested by the state machines. The runner carries them
/// out; nothing here talks to the network.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Obs(Vec<ObsRequest>),
    /// Marks the head of a lane as finished.
    Complete(Lane),
    WriteToMatrix(Redemption),
    LoadObsState,
    Delayed {
        delay: Duration,
        actions: Vec<Action>,
    },
}

impl Action {
    pub fn after(delay: Duration, actions: Vec<Action>) -> Self {
        Action::Delayed { delay, actions }
    }
}
