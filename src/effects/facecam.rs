use super::{
    Action,
    queue::EffectQueue,
    requests::{self, FACECAM},
};
use crate::{
    models::reward::{Lane, QueuedRedemption, RewardAction},
    utils::color::Rgb,
};

/// Overlays on the facecam itself. They fight over the same sources, so
/// only one runs at a time.
#[derive(Debug, Default)]
pub struct FacecamQueue {
    queue: EffectQueue<QueuedRedemption>,
}

impl FacecamQueue {
    pub fn enqueue(&mut self, item: QueuedRedemption) -> Vec<Action> {
        match self.queue.push(item) {
            Some(head) => start(head),
            None => {
                tracing::info!("Facecam effect queued, {} waiting", self.queue.len() - 1);
                Vec::new()
            }
        }
    }

    pub fn complete(&mut self) -> Vec<Action> {
        let Some(done) = self.queue.current() else {
            tracing::warn!("Facecam effect finished but none was running");
            return Vec::new();
        };
        tracing::debug!("Facecam effect {:?} finished", done.action);
        match self.queue.advance() {
            Some(next) => start(next),
            None => {
                tracing::debug!("Facecam queue drained");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

fn start(item: &QueuedRedemption) -> Vec<Action> {
    let action = item.action;
    let Some(scene_item) = action.facecam_item() else {
        tracing::warn!("{:?} is not a facecam effect, skipping", action);
        return vec![Action::Complete(Lane::Facecam)];
    };
    tracing::info!(
        "Starting facecam effect {:?} for {}",
        action,
        item.redemption.user_name
    );

    let mut actions = Vec::new();
    if action == RewardAction::Technicolor {
        let color = Rgb::parse_or_fallback(&item.redemption.user_input);
        actions.push(Action::Obs(requests::color_change(color)));
    }
    actions.push(Action::Obs(requests::toggle_scene_item(FACECAM, scene_item, true)));
    actions.push(Action::after(
        action.facecam_duration(),
        vec![Action::Complete(Lane::Facecam)],
    ));
    actions
}
