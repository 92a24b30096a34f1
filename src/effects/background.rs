//! Clone interactions: a recorded clone of the streamer walks in front of a
//! random background while the stream cuts to the alerts scene.
//!
//! The first interaction of a run switches scenes and remembers where the
//! stream was; the scene is only restored once the queue has drained, so
//! back-to-back redemptions play without bouncing between scenes.

use super::{
    Action,
    queue::EffectQueue,
    requests::{self, ALERTS_SCENE, FACECAM_BACKGROUND},
};
use crate::models::{
    clone_interaction::{CloneInteraction, Step, Streamer},
    reward::{Lane, QueuedRedemption, RewardAction},
};
use rand::Rng;
use serde_json::json;
use std::time::Duration;

const SCENE_BLUR_MS: u64 = 750;
/// Swap the background only once the alerts scene has blurred it out.
const BACKGROUND_SWAP_DELAY: Duration = Duration::from_millis(850);

/// What the background queue needs to know about the outside world when an
/// interaction starts.
pub struct Stage<'a, R: Rng> {
    pub current_scene: &'a str,
    pub streamer: Streamer,
    pub water: &'a CloneInteraction,
    pub rng: &'a mut R,
}

#[derive(Debug, Default)]
pub struct BackgroundQueue {
    queue: EffectQueue<QueuedRedemption>,
    active: bool,
    prior_scene: String,
}

impl BackgroundQueue {
    pub fn enqueue<R: Rng>(
        &mut self,
        item: QueuedRedemption,
        stage: Stage<'_, R>,
    ) -> Vec<Action> {
        let started = self.queue.push(item).map(|head| head.action);
        match started {
            Some(action) => self.start(action, stage),
            None => {
                tracing::info!(
                    "Background interaction queued, {} waiting",
                    self.queue.len() - 1
                );
                Vec::new()
            }
        }
    }

    pub fn complete<R: Rng>(&mut self, stage: Stage<'_, R>) -> Vec<Action> {
        if let Some(done) = self.queue.current() {
            tracing::debug!("Background interaction {:?} finished", done.action);
        }
        let next = self.queue.advance().map(|head| head.action);
        match next {
            Some(action) => self.start(action, stage),
            None => self.clear(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    fn start<R: Rng>(&mut self, action: RewardAction, stage: Stage<'_, R>) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.active {
            tracing::info!(
                "Starting background queue from scene {:?}",
                stage.current_scene
            );
            self.prior_scene = stage.current_scene.to_string();
            self.active = true;
            actions.push(Action::Obs(requests::change_scene(ALERTS_SCENE)));
            actions.push(Action::Obs(requests::timed_blur(SCENE_BLUR_MS, 100.0)));
        }

        match action {
            RewardAction::Water => {
                actions.extend(play_interaction(stage.water, stage.streamer, stage.rng));
            }
            other => {
                tracing::warn!("{:?} is not a background interaction, skipping", other);
                actions.push(Action::Complete(Lane::Background));
            }
        }
        actions
    }

    fn clear(&mut self) -> Vec<Action> {
        if !self.active {
            tracing::debug!("Background queue not active, waiting");
            return Vec::new();
        }
        tracing::info!("Clearing background queue, back to {:?}", self.prior_scene);
        let prior_scene = std::mem::take(&mut self.prior_scene);
        self.active = false;
        vec![
            Action::Obs(requests::change_scene(&prior_scene)),
            Action::Obs(requests::timed_blur(SCENE_BLUR_MS, 0.0)),
        ]
    }
}

fn play_interaction<R: Rng>(
    interaction: &CloneInteraction,
    streamer: Streamer,
    rng: &mut R,
) -> Vec<Action> {
    let instances = interaction.instances(streamer);
    if interaction.backgrounds.is_empty() || instances.is_empty() {
        tracing::warn!(
            "Clone interaction {:?} has nothing to play for {:?}",
            interaction.scene_name,
            streamer
        );
        return vec![Action::Complete(Lane::Background)];
    }

    let background = &interaction.backgrounds[rng.gen_range(0..interaction.backgrounds.len())];
    let instance = &instances[rng.gen_range(0..instances.len())];
    tracing::info!("Playing {:?} over {:?}", instance.file_path, background);

    let mut actions = vec![
        Action::after(
            BACKGROUND_SWAP_DELAY,
            vec![Action::Obs(requests::set_input_settings(
                &interaction.bg_image_source_name,
                json!({ "file": background }),
            ))],
        ),
        Action::Obs(requests::set_input_settings(
            &interaction.clone_source_name,
            json!({ "local_file": instance.file_path }),
        )),
        Action::Obs(requests::toggle_scene_item(
            FACECAM_BACKGROUND,
            &interaction.scene_name,
            true,
        )),
    ];

    for step in &instance.steps {
        if let Step::Blur {
            start_ms,
            blur,
            duration_ms,
        } = step
        {
            actions.push(Action::after(
                Duration::from_millis(*start_ms),
                vec![Action::Obs(requests::timed_face_blur(*duration_ms, *blur))],
            ));
        }
    }

    actions.push(Action::after(
        Duration::from_millis(instance.end_ms()),
        vec![
            Action::Obs(requests::fade_out(&interaction.scene_name)),
            Action::Complete(Lane::Background),
        ],
    ));
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        clone_interaction::CloneInstance,
        redemption::{Redemption, Reward},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn water() -> CloneInteraction {
        CloneInteraction {
            scene_name: "Clones - Water".into(),
            clone_source_name: "Clones Water Media".into(),
            bg_image_source_name: "[Img] Clones Water Image BG".into(),
            backgrounds: vec!["kitchen-1.png".into()],
            finite: vec![CloneInstance {
                file_path: "water-finite-1.mp4".into(),
                steps: vec![
                    Step::Blur {
                        start_ms: 12000,
                        blur: 20.0,
                        duration_ms: 5000,
                    },
                    Step::End { end_ms: 48000 },
                ],
            }],
            roscodes: vec![CloneInstance {
                file_path: "water-roscode-1.mp4".into(),
                steps: vec![Step::Blur {
                    start_ms: 8000,
                    blur: 40.0,
                    duration_ms: 2000,
                }],
            }],
        }
    }

    fn item() -> QueuedRedemption {
        QueuedRedemption {
            action: RewardAction::Water,
            redemption: Redemption {
                id: "r1".into(),
                user_id: "1234".into(),
                user_name: "viewer".into(),
                user_input: String::new(),
                user_input_emotes: None,
                reward: Reward {
                    id: "reward".into(),
                    title: "Here is your water!".into(),
                },
                redeemed_at: None,
            },
        }
    }

    fn stage<'a>(
        scene: &'a str,
        streamer: Streamer,
        water: &'a CloneInteraction,
        rng: &'a mut StdRng,
    ) -> Stage<'a, StdRng> {
        Stage {
            current_scene: scene,
            streamer,
            water,
            rng,
        }
    }

    fn completion_delay(actions: &[Action]) -> Option<Duration> {
        actions.iter().find_map(|action| match action {
            Action::Delayed { delay, actions }
                if actions.contains(&Action::Complete(Lane::Background)) =>
            {
                Some(*delay)
            }
            _ => None,
        })
    }

    #[test]
    fn first_interaction_switches_to_alerts() {
        let water = water();
        let mut rng = StdRng::seed_from_u64(7);
        let mut queue = BackgroundQueue::default();

        let actions = queue.enqueue(
            item(),
            stage("Main", Streamer::FiniteSingularity, &water, &mut rng),
        );

        assert!(queue.is_active());
        assert_eq!(actions[0], Action::Obs(requests::change_scene(ALERTS_SCENE)));
        assert_eq!(actions[1], Action::Obs(requests::timed_blur(750, 100.0)));
        assert!(actions.contains(&Action::Obs(requests::set_input_settings(
            "Clones Water Media",
            json!({ "local_file": "water-finite-1.mp4" }),
        ))));
        assert!(actions.contains(&Action::after(
            Duration::from_millis(12000),
            vec![Action::Obs(requests::timed_face_blur(5000, 20.0))],
        )));
        assert_eq!(completion_delay(&actions), Some(Duration::from_millis(48000)));
    }

    #[test]
    fn streamer_picks_the_instance_pool() {
        let water = water();
        let mut rng = StdRng::seed_from_u64(7);
        let mut queue = BackgroundQueue::default();

        let actions = queue.enqueue(
            item(),
            stage("Main", Streamer::Roscodes, &water, &mut rng),
        );
        assert!(actions.contains(&Action::Obs(requests::set_input_settings(
            "Clones Water Media",
            json!({ "local_file": "water-roscode-1.mp4" }),
        ))));
        // No end step: done once the last blur has finished.
        assert_eq!(completion_delay(&actions), Some(Duration::from_millis(10000)));
    }

    #[test]
    fn queued_interactions_stay_in_alerts_until_drained() {
        let water = water();
        let mut rng = StdRng::seed_from_u64(7);
        let mut queue = BackgroundQueue::default();

        let finite = Streamer::FiniteSingularity;

        queue.enqueue(item(), stage("Main", finite, &water, &mut rng));
        let second = queue.enqueue(item(), stage(ALERTS_SCENE, finite, &water, &mut rng));
        assert!(second.is_empty());
        assert_eq!(queue.len(), 2);

        let next = queue.complete(stage(ALERTS_SCENE, finite, &water, &mut rng));
        assert!(!next.contains(&Action::Obs(requests::change_scene(ALERTS_SCENE))));
        assert!(completion_delay(&next).is_some());

        let restore = queue.complete(stage(ALERTS_SCENE, finite, &water, &mut rng));
        assert_eq!(
            restore,
            vec![
                Action::Obs(requests::change_scene("Main")),
                Action::Obs(requests::timed_blur(750, 0.0)),
            ]
        );
        assert!(!queue.is_active());
    }

    #[test]
    fn completion_while_idle_does_nothing() {
        let water = water();
        let mut rng = StdRng::seed_from_u64(7);
        let mut queue = BackgroundQueue::default();
        let actions = queue.complete(stage("Main", Streamer::FiniteSingularity, &water, &mut rng));
        assert!(actions.is_empty());
    }

    #[test]
    fn empty_interaction_completes_immediately() {
        let water = CloneInteraction::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut queue = BackgroundQueue::default();

        let actions = queue.enqueue(
            item(),
            stage("Main", Streamer::FiniteSingularity, &water, &mut rng),
        );
        assert_eq!(actions.last(), Some(&Action::Complete(Lane::Background)));
    }
}
