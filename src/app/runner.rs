use super::{config::Config, reducer, state::AppState};
use crate::{
    core::obs::{ObsControl, ObsRequest},
    effects::Action,
    events::app_event::AppEvent,
    models::redemption::Redemption,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Owns the application state and turns events into effects.
pub struct Runner<O> {
    state: AppState,
    config: Config,
    event_rx: mpsc::Receiver<AppEvent>,
    action_tx: mpsc::UnboundedSender<Vec<Action>>,
    action_rx: mpsc::UnboundedReceiver<Vec<Action>>,
    dispatcher: Dispatcher<O>,
}

impl<O: ObsControl> Runner<O> {
    pub fn new(
        state: AppState,
        config: Config,
        obs: Arc<O>,
        event_tx: mpsc::Sender<AppEvent>,
        event_rx: mpsc::Receiver<AppEvent>,
        matrix_tx: mpsc::Sender<Redemption>,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            state,
            config,
            event_rx,
            dispatcher: Dispatcher {
                obs,
                event_tx,
                matrix_tx,
                action_tx: action_tx.clone(),
            },
            action_tx,
            action_rx,
        }
    }

    pub async fn run(mut self) {
        tokio::spawn(self.dispatcher.run(self.action_rx));

        tracing::info!("Waiting for redemptions");
        while let Some(event) = self.event_rx.recv().await {
            tracing::trace!("Event: {:?}", event);
            let actions = reducer::reduce(&mut self.state, event, &self.config);
            if !actions.is_empty() && self.action_tx.send(actions).is_err() {
                tracing::error!("Dispatcher is gone, dropping actions");
            }
        }
        tracing::info!("Event channel closed, runner stopping");
    }
}

/// Carries out actions one group at a time, in the order the reducer
/// produced them. Delayed groups rejoin the same line when their timer fires.
struct Dispatcher<O> {
    obs: Arc<O>,
    event_tx: mpsc::Sender<AppEvent>,
    matrix_tx: mpsc::Sender<Redemption>,
    action_tx: mpsc::UnboundedSender<Vec<Action>>,
}

impl<O: ObsControl> Dispatcher<O> {
    async fn run(self, mut action_rx: mpsc::UnboundedReceiver<Vec<Action>>) {
        while let Some(actions) = action_rx.recv().await {
            self.dispatch(actions).await;
        }
    }

    async fn dispatch(&self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Obs(batch) => self.run_batch(batch).await,
                Action::Complete(lane) => {
                    self.send_event(AppEvent::EffectComplete(lane)).await;
                }
                Action::WriteToMatrix(redemption) => {
                    if self.matrix_tx.send(redemption).await.is_err() {
                        tracing::error!("Failed to queue matrix message: writer is gone.");
                    }
                }
                Action::LoadObsState => self.load_obs_state().await,
                Action::Delayed { delay, actions } => {
                    let action_tx = self.action_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = action_tx.send(actions);
                    });
                }
            }
        }
    }

    async fn run_batch(&self, batch: Vec<ObsRequest>) {
        if let Err(e) = self.obs.run_batch(batch).await {
            tracing::error!("OBS batch failed: {:#}", e);
        }
    }

    async fn load_obs_state(&self) {
        match self.obs.load_state().await {
            Ok(event) => self.send_event(AppEvent::Obs(event)).await,
            Err(e) => tracing::error!("Failed to load OBS state: {:#}", e),
        }
    }

    async fn send_event(&self, event: AppEvent) {
        if self.event_tx.send(event).await.is_err() {
            tracing::error!("Failed to send event: channel is closed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        effects::requests::{self, FACECAM},
        events::app_event::ObsEvent,
        models::{clone_interaction::Streamer, redemption::Reward},
        utils::color::Rgb,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rand::{SeedableRng, rngs::StdRng};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingObs {
        batches: Mutex<Vec<Vec<ObsRequest>>>,
    }

    #[async_trait]
    impl ObsControl for RecordingObs {
        async fn run_batch(&self, batch: Vec<ObsRequest>) -> Result<(), eyre::Report> {
            self.batches.lock().push(batch);
            Ok(())
        }

        async fn load_state(&self) -> Result<ObsEvent, eyre::Report> {
            Ok(ObsEvent::StateLoaded {
                current_scene: "Main".into(),
                roscodes_item_id: Some(12),
                streamer: Streamer::Roscodes,
            })
        }
    }

    fn redemption(reward_id: &str, input: &str) -> Redemption {
        Redemption {
            id: "r1".into(),
            user_id: "5678".into(),
            user_name: "viewer".into(),
            user_input: input.into(),
            user_input_emotes: None,
            reward: Reward {
                id: reward_id.into(),
                title: String::new(),
            },
            redeemed_at: None,
        }
    }

    const MATRIX_REWARD: &str = "c05b769d-d4a1-40fe-a73b-c8d631a12103";

    struct Harness {
        obs: Arc<RecordingObs>,
        event_tx: mpsc::Sender<AppEvent>,
        matrix_rx: mpsc::Receiver<Redemption>,
    }

    fn spawn_runner(matrix_capacity: usize) -> Harness {
        let obs = Arc::new(RecordingObs::default());
        let (event_tx, event_rx) = mpsc::channel(16);
        let (matrix_tx, matrix_rx) = mpsc::channel(matrix_capacity);
        let runner = Runner::new(
            AppState::with_rng(StdRng::seed_from_u64(3)),
            Config::default(),
            obs.clone(),
            event_tx.clone(),
            event_rx,
            matrix_tx,
        );
        tokio::spawn(runner.run());
        Harness {
            obs,
            event_tx,
            matrix_rx,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn facecam_effects_run_back_to_back() {
        let harness = spawn_runner(16);
        let technicolor = "7a0ff357-492c-43bc-91d4-d2ca2c141a37";
        let mac = "8a29edcb-7870-4119-bc8b-14ee5ea4200e";

        harness
            .event_tx
            .send(AppEvent::Redemption(redemption(technicolor, "#0000ff")))
            .await
            .unwrap();
        harness
            .event_tx
            .send(AppEvent::Redemption(redemption(mac, "")))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            *harness.obs.batches.lock(),
            vec![
                requests::color_change(Rgb(0, 0, 255)),
                requests::toggle_scene_item(FACECAM, "Color Change", true),
            ]
        );

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(
            harness.obs.batches.lock().last(),
            Some(&requests::toggle_scene_item(FACECAM, "Mac", true))
        );
        assert_eq!(harness.obs.batches.lock().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn matrix_redemptions_reach_the_writer() {
        let mut harness = spawn_runner(16);
        harness
            .event_tx
            .send(AppEvent::Redemption(redemption(MATRIX_REWARD, "hello")))
            .await
            .unwrap();

        let written = harness.matrix_rx.recv().await.unwrap();
        assert_eq!(written.user_input, "hello");
        assert!(harness.obs.batches.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn matrix_writes_keep_redemption_order() {
        const COUNT: usize = 500;
        let mut harness = spawn_runner(COUNT);

        let event_tx = harness.event_tx.clone();
        tokio::spawn(async move {
            for n in 0..COUNT {
                let event = AppEvent::Redemption(redemption(MATRIX_REWARD, &n.to_string()));
                event_tx.send(event).await.unwrap();
            }
        });

        for expected in 0..COUNT {
            let written = harness.matrix_rx.recv().await.unwrap();
            assert_eq!(written.user_input, expected.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connecting_loads_state_into_the_reducer() {
        let harness = spawn_runner(16);
        harness
            .event_tx
            .send(AppEvent::Obs(ObsEvent::Connected))
            .await
            .unwrap();

        // Water with no configured instances completes at once; the restore
        // goes back to the scene OBS reported.
        tokio::time::sleep(Duration::from_millis(10)).await;
        harness
            .event_tx
            .send(AppEvent::Redemption(redemption(
                "83e12f84-f23a-47bb-9c23-1a97fc0d31c5",
                "",
            )))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let batches = harness.obs.batches.lock();
        assert_eq!(batches.first(), Some(&requests::change_scene(requests::ALERTS_SCENE)));
        assert!(batches.contains(&requests::change_scene("Main")));
    }
}
