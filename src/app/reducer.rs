use super::state::AppState;
use crate::{
    app::config::Config,
    effects::{
        Action,
        background::Stage,
        requests::{ALERTS_SCENE, FACECAM_KEYED},
    },
    events::app_event::{AppEvent, ObsEvent},
    models::{
        clone_interaction::Streamer,
        redemption::Redemption,
        reward::{Lane, QueuedRedemption},
    },
};

/// Applies one event to the state and returns what should happen next.
pub fn reduce(state: &mut AppState, event: AppEvent, config: &Config) -> Vec<Action> {
    match event {
        AppEvent::Redemption(redemption) => handle_redemption(state, redemption, config),
        AppEvent::Obs(obs_event) => handle_obs_event(state, obs_event),
        AppEvent::EffectComplete(lane) => handle_effect_complete(state, lane, config),
    }
}

fn handle_redemption(state: &mut AppState, redemption: Redemption, config: &Config) -> Vec<Action> {
    let Some(action) = config.reward_action(&redemption.reward.id) else {
        tracing::debug!(
            "Ignoring redemption of unmapped reward {:?} ({})",
            redemption.reward.title,
            redemption.reward.id
        );
        return Vec::new();
    };
    tracing::info!(
        "{} redeemed {:?} -> {:?}",
        redemption.user_name,
        redemption.reward.title,
        action
    );

    let lane = action.lane();
    if lane != Lane::Unqueued && !state.obs.connected {
        tracing::warn!("OBS is not connected, {:?} may not show", action);
    }

    let actions = match lane {
        Lane::Unqueued => vec![Action::WriteToMatrix(redemption)],
        Lane::Background => {
            let item = QueuedRedemption { action, redemption };
            let AppState {
                obs,
                background,
                rng,
                ..
            } = state;
            background.enqueue(
                item,
                Stage {
                    current_scene: &obs.current_scene,
                    streamer: obs.streamer,
                    water: &config.water,
                    rng,
                },
            )
        }
        Lane::Facecam => state
            .facecam
            .enqueue(QueuedRedemption { action, redemption }),
    };
    tracing::debug!(
        "Queued: {} background, {} facecam",
        state.background.len(),
        state.facecam.len()
    );
    actions
}

fn handle_effect_complete(state: &mut AppState, lane: Lane, config: &Config) -> Vec<Action> {
    match lane {
        Lane::Background => {
            let AppState {
                obs,
                background,
                rng,
                ..
            } = state;
            background.complete(Stage {
                current_scene: &obs.current_scene,
                streamer: obs.streamer,
                water: &config.water,
                rng,
            })
        }
        Lane::Facecam => state.facecam.complete(),
        Lane::Unqueued => {
            tracing::warn!("Unqueued effects have nothing to complete");
            Vec::new()
        }
    }
}

fn handle_obs_event(state: &mut AppState, event: ObsEvent) -> Vec<Action> {
    let background_active = state.background.is_active();
    let obs = &mut state.obs;
    match event {
        ObsEvent::Connected => {
            obs.connected = true;
            return vec![Action::LoadObsState];
        }
        ObsEvent::Disconnected => {
            obs.connected = false;
        }
        ObsEvent::StateLoaded {
            current_scene,
            roscodes_item_id,
            streamer,
        } => {
            tracing::info!(
                "OBS is on scene {:?}, streamer {:?}",
                current_scene,
                streamer
            );
            obs.current_scene = current_scene;
            obs.roscodes_item_id = roscodes_item_id;
            obs.streamer = streamer;
        }
        ObsEvent::SceneChanged(scene) => {
            if background_active && scene != ALERTS_SCENE {
                tracing::warn!("Scene changed to {:?} during a clone interaction", scene);
            } else {
                tracing::debug!("Program scene changed to {:?}", scene);
            }
            obs.current_scene = scene;
        }
        ObsEvent::SceneItemToggled {
            scene_name,
            scene_item_id,
            enabled,
        } => {
            if scene_name == FACECAM_KEYED && obs.roscodes_item_id == Some(scene_item_id) {
                obs.streamer = if enabled {
                    Streamer::Roscodes
                } else {
                    Streamer::FiniteSingularity
                };
                tracing::info!("Streamer is now {:?}", obs.streamer);
            }
        }
    }
    Vec::new()
}
