//! OBS control over obs-websocket, through `obws`.
//!
//! [`ObsClient::run`] owns the connection and reconnects forever.
//! [`ObsHandle`] is the cloneable side the dispatcher sends requests through.

use crate::{
    effects::requests::{FACECAM_KEYED, ROSCODES_ITEM},
    events::app_event::{AppEvent, ObsEvent},
    models::clone_interaction::Streamer,
};
use async_trait::async_trait;
use eyre::{Context, eyre};
use futures::StreamExt;
use obws::{
    Client,
    events::Event,
    requests::{filters, inputs, scene_items},
};
use parking_lot::Mutex;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// One step of an overlay effect.
#[derive(Debug, Clone, PartialEq)]
pub enum ObsRequest {
    SetCurrentProgramScene {
        scene: String,
    },
    /// Looks the item up by name, then enables or disables it.
    SetSceneItemEnabled {
        scene: String,
        item: String,
        enabled: bool,
    },
    SetInputSettings {
        input: String,
        settings: Value,
    },
    SetFilterEnabled {
        source: String,
        filter: String,
        enabled: bool,
    },
    SetFilterSettings {
        source: String,
        filter: String,
        settings: Value,
    },
    /// Holds back the rest of the batch.
    Sleep {
        millis: u64,
    },
}

/// The seam between effect dispatch and OBS.
#[async_trait]
pub trait ObsControl: Send + Sync + 'static {
    /// Runs the batch in order. A failing request is logged and the rest
    /// still run; only a missing connection is an error.
    async fn run_batch(&self, batch: Vec<ObsRequest>) -> Result<(), eyre::Report>;

    /// Reads the program scene and whether Roscodes is on camera.
    async fn load_state(&self) -> Result<ObsEvent, eyre::Report>;
}

#[derive(Clone, Default)]
pub struct ObsHandle {
    client: Arc<Mutex<Option<Arc<Client>>>>,
}

impl ObsHandle {
    fn client(&self) -> Result<Arc<Client>, eyre::Report> {
        self.client
            .lock()
            .clone()
            .ok_or_else(|| eyre!("Not connected to OBS"))
    }
}

#[async_trait]
impl ObsControl for ObsHandle {
    async fn run_batch(&self, batch: Vec<ObsRequest>) -> Result<(), eyre::Report> {
        let client = self.client()?;
        let mut requests = batch.into_iter();
        while let Some(request) = requests.next() {
            if let ObsRequest::Sleep { millis } = request {
                // The tail waits on its own task so later effects aren't held up.
                let rest: Vec<ObsRequest> = requests.by_ref().collect();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                    run_in_order(&client, rest).await;
                });
                return Ok(());
            }
            execute_logged(&client, &request).await;
        }
        Ok(())
    }

    async fn load_state(&self) -> Result<ObsEvent, eyre::Report> {
        let client = self.client()?;
        let scene = client
            .scenes()
            .current_program_scene()
            .await
            .context("Failed to read the program scene")?;

        // No Roscodes item just means Finite is on camera.
        let roscodes_item_id = client
            .scene_items()
            .id(scene_items::Id {
                scene: FACECAM_KEYED.into(),
                source: ROSCODES_ITEM.into(),
                search_offset: None,
            })
            .await
            .ok();
        let roscodes_enabled = match roscodes_item_id {
            Some(item_id) => client
                .scene_items()
                .enabled(FACECAM_KEYED.into(), item_id)
                .await
                .unwrap_or(false),
            None => false,
        };

        Ok(ObsEvent::StateLoaded {
            current_scene: scene.id.name,
            roscodes_item_id,
            streamer: if roscodes_enabled {
                Streamer::Roscodes
            } else {
                Streamer::FiniteSingularity
            },
        })
    }
}

async fn run_in_order(client: &Client, batch: Vec<ObsRequest>) {
    for request in batch {
        match request {
            ObsRequest::Sleep { millis } => {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            request => execute_logged(client, &request).await,
        }
    }
}

async fn execute_logged(client: &Client, request: &ObsRequest) {
    if let Err(e) = execute(client, request).await {
        tracing::warn!("OBS request {:?} failed: {}", request, e);
    }
}

async fn execute(client: &Client, request: &ObsRequest) -> Result<(), obws::error::Error> {
    match request {
        ObsRequest::SetCurrentProgramScene { scene } => {
            client
                .scenes()
                .set_current_program_scene(scene.as_str())
                .await
        }
        ObsRequest::SetSceneItemEnabled {
            scene,
            item,
            enabled,
        } => {
            let item_id = client
                .scene_items()
                .id(scene_items::Id {
                    scene: scene.as_str().into(),
                    source: item.as_str().into(),
                    search_offset: None,
                })
                .await?;
            client
                .scene_items()
                .set_enabled(scene_items::SetEnabled {
                    scene: scene.as_str().into(),
                    item_id,
                    enabled: *enabled,
                })
                .await
        }
        ObsRequest::SetInputSettings { input, settings } => {
            client
                .inputs()
                .set_settings(inputs::SetSettings {
                    input: input.as_str().into(),
                    settings,
                    overlay: Some(true),
                })
                .await
        }
        ObsRequest::SetFilterEnabled {
            source,
            filter,
            enabled,
        } => {
            client
                .filters()
                .set_enabled(filters::SetEnabled {
                    source: source.as_str().into(),
                    filter,
                    enabled: *enabled,
                })
                .await
        }
        ObsRequest::SetFilterSettings {
            source,
            filter,
            settings,
        } => {
            client
                .filters()
                .set_settings(filters::SetSettings {
                    source: source.as_str().into(),
                    filter,
                    settings,
                    overlay: Some(true),
                })
                .await
        }
        ObsRequest::Sleep { millis } => {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
            Ok(())
        }
    }
}

fn parse_event(event: Event) -> Option<ObsEvent> {
    match event {
        Event::CurrentProgramSceneChanged { id } => Some(ObsEvent::SceneChanged(id.name)),
        Event::SceneItemEnableStateChanged {
            scene,
            item_id,
            enabled,
        } => Some(ObsEvent::SceneItemToggled {
            scene_name: scene.name,
            scene_item_id: item_id as i64,
            enabled,
        }),
        _ => None,
    }
}

pub struct ObsClient {
    host: String,
    port: u16,
    password: Option<String>,
    event_tx: mpsc::Sender<AppEvent>,
    handle: ObsHandle,
}

impl ObsClient {
    pub fn new(
        host: String,
        port: u16,
        password: Option<String>,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> (Self, ObsHandle) {
        let handle = ObsHandle::default();
        let client = Self {
            host,
            port,
            password,
            event_tx,
            handle: handle.clone(),
        };
        (client, handle)
    }

    pub async fn run(self) {
        loop {
            if let Err(e) = self.session().await {
                tracing::warn!("OBS connection error: {:#}", e);
            }
            *self.handle.client.lock() = None;
            self.send_event(ObsEvent::Disconnected).await;
            tracing::info!("Reattempting OBS connection in {:?}", RECONNECT_DELAY);
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn session(&self) -> Result<(), eyre::Report> {
        tracing::info!("Connecting to OBS at {}:{}", self.host, self.port);
        let client = Client::connect(&self.host, self.port, self.password.as_deref())
            .await
            .context("Failed to connect to OBS WebSocket")?;
        let client = Arc::new(client);
        let events = client
            .events()
            .context("Failed to subscribe to OBS events")?;

        *self.handle.client.lock() = Some(client.clone());
        tracing::info!("Connected to OBS");
        self.send_event(ObsEvent::Connected).await;

        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            if let Some(event) = parse_event(event) {
                self.send_event(event).await;
            }
        }

        Err(eyre!("OBS event stream ended"))
    }

    async fn send_event(&self, event: ObsEvent) {
        if self.event_tx.send(AppEvent::Obs(event)).await.is_err() {
            tracing::error!("Failed to forward OBS event: channel is closed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn requests_fail_fast_when_disconnected() {
        let (tx, _rx) = mpsc::channel(1);
        let (_client, handle) = ObsClient::new("127.0.0.1".into(), 4455, None, tx);

        let err = handle
            .run_batch(vec![ObsRequest::SetCurrentProgramScene {
                scene: "Main".into(),
            }])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Not connected"));
        assert!(handle.load_state().await.is_err());
    }

    #[test]
    fn handles_share_one_connection_slot() {
        let handle = ObsHandle::default();
        let other = handle.clone();
        assert!(Arc::ptr_eq(&handle.client, &other.client));
        assert!(other.client().is_err());
    }
}
