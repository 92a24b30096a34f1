use crate::{events::app_event::AppEvent, models::redemption::Redemption};
use eyre::{Context, eyre};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use url::Url;

const REDEMPTION_EVENT: &str = "channel-channel_points_custom_reward_redemption-add";
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct TauMessage {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    event_data: Value,
}

/// Listens to Tau's Twitch event stream and forwards channel-point
/// redemptions.
pub struct TauClient {
    url: Url,
    token: String,
    event_tx: mpsc::Sender<AppEvent>,
}

pub fn events_url(domain: &str, port: u16) -> Result<Url, eyre::Report> {
    let mut url = Url::parse(&format!("wss://{domain}/ws/twitch-events/"))
        .context("Invalid Tau domain")?;
    url.set_port(Some(port))
        .map_err(|_| eyre!("Cannot set port {} on {}", port, url))?;
    Ok(url)
}

/// Returns the redemption carried by a Tau message, if it is one.
fn parse_message(text: &str) -> Result<Option<Redemption>, eyre::Report> {
    let message: TauMessage = serde_json::from_str(text)?;
    if message.event_type.as_deref() != Some(REDEMPTION_EVENT) {
        return Ok(None);
    }
    let redemption =
        serde_json::from_value(message.event_data).context("Malformed redemption event")?;
    Ok(Some(redemption))
}

impl TauClient {
    pub fn new(url: Url, token: String, event_tx: mpsc::Sender<AppEvent>) -> Self {
        Self {
            url,
            token,
            event_tx,
        }
    }

    pub async fn run(self) {
        loop {
            if let Err(e) = self.session().await {
                tracing::warn!("Tau connection error: {:#}", e);
            }
            tracing::info!("Disconnected from Tau, reconnecting in {:?}", RECONNECT_DELAY);
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn session(&self) -> Result<(), eyre::Report> {
        tracing::info!("Connecting to Tau at {}", self.url);
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .context("Failed to connect to Tau")?;
        let (mut write, mut read) = ws_stream.split();

        let auth = json!({ "token": self.token });
        write.send(WsMessage::Text(auth.to_string().into())).await?;
        tracing::info!("Connected to Tau");

        while let Some(msg) = read.next().await {
            match msg? {
                WsMessage::Text(s) => self.handle_text(s.as_str()).await,
                WsMessage::Close(c) => {
                    tracing::info!("Tau websocket closed: {:?}", c);
                    return Err(eyre!("Tau closed the connection"));
                }
                _ => {}
            }
        }

        Err(eyre!("Tau stream ended"))
    }

    async fn handle_text(&self, text: &str) {
        match parse_message(text) {
            Ok(Some(redemption)) => {
                if self
                    .event_tx
                    .send(AppEvent::Redemption(redemption))
                    .await
                    .is_err()
                {
                    tracing::error!("Failed to forward redemption: channel is closed.");
                }
            }
            Ok(None) => tracing::trace!("Ignoring Tau message"),
            Err(e) => tracing::warn!("Unreadable Tau message: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::emote::EmoteData;

    #[test]
    fn builds_events_url() {
        assert_eq!(
            events_url("tau.example.com", 443).unwrap().as_str(),
            "wss://tau.example.com/ws/twitch-events/"
        );
        assert_eq!(
            events_url("localhost", 8000).unwrap().as_str(),
            "wss://localhost:8000/ws/twitch-events/"
        );
    }

    #[test]
    fn parses_redemption_with_emotes() {
        let text = r#"{
            "id": "9d3c",
            "event_id": "17fa2df6",
            "event_type": "channel-channel_points_custom_reward_redemption-add",
            "event_source": "EventSub",
            "event_data": {
                "id": "17fa2df4-ad5a-4f3f-8c1e-1c6cd7e2e24f",
                "broadcaster_user_id": "1337",
                "user_id": "9001",
                "user_login": "cooler_user",
                "user_name": "Cooler_User",
                "user_input": "hi Kappa",
                "user_input_emotes": [{ "id": "25", "positions": [[3, 7]] }],
                "status": "unfulfilled",
                "reward": { "id": "c05b769d-d4a1-40fe-a73b-c8d631a12103", "title": "Write to matrix", "cost": 100, "prompt": "" },
                "redeemed_at": "2020-07-15T17:16:03.17106713Z"
            },
            "created": "2020-07-15T17:16:03.2Z"
        }"#;

        let redemption = parse_message(text).unwrap().unwrap();
        assert_eq!(redemption.user_id.as_str(), "9001");
        assert_eq!(redemption.user_name, "Cooler_User");
        assert_eq!(redemption.reward.id, "c05b769d-d4a1-40fe-a73b-c8d631a12103");
        assert_eq!(
            redemption.emotes(),
            &[EmoteData {
                id: "25".into(),
                positions: vec![[3, 7]],
            }]
        );
        assert!(redemption.redeemed_at.is_some());
    }

    #[test]
    fn missing_emotes_mean_none() {
        let text = r#"{
            "event_type": "channel-channel_points_custom_reward_redemption-add",
            "event_data": {
                "user_id": "9001",
                "user_input": "",
                "user_input_emotes": null,
                "reward": { "id": "abc" }
            }
        }"#;
        let redemption = parse_message(text).unwrap().unwrap();
        assert!(redemption.emotes().is_empty());
    }

    #[test]
    fn other_events_are_skipped() {
        let text = r#"{"event_type": "channel-follow", "event_data": {"user_id": "1"}}"#;
        assert_eq!(parse_message(text).unwrap(), None);
        assert!(parse_message("not json").is_err());
    }
}
