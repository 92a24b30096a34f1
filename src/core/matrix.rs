use super::helix::TauApiClient;
use crate::{
    models::{redemption::Redemption, segment::Segment},
    utils::segments::build_segments,
};
use eyre::Context;
use tokio::sync::mpsc;

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Posts segment payloads to the chat-display overlay.
#[derive(Clone)]
pub struct MatrixClient {
    client: reqwest::Client,
    url: String,
}

impl MatrixClient {
    pub fn new(url: String) -> Result<Self, eyre::Report> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()?;
        Ok(Self { client, url })
    }

    pub async fn post(&self, segments: &[Segment]) -> Result<(), eyre::Report> {
        self.client
            .post(&self.url)
            .json(segments)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Writes "write to matrix" redemptions one at a time, in the order they
/// were redeemed.
pub struct MatrixWriter {
    users: TauApiClient,
    matrix: Option<MatrixClient>,
}

impl MatrixWriter {
    pub fn new(users: TauApiClient, matrix: Option<MatrixClient>) -> Self {
        Self { users, matrix }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<Redemption>) {
        while let Some(redemption) = rx.recv().await {
            if let Err(e) = self.write(&redemption).await {
                tracing::error!(
                    "Failed to write {}'s message to the matrix: {:#}",
                    redemption.user_name,
                    e
                );
            }
        }
    }

    async fn write(&self, redemption: &Redemption) -> Result<(), eyre::Report> {
        let Some(matrix) = &self.matrix else {
            tracing::warn!("matrix.url is not configured, dropping message");
            return Ok(());
        };

        let avatar = self
            .users
            .avatar_url(&redemption.user_id)
            .await
            .context("Could not look up the redeeming user")?;
        let segments = build_segments(&redemption.user_input, redemption.emotes(), &avatar)?;
        tracing::info!(
            "Writing {} segments from {} to the matrix",
            segments.len(),
            redemption.user_name
        );

        matrix
            .post(&segments)
            .await
            .context("Matrix endpoint rejected the message")
    }
}
