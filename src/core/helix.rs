use eyre::eyre;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use twitch_types::UserIdRef;
use url::Url;

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
pub struct HelixUser {
    pub id: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<HelixUser>,
}

/// Helix calls proxied through Tau, authenticated with the Tau token.
#[derive(Clone)]
pub struct TauApiClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl TauApiClient {
    pub fn new(domain: &str, token: String) -> Result<Self, eyre::Report> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()?;
        let base_url = Url::parse(&format!("https://{domain}/api/twitch/helix/"))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub async fn get_user(&self, user_id: &UserIdRef) -> Result<Option<HelixUser>, eyre::Report> {
        let mut url = self.base_url.join("users")?;
        url.query_pairs_mut().append_pair("id", user_id.as_str());

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<UsersResponse>()
            .await?;

        Ok(response.data.into_iter().next())
    }

    /// The user's avatar at the size the overlay shows it.
    pub async fn avatar_url(&self, user_id: &UserIdRef) -> Result<String, eyre::Report> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| eyre!("No Twitch user with id {}", user_id))?;
        tracing::debug!(
            "Fetched avatar of {} ({}, id {})",
            user.display_name,
            user.login,
            user.id
        );
        Ok(small_avatar(&user.profile_image_url))
    }
}

/// Twitch serves 300x300 avatars by default; the overlay wants 28x28.
pub fn small_avatar(url: &str) -> String {
    url.replace("300x300", "28x28")
}
