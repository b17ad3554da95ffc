use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Secrets;
use crate::config::secrets::names;
use crate::error::AppResult;
use crate::external::{SocialPost, TwitterClient};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SocialPosts {
    pub username: String,
    pub posts: Vec<SocialPost>,
}

#[derive(Clone)]
pub struct SocialService {
    client: TwitterClient,
    secrets: Secrets,
    default_limit: u32,
}

impl SocialService {
    pub fn new(client: TwitterClient, secrets: Secrets, default_limit: u32) -> Self {
        Self {
            client,
            secrets,
            default_limit,
        }
    }

    pub async fn recent_posts(&self, username: &str, limit: Option<u32>) -> AppResult<SocialPosts> {
        let token = self.secrets.require(names::TWITTER_BEARER_TOKEN)?;
        let limit = limit.unwrap_or(self.default_limit);
        let posts = self.client.recent_posts(&token, username, limit).await?;
        Ok(SocialPosts {
            username: username.to_string(),
            posts,
        })
    }
}
