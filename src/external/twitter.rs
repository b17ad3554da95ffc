use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::client::send_json;
use crate::config::UpstreamsConfig;
use crate::error::AppResult;

const SERVICE: &str = "twitter";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawTweet>,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    id: String,
    text: String,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    public_metrics: Option<Metrics>,
}

#[derive(Debug, Default, Deserialize)]
struct Metrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SocialPost {
    pub id: String,
    pub text: String,
    pub created_at: Option<String>,
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub url: String,
}

/// X API v2 recent-search client.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    http: reqwest::Client,
    base_url: String,
}

impl TwitterClient {
    pub fn new(http: reqwest::Client, config: &UpstreamsConfig) -> Self {
        Self {
            http,
            base_url: config.twitter_api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Most recent posts authored by `username`, newest first.
    pub async fn recent_posts(
        &self,
        bearer_token: &str,
        username: &str,
        limit: u32,
    ) -> AppResult<Vec<SocialPost>> {
        let url = format!("{}/tweets/search/recent", self.base_url);
        let query = format!("from:{username} -is:retweet");
        let max_results = limit.to_string();
        let request = self
            .http
            .get(&url)
            .bearer_auth(bearer_token)
            .query(&[
                ("query", query.as_str()),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at,public_metrics"),
            ]);

        let body: SearchResponse = send_json(SERVICE, request).await?;
        Ok(body
            .data
            .into_iter()
            .map(|tweet| {
                let metrics = tweet.public_metrics.unwrap_or_default();
                SocialPost {
                    url: format!("https://x.com/{username}/status/{}", tweet.id),
                    id: tweet.id,
                    text: tweet.text,
                    created_at: tweet.created_at,
                    likes: metrics.like_count,
                    reposts: metrics.retweet_count,
                    replies: metrics.reply_count,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> TwitterClient {
        let config = UpstreamsConfig {
            twitter_api_url: server.base_url(),
            ..Default::default()
        };
        let http = crate::external::build_http_client(&config).unwrap();
        TwitterClient::new(http, &config)
    }

    #[tokio::test]
    async fn test_recent_posts_reshapes_tweets() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/tweets/search/recent")
                    .header("authorization", "Bearer tok")
                    .query_param("query", "from:tuna_agent -is:retweet")
                    .query_param("max_results", "10");
                then.status(200).json_body(json!({
                    "data": [{
                        "id": "1800000000000000001",
                        "text": "gm",
                        "created_at": "2025-01-01T00:00:00.000Z",
                        "public_metrics": { "like_count": 3, "retweet_count": 1, "reply_count": 0, "quote_count": 0 }
                    }],
                    "meta": { "result_count": 1 }
                }));
            })
            .await;

        let posts = client(&server).recent_posts("tok", "tuna_agent", 10).await.unwrap();
        mock.assert_async().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].likes, 3);
        assert_eq!(posts[0].url, "https://x.com/tuna_agent/status/1800000000000000001");
    }

    #[tokio::test]
    async fn test_no_results() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tweets/search/recent");
                then.status(200).json_body(json!({ "meta": { "result_count": 0 } }));
            })
            .await;

        let posts = client(&server).recent_posts("tok", "quiet", 10).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tweets/search/recent");
                then.status(429).json_body(json!({ "title": "Too Many Requests" }));
            })
            .await;

        let err = client(&server).recent_posts("tok", "busy", 10).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: Some(429), .. }));
    }
}
