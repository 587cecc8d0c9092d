use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::Video,
    provider::{ServiceId, join_url, send_and_read, truncate_body},
};

use super::VideoSearch;

/// Maximum number of videos returned per search.
pub const MAX_RESULTS: usize = 3;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// YouTube Data API search client.
#[derive(Debug, Clone)]
pub struct YouTubeSearch {
    api_key: String,
    base_url: String,
    http: Client,
}

impl YouTubeSearch {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: ServiceId::YouTube.default_base_url().to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct YtSearchResponse {
    items: Option<Vec<YtItem>>,
}

#[derive(Debug, Deserialize)]
struct YtItem {
    id: YtId,
    #[serde(default)]
    snippet: YtSnippet,
}

#[derive(Debug, Deserialize)]
struct YtId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YtSnippet {
    #[serde(default)]
    title: String,
}

fn into_videos(items: Vec<YtItem>) -> Vec<Video> {
    items
        .into_iter()
        .filter_map(|item| {
            item.id.video_id.map(|id| Video {
                title: item.snippet.title,
                url: format!("{WATCH_URL}{id}"),
            })
        })
        .take(MAX_RESULTS)
        .collect()
}

#[async_trait]
impl VideoSearch for YouTubeSearch {
    async fn search(&self, location: &str) -> Result<Vec<Video>> {
        let url = join_url(&self.base_url, "/youtube/v3/search");
        let query = format!("{location} weather");
        let max_results = MAX_RESULTS.to_string();

        let request = self.http.get(url).query(&[
            ("part", "snippet"),
            ("q", query.as_str()),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("key", self.api_key.as_str()),
        ]);

        let (status, body) = send_and_read(request, "YouTube").await?;

        if !status.is_success() {
            return Err(Error::FetchFailed(format!(
                "YouTube search failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: YtSearchResponse = serde_json::from_str(&body)
            .map_err(|e| Error::FetchFailed(format!("Failed to parse YouTube JSON: {e}")))?;

        let videos = parsed.items.map(into_videos).unwrap_or_default();
        tracing::debug!(location, count = videos.len(), "video search finished");
        Ok(videos)
    }
}
