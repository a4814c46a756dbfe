use tracing::debug;

use crate::types::{Comment, CommentThreadsResponse, Video, YouTubeSearchResponse};
use crate::{read_json, Result};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The Data API caps `maxResults` at 50 for search and 100 for comments.
const MAX_SEARCH_RESULTS: usize = 50;
const MAX_COMMENT_RESULTS: usize = 100;

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub base_url: String,
}

impl YouTubeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }
}

/// YouTube Data API v3: video search and comment threads.
pub struct YouTube {
    client: reqwest::Client,
    config: YouTubeConfig,
}

impl YouTube {
    pub fn new(client: reqwest::Client, config: YouTubeConfig) -> Self {
        Self { client, config }
    }

    /// Search videos. `order` is `relevance` or `date`.
    pub async fn search_videos(&self, query: &str, order: &str, max_results: usize) -> Result<Vec<Video>> {
        let max = max_results.clamp(1, MAX_SEARCH_RESULTS).to_string();
        let url = format!("{}/search", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("order", order),
                ("maxResults", max.as_str()),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let data: YouTubeSearchResponse = read_json(resp).await?;
        let videos: Vec<Video> = data
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(Video {
                    video_id,
                    title: item.snippet.title,
                    description: item.snippet.description,
                    channel_title: item.snippet.channel_title,
                    published_at: item.snippet.published_at,
                })
            })
            .collect();
        debug!(query, count = videos.len(), "YouTube video search complete");
        Ok(videos)
    }

    /// Top-level comments on a video, relevance-ordered.
    pub async fn comments(&self, video_id: &str, max_results: usize) -> Result<Vec<Comment>> {
        let max = max_results.clamp(1, MAX_COMMENT_RESULTS).to_string();
        let url = format!("{}/commentThreads", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("videoId", video_id),
                ("order", "relevance"),
                ("maxResults", max.as_str()),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let data: CommentThreadsResponse = read_json(resp).await?;
        let comments: Vec<Comment> = data
            .items
            .into_iter()
            .map(|t| {
                let s = t.snippet.top_level_comment.snippet;
                Comment {
                    text: s.text_display,
                    like_count: s.like_count,
                    published_at: s.published_at,
                }
            })
            .collect();
        debug!(video_id, count = comments.len(), "YouTube comments fetched");
        Ok(comments)
    }
}
