use chrono::NaiveDate;
use tracing::debug;

use crate::types::{BlogPost, ImageHit, NaverBlogItem, NaverImageItem, NaverResponse, NaverSort};
use crate::{read_json, Result};

const BASE_URL: &str = "https://openapi.naver.com";

/// Naver search caps `display` at 100.
const MAX_DISPLAY: usize = 100;

#[derive(Debug, Clone)]
pub struct NaverConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
}

impl NaverConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: BASE_URL.to_string(),
        }
    }
}

/// Naver open search API: blog and image verticals.
pub struct NaverSearch {
    client: reqwest::Client,
    config: NaverConfig,
}

impl NaverSearch {
    pub fn new(client: reqwest::Client, config: NaverConfig) -> Self {
        Self { client, config }
    }

    pub async fn blog(&self, query: &str, sort: NaverSort, display: usize) -> Result<Vec<BlogPost>> {
        let data: NaverResponse<NaverBlogItem> = self.get("blog", query, sort, display, &[]).await?;
        let posts: Vec<BlogPost> = data
            .items
            .into_iter()
            .map(|i| BlogPost {
                posted_on: NaiveDate::parse_from_str(&i.postdate, "%Y%m%d").ok(),
                title: i.title,
                link: i.link,
                description: i.description,
            })
            .collect();
        debug!(query, count = posts.len(), "Naver blog search complete");
        Ok(posts)
    }

    pub async fn image(&self, query: &str, sort: NaverSort, display: usize) -> Result<Vec<ImageHit>> {
        let data: NaverResponse<NaverImageItem> = self
            .get("image", query, sort, display, &[("filter", "medium")])
            .await?;
        let hits: Vec<ImageHit> = data
            .items
            .into_iter()
            .map(|i| ImageHit {
                width: i.sizewidth.parse().unwrap_or(0),
                height: i.sizeheight.parse().unwrap_or(0),
                title: i.title,
                link: i.link,
            })
            .collect();
        debug!(query, count = hits.len(), "Naver image search complete");
        Ok(hits)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        vertical: &str,
        query: &str,
        sort: NaverSort,
        display: usize,
        extra: &[(&str, &str)],
    ) -> Result<T> {
        let display = display.clamp(1, MAX_DISPLAY).to_string();
        let url = format!("{}/v1/search/{vertical}", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .header("X-Naver-Client-Id", &self.config.client_id)
            .header("X-Naver-Client-Secret", &self.config.client_secret)
            .query(&[
                ("query", query),
                ("display", display.as_str()),
                ("sort", sort.as_str()),
            ])
            .query(extra)
            .send()
            .await?;
        read_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_sizes_are_strings_on_the_wire() {
        let raw = r#"{"items":[{"title":"명동교자 간판","link":"https://blogfiles.naver.net/a.jpg","thumbnail":"t","sizeheight":"600","sizewidth":"800"}]}"#;
        let data: NaverResponse<NaverImageItem> = serde_json::from_str(raw).unwrap();
        assert_eq!(data.items[0].sizewidth, "800");
        assert_eq!(data.items[0].sizeheight.parse::<u32>().unwrap(), 600);
    }

    #[test]
    fn blog_items_tolerate_missing_fields() {
        let raw = r#"{"items":[{"title":"<b>명동교자</b> 후기"}]}"#;
        let data: NaverResponse<NaverBlogItem> = serde_json::from_str(raw).unwrap();
        assert_eq!(data.items[0].link, "");
        assert!(NaiveDate::parse_from_str(&data.items[0].postdate, "%Y%m%d").is_err());
    }
}
