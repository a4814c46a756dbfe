use tracing::debug;

use crate::types::{KakaoDocument, KakaoKeywordResponse, KakaoPlace};
use crate::{read_json, Result};

const BASE_URL: &str = "https://dapi.kakao.com";

/// Kakao Local returns at most 15 documents per page.
const MAX_PAGE_SIZE: usize = 15;

#[derive(Debug, Clone)]
pub struct KakaoConfig {
    pub api_key: String,
    pub base_url: String,
}

impl KakaoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }
}

/// Kakao Local keyword search client.
pub struct KakaoLocal {
    client: reqwest::Client,
    config: KakaoConfig,
}

impl KakaoLocal {
    pub fn new(client: reqwest::Client, config: KakaoConfig) -> Self {
        Self { client, config }
    }

    /// Keyword search. Results keep the provider's ranking; several
    /// branches of the same brand can come back for one query.
    pub async fn keyword_search(&self, query: &str, size: usize) -> Result<Vec<KakaoPlace>> {
        let size = size.clamp(1, MAX_PAGE_SIZE).to_string();
        let url = format!("{}/v2/local/search/keyword.json", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("KakaoAK {}", self.config.api_key))
            .query(&[("query", query), ("size", size.as_str())])
            .send()
            .await?;

        let data: KakaoKeywordResponse = read_json(resp).await?;
        let places: Vec<KakaoPlace> = data.documents.into_iter().map(into_place).collect();
        debug!(query, count = places.len(), "Kakao keyword search complete");
        Ok(places)
    }
}

fn into_place(doc: KakaoDocument) -> KakaoPlace {
    KakaoPlace {
        id: doc.id,
        place_name: doc.place_name,
        category_name: doc.category_name,
        address_name: doc.address_name,
        road_address_name: doc.road_address_name,
        lat: doc.y.parse().unwrap_or(0.0),
        lng: doc.x.parse().unwrap_or(0.0),
        phone: doc.phone,
    }
}
