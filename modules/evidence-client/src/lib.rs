pub mod error;
pub mod google;
pub mod kakao;
pub mod naver;
pub mod openai;
pub mod types;
pub mod youtube;

use std::time::Duration;

pub use error::{EvidenceError, Result};
pub use google::{GooglePlaces, GooglePlacesConfig};
pub use kakao::{KakaoConfig, KakaoLocal};
pub use naver::{NaverConfig, NaverSearch};
pub use openai::{OpenAiChat, OpenAiConfig};
pub use types::{BlogPost, Comment, ImageHit, KakaoPlace, NaverSort, PlacePhoto, Video};
pub use youtube::{YouTube, YouTubeConfig};

use serde::de::DeserializeOwned;

/// Build the HTTP client shared by every provider adapter.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EvidenceError::Network(format!("failed to build HTTP client: {e}")))
}

/// Map non-2xx responses to [`EvidenceError::Api`], then decode the body.
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(EvidenceError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
