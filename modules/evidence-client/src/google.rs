use tracing::debug;

use crate::types::{FindPlaceResponse, PlacePhoto};
use crate::{read_json, Result};

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

const PHOTO_MAX_WIDTH: u32 = 400;

#[derive(Debug, Clone)]
pub struct GooglePlacesConfig {
    pub api_key: String,
    pub base_url: String,
}

impl GooglePlacesConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }
}

/// Google Places "find place from text", used only to attach a photo.
pub struct GooglePlaces {
    client: reqwest::Client,
    config: GooglePlacesConfig,
}

impl GooglePlaces {
    pub fn new(client: reqwest::Client, config: GooglePlacesConfig) -> Self {
        Self { client, config }
    }

    /// Look up `name address` and return the first candidate's photo URL.
    /// A non-`OK` status (e.g. `ZERO_RESULTS`) is not an error.
    pub async fn find_photo(&self, name: &str, address: &str) -> Result<PlacePhoto> {
        let input = format!("{name} {address}");
        let url = format!("{}/findplacefromtext/json", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("input", input.as_str()),
                ("inputtype", "textquery"),
                ("fields", "place_id,photos"),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let data: FindPlaceResponse = read_json(resp).await?;
        if data.status != "OK" {
            debug!(name, status = data.status.as_str(), "Google Places returned no match");
            return Ok(PlacePhoto {
                place_id: None,
                photo_url: None,
            });
        }

        let Some(candidate) = data.candidates.into_iter().next() else {
            return Ok(PlacePhoto {
                place_id: None,
                photo_url: None,
            });
        };
        let photo_url = candidate
            .photos
            .first()
            .map(|p| self.photo_url(&p.photo_reference));
        Ok(PlacePhoto {
            place_id: candidate.place_id,
            photo_url,
        })
    }

    fn photo_url(&self, photo_reference: &str) -> String {
        format!(
            "{}/photo?maxwidth={PHOTO_MAX_WIDTH}&photoreference={photo_reference}&key={}",
            self.config.base_url, self.config.api_key
        )
    }
}
