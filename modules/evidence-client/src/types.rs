use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

// --- Kakao Local keyword search ---

#[derive(Debug, Deserialize)]
pub(crate) struct KakaoKeywordResponse {
    #[serde(default)]
    pub documents: Vec<KakaoDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KakaoDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub place_name: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub address_name: String,
    #[serde(default)]
    pub road_address_name: String,
    /// Longitude, sent as a string.
    #[serde(default)]
    pub x: String,
    /// Latitude, sent as a string.
    #[serde(default)]
    pub y: String,
    #[serde(default)]
    pub phone: String,
}

/// A place returned by Kakao keyword search.
#[derive(Debug, Clone, PartialEq)]
pub struct KakaoPlace {
    pub id: String,
    pub place_name: String,
    pub category_name: String,
    pub address_name: String,
    pub road_address_name: String,
    pub lat: f64,
    pub lng: f64,
    pub phone: String,
}

// --- Naver search ---

#[derive(Debug, Deserialize)]
pub(crate) struct NaverResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NaverBlogItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    /// `yyyymmdd`
    #[serde(default)]
    pub postdate: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NaverImageItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub sizewidth: String,
    #[serde(default)]
    pub sizeheight: String,
}

/// A blog post hit. `title` and `description` still carry `<b>` markup.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub title: String,
    pub link: String,
    pub description: String,
    pub posted_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageHit {
    pub title: String,
    pub link: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NaverSort {
    #[default]
    Sim,
    Date,
}

impl NaverSort {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            NaverSort::Sim => "sim",
            NaverSort::Date => "date",
        }
    }
}

// --- YouTube Data API ---

#[derive(Debug, Deserialize)]
pub(crate) struct YouTubeSearchResponse {
    #[serde(default)]
    pub items: Vec<YouTubeSearchItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YouTubeSearchItem {
    pub id: YouTubeVideoId,
    pub snippet: YouTubeSnippet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YouTubeVideoId {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YouTubeSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentThreadsResponse {
    #[serde(default)]
    pub items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentThread {
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentThreadSnippet {
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentSnippet {
    #[serde(rename = "textDisplay", default)]
    pub text_display: String,
    #[serde(rename = "likeCount", default)]
    pub like_count: u64,
    #[serde(rename = "publishedAt", default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Video {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// A top-level comment. `text` is `textDisplay` and may contain HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
}

// --- Google Places ---

#[derive(Debug, Deserialize)]
pub(crate) struct FindPlaceResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub candidates: Vec<FindPlaceCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FindPlaceCandidate {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub photos: Vec<PlacePhotoRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlacePhotoRef {
    pub photo_reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacePhoto {
    pub place_id: Option<String>,
    pub photo_url: Option<String>,
}

// --- OpenAI chat completions ---

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessage {
    #[serde(default)]
    pub content: String,
}
