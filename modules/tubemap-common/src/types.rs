use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Catalog Types ---

/// A curated venue as persisted in the catalog file.
///
/// `id` is positional: it is rewritten to the record's 1-based index on
/// every save and must not be used as a stable reference across runs.
/// Identity is the `(name, address)` pair, see [`CatalogKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub category: String,
    #[serde(default)]
    pub media: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub naver_url: String,
    #[serde(rename = "addressProvince", default, skip_serializing_if = "String::is_empty")]
    pub address_province: String,
    #[serde(rename = "addressCity", default, skip_serializing_if = "String::is_empty")]
    pub address_city: String,
    #[serde(rename = "addressDistrict", default, skip_serializing_if = "String::is_empty")]
    pub address_district: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category_group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub road_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl VenueRecord {
    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(&self.name, &self.address)
    }

    /// District token used to localise search queries. Falls back to the
    /// city token, then to the third address token.
    pub fn locale(&self) -> &str {
        if !self.address_district.is_empty() {
            return &self.address_district;
        }
        if !self.address_city.is_empty() {
            return &self.address_city;
        }
        self.address.split_whitespace().nth(2).unwrap_or("")
    }
}

/// Uniqueness key of a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogKey {
    pub name: String,
    pub address: String,
}

impl CatalogKey {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            address: address.trim().to_string(),
        }
    }
}

impl std::fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.name, self.address)
    }
}

/// Province / city / district split of a whitespace-tokenised address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub province: String,
    pub city: String,
    pub district: String,
}

impl AddressParts {
    pub fn parse(address: &str) -> Self {
        let mut parts = address.split_whitespace();
        Self {
            province: parts.next().unwrap_or_default().to_string(),
            city: parts.next().unwrap_or_default().to_string(),
            district: parts.next().unwrap_or_default().to_string(),
        }
    }
}

// --- Place Lookup ---

/// One ranked result from the place resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMatch {
    pub id: String,
    pub name: String,
    /// Provider category path, e.g. `음식점 > 한식 > 냉면`.
    pub category_path: String,
    pub address: String,
    pub road_address: String,
    pub lat: f64,
    pub lng: f64,
    pub phone: String,
}

impl PlaceMatch {
    /// Last segment of the category path.
    pub fn category_leaf(&self) -> &str {
        self.category_path
            .rsplit('>')
            .next()
            .map(str::trim)
            .unwrap_or("")
    }

    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(&self.name, &self.address)
    }
}

// --- Evidence ---

/// A single ranked search result used for scoring or description selection.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvidenceItem {
    pub title: String,
    pub snippet: String,
    pub link: String,
    /// 0-based position in the provider's ranking.
    pub rank: usize,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Channel or blog that published the item, when the provider says.
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl EvidenceItem {
    pub fn text(title: &str, snippet: &str, link: &str, rank: usize) -> Self {
        Self {
            title: title.to_string(),
            snippet: snippet.to_string(),
            link: link.to_string(),
            rank,
            ..Default::default()
        }
    }

    pub fn image(title: &str, link: &str, width: u32, height: u32, rank: usize) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            rank,
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Provider relevance ranking.
    #[default]
    Relevance,
    /// Most recent first.
    Date,
}

// --- Candidates ---

/// Where a candidate mention came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRef {
    Video {
        video_id: String,
        channel: String,
        url: String,
    },
    Article {
        link: String,
    },
}

impl SourceRef {
    pub fn video_id(&self) -> Option<&str> {
        match self {
            SourceRef::Video { video_id, .. } => Some(video_id),
            SourceRef::Article { .. } => None,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            SourceRef::Video { url, .. } => url,
            SourceRef::Article { link } => link,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    Pattern,
    Inference,
}

/// An unverified venue mention awaiting resolution and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name_hint: String,
    pub area_hint: String,
    pub address_hint: String,
    pub menu_hint: Option<String>,
    /// Channel, programme or seed keyword the mention arrived with.
    pub media_hint: String,
    pub source: SourceRef,
    pub extraction: ExtractionMethod,
}

impl Candidate {
    /// Text sent to the place resolver.
    pub fn lookup_query(&self) -> String {
        let base = if self.name_hint.is_empty() {
            self.address_hint.as_str()
        } else {
            self.name_hint.as_str()
        };
        if self.area_hint.is_empty() {
            base.to_string()
        } else {
            format!("{base} {}", self.area_hint)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parts_split_on_whitespace() {
        let parts = AddressParts::parse("서울 중구 명동2가 25-2");
        assert_eq!(parts.province, "서울");
        assert_eq!(parts.city, "중구");
        assert_eq!(parts.district, "명동2가");
    }

    #[test]
    fn short_address_leaves_missing_parts_empty() {
        let parts = AddressParts::parse("제주");
        assert_eq!(parts.province, "제주");
        assert!(parts.city.is_empty());
        assert!(parts.district.is_empty());
    }

    #[test]
    fn catalog_key_trims_whitespace() {
        assert_eq!(
            CatalogKey::new(" 명동교자 ", "서울 중구 명동2가 25-2 "),
            CatalogKey::new("명동교자", "서울 중구 명동2가 25-2")
        );
    }

    #[test]
    fn category_leaf_is_last_path_segment() {
        let m = PlaceMatch {
            id: "1".into(),
            name: "을지면옥".into(),
            category_path: "음식점 > 한식 > 냉면".into(),
            address: "서울 중구 입정동 177".into(),
            road_address: String::new(),
            lat: 37.56,
            lng: 126.99,
            phone: String::new(),
        };
        assert_eq!(m.category_leaf(), "냉면");
    }

    #[test]
    fn lookup_query_falls_back_to_address_hint() {
        let c = Candidate {
            name_hint: String::new(),
            area_hint: "서울 중구".into(),
            address_hint: "명동10길 29".into(),
            menu_hint: None,
            media_hint: String::new(),
            source: SourceRef::Article { link: "https://blog.naver.com/x".into() },
            extraction: ExtractionMethod::Pattern,
        };
        assert_eq!(c.lookup_query(), "명동10길 29 서울 중구");
    }

    #[test]
    fn record_without_optional_fields_deserializes() {
        let json = r#"{"id":3,"name":"a","address":"서울 중구 명동","lat":1.0,"lng":2.0,"category":"한식"}"#;
        let r: VenueRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.media, "");
        assert!(r.image_url.is_none());
        assert_eq!(r.locale(), "명동");
    }
}
