//! Collection runs against in-memory collaborators.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tubemap_common::{CurationRules, EvidenceItem};
use tubemap_curator::extractor::Mention;
use tubemap_curator::testing::{
    place_match, record, MockEvidence, MockInference, MockPhotos, MockPlaces,
};
use tubemap_curator::{Catalog, Collaborators, Curator, PipelineConfig};

const SEED: &str = "냉면 맛집";

fn post(title: &str) -> EvidenceItem {
    EvidenceItem::text(title, "", "https://blog.naver.com/someone/1", 0)
}

fn strong_image(title: &str) -> EvidenceItem {
    EvidenceItem::image(title, "https://blog.naver.com/img/a.jpg", 1200, 900, 0)
}

fn collaborators(places: Arc<MockPlaces>, text: Arc<MockEvidence>, images: Arc<MockEvidence>) -> Collaborators {
    Collaborators {
        places,
        text,
        images,
        videos: None,
        comments: None,
        photos: None,
        inference: None,
    }
}

fn curator(collab: Collaborators, workers: usize) -> Curator {
    Curator::new(
        CurationRules::bundled().unwrap(),
        collab,
        PipelineConfig {
            workers,
            call_timeout: Duration::from_secs(5),
        },
    )
    .unwrap()
}

fn empty_catalog() -> Catalog {
    Catalog::from_records(Path::new("unused.json"), Vec::new())
}

fn seeds() -> Vec<String> {
    vec![SEED.to_string()]
}

#[tokio::test]
async fn franchise_candidate_never_reaches_the_scorer() {
    let places = Arc::new(MockPlaces::new().on_query(
        "스타벅스 강남점",
        vec![place_match("스타벅스 강남점", "서울 강남구 역삼동 1", "음식점 > 카페 > 커피전문점")],
    ));
    let text = Arc::new(MockEvidence::new().on_query(SEED, vec![post("[스타벅스 강남점] 카페 후기")]));
    let images = Arc::new(MockEvidence::new());
    let c = curator(collaborators(places, text, images.clone()), 3);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 5, &seeds()).await;

    assert_eq!(stats.rejected.get("franchise"), Some(&1));
    assert_eq!(images.calls(), 0);
    assert!(catalog.is_empty());
    assert!(!catalog.is_dirty());
}

#[tokio::test]
async fn verified_image_is_attached_to_accepted_venue() {
    let places = Arc::new(MockPlaces::new().on_query(
        "을지면옥",
        vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
    ));
    let text = Arc::new(MockEvidence::new().on_query(SEED, vec![post("[을지면옥] 평양냉면 후기")]));
    let images = Arc::new(MockEvidence::new().otherwise(vec![strong_image("을지면옥 냉면 간판")]));
    let c = curator(collaborators(places, text, images), 3);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 5, &seeds()).await;

    assert_eq!(stats.accepted, 1);
    let r = &catalog.records()[0];
    assert_eq!(r.id, 1);
    assert_eq!(r.category, "한식");
    assert_eq!(r.address_district, "입정동");
    assert_eq!(r.image_url.as_deref(), Some("https://blog.naver.com/img/a.jpg"));
    assert!(r.verified_score.unwrap() >= 85);
    assert!(r.verified_at.is_some());
    assert!(!r.description.is_empty());
    assert!(r.naver_url.starts_with("https://map.naver.com/p/search/"));
    assert!(stats.changed());
}

#[tokio::test]
async fn acceptable_score_falls_back_to_photo_source() {
    let places = Arc::new(MockPlaces::new().on_query(
        "을지면옥",
        vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
    ));
    let text = Arc::new(MockEvidence::new().on_query(SEED, vec![post("[을지면옥] 후기")]));
    // 50 name + 30 menu, no bonuses
    let images = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::image(
        "을지면옥 냉면",
        "https://example.com/a.jpg",
        800,
        600,
        0,
    )]));
    let mut collab = collaborators(places, text, images);
    collab.photos = Some(Arc::new(MockPhotos::returning(
        "https://maps.example.com/photo.jpg",
        "gp-1",
    )));
    let c = curator(collab, 3);

    let mut catalog = empty_catalog();
    c.collect(&mut catalog, 5, &seeds()).await;

    let r = &catalog.records()[0];
    assert_eq!(r.verified_score, Some(80));
    assert_eq!(r.image_url.as_deref(), Some("https://maps.example.com/photo.jpg"));
    assert_eq!(r.google_place_id.as_deref(), Some("gp-1"));
}

#[tokio::test]
async fn weak_evidence_is_deferred() {
    let places = Arc::new(MockPlaces::new().on_query(
        "을지면옥",
        vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
    ));
    let text = Arc::new(MockEvidence::new().on_query(SEED, vec![post("[을지면옥] 후기")]));
    let images = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::image(
        "서울 냉면 맛집 TOP 10",
        "https://example.com/list.jpg",
        800,
        600,
        0,
    )]));
    let c = curator(collaborators(places, text, images), 3);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 5, &seeds()).await;

    assert_eq!(stats.deferred, 1);
    assert_eq!(stats.accepted, 0);
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn same_venue_from_two_mentions_is_inserted_once() {
    let venue = place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면");
    let places = Arc::new(
        MockPlaces::new()
            .on_query("을지면옥", vec![venue.clone()])
            .on_query("을지면옥 본점", vec![venue]),
    );
    let text = Arc::new(MockEvidence::new().on_query(
        SEED,
        vec![post("[을지면옥] 후기"), post("[을지면옥 본점] 다녀왔어요")],
    ));
    let images = Arc::new(
        MockEvidence::new()
            .otherwise(vec![strong_image("을지면옥 냉면 간판")])
            .with_delay(Duration::from_millis(10)),
    );
    let c = curator(collaborators(places, text, images), 3);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 5, &seeds()).await;

    assert_eq!(stats.discovered, 2);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected.get("duplicate"), Some(&1));
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn existing_venue_gains_new_media_instead_of_a_duplicate() {
    let places = Arc::new(MockPlaces::new().on_query(
        "을지면옥",
        vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
    ));
    let text = Arc::new(MockEvidence::new().on_query(
        "생활의 달인 냉면",
        vec![post("[생활의 달인] [을지면옥] 냉면 편")],
    ));
    let images = Arc::new(MockEvidence::new());
    let c = curator(collaborators(places, text, images.clone()), 3);

    let mut catalog = Catalog::from_records(
        Path::new("unused.json"),
        vec![record("을지면옥", "서울 중구 입정동 177")],
    );
    let stats = c
        .collect(&mut catalog, 5, &["생활의 달인 냉면".to_string()])
        .await;

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.records()[0].media, "또간집|생활의 달인");
    assert_eq!(stats.media_merged, 1);
    assert_eq!(stats.rejected.get("duplicate"), Some(&1));
    assert_eq!(images.calls(), 0);
}

#[tokio::test]
async fn quota_stops_the_run_and_abandons_remaining_candidates() {
    let places = Arc::new(
        MockPlaces::new()
            .on_query(
                "을지면옥",
                vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
            )
            .on_query(
                "필동면옥",
                vec![place_match("필동면옥", "서울 중구 필동1가 1-5", "음식점 > 한식 > 냉면")],
            )
            .on_query(
                "우래옥",
                vec![place_match("우래옥", "서울 중구 주교동 118-1", "음식점 > 한식 > 냉면")],
            ),
    );
    let text = Arc::new(MockEvidence::new().on_query(
        SEED,
        vec![post("[을지면옥] 후기"), post("[필동면옥] 후기"), post("[우래옥] 후기")],
    ));
    let images = Arc::new(
        MockEvidence::new().otherwise(vec![strong_image("을지면옥 필동면옥 우래옥 간판")]),
    );
    let c = curator(collaborators(places.clone(), text, images), 1);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 1, &seeds()).await;

    assert!(stats.quota_reached);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.evaluated, 1);
    assert_eq!(catalog.len(), 1);
    assert_eq!(places.calls(), 1);
}

#[tokio::test]
async fn video_mentions_carry_media_and_comment_review() {
    let places = Arc::new(MockPlaces::new().on_query(
        "을지면옥 서울 중구",
        vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
    ));
    let text = Arc::new(MockEvidence::new());
    let images = Arc::new(MockEvidence::new().otherwise(vec![strong_image("을지면옥 냉면 간판")]));
    let videos = Arc::new(MockEvidence::new().on_query(
        SEED,
        vec![
            EvidenceItem {
                title: "을지로 냉면 맛집 [을지면옥]".into(),
                snippet: "📍 서울 중구 입정동 177".into(),
                link: "https://www.youtube.com/watch?v=vid1".into(),
                author: Some("풍자 또간집".into()),
                ..Default::default()
            },
            EvidenceItem {
                title: "브이로그 일상".into(),
                link: "https://www.youtube.com/watch?v=vid2".into(),
                ..Default::default()
            },
        ],
    ));
    let comments = Arc::new(MockEvidence::new().on_query(
        "vid1",
        vec![EvidenceItem::text("", "을지면옥 냉면 진짜 최고예요", "", 0)],
    ));
    let mut collab = collaborators(places, text, images);
    collab.videos = Some(videos);
    collab.comments = Some(comments.clone());
    let c = curator(collab, 3);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 5, &seeds()).await;

    assert_eq!(stats.accepted, 1);
    let r = &catalog.records()[0];
    assert_eq!(r.media, "또간집");
    assert_eq!(r.description, "을지면옥 냉면 진짜 최고예요");
    assert_eq!(
        r.source_video_url.as_deref(),
        Some("https://www.youtube.com/watch?v=vid1")
    );
    assert_eq!(comments.seen(), ["vid1"]);
}

#[tokio::test]
async fn unparseable_video_text_uses_inference() {
    let places = Arc::new(MockPlaces::new().on_query(
        "을지면옥 서울 중구",
        vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
    ));
    let videos = Arc::new(MockEvidence::new().on_query(
        SEED,
        vec![EvidenceItem {
            title: "오늘은 냉면 먹방".into(),
            snippet: "을지로 골목 노포에서 한 그릇".into(),
            link: "https://www.youtube.com/watch?v=vid9".into(),
            author: Some("먹을텐데".into()),
            ..Default::default()
        }],
    ));
    let inference = Arc::new(MockInference::returning(vec![Mention {
        name: "을지면옥".into(),
        menu: Some("평양냉면".into()),
        area: String::new(),
        address: "서울 중구 입정동 177".into(),
    }]));
    let images = Arc::new(MockEvidence::new().otherwise(vec![strong_image("을지면옥 평양냉면 간판")]));
    let mut collab = collaborators(places, Arc::new(MockEvidence::new()), images);
    collab.videos = Some(videos);
    collab.inference = Some(inference.clone());
    let c = curator(collab, 3);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 5, &seeds()).await;

    assert_eq!(inference.calls(), 1);
    assert_eq!(stats.accepted, 1);
    assert_eq!(catalog.records()[0].media, "성시경의 먹을텐데");
}

#[tokio::test]
async fn failed_place_lookups_are_transient_rejections() {
    let places = Arc::new(MockPlaces::new().failing());
    let text = Arc::new(MockEvidence::new().on_query(SEED, vec![post("[을지면옥] 후기")]));
    let c = curator(collaborators(places, text, Arc::new(MockEvidence::new())), 3);

    let mut catalog = empty_catalog();
    let stats = c.collect(&mut catalog, 5, &seeds()).await;

    assert_eq!(stats.rejected.get("transient"), Some(&1));
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn keys_stay_unique_and_ids_dense_after_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("places.json");
    let mut existing = Catalog::from_records(
        &path,
        vec![
            record("필동면옥", "서울 중구 필동1가 1-5"),
            record("우래옥", "서울 중구 주교동 118-1"),
        ],
    );
    existing.save().unwrap();

    let places = Arc::new(
        MockPlaces::new()
            .on_query(
                "을지면옥",
                vec![place_match("을지면옥", "서울 중구 입정동 177", "음식점 > 한식 > 냉면")],
            )
            .on_query(
                "필동면옥",
                vec![place_match("필동면옥", "서울 중구 필동1가 1-5", "음식점 > 한식 > 냉면")],
            ),
    );
    let text = Arc::new(MockEvidence::new().on_query(
        SEED,
        vec![post("[을지면옥] 후기"), post("[필동면옥] 후기")],
    ));
    let images = Arc::new(
        MockEvidence::new().otherwise(vec![strong_image("을지면옥 필동면옥 냉면 간판")]),
    );
    let c = curator(collaborators(places, text, images), 3);

    let mut catalog = Catalog::load(&path).unwrap();
    c.collect(&mut catalog, 5, &seeds()).await;
    catalog.save().unwrap();

    let reloaded = Catalog::load(&path).unwrap();
    let keys: HashSet<_> = reloaded.keys().collect();
    assert_eq!(keys.len(), reloaded.len());
    assert_eq!(reloaded.len(), 3);
    let ids: Vec<u32> = reloaded.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(reloaded.records()[2].name, "을지면옥");
}
