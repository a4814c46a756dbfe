//! Verification runs: re-scoring, branch checks and zero-tolerance deletes.

use std::sync::Arc;
use std::time::Duration;

use tubemap_common::{CurationRules, EvidenceItem, VenueRecord};
use tubemap_curator::scorer::{RelevanceScorer, ScoreTarget};
use tubemap_curator::testing::{record, MockEvidence, MockPlaces};
use tubemap_curator::{Catalog, Collaborators, Curator, PipelineConfig};

fn curator(text: Arc<MockEvidence>, images: Arc<MockEvidence>) -> Curator {
    curator_with(CurationRules::bundled().unwrap(), text, images)
}

fn curator_with(rules: CurationRules, text: Arc<MockEvidence>, images: Arc<MockEvidence>) -> Curator {
    Curator::new(
        rules,
        Collaborators {
            places: Arc::new(MockPlaces::new()),
            text,
            images,
            videos: None,
            comments: None,
            photos: None,
            inference: None,
        },
        PipelineConfig {
            workers: 3,
            call_timeout: Duration::from_secs(5),
        },
    )
    .unwrap()
}

/// Blog search that returns one usable review for every query.
fn reviews() -> Arc<MockEvidence> {
    Arc::new(MockEvidence::new().otherwise(vec![review()]))
}

fn review() -> EvidenceItem {
    EvidenceItem::text(
        "오랜만에 다녀온 후기",
        "평양냉면 육수가 정말 맛있는 집이에요",
        "https://blog.naver.com/x/2",
        0,
    )
}

fn image(title: &str) -> EvidenceItem {
    EvidenceItem::image(title, "https://example.com/a.jpg", 800, 600, 0)
}

fn first_query(r: &VenueRecord) -> String {
    let scorer = RelevanceScorer::new(&CurationRules::bundled().unwrap()).unwrap();
    scorer.queries(&ScoreTarget::for_record(r)).remove(0)
}

#[tokio::test]
async fn low_scoring_record_is_deleted_and_ids_redensify() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("places.json");
    let weak = record("필동면옥", "서울 중구 필동1가 1-5");

    // 50 name + 30 menu - 40 low resolution = 40
    let images = Arc::new(
        MockEvidence::new()
            .on_query(
                &first_query(&weak),
                vec![EvidenceItem::image(
                    "필동면옥 평양냉면",
                    "https://example.com/tiny.jpg",
                    200,
                    200,
                    0,
                )],
            )
            .otherwise(vec![EvidenceItem::image(
                "을지면옥 우래옥 평양냉면",
                "https://example.com/a.jpg",
                800,
                600,
                0,
            )]),
    );
    let c = curator(reviews(), images);

    let mut catalog = Catalog::from_records(
        &path,
        vec![
            record("을지면옥", "서울 중구 입정동 177"),
            weak,
            record("우래옥", "서울 중구 주교동 118-1"),
        ],
    );
    let stats = c.verify(&mut catalog).await;
    catalog.save().unwrap();

    assert_eq!(stats.checked, 3);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.unchanged, 2);

    let reloaded = Catalog::load(&path).unwrap();
    let rows: Vec<(u32, &str)> = reloaded
        .records()
        .iter()
        .map(|r| (r.id, r.name.as_str()))
        .collect();
    assert_eq!(rows, [(1, "을지면옥"), (2, "우래옥")]);
    assert_eq!(reloaded.records()[0].verified_score, Some(80));
}

#[tokio::test]
async fn verified_evidence_replaces_a_different_image() {
    let images = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::image(
        "을지면옥 평양냉면 간판",
        "https://blog.naver.com/new.jpg",
        1200,
        900,
        0,
    )]));
    let c = curator(reviews(), images);

    let mut old = record("을지면옥", "서울 중구 입정동 177");
    old.image_url = Some("https://example.com/old.jpg".into());
    let mut catalog = Catalog::from_records(std::path::Path::new("unused.json"), vec![old]);
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.replaced, 1);
    let r = &catalog.records()[0];
    assert_eq!(r.image_url.as_deref(), Some("https://blog.naver.com/new.jpg"));
    assert!(r.verified_at.is_some());
}

#[tokio::test]
async fn unconfirmed_branch_is_deleted_without_rescoring() {
    let text = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::text(
        "명동교자 다녀왔어요",
        "칼국수가 맛있는 집",
        "https://blog.naver.com/x/1",
        0,
    )]));
    let images = Arc::new(MockEvidence::new());
    let c = curator(text.clone(), images.clone());

    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("명동교자 분점", "서울 중구 명동1가 10")],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.branch_unconfirmed, 1);
    assert!(catalog.is_empty());
    assert_eq!(text.seen(), ["또간집 명동교자 분점 지점 위치"]);
    assert_eq!(images.calls(), 0);
}

#[tokio::test]
async fn confirmed_branch_goes_on_to_rescoring() {
    let text = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::text(
        "명동교자 분점 위치",
        "서울 중구 명동1가에 있어요",
        "https://blog.naver.com/x/1",
        0,
    )]));
    let images = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::image(
        "명동교자 분점 평양냉면",
        "https://example.com/a.jpg",
        800,
        600,
        0,
    )]));
    let c = curator(text, images.clone());

    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("명동교자 분점", "서울 중구 명동1가 10")],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.unchanged, 1);
    assert!(images.calls() > 0);
}

#[tokio::test]
async fn provider_failure_defers_and_leaves_record_untouched() {
    let c = curator(reviews(), Arc::new(MockEvidence::new().failing()));
    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("을지면옥", "서울 중구 입정동 177")],
    );
    let before = catalog.records().to_vec();
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.deferred, 1);
    assert_eq!(stats.deleted, 0);
    assert_eq!(catalog.records(), before.as_slice());
    assert!(!catalog.is_dirty());
}

#[tokio::test]
async fn record_without_any_image_evidence_is_deleted() {
    let c = curator(reviews(), Arc::new(MockEvidence::new()));
    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("을지면옥", "서울 중구 입정동 177")],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.branch_unconfirmed, 0);
    assert_eq!(stats.no_review, 0);
    assert!(catalog.is_empty());
    assert!(stats.to_string().contains("Deleted:            1"));
}

#[tokio::test]
async fn head_office_text_does_not_confirm_another_branch() {
    let text = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::text(
        "명동교자 본점 후기",
        "본점은 명동2가에 있어요",
        "https://blog.naver.com/x/1",
        0,
    )]));
    let images = Arc::new(MockEvidence::new().otherwise(vec![image("명동교자 분점 평양냉면")]));
    let c = curator(text, images.clone());

    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("명동교자 분점", "서울 중구 명동1가 10")],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.branch_unconfirmed, 1);
    assert!(catalog.is_empty());
    assert_eq!(images.calls(), 0);
}

#[tokio::test]
async fn head_office_record_is_confirmed_by_head_office_text() {
    let text = Arc::new(MockEvidence::new().otherwise(vec![EvidenceItem::text(
        "명동교자 본점 후기",
        "본점 칼국수가 정말 맛있어요",
        "https://blog.naver.com/x/1",
        0,
    )]));
    let images = Arc::new(MockEvidence::new().otherwise(vec![image("명동교자 본점 평양냉면")]));
    let c = curator(text, images);

    // the text names no district, only 본점
    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("명동교자 본점", "서울 중구 명동2가 25-2")],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.branch_unconfirmed, 0);
    assert_eq!(stats.deleted, 0);
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn records_failing_admission_filters_are_deleted() {
    let images = Arc::new(MockEvidence::new().otherwise(vec![image("평양냉면")]));
    let text = reviews();
    let c = curator(text.clone(), images.clone());

    let mut market = record("광장시장", "서울 종로구 예지동 2-1");
    market.category_group = "쇼핑,유통 > 시장 > 전통시장".into();
    let franchise = record("스타벅스 을지로점", "서울 중구 을지로2가 1");
    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![market, franchise],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.deleted, 2);
    assert_eq!(stats.inadmissible, 2);
    assert!(catalog.is_empty());
    assert_eq!(text.calls(), 0);
    assert_eq!(images.calls(), 0);
}

#[tokio::test]
async fn record_without_review_text_is_deleted() {
    let images = Arc::new(MockEvidence::new().otherwise(vec![image("을지면옥 평양냉면")]));
    let text = Arc::new(MockEvidence::new());
    let c = curator(text.clone(), images.clone());

    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("을지면옥", "서울 중구 입정동 177")],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.no_review, 1);
    assert_eq!(text.seen(), ["을지면옥 입정동"]);
    assert_eq!(images.calls(), 0);
    assert!(stats.to_string().contains("no review:          1"));
}

#[tokio::test]
async fn video_comment_counts_as_review() {
    let comments = Arc::new(
        MockEvidence::new().on_query("abc123", vec![EvidenceItem::text("", "냉면 진짜 맛있어요", "", 0)]),
    );
    let c = Curator::new(
        CurationRules::bundled().unwrap(),
        Collaborators {
            places: Arc::new(MockPlaces::new()),
            text: Arc::new(MockEvidence::new()),
            images: Arc::new(MockEvidence::new().otherwise(vec![image("을지면옥 평양냉면")])),
            videos: None,
            comments: Some(comments.clone()),
            photos: None,
            inference: None,
        },
        PipelineConfig {
            workers: 1,
            call_timeout: Duration::from_secs(5),
        },
    )
    .unwrap();

    let mut venue = record("을지면옥", "서울 중구 입정동 177");
    venue.source_video_url = Some("https://www.youtube.com/watch?v=abc123".into());
    let mut catalog = Catalog::from_records(std::path::Path::new("unused.json"), vec![venue]);
    let stats = c.verify(&mut catalog).await;

    assert_eq!(comments.seen(), ["abc123"]);
    assert_eq!(stats.no_review, 0);
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn review_requirement_can_be_disabled_in_rules() {
    let mut rules = CurationRules::bundled().unwrap();
    rules.review.require_review_on_verify = false;
    let text = Arc::new(MockEvidence::new());
    let c = curator_with(
        rules,
        text.clone(),
        Arc::new(MockEvidence::new().otherwise(vec![image("을지면옥 평양냉면")])),
    );

    let mut catalog = Catalog::from_records(
        std::path::Path::new("unused.json"),
        vec![record("을지면옥", "서울 중구 입정동 177")],
    );
    let stats = c.verify(&mut catalog).await;

    assert_eq!(stats.no_review, 0);
    assert_eq!(text.calls(), 0);
    assert_eq!(catalog.len(), 1);
}
