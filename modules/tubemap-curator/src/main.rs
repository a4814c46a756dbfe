use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use evidence_client::{
    http_client, GooglePlaces, GooglePlacesConfig, KakaoConfig, KakaoLocal, NaverConfig,
    NaverSearch, OpenAiChat, OpenAiConfig, YouTube, YouTubeConfig,
};
use tubemap_common::{AppConfig, CurationRules};
use tubemap_curator::extractor::{InferenceStage, OpenAiInference};
use tubemap_curator::traits::{
    BlogEvidence, CommentEvidence, EvidenceSource, ImageEvidence, PhotoSource, VideoEvidence,
};
use tubemap_curator::{Catalog, Collaborators, Curator, PipelineConfig};

const INFERENCE_MODEL: &str = "gpt-4o-mini";

#[derive(Parser)]
#[command(name = "tubemap-curator", about = "TubeMap venue collection and verification")]
#[command(version)]
struct Cli {
    /// Catalog file (defaults to CATALOG_PATH or src/data/places.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Curation rules TOML (defaults to the bundled rules)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Worker pool width, clamped to 1..=10
    #[arg(long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover and append new venues
    Collect {
        /// Number of new venues to add before stopping
        #[arg(long, default_value_t = 10)]
        target: usize,

        /// Discovery keyword; repeatable. Defaults to the rules' seeds.
        #[arg(long = "seed")]
        seeds: Vec<String>,
    },
    /// Re-verify every record, replacing images and deleting failures
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tubemap=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!("TubeMap curator starting...");

    let mut config = AppConfig::from_env().context("loading configuration")?;
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }
    if let Some(path) = cli.rules {
        config.rules_path = Some(path);
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let rules = CurationRules::load_or_bundled(config.rules_path.as_deref())
        .context("loading curation rules")?;
    let collaborators = build_collaborators(&config)?;
    let curator = Curator::new(
        rules,
        collaborators,
        PipelineConfig {
            workers: config.workers,
            call_timeout: config.call_timeout,
        },
    )
    .context("building curator")?;

    let mut catalog = Catalog::load(&config.catalog_path)
        .with_context(|| format!("loading catalog {}", config.catalog_path.display()))?;

    let stats = match cli.command {
        Command::Collect { target, seeds } => curator.collect(&mut catalog, target, &seeds).await,
        Command::Verify => curator.verify(&mut catalog).await,
    };

    if catalog.is_dirty() {
        catalog
            .save()
            .with_context(|| format!("saving catalog {}", config.catalog_path.display()))?;
    } else {
        info!("Catalog unchanged, not saving");
    }

    println!("{stats}");
    Ok(())
}

fn build_collaborators(config: &AppConfig) -> Result<Collaborators> {
    let client = http_client(config.call_timeout).context("building HTTP client")?;

    let kakao = KakaoLocal::new(client.clone(), KakaoConfig::new(&config.kakao_api_key));
    let naver = Arc::new(NaverSearch::new(
        client.clone(),
        NaverConfig::new(&config.naver_client_id, &config.naver_client_secret),
    ));

    let youtube = config
        .youtube_api_key
        .as_ref()
        .map(|key| Arc::new(YouTube::new(client.clone(), YouTubeConfig::new(key))));
    if youtube.is_none() {
        info!("YOUTUBE_API_KEY unset, video discovery and comment reviews disabled");
    }

    let photos = config.google_places_api_key.as_ref().map(|key| {
        Arc::new(GooglePlaces::new(client.clone(), GooglePlacesConfig::new(key)))
            as Arc<dyn PhotoSource>
    });

    let inference = config.openai_api_key.as_ref().map(|key| {
        let chat = OpenAiChat::new(client.clone(), OpenAiConfig::new(key, INFERENCE_MODEL));
        Arc::new(OpenAiInference::new(Arc::new(chat))) as Arc<dyn InferenceStage>
    });

    Ok(Collaborators {
        places: Arc::new(kakao),
        text: Arc::new(BlogEvidence(naver.clone())),
        images: Arc::new(ImageEvidence(naver)),
        videos: youtube
            .clone()
            .map(|yt| Arc::new(VideoEvidence(yt)) as Arc<dyn EvidenceSource>),
        comments: youtube.map(|yt| Arc::new(CommentEvidence(yt)) as Arc<dyn EvidenceSource>),
        photos,
        inference,
    })
}
