mod cloud;
mod config;
mod errors;
mod extract;
mod layout;
mod render;
mod routes;
mod state;
mod tagging;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use ab_glyph::FontVec;

use crate::config::Config;
use crate::extract::FileTextExtractor;
use crate::layout::{AbGlyphMeasurer, FontMetricMeasurer, GlyphMeasurer};
use crate::render::ImageRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tagging::JiebaTagger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on invalid env values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting word cloud API v{}", env!("CARGO_PKG_VERSION"));

    // Measurer and renderer share one font; fall back to the static table without one
    let (measurer, renderer): (Arc<dyn GlyphMeasurer>, ImageRenderer) =
        match load_font_bytes(&config.font_path) {
            Ok(bytes) => {
                let measure_font = FontVec::try_from_vec(bytes.clone())
                    .context("parsing font for measurement")?;
                let render_font =
                    FontVec::try_from_vec(bytes).context("parsing font for rendering")?;
                info!(path = %config.font_path.display(), "Font loaded");
                (
                    Arc::new(AbGlyphMeasurer::new(measure_font)),
                    ImageRenderer::new(Some(render_font)),
                )
            }
            Err(e) => {
                warn!(
                    path = %config.font_path.display(),
                    error = %e,
                    family = ?config.font_family,
                    "Font unavailable; using static metric table and block rendering"
                );
                (
                    Arc::new(FontMetricMeasurer::new(config.font_family)),
                    ImageRenderer::new(None),
                )
            }
        };

    // Jieba dictionary load is slow; do it once at startup
    let tagger = Arc::new(JiebaTagger::new());
    info!("Tagger initialized (jieba, class '{}')", config.pos_class);

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("creating {}", config.upload_dir.display()))?;
    tokio::fs::create_dir_all(config.static_dir.join(render::ARTIFACT_DIR))
        .await
        .with_context(|| format!("creating {}", config.static_dir.display()))?;

    info!(
        "Layout canvas: {}x{} font {}..{} ({:?})",
        config.canvas_width,
        config.canvas_height,
        config.min_font_size,
        config.max_font_size,
        config.scaling_mode
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        extractor: Arc::new(FileTextExtractor),
        tagger,
        measurer,
        renderer: Arc::new(renderer),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_font_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading font {}", path.display()))
}
