//! Upload → text → adjectives → layout → PNG.
//!
//! Tagging, layout and rendering are CPU-bound and run in one
//! `tokio::task::spawn_blocking` call. Each run owns its layout grid, so
//! concurrent uploads never share mutable state.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cloud::upload::{store_upload, UploadedFile};
use crate::errors::AppError;
use crate::layout::{layout, LayoutBudget, LayoutResult};
use crate::render::write_artifact;
use crate::state::AppState;
use crate::tagging::select_tokens;

/// Summary of one generated cloud, returned to API and page callers.
#[derive(Debug, Clone, Serialize)]
pub struct CloudReport {
    pub run_id: Uuid,
    /// Path relative to the static root, e.g. `uploads/wordcloud.png`.
    pub image_path: String,
    pub placed: usize,
    pub skipped: Vec<String>,
    /// Informational note when words were omitted for space.
    pub omitted_note: Option<String>,
    pub excluded: usize,
    pub interrupted: bool,
    pub generated_at: DateTime<Utc>,
}

/// Full upload flow: format check, storage, extraction, generation.
pub async fn process_upload(state: &AppState, upload: UploadedFile) -> Result<CloudReport, AppError> {
    let format = upload.format()?;
    let stored = store_upload(&state.config.upload_dir, &upload).await?;
    let extracted = state.extractor.extract(&stored, format).await;
    if let Err(e) = stored.close() {
        warn!(error = %e, "Failed to remove stored upload");
    }
    let text = extracted?;

    if text.trim().is_empty() {
        debug!(filename = %upload.filename, "No text extracted");
        return Err(AppError::NothingToRender);
    }

    generate_cloud(state, text).await
}

/// Tags `text`, lays out the selected class and writes the image artifact.
pub async fn generate_cloud(state: &AppState, text: String) -> Result<CloudReport, AppError> {
    let run_id = Uuid::new_v4();
    let state_clone = state.clone();

    let result: LayoutResult = tokio::task::spawn_blocking(move || {
        let tagged = state_clone.tagger.tag(&text);
        let tokens = select_tokens(&tagged, &state_clone.config.pos_class);
        let budget = budget_for(state_clone.config.layout_timeout_ms);
        layout(
            &tokens,
            &state_clone.config.layout_config(),
            state_clone.measurer.as_ref(),
            &budget,
        )
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))??;

    if result.interrupted {
        warn!(%run_id, "Layout stopped early; remaining words skipped");
    }

    let renderer = state.renderer.clone();
    let rule = state.config.color_rule;
    let static_dir = state.config.static_dir.clone();
    let render_input = result.clone();
    let image_path = tokio::task::spawn_blocking(move || {
        let png = renderer.render(
            render_input.canvas_width,
            render_input.canvas_height,
            &render_input.placements,
            rule,
        )?;
        write_artifact(&static_dir, &png)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;

    info!(
        %run_id,
        placed = result.placements.len(),
        skipped = result.skipped.len(),
        excluded = result.excluded,
        "Word cloud generated"
    );

    Ok(build_report(run_id, image_path, result))
}

fn budget_for(timeout_ms: u64) -> LayoutBudget {
    LayoutBudget {
        deadline: (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms)),
        ..LayoutBudget::unlimited()
    }
}

fn build_report(run_id: Uuid, image_path: String, result: LayoutResult) -> CloudReport {
    let skipped: Vec<String> = result.skipped.into_iter().map(|w| w.text).collect();
    let omitted_note = (!skipped.is_empty()).then(|| omitted_note(skipped.len()));
    CloudReport {
        run_id,
        image_path,
        placed: result.placements.len(),
        skipped,
        omitted_note,
        excluded: result.excluded,
        interrupted: result.interrupted,
        generated_at: Utc::now(),
    }
}

pub fn omitted_note(count: usize) -> String {
    if count == 1 {
        "1 word omitted for space".to_string()
    } else {
        format!("{count} words omitted for space")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::config::Config;
    use crate::extract::{DocumentFormat, ExtractError, FileTextExtractor, TextExtractor};
    use crate::layout::{FontFamily, FontMetricMeasurer, ScalingMode};
    use crate::render::{ColorRule, ImageRenderer};
    use crate::tagging::{PosTagger, TaggedToken};

    /// Splits on whitespace; tokens ending in `的` are adjectives, others nouns.
    pub(crate) struct SuffixTagger;

    impl PosTagger for SuffixTagger {
        fn tag(&self, text: &str) -> Vec<TaggedToken> {
            text.split_whitespace()
                .map(|t| match t.strip_suffix('的') {
                    Some(stem) => TaggedToken {
                        token: stem.to_string(),
                        class: "a".to_string(),
                    },
                    None => TaggedToken {
                        token: t.to_string(),
                        class: "n".to_string(),
                    },
                })
                .collect()
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl TextExtractor for FailingExtractor {
        async fn extract(&self, _: &Path, _: DocumentFormat) -> Result<String, ExtractError> {
            Err(ExtractError::Parse("corrupt".to_string()))
        }
    }

    pub(crate) fn test_config(root: &Path) -> Config {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            upload_dir: root.join("uploads"),
            static_dir: root.join("static"),
            font_path: root.join("missing.ttf"),
            font_family: FontFamily::SimHei,
            canvas_width: 400,
            canvas_height: 200,
            min_font_size: 8,
            max_font_size: 60,
            scaling_mode: ScalingMode::Sqrt,
            max_words: 100,
            random_seed: 1,
            max_backoff_attempts: 64,
            prefer_horizontal: 0.9,
            word_margin: 2,
            pos_class: "a".to_string(),
            color_rule: ColorRule::Palette,
            layout_timeout_ms: 0,
            max_upload_bytes: 1024 * 1024,
        }
    }

    pub(crate) fn test_state(root: &Path) -> AppState {
        let config = test_config(root);
        let family = config.font_family;
        AppState {
            config,
            extractor: Arc::new(FileTextExtractor),
            tagger: Arc::new(SuffixTagger),
            measurer: Arc::new(FontMetricMeasurer::new(family)),
            renderer: Arc::new(ImageRenderer::new(None)),
        }
    }

    #[tokio::test]
    async fn test_generate_cloud_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let report = generate_cloud(&state, "好的 天气 美丽的 好的 山".to_string())
            .await
            .unwrap();
        assert_eq!(report.image_path, "uploads/wordcloud.png");
        assert_eq!(report.placed, 2);
        assert!(report.skipped.is_empty());
        assert!(report.omitted_note.is_none());
        let png = std::fs::read(dir.path().join("static/uploads/wordcloud.png")).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn test_generate_cloud_without_adjectives_is_nothing_to_render() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let err = generate_cloud(&state, "天气 山 水".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::NothingToRender));
    }

    #[tokio::test]
    async fn test_process_upload_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let upload = UploadedFile {
            filename: "cloud.exe".to_string(),
            data: bytes::Bytes::from_static(b"MZ"),
        };
        let err = process_upload(&state, upload).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFile(_)));
        assert!(!dir.path().join("uploads").exists(), "rejected uploads are not stored");
    }

    #[tokio::test]
    async fn test_process_upload_doc_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let upload = UploadedFile {
            filename: "old.doc".to_string(),
            data: bytes::Bytes::from_static(b"\xd0\xcf\x11\xe0"),
        };
        let err = process_upload(&state, upload).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFile(_)));
    }

    #[tokio::test]
    async fn test_process_upload_parse_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        state.extractor = Arc::new(FailingExtractor);
        let upload = UploadedFile {
            filename: "a.docx".to_string(),
            data: bytes::Bytes::from_static(b"junk"),
        };
        let err = process_upload(&state, upload).await.unwrap_err();
        assert!(matches!(err, AppError::UnreadableFile(_)));
    }

    #[tokio::test]
    async fn test_process_upload_empty_text_is_nothing_to_render() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let upload = UploadedFile {
            filename: "blank.txt".to_string(),
            data: bytes::Bytes::from_static(b"  \n "),
        };
        let err = process_upload(&state, upload).await.unwrap_err();
        assert!(matches!(err, AppError::NothingToRender));
    }

    #[tokio::test]
    async fn test_crowded_canvas_reports_omitted_words() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());
        state.config.canvas_width = 40;
        state.config.canvas_height = 40;
        state.config.min_font_size = 10;
        state.config.max_font_size = 20;
        let text: String = (0..60)
            .map(|i| format!("{}的 ", char::from_u32(0x4E00 + i).unwrap()))
            .collect();
        let report = generate_cloud(&state, text).await.unwrap();
        assert!(!report.skipped.is_empty());
        assert_eq!(report.placed + report.skipped.len(), 60);
        assert_eq!(report.omitted_note, Some(omitted_note(report.skipped.len())));
    }

    fn stored_uploads(root: &Path) -> usize {
        std::fs::read_dir(root.join("uploads"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_process_upload_leaves_no_stored_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        for _ in 0..3 {
            let upload = UploadedFile {
                filename: "a.txt".to_string(),
                data: bytes::Bytes::from_static("好的 风景".as_bytes()),
            };
            process_upload(&state, upload).await.unwrap();
        }
        assert_eq!(stored_uploads(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_failed_uploads_leave_no_stored_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path());

        let doc = UploadedFile {
            filename: "old.doc".to_string(),
            data: bytes::Bytes::from_static(b"\xd0\xcf\x11\xe0"),
        };
        assert!(process_upload(&state, doc).await.is_err());

        let blank = UploadedFile {
            filename: "blank.txt".to_string(),
            data: bytes::Bytes::from_static(b" "),
        };
        assert!(process_upload(&state, blank).await.is_err());

        state.extractor = Arc::new(FailingExtractor);
        let corrupt = UploadedFile {
            filename: "a.docx".to_string(),
            data: bytes::Bytes::from_static(b"junk"),
        };
        assert!(process_upload(&state, corrupt).await.is_err());

        assert_eq!(stored_uploads(dir.path()), 0);
    }

    #[test]
    fn test_omitted_note_wording() {
        assert_eq!(omitted_note(1), "1 word omitted for space");
        assert_eq!(omitted_note(7), "7 words omitted for space");
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        assert!(budget_for(0).deadline.is_none());
        assert!(budget_for(500).deadline.is_some());
    }
}
