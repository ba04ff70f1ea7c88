//! Integration tests for the detection / extraction orchestrator.
//!
//! These tests drive the public API against scripted in-process engines, so
//! they need no network, no API keys and no OCR backend.
//!
//! Run with:
//!   cargo test --test orchestrator -- --nocapture

use async_trait::async_trait;
use futures::StreamExt;
use ocr_langdetect::{
    detect_stream, extract_batch, extract_from_bytes, EngineError, ErrorKind, ExtractionConfig,
    ExtractionProgressCallback, Extractor, InputFile, LanguageCandidate, OcrLangError,
    Recognition, RecognitionEngine, Stage, TextExtractor, Tier,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF";

/// Recognition engine returning a fixed payload and counting calls.
struct ScriptedRecognizer {
    result: Result<Recognition, EngineError>,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    fn scores(script: &str, scores: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Recognition {
                detected_script: script.to_string(),
                candidates: scores
                    .iter()
                    .map(|(c, s)| LanguageCandidate::new(*c, *s))
                    .collect(),
                stages: vec![Stage::new("script", serde_json::json!({ "label": script }))],
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(EngineError::Failed(message.to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionEngine for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, _file: &InputFile) -> Result<Recognition, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Extraction engine that records the language it was asked for.
struct RecordingExtractor {
    fail_with: Option<String>,
    calls: AtomicUsize,
    last_language: parking_lot::Mutex<Option<String>>,
}

impl RecordingExtractor {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail_with: None,
            calls: AtomicUsize::new(0),
            last_language: parking_lot::Mutex::new(None),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            calls: AtomicUsize::new(0),
            last_language: parking_lot::Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for RecordingExtractor {
    fn name(&self) -> &str {
        "recording"
    }

    async fn extract_text(&self, file: &InputFile, language: &str) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_language.lock() = Some(language.to_string());
        match self.fail_with {
            Some(ref msg) => Err(EngineError::Failed(msg.clone())),
            None => Ok(format!("text of {} read as {}", file.name(), language)),
        }
    }
}

/// Route library logs to the test harness; `RUST_LOG` overrides the default.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ocr_langdetect=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn png(name: &str) -> InputFile {
    InputFile::from_bytes(name, PNG_MAGIC.to_vec()).unwrap()
}

// ── Direct extraction ────────────────────────────────────────────────────────

#[tokio::test]
async fn preferred_language_skips_recognition() {
    let rec = ScriptedRecognizer::scores("Latin", &[("en", 95.0)]);
    let ext = RecordingExtractor::ok();
    let extractor = Extractor::new(rec.clone(), ext.clone());

    let result = extractor.extract(&png("menu.png"), Some("es")).await;

    assert!(result.success);
    assert_eq!(result.language.as_deref(), Some("es"));
    assert_eq!(result.text.as_deref(), Some("text of menu.png read as es"));
    assert!(result.suggestions.is_empty());
    assert!(result.detection.is_none());
    assert_eq!(rec.calls(), 0, "recognition must not run");
    assert_eq!(ext.last_language.lock().as_deref(), Some("es"));
}

#[tokio::test]
async fn unknown_preferred_code_is_passed_through() {
    let ext = RecordingExtractor::ok();
    let extractor = Extractor::new(ScriptedRecognizer::scores("Latin", &[]), ext.clone());

    let result = extractor.extract(&png("a.png"), Some("tlh")).await;

    assert!(result.success);
    assert_eq!(ext.last_language.lock().as_deref(), Some("tlh"));
}

// ── Automatic detection ──────────────────────────────────────────────────────

#[tokio::test]
async fn high_confidence_detection_has_no_suggestions() {
    let rec = ScriptedRecognizer::scores("Latin", &[("fr", 91.0), ("it", 40.0), ("es", 35.0)]);
    let ext = RecordingExtractor::ok();
    let extractor = Extractor::new(rec.clone(), ext.clone());

    let result = extractor.extract(&png("lettre.png"), None).await;

    assert!(result.success);
    assert_eq!(result.language.as_deref(), Some("fr"));
    assert_eq!(result.language_confidence, Some(91.0));
    assert!(result.suggestions.is_empty());
    let detection = result.detection.unwrap();
    assert_eq!(detection.confidence_tier, Tier::High);
    assert_eq!(detection.suggestions, vec!["it", "es"]);
    assert_eq!(rec.calls(), 1);
}

#[tokio::test]
async fn low_confidence_detection_attaches_suggestions() {
    let rec = ScriptedRecognizer::scores(
        "Latin",
        &[
            ("pt", 41.0),
            ("es", 39.5),
            ("gl", 30.0),
            ("it", 12.0),
            ("ca", 10.0),
            ("ro", 5.0),
        ],
    );
    let extractor = Extractor::new(rec, RecordingExtractor::ok());

    let result = extractor.extract(&png("placa.png"), None).await;

    assert!(result.success);
    assert_eq!(result.language.as_deref(), Some("pt"));
    assert_eq!(result.suggestions, vec!["es", "gl", "it", "ca"]);
    assert_eq!(
        result.detection.as_ref().map(|d| d.confidence_tier),
        Some(Tier::Low)
    );
}

#[tokio::test]
async fn medium_tier_still_suggests() {
    let rec = ScriptedRecognizer::scores("Cyrillic", &[("ru", 79.9), ("uk", 60.0)]);
    let extractor = Extractor::new(rec, RecordingExtractor::ok());

    let result = extractor.extract(&png("znak.png"), None).await;

    assert_eq!(result.suggestions, vec!["uk"]);
}

#[tokio::test]
async fn duplicate_codes_keep_highest_score() {
    let rec = ScriptedRecognizer::scores("Latin", &[("de", 40.0), ("nl", 55.0), ("de", 82.0)]);
    let extractor = Extractor::new(rec, RecordingExtractor::ok());

    let detection = extractor.detect(&png("schild.png")).await.unwrap();

    let codes: Vec<_> = detection.candidates.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["de", "nl"]);
    assert_eq!(detection.confidence, 82.0);
    assert_eq!(detection.stages.len(), 1);
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_candidates_fail_without_extracting() {
    init_tracing();
    let rec = ScriptedRecognizer::scores("Unknown", &[]);
    let ext = RecordingExtractor::ok();
    let extractor = Extractor::new(rec, ext.clone());

    let result = extractor.extract(&png("blank.png"), None).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::NoLanguageDetected));
    assert!(result
        .error_detail
        .as_deref()
        .unwrap()
        .contains("No language detected"));
    assert!(result.text.is_none());
    assert!(result.language.is_none());
    assert_eq!(ext.calls(), 0, "extraction must not run");
}

#[tokio::test]
async fn extraction_engine_error_is_verbatim() {
    init_tracing();
    let extractor = Extractor::new(
        ScriptedRecognizer::scores("Latin", &[("en", 88.0)]),
        RecordingExtractor::failing("tesseract: failed loading language 'en'"),
    );

    let result = extractor.extract(&png("doc.png"), None).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::ExtractionEngineError));
    assert_eq!(
        result.error_detail.as_deref(),
        Some("tesseract: failed loading language 'en'")
    );
    assert!(result.detection.is_some());
}

#[tokio::test]
async fn recognition_engine_error_is_reported() {
    init_tracing();
    let ext = RecordingExtractor::ok();
    let extractor = Extractor::new(ScriptedRecognizer::failing("HTTP 503: overloaded"), ext.clone());

    let result = extractor.extract(&png("doc.png"), None).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::ExtractionEngineError));
    assert_eq!(result.error_detail.as_deref(), Some("HTTP 503: overloaded"));
    assert_eq!(ext.calls(), 0);
}

#[tokio::test]
async fn candidate_without_code_is_invalid_input() {
    let rec = ScriptedRecognizer::scores("Latin", &[("en", 70.0), ("", 20.0)]);
    let extractor = Extractor::new(rec, RecordingExtractor::ok());

    let err = extractor.detect(&png("x.png")).await.unwrap_err();
    assert!(matches!(err, OcrLangError::InvalidInput { .. }));

    let result = extractor.extract(&png("x.png"), None).await;
    assert_eq!(result.error_kind, Some(ErrorKind::InvalidInput));
}

// ── Caching and progress ─────────────────────────────────────────────────────

#[tokio::test]
async fn identical_files_share_a_cached_detection() {
    let rec = ScriptedRecognizer::scores("Latin", &[("sv", 66.0)]);
    let extractor = Extractor::new(rec.clone(), RecordingExtractor::ok()).with_cache(16);

    let first = extractor.extract(&png("a.png"), None).await;
    let second = extractor.extract(&png("copy-of-a.png"), None).await;
    let other = extractor
        .extract(&InputFile::from_bytes("b.jpg", JPEG_MAGIC.to_vec()).unwrap(), None)
        .await;

    assert!(first.success && second.success && other.success);
    assert_eq!(first.detection, second.detection);
    assert_eq!(rec.calls(), 2);
}

#[test]
fn detection_is_usable_from_sync_code() {
    let extractor = Extractor::new(
        ScriptedRecognizer::scores("Greek", &[("el", 77.0)]),
        RecordingExtractor::ok(),
    );
    let detection = tokio_test::block_on(extractor.detect(&png("pinakida.png"))).unwrap();
    assert_eq!(detection.detected_script, "Greek");
    assert_eq!(detection.confidence_tier, Tier::Medium);
}

#[derive(Default)]
struct EventLog {
    detections: AtomicUsize,
    completions: AtomicUsize,
    failures: AtomicUsize,
    batches: AtomicUsize,
}

impl ExtractionProgressCallback for EventLog {
    fn on_detection_complete(&self, _file: &str, _primary: Option<&str>, _tier: Tier) {
        self.detections.fetch_add(1, Ordering::SeqCst);
    }

    fn on_extraction_complete(&self, _file: &str, _language: &str, _chars: usize) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_extraction_failed(&self, _file: &str, _error: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_complete(&self, _total: usize, _success: usize) {
        self.batches.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_preserves_input_order_and_isolates_failures() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = Vec::new();
    for i in 0..5 {
        let path = dir.path().join(format!("page{i}.png"));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(PNG_MAGIC).unwrap();
        f.write_all(&[i as u8]).unwrap();
        inputs.push(path.to_string_lossy().to_string());
    }
    inputs.insert(2, dir.path().join("missing.png").to_string_lossy().to_string());

    let log = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .recognizer(ScriptedRecognizer::scores("Latin", &[("en", 90.0)]))
        .extractor(RecordingExtractor::ok())
        .concurrency(3)
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let items = extract_batch(inputs.clone(), None, &config).await.unwrap();

    assert_eq!(items.len(), 6);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item.index, i);
        assert_eq!(item.input, inputs[i]);
    }
    assert!(!items[2].result.success);
    assert_eq!(items[2].result.error_kind, Some(ErrorKind::InvalidInput));
    assert_eq!(items.iter().filter(|i| i.result.success).count(), 5);

    assert_eq!(log.detections.load(Ordering::SeqCst), 5);
    assert_eq!(log.completions.load(Ordering::SeqCst), 5);
    assert_eq!(log.failures.load(Ordering::SeqCst), 1);
    assert_eq!(log.batches.load(Ordering::SeqCst), 1);
}

/// Recognition engine that records how many calls overlap.
#[derive(Default)]
struct OverlapRecognizer {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl RecognitionEngine for OverlapRecognizer {
    fn name(&self) -> &str {
        "overlap"
    }

    async fn recognize(&self, _file: &InputFile) -> Result<Recognition, EngineError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Recognition {
            detected_script: "Latin".to_string(),
            candidates: vec![LanguageCandidate::new("en", 90.0)],
            stages: Vec::new(),
        })
    }
}

#[tokio::test]
async fn detect_stream_runs_files_concurrently_up_to_the_limit() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = Vec::new();
    for i in 0..6 {
        let path = dir.path().join(format!("scan{i}.png"));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(PNG_MAGIC).unwrap();
        f.write_all(&[i as u8]).unwrap();
        inputs.push(path.to_string_lossy().to_string());
    }

    let recognizer = Arc::new(OverlapRecognizer::default());
    let config = ExtractionConfig::builder()
        .recognizer(recognizer.clone())
        .extractor(RecordingExtractor::ok())
        .concurrency(2)
        .build()
        .unwrap();

    let mut items: Vec<_> = detect_stream(inputs.clone(), &config).unwrap().collect().await;
    items.sort_by_key(|i| i.index);

    assert_eq!(items.len(), 6);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item.input, inputs[i]);
        let detection = item.result.as_ref().unwrap();
        assert_eq!(detection.primary_language.as_ref().unwrap().code, "en");
    }
    assert_eq!(recognizer.peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn bytes_entry_point_uses_configured_engines() {
    let config = ExtractionConfig::builder()
        .recognizer(ScriptedRecognizer::scores("Han", &[("zh-cn", 84.0), ("ja", 20.0)]))
        .extractor(RecordingExtractor::ok())
        .build()
        .unwrap();

    let result = extract_from_bytes("sign.jpg", JPEG_MAGIC.to_vec(), None, &config).await;

    assert!(result.success);
    assert_eq!(result.language.as_deref(), Some("zh-cn"));
    let text = result.into_result().unwrap();
    assert_eq!(text.text, "text of sign.jpg read as zh-cn");
}
