//! Streaming batch API: emit per-file results as they complete.
//!
//! [`crate::extract::extract_batch`] waits for every file and returns them in
//! input order. [`extract_stream`] yields each [`BatchItem`] as soon as its
//! file finishes, so callers can print or persist results incrementally.
//! Items arrive in completion order; sort by `index` if order matters.
//! [`detect_stream`] does the same for detection alone.

use crate::config::ExtractionConfig;
use crate::engine::input;
use crate::error::OcrLangError;
use crate::extract::Extractor;
use crate::output::{DetectionResult, ExtractionResult};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// One input's outcome within a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    /// Position of the input in the original list.
    pub index: usize,
    /// The path or URL as given.
    pub input: String,
    pub result: ExtractionResult,
}

/// A boxed stream of batch items.
pub type ExtractionStream = Pin<Box<dyn Stream<Item = BatchItem> + Send>>;

/// One input's detection outcome within a batch.
#[derive(Debug)]
pub struct DetectionItem {
    pub index: usize,
    pub input: String,
    pub result: Result<DetectionResult, OcrLangError>,
}

/// A boxed stream of detection items.
pub type DetectionStream = Pin<Box<dyn Stream<Item = DetectionItem> + Send>>;

/// Extract every input with up to `config.concurrency` files in flight.
///
/// # Returns
/// - `Ok(ExtractionStream)`: one item per input, failures included
/// - `Err(OcrLangError)`: no engine could be built from `config`
///
/// # Example
/// ```rust,no_run
/// use ocr_langdetect::{extract_stream, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let inputs = vec!["a.png".to_string(), "b.jpg".to_string()];
/// let mut stream = extract_stream(inputs, None, &ExtractionConfig::default())?;
/// while let Some(item) = stream.next().await {
///     println!("{}: success={}", item.input, item.result.success);
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract_stream(
    inputs: Vec<String>,
    preferred_language: Option<String>,
    config: &ExtractionConfig,
) -> Result<ExtractionStream, OcrLangError> {
    let extractor = Arc::new(Extractor::from_config(config)?);
    let download_timeout = config.download_timeout_secs;
    let concurrency = config.concurrency.max(1);
    let progress = config.progress_callback.clone();
    info!(
        "Streaming extraction of {} inputs (concurrency {})",
        inputs.len(),
        concurrency
    );

    let s = stream::iter(inputs.into_iter().enumerate().map(move |(index, input_str)| {
        let extractor = Arc::clone(&extractor);
        let preferred = preferred_language.clone();
        let progress = progress.clone();
        async move {
            let result = match input::resolve_input(&input_str, download_timeout).await {
                Ok(file) => extractor.extract(&file, preferred.as_deref()).await,
                Err(e) => {
                    warn!("Could not read {}: {}", input_str, e);
                    if let Some(cb) = progress {
                        cb.on_extraction_failed(&input_str, &e.to_string());
                    }
                    ExtractionResult::failed(&e, None)
                }
            };
            BatchItem {
                index,
                input: input_str,
                result,
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

/// Detect the language of every input with up to `config.concurrency` files
/// in flight. Items arrive in completion order.
pub fn detect_stream(
    inputs: Vec<String>,
    config: &ExtractionConfig,
) -> Result<DetectionStream, OcrLangError> {
    let extractor = Arc::new(Extractor::from_config(config)?);
    let download_timeout = config.download_timeout_secs;
    let concurrency = config.concurrency.max(1);
    info!(
        "Streaming detection of {} inputs (concurrency {})",
        inputs.len(),
        concurrency
    );

    let s = stream::iter(inputs.into_iter().enumerate().map(move |(index, input_str)| {
        let extractor = Arc::clone(&extractor);
        async move {
            let result = match input::resolve_input(&input_str, download_timeout).await {
                Ok(file) => extractor.detect(&file).await,
                Err(e) => {
                    warn!("Could not read {}: {}", input_str, e);
                    Err(e)
                }
            };
            DetectionItem {
                index,
                input: input_str,
                result,
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
