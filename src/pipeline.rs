// Recognize + translate pipeline
//
// Runs off the UI thread on the tokio runtime and reports once through a oneshot channel.
// A capture `Session` owns a generation counter; closing the session bumps it so that a
// pipeline still in flight reports `Discarded` instead of touching a dead surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::ocr::{OcrResult, TextRecognizer};
use crate::pixel_buffer::PixelBuffer;
use crate::translation::{TextBlockTranslator, TranslationResult};

// ==================== Session ====================

#[derive(Debug, Default)]
struct SessionState {
    open: bool,
    running: bool,
}

#[derive(Debug)]
struct SessionInner {
    generation: AtomicU64,
    state: Mutex<SessionState>,
}

/// Liveness of one capture surface.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                generation: AtomicU64::new(0),
                state: Mutex::new(SessionState {
                    open: true,
                    running: false,
                }),
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.lock().open
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Close the surface; any in-flight pipeline becomes stale.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        state.open = false;
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Claim the session's single pipeline slot.
    ///
    /// `None` when the session is closed or a pipeline is already running.
    pub fn begin(&self) -> Option<SessionTicket> {
        let mut state = self.inner.state.lock();
        if !state.open || state.running {
            return None;
        }
        state.running = true;
        Some(SessionTicket {
            session: self.clone(),
            generation: self.generation(),
        })
    }
}

/// Proof of a running pipeline. Dropping it frees the session's pipeline slot.
#[derive(Debug)]
pub struct SessionTicket {
    session: Session,
    generation: u64,
}

impl SessionTicket {
    pub fn is_live(&self) -> bool {
        self.session.is_open() && self.session.generation() == self.generation
    }
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        self.session.inner.state.lock().running = false;
    }
}

// ==================== Pipeline ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Recognition only.
    Recognize,
    /// Recognition followed by line translation.
    Translate,
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub image: PixelBuffer,
    pub mode: PipelineMode,
    pub ocr_language: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Translated {
        ocr: OcrResult,
        translation: TranslationResult,
    },
    Recognized(OcrResult),
    /// Recognition ran and found nothing.
    NoText,
    /// No recognition engine for the requested language.
    RecognitionUnavailable(String),
    /// Recognition failed for another reason.
    Failed(String),
    /// The session closed before the result arrived.
    Discarded,
}

pub struct Pipeline {
    recognizer: Arc<dyn TextRecognizer>,
    blocks: TextBlockTranslator,
}

impl Pipeline {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, blocks: TextBlockTranslator) -> Self {
        Self { recognizer, blocks }
    }

    /// Run the job inline, checking liveness after every suspension point.
    pub async fn run(&self, ticket: &SessionTicket, request: PipelineRequest) -> PipelineOutcome {
        let recognized = self
            .recognizer
            .recognize(&request.image, &request.ocr_language)
            .await;
        if !ticket.is_live() {
            debug!("Session closed during recognition, discarding");
            return PipelineOutcome::Discarded;
        }

        let ocr = match recognized {
            Ok(ocr) => ocr,
            Err(OcrError::EngineUnavailable(msg)) => {
                warn!("Recognition unavailable: {}", msg);
                return PipelineOutcome::RecognitionUnavailable(msg);
            }
            Err(e) => {
                warn!("Recognition failed: {}", e);
                return PipelineOutcome::Failed(e.to_string());
            }
        };
        if ocr.is_empty() {
            info!("No text recognized");
            return PipelineOutcome::NoText;
        }
        if request.mode == PipelineMode::Recognize {
            return PipelineOutcome::Recognized(ocr);
        }

        let is_live = || ticket.is_live();
        let translation = self
            .blocks
            .translate_lines_while(&ocr.lines, &request.source_lang, &request.target_lang, &is_live)
            .await;
        if !translation.success || !ticket.is_live() {
            debug!("Session closed during translation, discarding");
            return PipelineOutcome::Discarded;
        }

        info!("Translated {} block(s)", translation.blocks.len());
        PipelineOutcome::Translated { ocr, translation }
    }

    /// Start the job on the tokio runtime.
    ///
    /// Returns `None` when the session is closed or already has a pipeline running.
    pub fn spawn(
        self: &Arc<Self>,
        session: &Session,
        request: PipelineRequest,
    ) -> Option<oneshot::Receiver<PipelineOutcome>> {
        let ticket = session.begin()?;
        let (tx, rx) = oneshot::channel();
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = pipeline.run(&ticket, request).await;
            drop(ticket);
            // The receiver may be gone if the host stopped listening.
            let _ = tx.send(outcome);
        });
        Some(rx)
    }
}
