// Scan pipeline and message service
// Orchestrates extract -> normalize -> route -> classify -> aggregate for
// full-page scans, and runs the typed request/response loop the popup and
// content script talk to.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    ClassificationResult, HateSpeechMap, LanguageLabel, Mode, Request, Response, ScanResponse,
    ScanStatus, SentencePrediction,
};

use super::classification::{
    aggregate, is_hate, run_throttled, ClassifierError, ColdStartManager, InferenceClient,
    LanguageRouter, SentenceResults,
};
use super::config::PipelineConfig;
use super::extractor;
use super::normalizer::SentenceNormalizer;
use super::observer::{ChangeObserver, MutationBatch};

pub struct ScanPipeline {
    config: PipelineConfig,
    client: Arc<InferenceClient>,
    router: LanguageRouter,
    normalizer: SentenceNormalizer,
    mode: Mode,
}

impl ScanPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let client = Arc::new(InferenceClient::new(config.classifier.clone()));
        let router = LanguageRouter::new(client.clone(), config.concurrency_limit);
        let normalizer = SentenceNormalizer::new(config.normalizer.clone());
        Self {
            config,
            client,
            router,
            normalizer,
            mode: Mode::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        info!(?mode, "moderation mode changed");
        self.mode = mode;
    }

    /// Batch scan: extract and classify everything visible in `html`.
    ///
    /// The first classification error settles the whole scan through the
    /// cold-start manager; otherwise results aggregate under the mode in
    /// effect when the scan finishes.
    pub async fn scan_page(&self, html: &str) -> ScanResponse {
        let scan_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let candidates = extractor::extract_from_html(html, &self.config.extractor);
        let mut seen = HashSet::new();
        let sentences = self.normalizer.process_batch(&candidates, &mut seen);
        info!(
            scan_id = %scan_id,
            candidates = candidates.len(),
            sentences = sentences.len(),
            "page text extracted"
        );

        let (english, tagalog) = self.router.partition(&sentences).await;
        debug!(
            scan_id = %scan_id,
            english = english.len(),
            tagalog = tagalog.len(),
            "sentences routed by language"
        );

        let mut cold_start = ColdStartManager::new(self.config.cold_start_delay);
        cold_start.begin();

        let english_outcomes = self
            .classify_group(&english, &self.config.classifier.english_hate_model)
            .await;
        let tagalog_outcomes = self
            .classify_group(&tagalog, &self.config.classifier.tagalog_hate_model)
            .await;

        let mut english_results: SentenceResults = Vec::new();
        let mut tagalog_results: SentenceResults = Vec::new();
        for (group, outcomes, results) in [
            (&english, english_outcomes, &mut english_results),
            (&tagalog, tagalog_outcomes, &mut tagalog_results),
        ] {
            for (sentence, outcome) in group.iter().zip(outcomes) {
                match outcome {
                    Ok(ranked) => results.push((sentence.clone(), ranked)),
                    Err(err) => {
                        let status = cold_start.fail(&err).await;
                        warn!(scan_id = %scan_id, ?status, "scan aborted: {}", err);
                        return ScanResponse::failed(scan_id, status);
                    }
                }
            }
        }
        cold_start.succeed();

        let agg = aggregate(
            &english_results,
            &tagalog_results,
            &self.config.classifier.english_hate_label,
            &self.config.classifier.tagalog_hate_label,
            self.mode,
        );
        info!(
            scan_id = %scan_id,
            english_hate = agg.counts.english_hate_count,
            tagalog_hate = agg.counts.tagalog_hate_count,
            elapsed_ms = started.elapsed().as_millis() as i64,
            "scan complete"
        );

        ScanResponse {
            scan_id,
            scan_result: ScanStatus::Success,
            detected_hate_speeches: agg.counts,
            hate_speech_map: agg.hate_speech_map,
            sentences,
        }
    }

    async fn classify_group(
        &self,
        sentences: &[String],
        model: &str,
    ) -> Vec<Result<Vec<ClassificationResult>, ClassifierError>> {
        let tasks: Vec<_> = sentences
            .iter()
            .cloned()
            .map(|sentence| {
                let client = self.client.clone();
                let model = model.to_string();
                async move { client.classify(&model, &sentence).await }
            })
            .collect();
        run_throttled(tasks, self.config.concurrency_limit).await
    }

    /// Real-time path: detect language and classify one sentence, no
    /// batching. Used for chat input and observer-dispatched sentences.
    pub async fn process_sentence(&self, raw: &str) -> SentencePrediction {
        let sentence = raw.trim().to_lowercase();
        let language = self.router.detect(&sentence).await;
        let model = match language {
            LanguageLabel::English => &self.config.classifier.english_hate_model,
            LanguageLabel::Tagalog => &self.config.classifier.tagalog_hate_model,
        };

        let mut cold_start = ColdStartManager::new(self.config.cold_start_delay);
        cold_start.begin();
        match self.client.classify(model, &sentence).await {
            Ok(prediction) => {
                cold_start.succeed();
                SentencePrediction {
                    status: ScanStatus::Success,
                    language,
                    prediction,
                }
            }
            Err(err) => {
                let status = cold_start.fail(&err).await;
                SentencePrediction {
                    status,
                    language,
                    prediction: Vec::new(),
                }
            }
        }
    }

    fn positive_label(&self, language: LanguageLabel) -> &str {
        match language {
            LanguageLabel::English => &self.config.classifier.english_hate_label,
            LanguageLabel::Tagalog => &self.config.classifier.tagalog_hate_label,
        }
    }
}

// ============ Message Service ============

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("scan service is no longer running")]
    Closed,
    /// The service dropped the reply channel; callers must treat an absent
    /// response as its own failure mode.
    #[error("scan service returned no response")]
    NoResponse,
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

#[derive(Clone)]
pub struct ScanServiceHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ScanServiceHandle {
    pub async fn request(&self, request: Request) -> Result<Response, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ServiceError::Closed)?;
        reply_rx.await.map_err(|_| ServiceError::NoResponse)
    }
}

pub struct ScanService;

impl ScanService {
    /// Run the pipeline behind a typed request/response channel. The loop is
    /// single-threaded: mode changes and the observer seen-set are only ever
    /// touched here.
    pub fn spawn(config: PipelineConfig) -> ScanServiceHandle {
        let (tx, mut rx) = mpsc::channel::<Envelope>(32);

        tokio::spawn(async move {
            let mut pipeline = ScanPipeline::new(config.clone());
            let mut observer: Option<ChangeObserver> = None;
            // Flagged sentences accumulated while the observer is enabled.
            let mut session_map = HateSpeechMap::new();
            let (observed_tx, mut observed_rx) = mpsc::channel::<String>(64);

            loop {
                tokio::select! {
                    envelope = rx.recv() => {
                        let Some(Envelope { request, reply }) = envelope else {
                            break;
                        };
                        let response = handle_request(
                            request,
                            &mut pipeline,
                            &mut observer,
                            &config,
                            &observed_tx,
                        )
                        .await;
                        if reply.send(response).is_err() {
                            debug!("caller dropped reply channel");
                        }
                    }
                    Some(sentence) = observed_rx.recv() => {
                        let prediction = pipeline.process_sentence(&sentence).await;
                        if prediction.status == ScanStatus::Success {
                            let label = pipeline.positive_label(prediction.language);
                            let threshold = pipeline.mode().threshold();
                            if is_hate(&prediction.prediction, label, threshold) {
                                info!(sentence = %sentence, "observer flagged sentence");
                                session_map.insert(sentence, prediction.prediction);
                            }
                        }
                    }
                }
            }

            if let Some(obs) = observer.take() {
                obs.stop().await;
            }
            info!(flagged = session_map.len(), "scan service stopped");
        });

        ScanServiceHandle { tx }
    }
}

async fn handle_request(
    request: Request,
    pipeline: &mut ScanPipeline,
    observer: &mut Option<ChangeObserver>,
    config: &PipelineConfig,
    observed_tx: &mpsc::Sender<String>,
) -> Response {
    match request {
        Request::ScanPage { html } => Response::Scan(pipeline.scan_page(&html).await),
        Request::ProcessSentence { sentence } => {
            Response::Prediction(pipeline.process_sentence(&sentence).await)
        }
        Request::SetMode { mode } => {
            let mode = Mode::from_selector(&mode);
            pipeline.set_mode(mode);
            Response::ModeSet { mode }
        }
        Request::ToggleObserver { enabled } => {
            if enabled {
                if observer.is_none() {
                    *observer = Some(ChangeObserver::start(
                        config.extractor.clone(),
                        config.normalizer.clone(),
                        observed_tx.clone(),
                    ));
                }
            } else if let Some(obs) = observer.take() {
                obs.stop().await;
            }
            Response::Observer {
                enabled: observer.is_some(),
            }
        }
        Request::MutationBatch { inserted_html } => {
            let delivered = match observer.as_ref() {
                Some(obs) => obs.submit(MutationBatch { inserted_html }).await,
                None => false,
            };
            if !delivered {
                debug!("mutation batch dropped, observer disabled");
            }
            Response::Observer { enabled: delivered }
        }
    }
}
