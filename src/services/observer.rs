// Change Observer
// Consumes batches of newly inserted DOM content (delivered by the
// content-script mutation callback, which is glue outside this crate) and
// feeds fresh sentences into the real-time classification path.

use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::{ExtractorConfig, NormalizerConfig};
use super::extractor;
use super::normalizer::SentenceNormalizer;

/// One delivery from the mutation notification mechanism: the serialized
/// subtrees that were inserted since the last callback.
#[derive(Debug, Clone)]
pub struct MutationBatch {
    pub inserted_html: Vec<String>,
}

/// Handle to a running observation task.
///
/// Sentences already emitted during this observation's lifetime are never
/// re-emitted; the seen-set persists across batches until `stop`.
pub struct ChangeObserver {
    batch_tx: mpsc::Sender<MutationBatch>,
    task: JoinHandle<()>,
}

impl ChangeObserver {
    pub fn start(
        extractor_config: ExtractorConfig,
        normalizer_config: NormalizerConfig,
        out: mpsc::Sender<String>,
    ) -> Self {
        let (batch_tx, mut batch_rx) = mpsc::channel::<MutationBatch>(32);

        let task = tokio::spawn(async move {
            let normalizer = SentenceNormalizer::new(normalizer_config);
            let mut seen: HashSet<String> = HashSet::new();
            info!("change observer started");

            while let Some(batch) = batch_rx.recv().await {
                for html in &batch.inserted_html {
                    let candidates = extractor::extract_from_html(html, &extractor_config);
                    let sentences = normalizer.process_batch(&candidates, &mut seen);
                    for sentence in sentences {
                        // Dispatch one sentence at a time, in delivery order.
                        if out.send(sentence).await.is_err() {
                            debug!("observer output closed, stopping early");
                            return;
                        }
                    }
                }
            }

            info!("change observer stopped");
        });

        Self { batch_tx, task }
    }

    /// Forward a mutation batch to the observation task. Returns false once
    /// the observer has shut down.
    pub async fn submit(&self, batch: MutationBatch) -> bool {
        self.batch_tx.send(batch).await.is_ok()
    }

    /// Stop observing: closes the intake channel and waits for the task so
    /// no further dispatches fire after this returns.
    pub async fn stop(self) {
        drop(self.batch_tx);
        if let Err(e) = self.task.await {
            warn!("observer task did not shut down cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn observer_with_output() -> (ChangeObserver, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(16);
        let observer = ChangeObserver::start(
            ExtractorConfig::default(),
            NormalizerConfig::default(),
            tx,
        );
        (observer, rx)
    }

    #[tokio::test]
    async fn test_emits_sentences_from_inserted_content() {
        let (observer, mut rx) = observer_with_output();
        let ok = observer
            .submit(MutationBatch {
                inserted_html: vec!["<p>Somebody posted a new comment. Short no.</p>".to_string()],
            })
            .await;
        assert!(ok);

        let sentence = rx.recv().await.unwrap();
        assert_eq!(sentence, "somebody posted a new comment");
        observer.stop().await;
    }

    #[tokio::test]
    async fn test_seen_set_persists_across_batches() {
        let (observer, mut rx) = observer_with_output();
        let batch = MutationBatch {
            inserted_html: vec!["<p>The same comment appears twice.</p>".to_string()],
        };
        observer.submit(batch.clone()).await;
        observer.submit(batch).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first, "the same comment appears twice");

        let second = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(second.is_err(), "duplicate sentence was re-emitted");
        observer.stop().await;
    }

    #[tokio::test]
    async fn test_stop_closes_intake() {
        let (observer, _rx) = observer_with_output();
        let tx = observer.batch_tx.clone();
        observer.stop().await;
        assert!(tx
            .send(MutationBatch {
                inserted_html: vec![],
            })
            .await
            .is_err());
    }
}
