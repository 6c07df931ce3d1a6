// Classification Module
// Remote classification pipeline organized into specialized submodules:
// - client: one-request-per-call wrapper over the inference endpoint
// - throttle: order-preserving concurrency-limited task runner
// - router: language detection and per-language batch partitioning
// - aggregation: mode-threshold counting of positive results
// - cold_start: transient/terminal failure classification and outcomes

pub mod aggregation;
pub mod client;
pub mod cold_start;
pub mod router;
pub mod throttle;

pub use aggregation::{aggregate, is_hate, ScanAggregation, SentenceResults};
pub use client::{parse_results, truncate_to_budget, ClassifierError, InferenceClient};
pub use cold_start::{classify_error, ColdStartManager, ColdStartState, ErrorClass};
pub use router::LanguageRouter;
pub use throttle::run_throttled;
