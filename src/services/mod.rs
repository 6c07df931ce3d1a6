// Bantay core services

pub mod classification;
pub mod config;
pub mod extractor;
pub mod normalizer;
pub mod observer;
pub mod scanner;

pub use config::{ClassifierConfig, ExtractorConfig, NormalizerConfig, PipelineConfig};
pub use normalizer::SentenceNormalizer;
pub use observer::{ChangeObserver, MutationBatch};
pub use scanner::{ScanPipeline, ScanService, ScanServiceHandle, ServiceError};

pub use classification::{
    aggregate, classify_error, is_hate, run_throttled, ClassifierError, ColdStartManager,
    ColdStartState, ErrorClass, InferenceClient, LanguageRouter, ScanAggregation,
};
