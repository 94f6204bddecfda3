pub mod feed_list;
pub mod ingestion_service;
pub mod normalizer;
pub mod storage_writer;
pub mod summary_service;
pub mod windowed_reader;

pub use feed_list::load_feed_list;
pub use ingestion_service::{FailurePolicy, IngestOptions, IngestOutcome, IngestionService};
pub use normalizer::ItemNormalizer;
pub use storage_writer::{StorageWriter, WriteSummary};
pub use summary_service::SummaryService;
pub use windowed_reader::WindowedReader;
