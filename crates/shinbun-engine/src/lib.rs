//! Channel sync and digest assembly.
//!
//! Data flows resolver → watermark → fetcher → merge → assembler → digest
//! client. Channels are processed one at a time; remote rate limits are per
//! token, so fanning out would not raise throughput.

pub mod digest;
pub mod error;
pub mod fetcher;
pub mod merge;
pub mod prompt;
pub mod resolver;
pub mod retry;
pub mod sync;
pub mod watermark;

#[cfg(test)]
pub(crate) mod testing;

pub use digest::{subject_line, Digest, DigestRunner};
pub use error::EngineError;
pub use fetcher::{fallback_permalink, skip_reason, FetchConfig, HistoryFetcher, SkipReason};
pub use merge::merge;
pub use prompt::{AssemblerConfig, PromptAssembler};
pub use resolver::{ChannelResolver, ResolverConfig};
pub use retry::RateLimitPolicy;
pub use sync::{ChannelSummary, SkippedChannel, SyncPipeline, SyncReport};
pub use watermark::WatermarkStore;
