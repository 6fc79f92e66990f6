//! 収集 → 特徴化 → 学習 → スコアリング → 振り分けのバッチパイプライン。
pub mod collect;
pub mod orchestrator;
pub mod partition;
pub mod score;

pub use collect::{Corpus, CorpusCollector};
pub use orchestrator::{RunSummary, run};
pub use partition::{OutputTargets, PartitionSummary, Partitioner};
pub use score::{ScoredRecord, ScoredTable, Scorer};
