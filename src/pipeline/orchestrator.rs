use std::path::Path;

use tracing::{info, warn};

use super::collect::CorpusCollector;
use super::partition::{OutputTargets, Partitioner};
use super::score::Scorer;
use crate::classification::{DecisionBoundary, ModelArtifact, NoveltyClassifier, Vectorizer};
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::util::text::corpus_fingerprint;

/// 1回のバッチ実行の集計。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub documents: usize,
    pub sources_loaded: usize,
    pub sources_skipped: usize,
    pub vocabulary_size: usize,
    pub support_vectors: usize,
    pub target: usize,
    pub other: usize,
}

/// 学習（または読み込み）で得た分類器とその由来。
struct TrainedModel {
    classifier: NoveltyClassifier,
    fingerprint: String,
    documents: usize,
    sources_loaded: usize,
    sources_skipped: usize,
}

/// collect → fit → train → score → partition を順に実行する。
///
/// 各ステージは前段の出力が揃ってから始まる。
///
/// # Errors
/// いずれかのステージが致命的エラーを返した場合。
pub fn run(config: &Config) -> PipelineResult<RunSummary> {
    let model = match &config.model_in {
        Some(path) => load_model(path)?,
        None => {
            let root = config.corpus_root.as_deref().ok_or_else(|| {
                PipelineError::InvalidParameter(
                    "a corpus root is required when no model artifact is given".to_string(),
                )
            })?;
            train_model(config, root)?
        }
    };

    if let Some(path) = &config.model_out {
        ModelArtifact::from_classifier(
            &model.classifier,
            model.fingerprint.clone(),
            model.documents,
        )
        .save(path)?;
    }

    let scored = Scorer::new(&config.text_column, &config.label_column)
        .score(&config.evaluation_file, &model.classifier)?;

    let partitioner = Partitioner::new(
        OutputTargets {
            target: config.target_output.clone(),
            other: config.other_output.clone(),
        },
        config.label_names(),
        &config.label_column,
    );
    let partition = partitioner.partition(&scored)?;

    let summary = RunSummary {
        documents: model.documents,
        sources_loaded: model.sources_loaded,
        sources_skipped: model.sources_skipped,
        vocabulary_size: model.classifier.vectorizer().dim(),
        support_vectors: model.classifier.boundary().support_vector_count(),
        target: partition.target,
        other: partition.other,
    };
    info!(
        documents = summary.documents,
        sources_loaded = summary.sources_loaded,
        sources_skipped = summary.sources_skipped,
        vocabulary_size = summary.vocabulary_size,
        support_vectors = summary.support_vectors,
        target_rows = summary.target,
        other_rows = summary.other,
        "run completed"
    );
    Ok(summary)
}

fn train_model(config: &Config, root: &Path) -> PipelineResult<TrainedModel> {
    let params = config.boundary_params();
    params.validate()?;

    let corpus = CorpusCollector::new(&config.text_column)
        .collect(root)
        .ensure_usable()?;
    let fingerprint = corpus_fingerprint(&corpus.documents);
    info!(documents = corpus.len(), fingerprint = %fingerprint, "training corpus ready");

    let vectorizer = Vectorizer::fit(&corpus.documents, config.max_features)?;
    if vectorizer.dim() == 0 {
        warn!(root = %corpus.root.display(), "collected text contains only stop words");
        return Err(PipelineError::EmptyCorpus { root: corpus.root });
    }
    let points = vectorizer.transform_all(&corpus.documents);
    let boundary = DecisionBoundary::train(&points, &params)?;

    Ok(TrainedModel {
        classifier: NoveltyClassifier::new(vectorizer, boundary),
        fingerprint,
        documents: corpus.len(),
        sources_loaded: corpus.report.loaded.len(),
        sources_skipped: corpus.report.skipped.len(),
    })
}

fn load_model(path: &Path) -> PipelineResult<TrainedModel> {
    let artifact = ModelArtifact::load(path)?;
    let fingerprint = artifact.corpus_fingerprint.clone();
    let documents = artifact.training_documents;
    let classifier = artifact.into_classifier(path)?;
    info!(
        path = %path.display(),
        fingerprint = %fingerprint,
        vocabulary_size = classifier.vectorizer().dim(),
        "model artifact loaded"
    );
    Ok(TrainedModel {
        classifier,
        fingerprint,
        documents,
        sources_loaded: 0,
        sources_skipped: 0,
    })
}
