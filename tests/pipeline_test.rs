// 合成コーパスを用いたバッチパイプライン全体の結合テスト。
use std::fs;
use std::path::{Path, PathBuf};

use ito_novelty::classification::Label;
use ito_novelty::config::Config;
use ito_novelty::error::PipelineError;
use ito_novelty::pipeline::run;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const TEMPLATE: &str = "standard outsourcing agreement";

const NEAR_IDENTICAL: [&str; 5] = [
    "Standard outsourcing agreement",
    "STANDARD OUTSOURCING AGREEMENT",
    "the standard outsourcing agreement",
    "Agreement: standard outsourcing",
    "standard outsourcing agreement v2",
];

const UNRELATED: [&str; 5] = [
    "quarterly weather report",
    "lunch menu for friday",
    "football results",
    "",
    "NaN",
];

const SERVICES: [&str; 20] = [
    "payroll",
    "helpdesk",
    "hosting",
    "network",
    "datacenter",
    "printing",
    "logistics",
    "recruitment",
    "cleaning",
    "catering",
    "storage",
    "maintenance",
    "billing",
    "telemarketing",
    "translation",
    "warehousing",
    "procurement",
    "training",
    "auditing",
    "legal",
];

const SHARED_TERMS: [&str; 5] = [
    "Outsourcing contract",
    "outsourcing contract renewal",
    "The outsourcing contract",
    "CONTRACT: outsourcing",
    "outsourcing contract for the region",
];

const OFF_TOPIC: [&str; 5] = [
    "weather forecast update",
    "",
    "football results",
    "payroll",
    "catering menu",
];

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn config(&self, extra: &[&str]) -> Config {
        let mut args: Vec<String> = vec![
            "ito-novelty".to_string(),
            "--corpus-root".to_string(),
            self.path("corpus").display().to_string(),
            "--evaluation-file".to_string(),
            self.path("evaluation.csv").display().to_string(),
            "--target-output".to_string(),
            self.path("out/ito_predictions.csv").display().to_string(),
            "--other-output".to_string(),
            self.path("out/non_ito_predictions.csv").display().to_string(),
        ];
        args.extend(extra.iter().map(ToString::to_string));
        Config::from_args(args).unwrap()
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }
}

fn csv_rows(header: &str, rows: &[&str]) -> String {
    let mut contents = format!("{header}\n");
    for (i, row) in rows.iter().enumerate() {
        contents.push_str(&format!("{i},\"{row}\"\n"));
    }
    contents
}

fn interleave(first: &[&'static str], second: &[&'static str]) -> Vec<&'static str> {
    first
        .iter()
        .zip(second)
        .flat_map(|(a, b)| [*a, *b])
        .collect()
}

#[fixture]
fn workspace() -> Workspace {
    let workspace = Workspace {
        dir: tempfile::tempdir().unwrap(),
    };
    workspace.write(
        "corpus/contracts.csv",
        &csv_rows("id,description", &[TEMPLATE; 12]),
    );
    let mut tsv = String::from("description\tvendor\n");
    for _ in 0..8 {
        tsv.push_str(&format!("{TEMPLATE}\tacme\n"));
    }
    workspace.write("corpus/archive/2023.tsv", &tsv);
    workspace.write("corpus/README.md", "not a table\n");
    fs::create_dir_all(workspace.path("out")).unwrap();

    let evaluation = interleave(&NEAR_IDENTICAL, &UNRELATED);
    workspace.write("evaluation.csv", &csv_rows("id,description", &evaluation));
    workspace
}

/// 共通語 "outsourcing contract" と、文書ごとに異なるサービス名からなるコーパス。
#[fixture]
fn varied_workspace(workspace: Workspace) -> Workspace {
    fs::remove_dir_all(workspace.path("corpus")).unwrap();
    let rows: Vec<String> = SERVICES
        .iter()
        .map(|service| format!("outsourcing contract for {service}"))
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    workspace.write("corpus/contracts.csv", &csv_rows("id,description", &rows[..12]));
    workspace.write(
        "corpus/archive/2023.csv",
        &csv_rows("id,description", &rows[12..]),
    );
    let evaluation = interleave(&SHARED_TERMS, &OFF_TOPIC);
    workspace.write("evaluation.csv", &csv_rows("id,description", &evaluation));
    workspace
}

#[rstest]
fn synthetic_corpus_is_partitioned(workspace: Workspace) {
    let summary = run(&workspace.config(&[])).unwrap();

    assert_eq!(summary.documents, 20);
    assert_eq!(summary.sources_loaded, 2);
    assert_eq!(summary.sources_skipped, 0);
    assert_eq!(summary.vocabulary_size, 3);
    assert_eq!(summary.target, 5);
    assert_eq!(summary.other, 5);
    assert_eq!(summary.target + summary.other, 10);

    let target = workspace.read("out/ito_predictions.csv");
    let target_lines: Vec<&str> = target.lines().collect();
    assert_eq!(target_lines[0], "id,description,predicted_label");
    assert_eq!(target_lines.len(), 6);
    assert_eq!(target_lines[1], "0,Standard outsourcing agreement,ITO");
    assert!(target_lines[1..].iter().all(|line| line.ends_with(",ITO")));

    let other = workspace.read("out/non_ito_predictions.csv");
    let other_lines: Vec<&str> = other.lines().collect();
    assert_eq!(other_lines.len(), 6);
    assert_eq!(other_lines[1], "1,quarterly weather report,Non-ITO");
    assert!(other_lines[1..].iter().all(|line| line.ends_with(",Non-ITO")));
}

#[rstest]
fn broken_source_is_skipped_and_run_continues(workspace: Workspace) {
    workspace.write("corpus/legacy/titles.csv", "title\nsomething else\n");
    workspace.write("corpus/legacy/ragged.csv", "description\na,b\n");

    let summary = run(&workspace.config(&[])).unwrap();
    assert_eq!(summary.sources_loaded, 2);
    assert_eq!(summary.sources_skipped, 2);
    assert_eq!(summary.target, 5);
}

#[rstest]
fn runs_are_byte_identical(workspace: Workspace) {
    run(&workspace.config(&[])).unwrap();
    let first_target = workspace.read("out/ito_predictions.csv");
    let first_other = workspace.read("out/non_ito_predictions.csv");

    run(&workspace.config(&[])).unwrap();
    assert_eq!(first_target, workspace.read("out/ito_predictions.csv"));
    assert_eq!(first_other, workspace.read("out/non_ito_predictions.csv"));
}

#[rstest]
fn saved_model_reproduces_outputs(workspace: Workspace) {
    let model = workspace.path("out/model.json").display().to_string();
    run(&workspace.config(&["--model-out", &model])).unwrap();
    let trained_target = workspace.read("out/ito_predictions.csv");
    let trained_other = workspace.read("out/non_ito_predictions.csv");

    // The corpus is removed so the second run can only use the artifact.
    fs::remove_dir_all(workspace.path("corpus")).unwrap();
    let summary = run(&workspace.config(&["--model-in", &model])).unwrap();
    assert_eq!(summary.documents, 20);
    assert_eq!(trained_target, workspace.read("out/ito_predictions.csv"));
    assert_eq!(trained_other, workspace.read("out/non_ito_predictions.csv"));
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(1000)]
fn vocabulary_respects_max_features(workspace: Workspace, #[case] max_features: usize) {
    workspace.write(
        "corpus/extra.csv",
        &csv_rows(
            "id,description",
            &["managed network operations", "helpdesk staffing outsourcing"],
        ),
    );
    let cap = max_features.to_string();
    let summary = run(&workspace.config(&["--max-features", &cap])).unwrap();
    assert!(summary.vocabulary_size <= max_features);
    assert!(summary.vocabulary_size >= 1);
    assert_eq!(summary.target + summary.other, 10);
}

#[rstest]
fn empty_corpus_fails_before_scoring(workspace: Workspace) {
    fs::remove_dir_all(workspace.path("corpus")).unwrap();
    workspace.write("corpus/blank.csv", "id,description\n1,\n2,null\n");
    fs::remove_file(workspace.path("evaluation.csv")).unwrap();

    let error = run(&workspace.config(&[])).unwrap_err();
    assert!(matches!(error, PipelineError::EmptyCorpus { .. }), "{error}");
    assert!(!workspace.path("out/ito_predictions.csv").exists());
    assert!(!workspace.path("out/non_ito_predictions.csv").exists());
}

#[rstest]
fn every_source_failing_is_reported(workspace: Workspace) {
    fs::remove_dir_all(workspace.path("corpus")).unwrap();
    workspace.write("corpus/a.csv", "title\nx\n");
    workspace.write("corpus/b.tsv", "summary\ty\n");

    let error = run(&workspace.config(&[])).unwrap_err();
    assert!(
        matches!(error, PipelineError::AllSourcesFailed { failed: 2, .. }),
        "{error}"
    );
}

#[rstest]
fn evaluation_without_text_column_is_fatal(workspace: Workspace) {
    workspace.write("evaluation.csv", "id,title\n1,hosting\n");
    let error = run(&workspace.config(&[])).unwrap_err();
    assert!(
        matches!(error, PipelineError::EvaluationRead { .. }),
        "{error}"
    );
}

#[rstest]
fn unwritable_output_names_its_group(workspace: Workspace) {
    let unwritable = workspace
        .path("missing-dir/non_ito.csv")
        .display()
        .to_string();
    let error = run(&workspace.config(&["--other-output", &unwritable])).unwrap_err();
    match error {
        PipelineError::OutputWrite { group, path, .. } => {
            assert_eq!(group, Label::Other);
            assert_eq!(path, Path::new(&unwritable));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!workspace.path("out/ito_predictions.csv").exists());
}

#[rstest]
fn tsv_outputs_and_custom_labels(workspace: Workspace) {
    let target = workspace.path("out/in.tsv").display().to_string();
    let other = workspace.path("out/out.tsv").display().to_string();
    let summary = run(&workspace.config(&[
        "--target-output",
        &target,
        "--other-output",
        &other,
        "--target-label",
        "inside",
        "--other-label",
        "outside",
        "--label-column",
        "verdict",
    ]))
    .unwrap();
    assert_eq!(summary.target, 5);
    let inside = workspace.read("out/in.tsv");
    assert!(inside.starts_with("id\tdescription\tverdict\n"));
    assert!(inside.lines().skip(1).all(|line| line.ends_with("\tinside")));
}

#[rstest]
fn linear_kernel_partitions_a_varied_corpus(varied_workspace: Workspace) {
    let summary = run(&varied_workspace.config(&["--kernel", "linear"])).unwrap();
    assert_eq!(summary.documents, 20);
    assert_eq!(summary.vocabulary_size, 22);
    assert_eq!(summary.target, 5);
    assert_eq!(summary.other, 5);

    let target = varied_workspace.read("out/ito_predictions.csv");
    let target_lines: Vec<&str> = target.lines().collect();
    assert_eq!(target_lines[1], "0,Outsourcing contract,ITO");
    let other = varied_workspace.read("out/non_ito_predictions.csv");
    let other_lines: Vec<&str> = other.lines().collect();
    assert_eq!(other_lines[1], "1,weather forecast update,Non-ITO");
    assert!(other_lines.contains(&"7,payroll,Non-ITO"));
}

#[rstest]
fn rbf_default_keeps_unknown_text_inside_a_varied_corpus(varied_workspace: Workspace) {
    // Text with no known term maps to the origin, which is closer to every unit-norm
    // support vector than those vectors are to each other.
    let summary = run(&varied_workspace.config(&[])).unwrap();
    assert_eq!(summary.target, 8);
    assert_eq!(summary.other, 2);

    let other = varied_workspace.read("out/non_ito_predictions.csv");
    assert_eq!(
        other,
        "id,description,predicted_label\n7,payroll,Non-ITO\n9,catering menu,Non-ITO\n"
    );
}

#[rstest]
fn stop_word_only_corpus_is_empty(workspace: Workspace) {
    fs::remove_dir_all(workspace.path("corpus")).unwrap();
    workspace.write(
        "corpus/filler.csv",
        &csv_rows("id,description", &["the and of", "it is what it is", "none of these"]),
    );

    let error = run(&workspace.config(&[])).unwrap_err();
    match error {
        PipelineError::EmptyCorpus { root } => assert_eq!(root, workspace.path("corpus")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!workspace.path("out/ito_predictions.csv").exists());
    assert!(!workspace.path("out/non_ito_predictions.csv").exists());
}
