//! Pipeline edge cases and invariants

mod common;

use common::*;
use docveil::anonymization::{AnonymizationEngine, PatternStore, RunPaths, SurrogateMapper};
use docveil::config::DocveilConfig;
use std::path::Path;
use tokio::sync::watch;

fn engine_with(catalogue: &str) -> AnonymizationEngine {
    AnonymizationEngine::new(DocveilConfig::default())
        .unwrap()
        .with_patterns(PatternStore::from_csv(catalogue).unwrap())
}

fn run_paths(dir: &Path) -> RunPaths {
    RunPaths {
        summary: Some(dir.join("report.xlsx")),
        ledger: Some(dir.join("ledger.json")),
    }
}

async fn run(
    engine: &AnonymizationEngine,
    input: &Path,
    output: &Path,
    reports: &RunPaths,
) -> docveil::anonymization::RunSummary {
    let (_tx, shutdown) = watch::channel(false);
    engine
        .anonymize_document(input, output, reports, shutdown)
        .await
        .unwrap()
}

// A rule that matches across the " | " cell separator produces a plan
// that cannot land in any single cell; it is skipped with a structured
// reason and the table survives untouched.
#[tokio::test]
async fn span_straddling_cells_is_skipped() {
    let dir = temp_dir("straddle");
    let input = dir.join("input.docx");
    write_simple_docx(
        &input,
        concat!(
            "<w:tbl><w:tr>",
            "<w:tc><w:p><w:r><w:t>ИНН</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t>7701234567</w:t></w:r></w:p></w:tc>",
            "</w:tr></w:tbl>",
        ),
    );

    let engine = engine_with(
        "category,pattern,confidence,description\n\
         label,\"ИНН \\| 7701\",0.9,Crosses a separator\n",
    );
    let output = dir.join("anonymized.docx");
    let summary = run(&engine, &input, &output, &run_paths(&dir)).await;

    assert_eq!(summary.applied, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        part_texts(&output, "word/document.xml"),
        vec!["ИНН".to_string(), "7701234567".to_string()]
    );

    let ledger: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("ledger.json")).unwrap()).unwrap();
    assert_eq!(ledger["skipped"][0]["reason"], "cell_boundary");
}

// Running the pipeline on its own output detects nothing new: the
// surrogates are not matched by the catalogue.
#[tokio::test]
async fn second_pass_is_idempotent() {
    let dir = temp_dir("idempotent");
    let input = dir.join("input.docx");
    write_simple_docx(
        &input,
        r#"<w:p><w:r><w:t>Иванов И. И. подписал</w:t></w:r></w:p>"#,
    );

    let catalogue = "category,pattern,confidence,description\n\
                     person_name,\"Иванов И\\. И\\.\",0.9,Surname with initials\n";
    let engine = engine_with(catalogue);
    let first_out = dir.join("first.docx");
    let first = run(&engine, &input, &first_out, &run_paths(&dir)).await;
    assert_eq!(first.applied, 1);

    let second_out = dir.join("second.docx");
    let second = run(&engine, &first_out, &second_out, &run_paths(&dir)).await;
    assert_eq!(second.planned, 0);
    assert_eq!(second.applied, 0);
    assert_eq!(
        part_texts(&second_out, "word/document.xml"),
        part_texts(&first_out, "word/document.xml")
    );
}

// The output archive carries exactly the input's parts; untouched parts
// are byte-identical.
#[tokio::test]
async fn structure_is_preserved() {
    let dir = temp_dir("structure");
    let input = dir.join("input.docx");
    let styles = r#"<w:styles xmlns:w="http://x"><w:style w:styleId="Normal"/></w:styles>"#;
    write_docx(
        &input,
        &[
            (
                "word/document.xml",
                &wrap_document(r#"<w:p><w:r><w:t>ИНН 7701234567</w:t></w:r></w:p>"#),
            ),
            ("word/styles.xml", styles),
        ],
    );

    let engine = engine_with(
        "category,pattern,confidence,description\n\
         inn,\"\\b\\d{10}\\b\",0.85,Taxpayer number\n",
    );
    let output = dir.join("anonymized.docx");
    run(&engine, &input, &output, &run_paths(&dir)).await;

    assert_eq!(part_names(&input), part_names(&output));
    assert_eq!(read_part(&output, "word/styles.xml"), styles);
}

// Applying all plans of a block leaves the paragraph text length at
// original + sum(uuid lengths) - sum(original lengths).
#[tokio::test]
async fn positional_safety_length_equation() {
    let dir = temp_dir("lengths");
    let input = dir.join("input.docx");
    let text = "Иванов И. И. и 7701234567 в одном абзаце";
    write_simple_docx(&input, &format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"));

    let engine = engine_with(
        "category,pattern,confidence,description\n\
         person_name,\"Иванов И\\. И\\.\",0.9,Surname with initials\n\
         inn,\"\\b\\d{10}\\b\",0.85,Taxpayer number\n",
    );
    let output = dir.join("anonymized.docx");
    let summary = run(&engine, &input, &output, &run_paths(&dir)).await;
    assert_eq!(summary.applied, 2);

    let out_text = part_texts(&output, "word/document.xml").join("");
    let mapper = SurrogateMapper::new();
    let uuid_len = mapper.uuid_for("Иванов И. И.", "person_name").chars().count()
        + mapper.uuid_for("7701234567", "inn").chars().count();
    let original_len = "Иванов И. И.".chars().count() + "7701234567".chars().count();
    assert_eq!(
        out_text.chars().count(),
        text.chars().count() + uuid_len - original_len
    );
}

// The same literal in two different documents maps to the same surrogate
// through the shared process-wide mapper and across engines.
#[tokio::test]
async fn surrogates_are_stable_across_documents() {
    let dir = temp_dir("stability");
    let catalogue = "category,pattern,confidence,description\n\
                     inn,\"\\b\\d{10}\\b\",0.85,Taxpayer number\n";

    let mut uuids = Vec::new();
    for (i, body_text) in ["номер 7701234567", "снова 7701234567 тут"].iter().enumerate() {
        let input = dir.join(format!("input{i}.docx"));
        write_simple_docx(&input, &format!("<w:p><w:r><w:t>{body_text}</w:t></w:r></w:p>"));
        let engine = engine_with(catalogue);
        let output = dir.join(format!("out{i}.docx"));
        run(&engine, &input, &output, &run_paths(&dir)).await;

        let ledger: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("ledger.json")).unwrap())
                .unwrap();
        uuids.push(ledger["replacements"][0]["uuid"].as_str().unwrap().to_string());
    }
    assert_eq!(uuids[0], uuids[1]);
}

// A corrupt archive fails the run before anything is written.
#[tokio::test]
async fn corrupt_input_fails_without_outputs() {
    let dir = temp_dir("corrupt");
    let input = dir.join("input.docx");
    std::fs::write(&input, b"not a zip archive").unwrap();

    let engine = engine_with(
        "category,pattern,confidence,description\n\
         inn,\"\\d{10}\",0.85,Taxpayer number\n",
    );
    let output = dir.join("anonymized.docx");
    let (_tx, shutdown) = watch::channel(false);
    let result = engine
        .anonymize_document(&input, &output, &run_paths(&dir), shutdown)
        .await;

    assert!(result.is_err());
    assert!(!output.exists());
    assert!(!dir.join("ledger.json").exists());
}

// Cancellation before the run starts discards all outputs.
#[tokio::test]
async fn cancellation_discards_outputs() {
    let dir = temp_dir("cancel");
    let input = dir.join("input.docx");
    write_simple_docx(&input, r#"<w:p><w:r><w:t>ИНН 7701234567</w:t></w:r></w:p>"#);

    let engine = engine_with(
        "category,pattern,confidence,description\n\
         inn,\"\\b\\d{10}\\b\",0.85,Taxpayer number\n",
    );
    let output = dir.join("anonymized.docx");
    let (tx, shutdown) = watch::channel(false);
    tx.send(true).unwrap();

    let result = engine
        .anonymize_document(&input, &output, &run_paths(&dir), shutdown)
        .await;
    assert!(matches!(
        result,
        Err(docveil::domain::errors::DocveilError::Cancelled)
    ));
    assert!(!output.exists());
}

// Author metadata in docProps/core.xml is scrubbed and ledgered.
#[tokio::test]
async fn core_properties_are_scrubbed() {
    let dir = temp_dir("metadata");
    let input = dir.join("input.docx");
    let core = concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
        "<dc:creator>Иванов Иван</dc:creator>",
        "</cp:coreProperties>",
    );
    write_docx(
        &input,
        &[
            (
                "word/document.xml",
                &wrap_document("<w:p><w:r><w:t>текст</w:t></w:r></w:p>"),
            ),
            ("docProps/core.xml", core),
        ],
    );

    let engine = engine_with("category,pattern,confidence,description\n");
    let output = dir.join("anonymized.docx");
    let summary = run(&engine, &input, &output, &run_paths(&dir)).await;

    assert_eq!(summary.metadata_replacements, 1);
    let out_core = read_part(&output, "docProps/core.xml");
    assert!(!out_core.contains("Иванов Иван"));

    let ledger: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("ledger.json")).unwrap()).unwrap();
    let replacements = ledger["replacements"].as_array().unwrap();
    assert!(replacements.iter().any(|r| r["category"] == "metadata"));
}
