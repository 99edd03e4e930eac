//! PDF merge and split, and summarization, through the engine.

mod common;

use swissknife_core::pdf::PdfError;
use swissknife_core::testing::{fixtures, read_fake_pdf, write_fake_pdf};
use swissknife_core::{FailureKind, LogOutcome, Operation, SummaryLength};

use common::{file_names, TestHarness};

#[tokio::test]
async fn test_merge_keeps_input_order() {
    let harness = TestHarness::new();
    let mut inputs = Vec::new();
    for label in ["cover", "body", "appendix"] {
        let path = harness.path(&format!("pdfs/{}.pdf", label));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_fake_pdf(&path, &[label]).unwrap();
        inputs.push(path);
    }
    let output = harness.path("merged/book.pdf");

    let result = harness.engine.merge(&inputs, &output, false).await.unwrap();

    assert_eq!(result.page_count, 3);
    assert_eq!(result.output_path, output);
    assert_eq!(read_fake_pdf(&output).unwrap(), ["cover", "body", "appendix"]);
    assert!(inputs.iter().all(|p| p.exists()));
    assert!(harness.staging_is_empty());

    let entries = harness.shutdown().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, Operation::Merge);
    assert_eq!(entries[0].extra_inputs.len(), 2);
}

#[tokio::test]
async fn test_merge_rejects_missing_and_non_pdf_inputs() {
    let harness = TestHarness::new();
    let a = harness.path("a.pdf");
    fixtures::numbered_pdf(&a, 2).unwrap();
    let notes = harness.write("notes.txt", b"text");

    let missing = harness
        .engine
        .merge(&[a.clone(), harness.path("gone.pdf")], &harness.path("out.pdf"), false)
        .await
        .unwrap_err();
    assert_eq!(missing.kind, FailureKind::IoError);

    let wrong = harness
        .engine
        .merge(&[a.clone(), notes], &harness.path("out.pdf"), false)
        .await
        .unwrap_err();
    assert_eq!(wrong.kind, FailureKind::UnknownFormat);

    let single = harness
        .engine
        .merge(&[a], &harness.path("out.pdf"), false)
        .await
        .unwrap_err();
    assert_eq!(single.kind, FailureKind::UnsupportedConversion);

    assert!(!harness.path("out.pdf").exists());
    assert_eq!(harness.shutdown().await.len(), 3);
}

#[tokio::test]
async fn test_merge_page_count_mismatch_writes_nothing() {
    let harness = TestHarness::new();
    let a = harness.path("a.pdf");
    let b = harness.path("b.pdf");
    fixtures::numbered_pdf(&a, 2).unwrap();
    fixtures::numbered_pdf(&b, 3).unwrap();
    harness.pdf.set_lose_page_on_merge(true).await;

    let failure = harness
        .engine
        .merge(&[a, b], &harness.path("out.pdf"), false)
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::BackendError);
    assert!(!harness.path("out.pdf").exists());
    assert!(harness.staging_is_empty());
}

#[tokio::test]
async fn test_split_by_ranges() {
    let harness = TestHarness::new();
    let input = harness.path("book.pdf");
    fixtures::numbered_pdf(&input, 10).unwrap();

    let result = harness
        .engine
        .split(&input, "1-3,5,7-9", Some(&harness.path("parts")), false)
        .await
        .unwrap();

    assert_eq!(
        file_names(&result.parts),
        ["book_p1-3.pdf", "book_p5.pdf", "book_p7-9.pdf"]
    );
    assert_eq!(read_fake_pdf(&result.parts[0]).unwrap(), ["1", "2", "3"]);
    assert_eq!(read_fake_pdf(&result.parts[1]).unwrap(), ["5"]);
    assert_eq!(read_fake_pdf(&result.parts[2]).unwrap(), ["7", "8", "9"]);
    assert!(input.exists());

    let entries = harness.shutdown().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, Operation::Split);
    assert_eq!(entries[0].outcome, LogOutcome::Success);
}

#[tokio::test]
async fn test_split_out_of_bounds_writes_nothing() {
    let harness = TestHarness::new();
    let input = harness.path("book.pdf");
    fixtures::numbered_pdf(&input, 10).unwrap();

    for ranges in ["1-3,99", "5-2", "abc", "", "1,1"] {
        let failure = harness
            .engine
            .split(&input, ranges, Some(&harness.path("parts")), false)
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnsupportedConversion, "{:?}", ranges);
    }

    assert!(!harness.path("parts").exists());
    assert!(harness.pdf.extractions().await.is_empty());
    assert_eq!(harness.shutdown().await.len(), 5);
}

#[tokio::test]
async fn test_split_failure_midway_places_no_parts() {
    let harness = TestHarness::new();
    let input = harness.path("book.pdf");
    fixtures::numbered_pdf(&input, 6).unwrap();
    harness
        .pdf
        .set_next_error(PdfError::EmptyOutput {
            path: harness.path("book_p4-6.pdf"),
        })
        .await;

    let result = harness
        .engine
        .split(&input, "1-3,4-6", Some(&harness.path("parts")), false)
        .await;

    assert!(result.is_err());
    assert!(!harness.path("parts/book_p1-3.pdf").exists());
    assert!(harness.staging_is_empty());
}

#[tokio::test]
async fn test_summarize_writes_summary_next_to_input() {
    let harness = TestHarness::new();
    let input = harness.write("docs/plan.md", b"# Q3 plan\n\nShip the thing.");

    let result = harness
        .engine
        .summarize(&input, SummaryLength::Short)
        .await
        .unwrap();

    assert_eq!(result.summary_path, harness.path("docs/plan_summary.txt"));
    assert_eq!(
        std::fs::read_to_string(&result.summary_path).unwrap().trim(),
        "The document describes a quarterly plan in some detail."
    );
    let requests = harness.llm.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.contains("Ship the thing."));

    let entries = harness.shutdown().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, Operation::Summarize);
}

#[tokio::test]
async fn test_summarize_failures_are_logged() {
    let harness = TestHarness::new();
    let image = harness.write("photo.png", b"png");

    let missing = harness
        .engine
        .summarize(&harness.path("missing.txt"), SummaryLength::Medium)
        .await
        .unwrap_err();
    assert_eq!(missing.kind, FailureKind::IoError);

    let unsupported = harness
        .engine
        .summarize(&image, SummaryLength::Medium)
        .await
        .unwrap_err();
    assert_eq!(unsupported.kind, FailureKind::UnsupportedConversion);

    harness.llm.set_response("ok").await;
    let text = harness.write("short.txt", b"some words");
    let empty = harness
        .engine
        .summarize(&text, SummaryLength::Medium)
        .await
        .unwrap_err();
    assert_eq!(empty.kind, FailureKind::EmptyOutput);
    assert!(!harness.path("short_summary.txt").exists());

    let entries = harness.shutdown().await;
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| !e.is_success()));
}
