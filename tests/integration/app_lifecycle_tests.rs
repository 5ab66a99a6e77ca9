/*!
 * Full directory runs through the application controller
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chunkwise::app_controller::{Controller, RunOptions};
use chunkwise::checkpoint::CheckpointStore;
use chunkwise::file_utils::FileManager;

use crate::common::mock_providers::{MockBehavior, MockTranslator};
use crate::common::{
    CHAPTER_ONE, CHAPTER_TWO, create_temp_dir, create_test_book, create_test_file, init_test_logging,
    test_config,
};

fn controller(state_file: &Path, behavior: MockBehavior) -> (Controller, Arc<MockTranslator>) {
    init_test_logging();
    let translator = Arc::new(MockTranslator::new(behavior));
    let controller = Controller::with_translator(test_config(state_file), translator.clone()).unwrap();
    (controller, translator)
}

/// Test that a run writes translated markup and copies assets next to the input
#[tokio::test]
async fn test_runFolder_shouldTranslateIntoDefaultOutput() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let (controller, _) = controller(&dir.path().join("state.json"), MockBehavior::Working);

    let report = controller.run_folder(&book, &RunOptions::default()).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.translated, vec!["text/ch1.xhtml", "text/ch2.xhtml"]);

    let output = dir.path().join("book-zh");
    let ch1 = fs::read_to_string(output.join("text/ch1.xhtml")).unwrap();
    assert!(ch1.contains("<h1>你好</h1>"));
    assert!(ch1.contains("<pre><code>fn main() {}</code></pre>"));
    let ch2 = fs::read_to_string(output.join("text/ch2.xhtml")).unwrap();
    assert!(ch2.contains("<p>再见</p>"));
    assert!(ch2.contains(r#"var greeting = "Hello";"#));

    assert_eq!(
        fs::read_to_string(output.join("styles/book.css")).unwrap(),
        "p { text-indent: 1em; }"
    );
    assert!(output.join("images/cover.png").exists());
}

/// Test that a second run skips everything already checkpointed
#[tokio::test]
async fn test_runFolder_secondRun_shouldResumeFromCheckpoint() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let state_file = dir.path().join("state.json");

    let (first, _) = controller(&state_file, MockBehavior::Working);
    first.run_folder(&book, &RunOptions::default()).await.unwrap();

    let (second, translator) = controller(&state_file, MockBehavior::Working);
    let report = second.run_folder(&book, &RunOptions::default()).await.unwrap();

    assert!(report.translated.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(translator.call_count(), 0);
}

/// Test that a file interrupted by failures is retried on the next run
#[tokio::test]
async fn test_runFolder_afterFailures_shouldRetryIncompleteFiles() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let state_file = dir.path().join("state.json");

    let (failing, _) = controller(&state_file, MockBehavior::Failing);
    let report = failing.run_folder(&book, &RunOptions::default()).await.unwrap();
    assert_eq!(report.incomplete.len(), 2);
    let output = dir.path().join("book-zh");
    assert_eq!(fs::read_to_string(output.join("text/ch1.xhtml")).unwrap(), CHAPTER_ONE);

    let (working, translator) = controller(&state_file, MockBehavior::Working);
    let report = working.run_folder(&book, &RunOptions::default()).await.unwrap();

    assert_eq!(report.translated.len(), 2);
    assert!(translator.call_count() > 0);
    assert!(fs::read_to_string(output.join("text/ch1.xhtml")).unwrap().contains("你好"));
}

/// Test that the same directory spelled differently resumes the same record
#[tokio::test]
async fn test_runFolder_differentPathSpelling_shouldShareCheckpoint() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let state_file = dir.path().join("state.json");

    let (first, _) = controller(&state_file, MockBehavior::Working);
    first.run_folder(&book, &RunOptions::default()).await.unwrap();

    for spelling in [
        PathBuf::from(format!("{}/", book.display())),
        book.join("."),
        dir.path().join("book").join("..").join("book"),
    ] {
        let (again, translator) = controller(&state_file, MockBehavior::Working);
        let report = again.run_folder(&spelling, &RunOptions::default()).await.unwrap();

        assert_eq!(report.skipped.len(), 2, "{:?} was not resumed", spelling);
        assert!(report.translated.is_empty());
        assert_eq!(translator.call_count(), 0);
    }

    assert_eq!(CheckpointStore::open(&state_file).documents().count(), 1);
}

/// Test that restart clears this document's progress
#[tokio::test]
async fn test_runFolder_withRestart_shouldTranslateAgain() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let state_file = dir.path().join("state.json");

    let (first, _) = controller(&state_file, MockBehavior::Working);
    first.run_folder(&book, &RunOptions::default()).await.unwrap();

    let (second, translator) = controller(&state_file, MockBehavior::Working);
    let options = RunOptions {
        restart: true,
        ..RunOptions::default()
    };
    let report = second.run_folder(&book, &options).await.unwrap();

    assert_eq!(report.translated.len(), 2);
    assert!(report.skipped.is_empty());
    assert_eq!(translator.call_count(), 2);
}

/// Test that disabling resume neither reads nor writes the checkpoint
#[tokio::test]
async fn test_runFolder_withoutResume_shouldNotTouchCheckpoint() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let state_file = dir.path().join("state.json");
    let (controller, _) = controller(&state_file, MockBehavior::Working);

    let options = RunOptions {
        resume: false,
        ..RunOptions::default()
    };
    let report = controller.run_folder(&book, &options).await.unwrap();

    assert_eq!(report.translated.len(), 2);
    assert!(!state_file.exists());
}

/// Test that the checkpoint is keyed by the input directory
#[tokio::test]
async fn test_runFolder_shouldRecordProgressUnderInputPath() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let state_file = dir.path().join("state.json");
    let (controller, _) = controller(&state_file, MockBehavior::Working);

    controller.run_folder(&book, &RunOptions::default()).await.unwrap();

    let store = CheckpointStore::open(&state_file);
    let document_id = FileManager::document_id(&book);
    assert!(store.is_processed(&document_id, "text/ch1.xhtml"));
    assert!(store.is_processed(&document_id, "text/ch2.xhtml"));
}

/// Test that existing assets are kept unless overwriting is forced
#[tokio::test]
async fn test_runFolder_existingAsset_shouldRespectForceOverwrite() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let output = dir.path().join("book-zh");
    create_test_file(&output, "styles/book.css", "edited").unwrap();

    let (controller, _) = controller(&dir.path().join("state.json"), MockBehavior::Working);
    let options = RunOptions {
        resume: false,
        ..RunOptions::default()
    };
    controller.run_folder(&book, &options).await.unwrap();
    assert_eq!(fs::read_to_string(output.join("styles/book.css")).unwrap(), "edited");

    let forced = RunOptions {
        resume: false,
        force_overwrite: true,
        ..RunOptions::default()
    };
    controller.run_folder(&book, &forced).await.unwrap();
    assert_eq!(
        fs::read_to_string(output.join("styles/book.css")).unwrap(),
        "p { text-indent: 1em; }"
    );
}

/// Test that an output directory inside the input is not treated as input
#[tokio::test]
async fn test_runFolder_nestedOutput_shouldNotTranslateOwnOutput() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let output = book.join("translated");
    let (controller, _) = controller(&dir.path().join("state.json"), MockBehavior::Echo);
    let options = RunOptions {
        output_dir: Some(output.clone()),
        resume: false,
        ..RunOptions::default()
    };

    controller.run_folder(&book, &options).await.unwrap();
    let report = controller.run_folder(&book, &options).await.unwrap();

    assert_eq!(report.translated.len(), 2);
    assert!(!output.join("translated").exists());
    assert_eq!(fs::read_to_string(output.join("text/ch2.xhtml")).unwrap(), CHAPTER_TWO);
}

/// Test that a nested output directory is excluded however the input is spelled
#[tokio::test]
async fn test_runFolder_nestedOutputDifferentSpelling_shouldNotTranslateOwnOutput() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let (controller, translator) = controller(&dir.path().join("state.json"), MockBehavior::Echo);
    let options = RunOptions {
        output_dir: Some(book.join("translated")),
        resume: false,
        ..RunOptions::default()
    };

    controller.run_folder(&book.join("."), &options).await.unwrap();
    let report = controller.run_folder(&book.join("."), &options).await.unwrap();

    assert_eq!(report.translated, vec!["text/ch1.xhtml", "text/ch2.xhtml"]);
    assert_eq!(translator.call_count(), 4);
    assert!(!book.join("translated/translated").exists());
}

/// Test that an output directory equal to the input is refused in any spelling
#[tokio::test]
async fn test_runFolder_outputSameAsInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    let (controller, translator) = controller(&dir.path().join("state.json"), MockBehavior::Working);
    let options = RunOptions {
        output_dir: Some(book.join(".")),
        ..RunOptions::default()
    };

    assert!(controller.run_folder(&book, &options).await.is_err());
    assert_eq!(translator.call_count(), 0);
}

/// Test that a file the parser rejects is copied through unchanged
#[tokio::test]
async fn test_runFolder_unparseableFile_shouldCopyOriginal() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();
    create_test_file(&book, "text/broken.html", "<p>Hello</p><").unwrap();
    let (controller, _) = controller(&dir.path().join("state.json"), MockBehavior::Working);

    let report = controller.run_folder(&book, &RunOptions::default()).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("book-zh/text/broken.html")).unwrap(),
        "<p>Hello</p><"
    );
}

/// Test that a missing input directory is an error
#[test]
fn test_runFolder_missingInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let (controller, translator) = controller(&dir.path().join("state.json"), MockBehavior::Working);

    let result = tokio_test::block_on(async {
        controller
            .run_folder(&dir.path().join("nope"), &RunOptions::default())
            .await
    });

    assert!(result.is_err());
    assert_eq!(translator.call_count(), 0);
}
