/*!
 * Tests for file discovery and copying
 */

use std::fs;
use std::path::PathBuf;

use chunkwise::file_utils::FileManager;

use crate::common::{create_temp_dir, create_test_book, create_test_file};

/// Test that the sample book is split into markup and assets
#[test]
fn test_findDocumentFiles_withBook_shouldClassifyFiles() {
    let dir = create_temp_dir().unwrap();
    let book = create_test_book(dir.path()).unwrap();

    let files = FileManager::find_document_files(&book, None).unwrap();

    assert_eq!(
        files.markup,
        vec![PathBuf::from("text/ch1.xhtml"), PathBuf::from("text/ch2.xhtml")]
    );
    assert_eq!(
        files.assets,
        vec![PathBuf::from("images/cover.png"), PathBuf::from("styles/book.css")]
    );
}

/// Test that a missing directory is an error
#[test]
fn test_findDocumentFiles_missingDirectory_shouldFail() {
    let dir = create_temp_dir().unwrap();
    assert!(FileManager::find_document_files(dir.path().join("nope"), None).is_err());
}

/// Test that copying creates the target directory
#[test]
fn test_copyFile_shouldCreateTargetDirectory() {
    let dir = create_temp_dir().unwrap();
    let source = create_test_file(dir.path(), "a.css", "p {}").unwrap();
    let target = dir.path().join("out/nested/a.css");

    FileManager::copy_file(&source, &target).unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "p {}");
}

/// Test that copying a missing file fails
#[test]
fn test_copyFile_missingSource_shouldFail() {
    let dir = create_temp_dir().unwrap();
    assert!(FileManager::copy_file(dir.path().join("nope"), dir.path().join("out")).is_err());
}

/// Test existence checks and directory creation
#[test]
fn test_ensureDir_shouldCreateNestedDirectories() {
    let dir = create_temp_dir().unwrap();
    let nested = dir.path().join("a/b/c");

    assert!(!FileManager::dir_exists(&nested));
    FileManager::ensure_dir(&nested).unwrap();
    assert!(FileManager::dir_exists(&nested));
    assert!(!FileManager::file_exists(&nested));
}
