/*!
 * Tests for placeholder protection and restoration
 */

use chunkwise::errors::{INTEGRITY_SAMPLE_LIMIT, PipelineError};
use chunkwise::markup::protector::PLACEHOLDER_REGEX;
use chunkwise::markup::{IgnoreTags, Protector};

use crate::common::{CHAPTER_ONE, CHAPTER_TWO};

/// Test that a full chapter comes back byte for byte after protect and restore
#[test]
fn test_protectThenRestore_withChapter_shouldRoundTripExactly() {
    for chapter in [CHAPTER_ONE, CHAPTER_TWO] {
        let mut protector = Protector::default();
        let protected = protector.protect(chapter).unwrap();
        let report = protector.restore(&protected);

        assert!(report.is_clean());
        assert_eq!(report.markup, chapter);
    }
}

/// Test that ignored content never appears in the protected text
#[test]
fn test_protect_withChapter_shouldHideIgnoredContent() {
    let mut protector = Protector::default();
    let protected = protector.protect(CHAPTER_ONE).unwrap();

    assert!(!protected.contains("fn main"));
    assert!(!protected.contains("margin"));
    assert!(!protected.contains("cover.png"));
    assert!(protected.contains("<p>Hello world, said the <em>robot</em>.</p>"));
    // style, pre and img
    assert_eq!(protector.placeholders().len(), 3);
    assert_eq!(PLACEHOLDER_REGEX.find_iter(&protected).count(), 3);
}

/// Test that a translated body with placeholders in new positions restores them there
#[test]
fn test_restore_withReorderedPlaceholders_shouldFollowTranslation() {
    let mut protector = Protector::default();
    let protected = protector
        .protect("<p>Run <code>ls</code> then <code>pwd</code>.</p>")
        .unwrap();
    let tokens: Vec<&str> = PLACEHOLDER_REGEX
        .find_iter(&protected)
        .map(|m| m.as_str())
        .collect();
    assert_eq!(tokens.len(), 2);

    let translated = format!("<p>先运行 {} 再运行 {}。</p>", tokens[1], tokens[0]);
    let report = protector.restore(&translated);

    assert!(report.is_clean());
    assert_eq!(report.markup, "<p>先运行 <code>pwd</code> 再运行 <code>ls</code>。</p>");
}

/// Test that the integrity warning caps its sample
#[test]
fn test_restore_manyUnknownTokens_shouldCapWarningSample() {
    let protector = Protector::default();
    let text: String = (0..8).map(|i| format!("{{ABCDEFG{}}} ", i)).collect();

    let report = protector.restore(&text);
    let warning = report.warning().unwrap();

    assert_eq!(report.markup, text);
    assert_eq!(warning.leftover_count, 8);
    assert_eq!(warning.sample.len(), INTEGRITY_SAMPLE_LIMIT);
    assert_eq!(warning.missing_count, 0);
}

/// Test that extra ignore tags are honoured alongside the defaults
#[test]
fn test_protect_withExtraIgnoreTag_shouldHideIt() {
    let tags = IgnoreTags::with_extra(["aside"]).unwrap();
    let mut protector = Protector::new(tags);

    let protected = protector
        .protect("<aside>Footnote</aside><p>Text</p><script>x()</script>")
        .unwrap();

    assert!(!protected.contains("Footnote"));
    assert!(!protected.contains("x()"));
    assert!(protected.contains("<p>Text</p>"));
}

/// Test that invalid extra tag names are rejected as configuration errors
#[test]
fn test_ignoreTags_withInvalidNames_shouldFail() {
    for bad in ["", "two words", "<p>"] {
        let result = IgnoreTags::with_extra([bad]);
        assert!(matches!(result, Err(PipelineError::InvalidConfiguration(_))), "accepted {:?}", bad);
    }
}

/// Test that text without any ignored element is left untouched
#[test]
fn test_protect_plainParagraphs_shouldBeUnchanged() {
    let markup = "<div>\n  <p>One</p>\n  <p>Two &amp; three</p>\n</div>";
    let mut protector = Protector::default();

    assert_eq!(protector.protect(markup).unwrap(), markup);
    assert!(protector.placeholders().is_empty());
}
