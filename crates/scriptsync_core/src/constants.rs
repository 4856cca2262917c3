//! Shared constants used across scriptsync crates.

/// Default bound on the undo stack; the oldest entry is evicted beyond it.
pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// Characters of unchanged context kept around every patch hunk.
pub const PATCH_MARGIN: usize = 4;

/// Upper bound on time spent computing a character diff before falling back
/// to a coarser (still exact) edit script.
pub const DIFF_TIMEOUT_MS: u64 = 2_000;

/// Default page height, in blocks, for page-break correction.
pub const DEFAULT_LINES_PER_PAGE: usize = 55;

/// Default chronometry: this many characters of text...
pub const DEFAULT_CHRONOMETRY_CHARACTERS: usize = 1_000;
/// ...take this many seconds of screen time.
pub const DEFAULT_CHRONOMETRY_SECONDS: f64 = 60.0;

/// Length of the short scene text shown in outline views.
pub const OUTLINE_SHORT_TEXT_CHARS: usize = 100;

/// Suffix appended to a repeated speaker within one scene.
pub const CONTINUED_SUFFIX: &str = " (CONT'D)";

/// Root element of the script XML.
pub const SCRIPT_TAG: &str = "scenario";
/// Value written to the root `version` attribute.
pub const SCRIPT_XML_VERSION: &str = "1.0";
/// Child element holding a unit's text.
pub const VALUE_TAG: &str = "v";
/// Child element holding a unit's review marks.
pub const REVIEWS_TAG: &str = "reviews";
/// Single review mark element.
pub const REVIEW_TAG: &str = "review";
/// Comment attached to a review mark.
pub const REVIEW_COMMENT_TAG: &str = "review_comment";

/// File name for the redb change store within the configured directory.
pub const REDB_FILE_NAME: &str = "history.redb";

/// Default author recorded when nothing else is configured.
pub const DEFAULT_AUTHOR: &str = "unknown";
