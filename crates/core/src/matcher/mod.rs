//! Query normalization and release-name matching.
//!
//! Two normalization modes exist: the storage-key form (`foo+bar`) used to
//! build persisted keys, and the matching form (`foo bar`) in which the
//! separators `.`, `-`, `_` are treated like whitespace. Both are pure and
//! idempotent.

mod normalize;
mod similarity;

pub use normalize::{canonical, match_form, matches, query_words, storage_key, MIN_WORD_LEN};
pub use similarity::{is_similar, overlap, SIMILARITY_THRESHOLD};
