//! Box identifier generation.
//!
//! Ids are short random tokens: unique in practice for one document lifetime,
//! not cryptographically unique. `fresh_box_id` closes the remaining gap by
//! re-drawing on collision with ids already in the document.

use crate::model::diagram::{BoxId, Document};
use uuid::Uuid;

/// Token length in hex characters.
pub const BOX_ID_LEN: usize = 8;

/// Returns a new short random box id.
pub fn new_box_id() -> BoxId {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(BOX_ID_LEN);
    token
}

/// Returns a new box id that is not used by any box in `document`.
pub fn fresh_box_id(document: &Document) -> BoxId {
    loop {
        let candidate = new_box_id();
        if !document.contains_box(&candidate) {
            return candidate;
        }
    }
}
