use serde::{Deserialize, Serialize};

/// An emote as it arrives with a redemption: one entry per emote id, one
/// `[start, end]` pair per occurrence. Offsets are inclusive and counted in
/// code points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteData {
    pub id: String,
    #[serde(default)]
    pub positions: Vec<[usize; 2]>,
}

/// A single placement of an emote inside a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmoteOccurrence<'a> {
    pub id: &'a str,
    pub start: usize,
    pub end: usize,
}

impl EmoteData {
    pub fn occurrences(&self) -> impl Iterator<Item = EmoteOccurrence<'_>> {
        self.positions.iter().map(|[start, end]| EmoteOccurrence {
            id: &self.id,
            start: *start,
            end: *end,
        })
    }
}
