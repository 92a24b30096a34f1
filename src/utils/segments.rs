//! Splits a chat message into the text/emote segments the overlay renders.
//!
//! Emote positions are inclusive `[start, end]` ranges of code points, so the
//! message is indexed as a `Vec<char>` and never sliced by byte offset.

use crate::models::{
    emote::{EmoteData, EmoteOccurrence},
    segment::Segment,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("malformed emote `{id}`: {kind}")]
    MalformedInput { id: String, kind: Malformation },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformation {
    #[error("range {start}..={end} is inverted")]
    Inverted { start: usize, end: usize },
    #[error("range {start}..={end} exceeds message length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("range {start}..={end} overlaps an emote ending at {previous_end}")]
    Overlap {
        start: usize,
        end: usize,
        previous_end: usize,
    },
}

fn malformed(id: &str, kind: Malformation) -> SegmentError {
    SegmentError::MalformedInput {
        id: id.to_string(),
        kind,
    }
}

/// Builds `[Image, ...body, Image]` for `text`, replacing every emote
/// occurrence with an [`Segment::Emote`] and keeping the text around them.
///
/// The whole message is rejected if any range is inverted, runs past the end
/// of the text, or overlaps another one.
pub fn build_segments(
    text: &str,
    emotes: &[EmoteData],
    image: &str,
) -> Result<Vec<Segment>, SegmentError> {
    let chars: Vec<char> = text.chars().collect();

    let mut occurrences: Vec<EmoteOccurrence<'_>> =
        emotes.iter().flat_map(EmoteData::occurrences).collect();
    occurrences.sort_by_key(|occurrence| occurrence.start);

    let mut result = Vec::with_capacity(occurrences.len() * 2 + 3);
    result.push(Segment::Image(image.to_string()));

    let mut cursor = 0;
    for (index, occurrence) in occurrences.iter().enumerate() {
        let EmoteOccurrence { id, start, end } = *occurrence;
        if end < start {
            return Err(malformed(id, Malformation::Inverted { start, end }));
        }
        if end >= chars.len() {
            return Err(malformed(
                id,
                Malformation::OutOfBounds {
                    start,
                    end,
                    len: chars.len(),
                },
            ));
        }
        if start < cursor {
            return Err(malformed(
                id,
                Malformation::Overlap {
                    start,
                    end,
                    previous_end: occurrences[index - 1].end,
                },
            ));
        }

        if start > cursor {
            result.push(Segment::Text(chars[cursor..start].iter().collect()));
        }
        result.push(Segment::Emote(id.to_string()));
        cursor = end + 1;
    }

    if cursor < chars.len() {
        result.push(Segment::Text(chars[cursor..].iter().collect()));
    }

    result.push(Segment::Image(image.to_string()));
    Ok(result)
}
