use smallvec::SmallVec;

use crate::types::{GlyphId, WordId};
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Number of occurrences of each glyph in a single cell across a set of words, indexed by
/// `GlyphId`.
pub type GlyphCounts = SmallVec<[u32; MAX_GLYPH_COUNT]>;

/// Count the glyphs appearing at `cell_idx` in the given options. Words too short to reach the
/// cell don't contribute anything.
pub fn build_glyph_counts_for_cell(
    word_list: &WordList,
    options: &[WordId],
    cell_idx: usize,
) -> GlyphCounts {
    let mut result: GlyphCounts = (0..word_list.glyphs.len()).map(|_| 0).collect();

    for &word_id in options {
        if let Some(&glyph) = word_list.get_word(word_id).glyphs.get(cell_idx) {
            result[glyph] += 1;
        }
    }

    result
}

/// Look up the glyph count for a glyph that may not appear in the table at all.
#[must_use]
pub fn glyph_count(counts: &GlyphCounts, glyph: Option<GlyphId>) -> u32 {
    glyph.and_then(|glyph| counts.get(glyph)).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use crate::util::{build_glyph_counts_for_cell, glyph_count};
    use crate::word_list::WordList;

    #[test]
    fn test_counts_single_cell_skipping_short_words() {
        let word_list = WordList::from_words(["cat", "car", "at"]);
        let options: Vec<_> = (0..word_list.len()).collect();

        let counts = build_glyph_counts_for_cell(&word_list, &options, 2);
        let t = word_list.glyph_id_by_char[&'t'];
        let r = word_list.glyph_id_by_char[&'r'];

        assert_eq!(counts[t], 1);
        assert_eq!(counts[r], 1);
        assert_eq!(counts.iter().sum::<u32>(), 2);
        assert_eq!(glyph_count(&counts, None), 0);
        assert_eq!(glyph_count(&counts, Some(t)), 1);
    }
}
