use smallvec::{smallvec, SmallVec};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fmt::Debug;
use std::{fmt, fs};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word in the word list.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a grid -- only lowercase letters or other valid glyphs.
    pub normalized_string: String,

    /// The word as it appears in the user's word list, with arbitrary formatting and punctuation.
    pub canonical_string: String,

    /// The glyph ids making up `normalized_string`. The length of this is the length of the word.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,

    /// The index of the source that the word came from. If the same word appears in multiple
    /// sources, this is the highest-priority (i.e., lowest) one.
    pub source_index: u16,
}

impl Word {
    /// The length of the word in glyphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Given a canonical word string from a dictionary file, turn it into the normalized form we'll
/// use in the actual fill engine.
#[must_use]
pub fn normalize_word(canonical: &str) -> String {
    canonical
        .to_lowercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordListError {
    #[error("Can’t read file: “{0}”")]
    InvalidPath(String),

    #[error("Word list contains invalid word: “{0}”")]
    InvalidWord(String),
}

/// Configuration describing a source of wordlist entries.
#[derive(Debug, Clone)]
pub enum WordListSourceConfig {
    Memory { id: String, words: Vec<String> },
    File { id: String, path: OsString },
    FileContents { id: String, contents: &'static str },
}

impl WordListSourceConfig {
    /// The unique, persistent id of this word list.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            WordListSourceConfig::Memory { id, .. }
            | WordListSourceConfig::FileContents { id, .. }
            | WordListSourceConfig::File { id, .. } => id.clone(),
        }
    }
}

/// A single word list entry.
struct RawWordListEntry {
    pub normalized: String,
    pub canonical: String,
    pub source_index: u16,
}

fn parse_raw_entry(
    canonical: &str,
    source_index: u16,
    errors: &mut Vec<WordListError>,
) -> Option<RawWordListEntry> {
    let canonical = canonical.trim();
    let normalized = normalize_word(canonical);
    if normalized.is_empty() {
        errors.push(WordListError::InvalidWord(canonical.into()));
        return None;
    }

    Some(RawWordListEntry {
        normalized,
        canonical: canonical.to_string(),
        source_index,
    })
}

/// Parse a word list file with one entry per line. Scored lists (`word;score`) are accepted, but
/// only the word is kept. Blank lines are skipped.
fn parse_word_list_file_contents(
    file_contents: &str,
    source_index: u16,
    errors: &mut Vec<WordListError>,
) -> Vec<RawWordListEntry> {
    file_contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map_while(|line| {
            if errors.len() > 100 {
                return None;
            }

            let canonical = line.split(';').next().unwrap_or_default();
            Some(parse_raw_entry(canonical, source_index, errors))
        })
        .flatten()
        .collect()
}

fn load_words_from_source(
    source: &WordListSourceConfig,
    source_index: u16,
) -> (Vec<RawWordListEntry>, Vec<WordListError>) {
    let mut errors = vec![];

    let entries = match source {
        WordListSourceConfig::Memory { words, .. } => words
            .iter()
            .filter_map(|canonical| parse_raw_entry(canonical, source_index, &mut errors))
            .collect(),

        WordListSourceConfig::File { path, .. } => {
            if let Ok(contents) = fs::read_to_string(path) {
                parse_word_list_file_contents(&contents, source_index, &mut errors)
            } else {
                errors.push(WordListError::InvalidPath(path.to_string_lossy().into()));
                vec![]
            }
        }

        WordListSourceConfig::FileContents { contents, .. } => {
            parse_word_list_file_contents(contents, source_index, &mut errors)
        }
    };

    (entries, errors)
}

/// The words available for filling, in load order, along with lookup tables for glyphs and
/// normalized strings. Word ids and glyph ids are stable for the lifetime of the list.
pub struct WordList {
    /// A list of all characters that occur in any (normalized) word. `GlyphId`s used everywhere
    /// else are indices into this list.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`: a map from a character to the `GlyphId` representing it.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// All loaded words; a `WordId` is an index into this list.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// Errors emitted by each source during loading, keyed by source id.
    pub source_errors: HashMap<String, Vec<WordListError>>,
}

impl WordList {
    /// Construct a new `WordList` using the given sources (omitting any entries that are longer than
    /// `max_length`). Sources are listed in priority order; a word that appears in more than one
    /// source is only loaded once.
    #[must_use]
    pub fn new(source_configs: &[WordListSourceConfig], max_length: Option<usize>) -> WordList {
        assert!(
            source_configs.len() < 2usize.pow(16),
            "Too many word list sources"
        );

        let mut instance = WordList {
            glyphs: smallvec![],
            glyph_id_by_char: HashMap::new(),
            words: vec![],
            word_id_by_string: HashMap::new(),
            source_errors: HashMap::new(),
        };

        let mut seen_words: HashSet<String> = HashSet::new();

        for (source_index, source) in source_configs.iter().enumerate() {
            let (entries, errors) = load_words_from_source(source, source_index as u16);

            for entry in entries {
                if max_length.is_some_and(|max_length| entry.normalized.chars().count() > max_length)
                {
                    continue;
                }
                if !seen_words.insert(entry.normalized.clone()) {
                    continue;
                }
                instance.add_word(&entry);
            }

            instance.source_errors.insert(source.id(), errors);
        }

        log::debug!(
            "loaded {} words from {} source(s) using {} glyphs",
            instance.words.len(),
            source_configs.len(),
            instance.glyphs.len()
        );

        instance
    }

    /// Build a `WordList` from a single in-memory list of words.
    #[must_use]
    pub fn from_words<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        WordList::new(
            &[WordListSourceConfig::Memory {
                id: "0".into(),
                words: words.into_iter().map(|w| w.as_ref().to_string()).collect(),
            }],
            None,
        )
    }

    /// Add the given word to the list. The word must not be part of the list yet.
    fn add_word(&mut self, raw_entry: &RawWordListEntry) -> WordId {
        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = raw_entry
            .normalized
            .chars()
            .map(|c| self.glyph_id_for_char(c))
            .collect();

        let word_id = self.words.len();

        self.words.push(Word {
            normalized_string: raw_entry.normalized.clone(),
            canonical_string: raw_entry.canonical.clone(),
            glyphs,
            source_index: raw_entry.source_index,
        });

        self.word_id_by_string
            .insert(raw_entry.normalized.clone(), word_id);

        word_id
    }

    /// What's the unique glyph id for the given char? We do this lazily, instead of just mapping
    /// every letter up front, because word list entries may also contain numbers, non-English
    /// letters, or punctuation.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        self.glyph_id_by_char.get(&ch).copied().unwrap_or_else(|| {
            self.glyphs.push(ch);
            let id = self.glyphs.len() - 1;
            self.glyph_id_by_char.insert(ch, id);
            id
        })
    }

    /// Borrow an existing word using its id.
    #[must_use]
    pub fn get_word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Look up the id of a word, normalizing it first.
    #[must_use]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(word)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// For each source, return any errors it emitted while loading.
    #[must_use]
    pub fn get_source_errors(&self) -> &HashMap<String, Vec<WordListError>> {
        &self.source_errors
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &self.words.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub mod tests {
    use crate::word_list::{normalize_word, WordList, WordListError, WordListSourceConfig};
    use std::path::PathBuf;

    #[test]
    fn test_normalizes_words() {
        assert_eq!(normalize_word("Ice Cream"), "icecream");
        assert_eq!(normalize_word("CAT"), "cat");
        assert_eq!(normalize_word("CAFE\u{301}"), "caf\u{e9}");
    }

    #[test]
    fn test_loads_words_up_to_max_length() {
        let word_list = WordList::new(
            &[WordListSourceConfig::FileContents {
                id: "0".into(),
                contents: "cat\nhorse\n\ndog;50\nelephant;20\n",
            }],
            Some(5),
        );

        let loaded: Vec<_> = word_list
            .words
            .iter()
            .map(|word| word.normalized_string.as_str())
            .collect();

        assert_eq!(loaded, vec!["cat", "horse", "dog"]);
        assert_eq!(word_list.word_id("DOG"), Some(2));
        assert_eq!(word_list.word_id("elephant"), None);
    }

    #[test]
    fn test_deduplicates_across_sources() {
        let word_list = WordList::new(
            &[
                WordListSourceConfig::Memory {
                    id: "first".into(),
                    words: vec!["Cat".into(), "dog".into()],
                },
                WordListSourceConfig::Memory {
                    id: "second".into(),
                    words: vec!["cat".into(), "emu".into(), "DOG".into()],
                },
            ],
            None,
        );

        assert_eq!(word_list.len(), 3);
        let cat = word_list.get_word(word_list.word_id("cat").unwrap());
        assert_eq!(cat.canonical_string, "Cat");
        assert_eq!(cat.source_index, 0);
        assert_eq!(word_list.get_word(2).source_index, 1);
    }

    #[test]
    fn test_unusual_characters() {
        let word_list = WordList::from_words(["naïve", "ab-c"]);

        assert_eq!(word_list.get_word(0).len(), 5);
        assert_eq!(word_list.get_word(1).len(), 4);
        assert!(word_list.glyph_id_by_char.contains_key(&'ï'));
        assert!(word_list.glyph_id_by_char.contains_key(&'-'));
    }

    #[test]
    fn test_collects_source_errors() {
        let missing_path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "does-not-exist.txt"]
            .iter()
            .collect();

        let word_list = WordList::new(
            &[
                WordListSourceConfig::File {
                    id: "missing".into(),
                    path: missing_path.clone().into(),
                },
                WordListSourceConfig::FileContents {
                    id: "contents".into(),
                    contents: "ok\n ;10\n",
                },
            ],
            None,
        );

        let errors = word_list.get_source_errors();
        assert_eq!(
            errors["missing"],
            vec![WordListError::InvalidPath(
                missing_path.to_string_lossy().into()
            )]
        );
        assert_eq!(errors["contents"], vec![WordListError::InvalidWord("".into())]);
        assert_eq!(word_list.len(), 1);
    }
}
