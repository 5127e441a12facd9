//! Tagging support: turning segmented text into tagging rows, suggesting
//! tags from an existing ontology, and folding tagged words back into a
//! new ontology.
//!
//! Segmented text is one unit per line, words separated by single spaces.
//! In `Chunk` mode a line holds one word; in `Sentence` mode a line is a
//! whole sentence.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ReconcileConfig;
use crate::error::{OntoError, Result};
use crate::trie::PathTrie;
use crate::view::OntologyView;

const CHUNK_WORDS: usize = 48;
const CHUNK_SENTENCES: usize = 4;
const ROW_WORDS: usize = 12;

pub type Unit = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMode {
    #[default]
    Chunk,
    Sentence,
}

impl LineMode {
    pub fn chunk_size(self) -> usize {
        match self {
            Self::Chunk => CHUNK_WORDS,
            Self::Sentence => CHUNK_SENTENCES,
        }
    }
}

impl FromStr for LineMode {
    type Err = OntoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chunk" => Ok(Self::Chunk),
            "sentence" => Ok(Self::Sentence),
            other => Err(OntoError::InvalidArguments(format!(
                "line mode is either `sentence` or `chunk`, got `{other}`"
            ))),
        }
    }
}

/// Split segmented text into tagging chunks of `mode.chunk_size()` units.
/// The last chunk may be shorter.
pub fn chunk_units(text: &str, mode: LineMode) -> Vec<Vec<Unit>> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Vec::new();
    }
    let units: Vec<Unit> = text
        .lines()
        .map(|line| line.trim().split(' ').map(str::to_string).collect())
        .collect();
    units
        .chunks(mode.chunk_size())
        .map(<[Unit]>::to_vec)
        .collect()
}

/// Lay out one chunk as tagging rows: one row per sentence, or rows of
/// twelve words.
pub fn rows_from_units(units: &[Unit], mode: LineMode) -> Vec<Vec<String>> {
    match mode {
        LineMode::Sentence => units.to_vec(),
        LineMode::Chunk => {
            let words: Vec<String> = units.iter().flatten().cloned().collect();
            words.chunks(ROW_WORDS).map(<[String]>::to_vec).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedWord {
    pub word: String,
    pub pos: String,
    pub level: String,
    pub freq: u64,
}

/// Count identical (word, pos, level) triples. Triples with an empty member
/// are skipped; output keeps first-seen order.
pub fn collect_tagged<I>(rows: I) -> Vec<TaggedWord>
where
    I: IntoIterator<Item = (String, String, String)>,
{
    let mut seen: HashMap<(String, String, String), usize> = HashMap::new();
    let mut out: Vec<TaggedWord> = Vec::new();
    for (word, pos, level) in rows {
        if word.is_empty() || pos.is_empty() || level.is_empty() {
            continue;
        }
        let key = (word, pos, level);
        match seen.get(&key) {
            Some(&idx) => out[idx].freq += 1,
            None => {
                seen.insert(key.clone(), out.len());
                let (word, pos, level) = key;
                out.push(TaggedWord {
                    word,
                    pos,
                    level,
                    freq: 1,
                });
            }
        }
    }
    out
}

/// Build an ontology from tagged words using `basis`'s legend. A word the
/// basis already files under its POS keeps that path; anything else lands in
/// `[pos, unfiled_bucket]`. POS, level and frequency go to the fields
/// `config` names for them.
pub fn tagged_to_trie(tagged: &[TaggedWord], basis: &OntologyView, config: &ReconcileConfig) -> Result<PathTrie> {
    let legend = basis.legend();
    let mut trie = PathTrie::with_legend(legend);
    let unfiled_bucket = config.unfiled_bucket.as_str();
    for tw in tagged {
        let freq = tw.freq.to_string();
        let entry = legend
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                if idx == 0 {
                    tw.word.clone()
                } else if *field == config.pos_field {
                    tw.pos.clone()
                } else if *field == config.level_field {
                    tw.level.clone()
                } else if *field == config.freq_field {
                    freq.clone()
                } else {
                    String::new()
                }
            })
            .collect();
        let found = basis.find_entries(&[tw.pos.as_str()], Some(&tw.word));
        match found.into_iter().next() {
            Some((path, _)) => trie.insert(&path, Some(entry))?,
            None => trie.insert(&[tw.pos.as_str(), unfiled_bucket], Some(entry))?,
        }
    }
    Ok(trie)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSuggestion {
    pub word: String,
    /// Top-level category of the first path holding the word.
    pub pos: Option<String>,
    pub level: String,
    /// The word is not in the ontology yet.
    pub is_new: bool,
}

pub fn suggest_tags<S: AsRef<str>>(
    view: &OntologyView,
    words: &[S],
    default_level: &str,
    config: &ReconcileConfig,
) -> Vec<TagSuggestion> {
    words
        .iter()
        .map(|word| {
            let word = word.as_ref();
            let found = view.find_word(word);
            let first = found.first();
            let pos = first.and_then(|(path, _)| path.first().cloned());
            let level = first
                .and_then(|(_, entries)| entries.first())
                .and_then(|entry| view.get_field(entry, &config.level_field).ok().flatten())
                .unwrap_or(default_level)
                .to_string();
            TagSuggestion {
                word: word.to_string(),
                pos,
                level,
                is_new: first.is_none(),
            }
        })
        .collect()
}
