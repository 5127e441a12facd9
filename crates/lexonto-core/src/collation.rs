//! String collation for leaf ordering.
//!
//! Cleanup orders each leaf by a locale-specific total order. The order is an
//! injected capability (`Collator`); `TibetanCollator` implements Tibetan
//! dictionary order, `CodepointCollator` plain `str` ordering.
//!
//! Tibetan order is syllable based. Each syllable is decomposed into
//! prefix, superscript, root, subscripts, vowel and suffixes, and compared by
//! root letter first, then superscript, prefix, subscripts, vowel, suffixes:
//!
//! ```text
//! ཀ < ཀི < ཀྱ < ཀྲ < དཀའ < བཀའ < རྐ < བརྐ < སྐ < ཁ ...
//! ```
//!
//! Text outside the Tibetan block sorts after Tibetan syllables, by code
//! point.

use std::cmp::Ordering;

pub trait Collator {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodepointCollator;

impl Collator for CodepointCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TibetanCollator;

impl Collator for TibetanCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.sort_key(a)
            .cmp(&self.sort_key(b))
            .then_with(|| a.cmp(b))
    }
}

// ============================================================================
// Tibetan letters
// ============================================================================

const ALPHABET: [char; 30] = [
    'ཀ', 'ཁ', 'ག', 'ང', 'ཅ', 'ཆ', 'ཇ', 'ཉ', 'ཏ', 'ཐ', 'ད', 'ན', 'པ', 'ཕ', 'བ', 'མ', 'ཙ', 'ཚ', 'ཛ',
    'ཝ', 'ཞ', 'ཟ', 'འ', 'ཡ', 'ར', 'ལ', 'ཤ', 'ས', 'ཧ', 'ཨ',
];

const PREFIXES: [char; 5] = ['ག', 'ད', 'བ', 'མ', 'འ'];
const SUPERSCRIPTS: [char; 3] = ['ར', 'ལ', 'ས'];
const SUBSCRIPTS: [char; 4] = ['ཡ', 'ར', 'ལ', 'ཝ'];

const VOWELS: [char; 4] = ['ི', 'ུ', 'ེ', 'ོ'];

const TSEK: [char; 2] = ['\u{0F0B}', '\u{0F0C}'];

/// Marks a Tibetan syllable segment inside a sort key.
const SYLLABLE: u32 = 0;
/// Marks a non-Tibetan character inside a sort key.
const OTHER: u32 = 1;

fn is_base_letter(c: char) -> bool {
    ('\u{0F40}'..='\u{0F6C}').contains(&c)
}

fn is_subjoined(c: char) -> bool {
    ('\u{0F90}'..='\u{0FBC}').contains(&c)
}

fn is_vowel_sign(c: char) -> bool {
    ('\u{0F71}'..='\u{0F7D}').contains(&c) || c == '\u{0F80}' || c == '\u{0F81}'
}

/// Subjoined form → base letter.
fn base_of(sub: char) -> char {
    match sub {
        '\u{0FBA}' => 'ཝ',
        '\u{0FBB}' => 'ཡ',
        '\u{0FBC}' => 'ར',
        other => char::from_u32(other as u32 - 0x50).unwrap_or(other),
    }
}

fn letter_rank(c: char) -> u32 {
    match ALPHABET.iter().position(|&l| l == c) {
        Some(idx) => idx as u32 + 1,
        // Sanskrit and fixed-form letters after the native alphabet
        None => 64 + (c as u32).saturating_sub(0x0F40),
    }
}

fn vowel_rank(c: char) -> u32 {
    match VOWELS.iter().position(|&v| v == c) {
        Some(idx) => idx as u32 + 1,
        None => 8 + (c as u32).saturating_sub(0x0F70),
    }
}

#[derive(Debug, Default)]
struct Stack {
    base: char,
    subs: Vec<char>,
    vowels: Vec<char>,
}

fn syllable_key(stacks: &[Stack], key: &mut Vec<u32>) {
    if stacks.is_empty() {
        return;
    }
    let root_idx = match stacks.iter().position(|s| !s.vowels.is_empty()) {
        Some(idx) => idx,
        None if stacks.len() == 1 || !stacks[0].subs.is_empty() => 0,
        None if stacks.len() == 2 => usize::from(!stacks[1].subs.is_empty()),
        None if !stacks[1].subs.is_empty() => 1,
        None if PREFIXES.contains(&stacks[0].base) => 1,
        None => 0,
    };

    let stack = &stacks[root_idx];
    let (superscript, root, subs) = match stack.subs.first() {
        Some(first) if SUPERSCRIPTS.contains(&stack.base) && !SUBSCRIPTS.contains(first) => {
            (Some(stack.base), *first, &stack.subs[1..])
        }
        _ => (None, stack.base, &stack.subs[..]),
    };
    let prefix = root_idx.checked_sub(1).map(|i| stacks[i].base);
    let rank = |c: Option<char>| c.map(letter_rank).unwrap_or(0);

    key.push(SYLLABLE);
    key.push(letter_rank(root));
    key.push(rank(superscript));
    key.push(rank(prefix));
    key.push(rank(subs.first().copied()));
    key.push(rank(subs.get(1).copied()));
    key.push(
        stack
            .vowels
            .iter()
            .fold(0u32, |acc, &v| acc.saturating_mul(32).saturating_add(vowel_rank(v))),
    );
    key.push(rank(stacks.get(root_idx + 1).map(|s| s.base)));
    key.push(rank(stacks.get(root_idx + 2).map(|s| s.base)));
}

impl TibetanCollator {
    /// Sort key: one fixed-width segment per Tibetan syllable, one
    /// `[OTHER, codepoint]` pair per character outside the script.
    pub fn sort_key(&self, text: &str) -> Vec<u32> {
        let mut key = Vec::with_capacity(text.len());
        let mut stacks: Vec<Stack> = Vec::new();

        for c in text.chars() {
            if is_base_letter(c) {
                stacks.push(Stack {
                    base: c,
                    ..Stack::default()
                });
            } else if (is_subjoined(c) || is_vowel_sign(c)) && !stacks.is_empty() {
                let last = stacks.len() - 1;
                if is_subjoined(c) {
                    stacks[last].subs.push(base_of(c));
                } else {
                    stacks[last].vowels.push(c);
                }
            } else {
                syllable_key(&stacks, &mut key);
                stacks.clear();
                if !TSEK.contains(&c) {
                    key.push(OTHER);
                    key.push(c as u32);
                }
            }
        }
        syllable_key(&stacks, &mut key);
        key
    }
}
