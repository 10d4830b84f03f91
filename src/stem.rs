//! Stemmers.
//!
//! Stemming is mechanical suffix removal: it may produce non-words and it
//! knows nothing about lemmas. Every stemmer here works on `char`s, so
//! Polish diacritics never land on a byte boundary.

use anyhow::Result;

pub trait Stemmer: Send + Sync {
    /// Reduce one lower-cased token to its stem.
    fn stem(&self, word: &str) -> String;

    /// Name used in config and logs.
    fn name(&self) -> &'static str;
}

/// Stem a token sequence. Total and order-preserving.
pub fn stem_tokens(tokens: &[String], stemmer: &dyn Stemmer) -> Vec<String> {
    tokens.iter().map(|t| stemmer.stem(t)).collect()
}

/// Build the stemmer named in `normalize.stemmer`.
pub fn stemmer_for(name: &str) -> Result<Box<dyn Stemmer>> {
    match name {
        "polish" => Ok(Box::new(PolishStemmer::new())),
        "porter" => Ok(Box::new(PorterStemmer)),
        other => anyhow::bail!("Unknown stemmer: '{}'. Must be polish or porter.", other),
    }
}

/// Light Polish stemmer: strips the longest known inflectional suffix,
/// keeping at least [`PolishStemmer::MIN_STEM`] characters.
#[derive(Debug, Clone)]
pub struct PolishStemmer {
    suffixes: Vec<Vec<char>>,
}

impl PolishStemmer {
    pub const MIN_STEM: usize = 3;

    pub fn new() -> Self {
        let mut suffixes: Vec<Vec<char>> = [
            // verbal
            "owała", "owało", "owały", "owali", "ować", "ował", "ując", "ujemy", "ujesz",
            "iła", "iło", "iły", "ili", "ała", "ało", "ały", "ali", "uje", "ują", "ić", "ać",
            "eć", "yć", "ił", "ał",
            // nominal and adjectival
            "owego", "owemu", "owych", "owymi", "owej", "owym", "iego", "iemu", "ego", "emu",
            "ymi", "imi", "ych", "ich", "ami", "ach", "owi", "ów", "om", "ej", "ym", "im",
            "ie", "ą", "ę", "a", "e", "i", "y", "o", "u",
        ]
        .iter()
        .map(|s| s.chars().collect())
        .collect();
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
        Self { suffixes }
    }
}

impl Default for PolishStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for PolishStemmer {
    fn stem(&self, word: &str) -> String {
        let chars: Vec<char> = word.chars().collect();
        for suffix in &self.suffixes {
            if chars.len() >= suffix.len() + Self::MIN_STEM && chars.ends_with(suffix) {
                return chars[..chars.len() - suffix.len()].iter().collect();
            }
        }
        word.to_string()
    }

    fn name(&self) -> &'static str {
        "polish"
    }
}

/// The classic Porter (1980) algorithm for English.
///
/// Letters outside `a-z` count as consonants, which keeps the rules total
/// on non-English input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        let mut w = Word(word.chars().collect());
        if w.0.len() <= 2 {
            return word.to_string();
        }
        w.step1a();
        w.step1b();
        w.step1c();
        w.step2();
        w.step3();
        w.step4();
        w.step5();
        w.0.into_iter().collect()
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}

struct Word(Vec<char>);

impl Word {
    fn is_consonant(&self, i: usize) -> bool {
        match self.0[i] {
            'a' | 'e' | 'i' | 'o' | 'u' => false,
            'y' => i == 0 || !self.is_consonant(i - 1),
            _ => true,
        }
    }

    /// Number of VC sequences in the first `len` characters.
    fn measure(&self, len: usize) -> usize {
        let mut m = 0;
        let mut i = 0;
        while i < len && self.is_consonant(i) {
            i += 1;
        }
        while i < len {
            while i < len && !self.is_consonant(i) {
                i += 1;
            }
            if i >= len {
                break;
            }
            m += 1;
            while i < len && self.is_consonant(i) {
                i += 1;
            }
        }
        m
    }

    fn has_vowel(&self, len: usize) -> bool {
        (0..len).any(|i| !self.is_consonant(i))
    }

    fn ends_double_consonant(&self, len: usize) -> bool {
        len >= 2 && self.0[len - 1] == self.0[len - 2] && self.is_consonant(len - 1)
    }

    /// consonant-vowel-consonant ending at `len - 1`, last not w, x or y.
    fn ends_cvc(&self, len: usize) -> bool {
        len >= 3
            && self.is_consonant(len - 3)
            && !self.is_consonant(len - 2)
            && self.is_consonant(len - 1)
            && !matches!(self.0[len - 1], 'w' | 'x' | 'y')
    }

    fn ends_with(&self, suffix: &str) -> Option<usize> {
        let suffix: Vec<char> = suffix.chars().collect();
        if self.0.ends_with(&suffix) {
            Some(self.0.len() - suffix.len())
        } else {
            None
        }
    }

    fn set_from(&mut self, stem_len: usize, replacement: &str) {
        self.0.truncate(stem_len);
        self.0.extend(replacement.chars());
    }

    /// Replace the first matching suffix when the stem measure exceeds `min_m`.
    fn replace_first(&mut self, rules: &[(&str, &str)], min_m: usize) {
        for (suffix, replacement) in rules {
            if let Some(stem) = self.ends_with(suffix) {
                if self.measure(stem) > min_m {
                    self.set_from(stem, replacement);
                }
                return;
            }
        }
    }

    fn step1a(&mut self) {
        if let Some(stem) = self.ends_with("sses") {
            self.set_from(stem, "ss");
        } else if let Some(stem) = self.ends_with("ies") {
            self.set_from(stem, "i");
        } else if self.ends_with("ss").is_none() {
            if let Some(stem) = self.ends_with("s") {
                self.set_from(stem, "");
            }
        }
    }

    fn step1b(&mut self) {
        if let Some(stem) = self.ends_with("eed") {
            if self.measure(stem) > 0 {
                self.set_from(stem, "ee");
            }
            return;
        }
        let stem = match self.ends_with("ed").or_else(|| self.ends_with("ing")) {
            Some(stem) if self.has_vowel(stem) => stem,
            _ => return,
        };
        self.set_from(stem, "");

        let len = self.0.len();
        if self.ends_with("at").is_some()
            || self.ends_with("bl").is_some()
            || self.ends_with("iz").is_some()
        {
            self.0.push('e');
        } else if self.ends_double_consonant(len) && !matches!(self.0[len - 1], 'l' | 's' | 'z') {
            self.0.pop();
        } else if self.measure(len) == 1 && self.ends_cvc(len) {
            self.0.push('e');
        }
    }

    fn step1c(&mut self) {
        if let Some(stem) = self.ends_with("y") {
            if self.has_vowel(stem) {
                self.set_from(stem, "i");
            }
        }
    }

    fn step2(&mut self) {
        self.replace_first(
            &[
                ("ational", "ate"),
                ("tional", "tion"),
                ("enci", "ence"),
                ("anci", "ance"),
                ("izer", "ize"),
                ("abli", "able"),
                ("alli", "al"),
                ("entli", "ent"),
                ("eli", "e"),
                ("ousli", "ous"),
                ("ization", "ize"),
                ("ation", "ate"),
                ("ator", "ate"),
                ("alism", "al"),
                ("iveness", "ive"),
                ("fulness", "ful"),
                ("ousness", "ous"),
                ("aliti", "al"),
                ("iviti", "ive"),
                ("biliti", "ble"),
            ],
            0,
        );
    }

    fn step3(&mut self) {
        self.replace_first(
            &[
                ("icate", "ic"),
                ("ative", ""),
                ("alize", "al"),
                ("iciti", "ic"),
                ("ical", "ic"),
                ("ful", ""),
                ("ness", ""),
            ],
            0,
        );
    }

    fn step4(&mut self) {
        const SUFFIXES: [&str; 19] = [
            "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion",
            "ou", "ism", "ate", "iti", "ous", "ive", "ize",
        ];
        for suffix in SUFFIXES {
            let Some(stem) = self.ends_with(suffix) else {
                continue;
            };
            if suffix == "ion" && !(stem > 0 && matches!(self.0[stem - 1], 's' | 't')) {
                continue;
            }
            if self.measure(stem) > 1 {
                self.set_from(stem, "");
            }
            return;
        }
    }

    fn step5(&mut self) {
        if let Some(stem) = self.ends_with("e") {
            let m = self.measure(stem);
            if m > 1 || (m == 1 && !self.ends_cvc(stem)) {
                self.set_from(stem, "");
            }
        }
        let len = self.0.len();
        if self.measure(len) > 1 && self.ends_double_consonant(len) && self.0[len - 1] == 'l' {
            self.0.pop();
        }
    }
}
