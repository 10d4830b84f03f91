//! Token frequency distribution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCount {
    pub token: String,
    pub count: usize,
}

/// Token counts ordered by first occurrence, plus totals.
///
/// Ranking helpers sort by count descending; the sort is stable, so tokens
/// with equal counts keep first-occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub total: usize,
    pub distinct: usize,
    pub counts: Vec<TermCount>,
}

impl FrequencyTable {
    pub fn from_tokens(tokens: &[String]) -> Self {
        let mut counts: Vec<TermCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            match index.get(token) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(token.clone(), counts.len());
                    counts.push(TermCount {
                        token: token.clone(),
                        count: 1,
                    });
                }
            }
        }
        Self {
            total: tokens.len(),
            distinct: counts.len(),
            counts,
        }
    }

    /// Count for `token`, zero when absent.
    pub fn count(&self, token: &str) -> usize {
        self.counts
            .iter()
            .find(|c| c.token == token)
            .map_or(0, |c| c.count)
    }

    /// All entries ranked by count descending.
    pub fn ranked(&self) -> Vec<&TermCount> {
        let mut ranked: Vec<&TermCount> = self.counts.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    pub fn top_k(&self, k: usize) -> Vec<&TermCount> {
        let mut ranked = self.ranked();
        ranked.truncate(k);
        ranked
    }

    /// The top `p` percent of distinct tokens: `floor(p / 100 * distinct)`
    /// entries, at least one when `p > 0` and the table is non-empty.
    pub fn top_percent(&self, p: f64) -> Vec<&TermCount> {
        if p <= 0.0 || self.distinct == 0 {
            return Vec::new();
        }
        let n = (p * self.distinct as f64 / 100.0).floor() as usize;
        self.top_k(n.clamp(1, self.distinct))
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn counts_sum_to_length() {
        let input = tokens("hotel basen hotel plaża basen hotel obsługa");
        let table = FrequencyTable::from_tokens(&input);
        assert_eq!(table.total, input.len());
        assert_eq!(table.counts.iter().map(|c| c.count).sum::<usize>(), input.len());
        assert_eq!(table.counts.len(), table.distinct);
        assert_eq!(table.distinct, 4);
        assert_eq!(table.count("hotel"), 3);
        assert_eq!(table.count("brak"), 0);
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let table = FrequencyTable::from_tokens(&tokens("c b a b c a d"));
        let top: Vec<&str> = table.top_k(3).iter().map(|c| c.token.as_str()).collect();
        assert_eq!(top, vec!["c", "b", "a"]);
    }

    #[test]
    fn lemmas_merge_counts() {
        let raw = FrequencyTable::from_tokens(&tokens("miłe miła"));
        assert_eq!(raw.count("miła"), 1);
        assert_eq!(raw.count("miłe"), 1);

        let lemmas = FrequencyTable::from_tokens(&tokens("miły miły"));
        assert_eq!(lemmas.count("miły"), 2);
    }

    #[test]
    fn top_percent_floors_with_minimum_one() {
        let input: Vec<String> = (0..10).map(|i| format!("t{i}")).collect();
        let table = FrequencyTable::from_tokens(&input);
        assert_eq!(table.top_percent(30.0).len(), 3);
        assert_eq!(table.top_percent(0.3).len(), 1);
        assert_eq!(table.top_percent(100.0).len(), 10);
        assert!(table.top_percent(0.0).is_empty());

        let empty = FrequencyTable::from_tokens(&[]);
        assert!(empty.top_percent(50.0).is_empty());
        assert!(empty.is_empty());
    }

    #[test]
    fn survives_json_roundtrip() {
        let table = FrequencyTable::from_tokens(&tokens("a a b"));
        let json = serde_json::to_string(&table).unwrap();
        let back: FrequencyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.count("a"), 2);
        assert_eq!(back.distinct, 2);
    }
}
