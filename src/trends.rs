//! Title frequency ranking over a window of recent items.

use std::collections::HashMap;
use std::fmt;

use crate::forum::Item;

/// One ranked title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendEntry {
    pub title: String,
    pub count: usize,
}

/// Distinct titles ranked by how often they occur, most frequent first.
///
/// Ties keep the order in which titles were first seen in the window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendSnapshot {
    entries: Vec<TrendEntry>,
}

impl TrendSnapshot {
    #[must_use]
    pub fn from_items(items: &[Item]) -> Self {
        Self::from_titles(items.iter().map(|item| item.title.as_str()))
    }

    pub fn from_titles<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<TrendEntry> = Vec::new();

        for title in titles {
            if let Some(&pos) = positions.get(title) {
                entries[pos].count += 1;
            } else {
                positions.insert(title, entries.len());
                entries.push(TrendEntry {
                    title: title.to_string(),
                    count: 1,
                });
            }
        }

        // Stable sort keeps first-seen order among equal counts.
        entries.sort_by(|a, b| b.count.cmp(&a.count));

        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[TrendEntry] {
        &self.entries
    }

    #[must_use]
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.title.as_str()).collect()
    }

    /// The `n` highest ranked titles.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<&str> {
        self.entries
            .iter()
            .take(n)
            .map(|e| e.title.as_str())
            .collect()
    }

    #[must_use]
    pub fn count(&self, title: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.title == title)
            .map(|e| e.count)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for TrendSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "- {} ({})", entry.title, entry.count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_with_ties() {
        let trends = TrendSnapshot::from_titles(["A", "B", "A", "C"]);
        assert_eq!(trends.titles(), vec!["A", "B", "C"]);
        assert_eq!(trends.count("A"), Some(2));
        assert_eq!(trends.count("B"), Some(1));
        assert_eq!(trends.count("C"), Some(1));
        assert_eq!(trends.count("D"), None);
    }

    #[test]
    fn test_later_title_overtakes() {
        let trends = TrendSnapshot::from_titles(["x", "y", "z", "z", "y", "z"]);
        assert_eq!(trends.titles(), vec!["z", "y", "x"]);
        assert_eq!(trends.top(2), vec!["z", "y"]);
    }

    #[test]
    fn test_empty_input() {
        let trends = TrendSnapshot::from_items(&[]);
        assert!(trends.is_empty());
        assert!(trends.top(3).is_empty());
        assert_eq!(trends.to_string(), "");
    }

    #[test]
    fn test_from_items() {
        let items: Vec<Item> = ["A", "B", "A"]
            .iter()
            .enumerate()
            .map(|(i, t)| Item::new(i.to_string(), *t))
            .collect();
        let trends = TrendSnapshot::from_items(&items);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends.to_string(), "- A (2)\n- B (1)\n");
    }
}
