use std::collections::BTreeMap;

/// One (canonical stat, OCR spelling) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasPair {
    pub canonical: String,
    pub alias: String,
}

/// Flat alias table ordered by alias length, longest first.
///
/// Built once from the stat alias map and shared read-only by every parse.
/// Longest-first order keeps a short alias such as `HP` from shadowing
/// `HP%` when both occur in a line. Aliases of equal length keep the
/// order of the source map.
#[derive(Clone, Debug, Default)]
pub struct AliasIndex {
    pairs: Vec<AliasPair>,
}

impl AliasIndex {
    pub fn new(stat_aliases: &BTreeMap<String, Vec<String>>) -> Self {
        let mut pairs: Vec<AliasPair> = stat_aliases
            .iter()
            .flat_map(|(canonical, aliases)| {
                aliases.iter().map(move |alias| AliasPair {
                    canonical: canonical.clone(),
                    alias: alias.clone(),
                })
            })
            .collect();

        // Stable sort: ties keep map order
        pairs.sort_by_key(|p| std::cmp::Reverse(p.alias.chars().count()));

        Self { pairs }
    }

    pub fn pairs(&self) -> &[AliasPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the canonical stat whose name or alias equals `label` exactly.
    pub fn find_exact(&self, label: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.canonical == label || p.alias == label)
            .map(|p| p.canonical.as_str())
    }

    /// Returns the canonical stat of the first (longest) alias contained in `line`.
    pub fn find_contained(&self, line: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| !p.alias.is_empty() && line.contains(p.alias.as_str()))
            .map(|p| p.canonical.as_str())
    }

    /// Returns every alias registered for `canonical`, longest first.
    pub fn aliases_of<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |p| p.canonical == canonical)
            .map(|p| p.alias.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert("HP".to_string(), vec!["HP".to_string(), "体力".to_string()]);
        map.insert(
            "HP%".to_string(),
            vec!["HP%".to_string(), "HP(%)".to_string()],
        );
        map.insert(
            "クリティカル率".to_string(),
            vec!["クリティカル率".to_string(), "クリ率".to_string()],
        );
        map
    }

    #[test]
    fn test_sorted_longest_first() {
        let index = AliasIndex::new(&sample_map());
        let lengths: Vec<usize> = index.pairs().iter().map(|p| p.alias.chars().count()).collect();
        let mut sorted = lengths.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lengths, sorted);
        assert_eq!(index.len(), 6);
        assert_eq!(index.pairs()[0].alias, "クリティカル率");
    }

    #[test]
    fn test_longer_alias_wins_substring_search() {
        let index = AliasIndex::new(&sample_map());
        assert_eq!(index.find_contained("HP%12.8"), Some("HP%"));
        assert_eq!(index.find_contained("HP470"), Some("HP"));
        assert_eq!(index.find_contained("防御力 50"), None);
    }

    #[test]
    fn test_find_exact() {
        let index = AliasIndex::new(&sample_map());
        assert_eq!(index.find_exact("クリ率"), Some("クリティカル率"));
        assert_eq!(index.find_exact("HP(%)"), Some("HP%"));
        assert_eq!(index.find_exact("クリ"), None);
    }

    #[test]
    fn test_aliases_of() {
        let index = AliasIndex::new(&sample_map());
        let aliases: Vec<&str> = index.aliases_of("HP").collect();
        assert_eq!(aliases, vec!["HP", "体力"]);
    }
}
