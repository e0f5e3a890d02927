use crate::stargazers::StarCounts;

/// The `k` most frequent entries, highest count first.
///
/// Equal counts keep the order in which the names were first counted. Returns
/// every entry when `k` exceeds the number of distinct names.
pub fn top_entries(counts: &StarCounts, k: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(&str, usize)> = counts.iter().collect();
    // Stable sort keeps first-seen order among ties
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(k)
        .map(|(name, count)| (name.to_string(), count))
        .collect()
}

/// Names of the `k` most frequent repositories.
pub fn select_top_k(counts: &StarCounts, k: usize) -> Vec<String> {
    top_entries(counts, k).into_iter().map(|(name, _)| name).collect()
}
