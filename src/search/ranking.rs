use crate::data::SearchHit;

/// Orders hits for display: name prefix matches, then name substring
/// matches, then description matches, then the rest. Order within a tier is
/// preserved.
pub fn rank(query: &str, mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    hits.sort_by_key(|hit| tier(&needle, hit));
    hits
}

fn tier(needle: &str, hit: &SearchHit) -> u8 {
    let name = hit.name.to_lowercase();
    if name.starts_with(needle) {
        0
    } else if name.contains(needle) {
        1
    } else if hit.description.to_lowercase().contains(needle) {
        2
    } else {
        3
    }
}
