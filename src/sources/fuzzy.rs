/// Fuzzy/subsequence match: return the character positions in `title`
/// that match `query`, or `None` if not matched.
///
/// Whitespace in the query is ignored, so `"synth drive"` matches
/// `"Synthwave Dreams Midnight Drive"`.
pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
    let mut positions: Vec<usize> = Vec::new();
    let mut title_iter = title.chars().enumerate();

    for qc in query.chars().filter(|c| !c.is_whitespace()) {
        let qc_low = qc.to_lowercase().next().unwrap_or(qc);
        loop {
            match title_iter.next() {
                Some((ti, tc)) if tc.to_lowercase().next().unwrap_or(tc) == qc_low => {
                    positions.push(ti);
                    break;
                }
                Some(_) => continue,
                None => return None,
            }
        }
    }

    Some(positions)
}
