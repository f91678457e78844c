//! Subsequence fuzzy matching shared by app and contact search.

const MATCH_SCORE: i64 = 10;
const PREFIX_BONUS: i64 = 50;

/// Scores `query` against `target`; `None` when `query` is not a
/// subsequence of `target`.
///
/// Both inputs are expected to be normalized already. Every matched
/// character earns a base score, a run of skipped characters between two
/// matches costs one point per skipped character, and the first query
/// character earns a bonus equal to the unscanned tail of the target. A
/// target that literally starts with the query gets a flat prefix bonus on
/// top.
pub fn score(query: &str, target: &str) -> Option<i64> {
    let query_chars: Vec<char> = query.chars().collect();
    let target_len = target.chars().count() as i64;

    let mut total = 0_i64;
    let mut next = 0_usize;
    let mut last_match: Option<usize> = None;

    for (index, target_char) in target.chars().enumerate() {
        let Some(&wanted) = query_chars.get(next) else {
            break;
        };
        if target_char != wanted {
            continue;
        }

        total += MATCH_SCORE;
        if let Some(last) = last_match {
            total -= (index - last - 1) as i64;
        }
        if next == 0 {
            total += target_len - index as i64;
        }

        last_match = Some(index);
        next += 1;
    }

    if next != query_chars.len() {
        return None;
    }

    if target.starts_with(query) {
        total += PREFIX_BONUS;
    }

    Some(total)
}

/// Matching candidates ordered best first. Non-matching candidates are
/// dropped; equal scores keep their input order.
pub fn rank<'a, T, F>(query: &str, candidates: &'a [T], key: F) -> Vec<&'a T>
where
    F: Fn(&T) -> &str,
{
    let mut scored: Vec<(i64, usize, &T)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            score(query, key(candidate)).map(|value| (value, index, candidate))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    scored
        .into_iter()
        .map(|(_, _, candidate)| candidate)
        .collect()
}

/// Owned variant of [`rank`].
pub fn rank_cloned<T, F>(query: &str, candidates: &[T], key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    rank(query, candidates, key).into_iter().cloned().collect()
}
