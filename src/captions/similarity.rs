use std::collections::HashMap;

/// Similarity ratio in `[0, 1]` between two strings, compared per `char`.
///
/// The ratio is `2 * M / (|a| + |b|)`, where `M` counts the characters inside the matching
/// blocks found by repeatedly taking the longest common substring and recursing on the pieces
/// to its left and right (the `difflib` `SequenceMatcher` ratio, without its junk heuristics).
/// Comparing against an empty string yields `0.0`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let matched = matching_chars(&a, &b);

    (2 * matched) as f64 / (a.len() + b.len()) as f64
}

/// Total size of the longest-first matching blocks of `a` and `b`.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, len) = longest_block(a, &positions, (alo, ahi), (blo, bhi));
        if len == 0 {
            continue;
        }
        total += len;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + len < ahi && j + len < bhi {
            pending.push((i + len, ahi, j + len, bhi));
        }
    }
    total
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
///
/// Ties go to the earliest start in `a`, then in `b`.
fn longest_block(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    // Run length ending at (i - 1, j) for each j, from the previous row.
    let mut run_at: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next = HashMap::new();
        for &j in positions.get(c).map(Vec::as_slice).unwrap_or_default() {
            if j < blo {
                continue;
            }
            if j >= bhi {
                break;
            }
            let len = j
                .checked_sub(1)
                .and_then(|prev| run_at.get(&prev))
                .copied()
                .unwrap_or(0)
                + 1;
            next.insert(j, len);
            if len > best_len {
                best_i = i + 1 - len;
                best_j = j + 1 - len;
                best_len = len;
            }
        }
        run_at = next;
    }
    (best_i, best_j, best_len)
}

#[cfg(test)]
#[path = "../../tests/unit/captions/similarity.rs"]
mod tests;
