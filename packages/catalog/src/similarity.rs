//! Ratcliff/Obershelp string similarity.
//!
//! Recursively takes the longest common block, then matches the pieces on
//! either side of it. The ratio is twice the number of matching characters
//! divided by the combined length.

/// Similarity of `a` and `b` in `0.0..=1.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Counts characters covered by recursively matched longest common blocks.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Returns `(start_a, start_b, len)` of the longest common substring,
/// preferring the earliest start in `a`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0_usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        let mut cur = vec![0_usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let run = prev[j] + 1;
                cur[j + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        prev = cur;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_one() {
        assert!(close(ratio("colombo", "colombo"), 1.0));
        assert!(close(ratio("", ""), 1.0));
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert!(close(ratio("abc", "xyz"), 0.0));
    }

    #[test]
    fn counts_shared_blocks() {
        // "bcd" shared: 2 * 3 / 8
        assert!(close(ratio("abcd", "bcde"), 0.75));
        // one dropped letter out of seven
        assert!(close(ratio("colmbo", "colombo"), 12.0 / 13.0));
    }

    #[test]
    fn ocr_damage_stays_above_typical_threshold() {
        assert!(ratio("trincomalcc", "trincomalee") > 0.8);
        assert!(ratio("xyzplace", "colombo") < 0.5);
    }
}
