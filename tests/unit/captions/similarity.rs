use super::*;

#[test]
fn identical_strings_score_one() {
    assert_eq!(similarity_ratio("hello", "hello"), 1.0);
    assert_eq!(similarity_ratio("ずんだもん", "ずんだもん"), 1.0);
}

#[test]
fn empty_input_scores_zero() {
    assert_eq!(similarity_ratio("", "hello"), 0.0);
    assert_eq!(similarity_ratio("hello", ""), 0.0);
    assert_eq!(similarity_ratio("", ""), 0.0);
}

#[test]
fn disjoint_strings_score_zero() {
    assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
}

#[test]
fn ratio_counts_matching_chars() {
    // 1 shared char over 1 + 9 chars.
    assert_eq!(similarity_ratio("a", "abcdefghi"), 0.2);
    // "world" vs "word": w,o,r,d match.
    assert!((similarity_ratio("world", "word") - 8.0 / 9.0).abs() < 1e-12);
}

#[test]
fn ratio_is_symmetric() {
    let pairs = [
        ("APIは窓口なのだ", "APIって窓口なの？"),
        ("kitten", "sitting"),
        ("hello world", "world hello"),
    ];
    for (a, b) in pairs {
        assert_eq!(similarity_ratio(a, b), similarity_ratio(b, a), "{a} / {b}");
    }
}

#[test]
fn multibyte_text_is_compared_per_char() {
    // 3 of 5 chars shared on each side.
    let r = similarity_ratio("こんにちは", "こんばんは");
    assert!((r - 0.6).abs() < 1e-12, "got {r}");
}

#[test]
fn longest_block_first_not_longest_subsequence() {
    // The LCS has 4 chars, but taking "cb" first leaves only unmatched pieces.
    let r = similarity_ratio("cbcbcba", "babbacb");
    assert!((r - 4.0 / 14.0).abs() < 1e-12, "got {r}");
    assert!((similarity_ratio("hello world", "world hello") - 10.0 / 22.0).abs() < 1e-12);
}

#[test]
fn blocks_are_found_on_both_sides_of_the_longest() {
    // "API" left of "窓口なの", nothing right of it.
    let r = similarity_ratio("APIは窓口なのだ", "APIって窓口なの？");
    assert!((r - 14.0 / 19.0).abs() < 1e-12, "got {r}");
    assert!((similarity_ratio("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-12);
}
