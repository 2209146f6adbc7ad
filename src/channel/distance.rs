//! Edit distance between the sent and the recovered text.

/// Levenshtein distance (insertions, deletions, substitutions all cost 1).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row of the DP table
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, &ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, &cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }

    row[b.len()]
}

/// Distance relative to the length of the sent text; 0.0 is a perfect copy.
pub fn error_rate(sent: &str, received: &str) -> f64 {
    let length = sent.chars().count();
    if length == 0 {
        return if received.is_empty() { 0.0 } else { 1.0 };
    }
    levenshtein(sent, received) as f64 / length as f64
}
