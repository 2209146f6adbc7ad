//! # Group Aggregation and Majority Vote
//!
//! Rebuilds the message from the classified cell stream. Every Pass repeats
//! the same digits in the same order, so the symbol at position `p` of each
//! Pass is one more vote for digit `p` of the message.
//!
//! ## State Machine:
//! - **Terminator**: position resets to 0, nothing is recorded
//! - **Digit**: appended to the group at the current position, position advances
//! - **Unassigned bin** (alphabets wider than 11 bins only): position advances, no vote
//!
//! ## Trailing Fragments:
//! The buffer nearly always ends in the middle of a Pass, and noise can hide a
//! terminator run so that a Pass spills past the real message length. Groups
//! at those positions are fragments, not message digits. The aggregator
//! estimates the message length as the most common run length between Pass
//! boundaries and drops every group at or beyond it. When the stream never
//! completes a delimited Pass, the highest-index group is dropped instead.

use crate::codec::quantizer::{Symbol, DIGIT_COUNT};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of aggregating one symbol stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Verdict {
    /// Recovered digits
    pub text: String,

    /// Positions that had no strict majority and fell back to their first entry
    pub ambiguous_positions: Vec<usize>,

    /// Number of Passes that ended in a terminator run
    pub passes_observed: usize,

    /// Groups discarded as trailing fragments
    pub dropped_groups: usize,
}

/// Incremental group builder; feed symbols with `push`, read the result with `finish`.
#[derive(Debug, Clone)]
pub struct GroupAggregator {
    terminator: Symbol,
    position: usize,
    groups: Vec<Vec<Symbol>>,
    /// Run length (cells between Pass boundaries) → number of Passes with that length
    pass_lengths: BTreeMap<usize, usize>,
}

impl GroupAggregator {
    pub fn new(terminator: Symbol) -> Self {
        Self {
            terminator,
            position: 0,
            groups: Vec::new(),
            pass_lengths: BTreeMap::new(),
        }
    }

    /// Apply one classified symbol.
    pub fn push(&mut self, symbol: Symbol) {
        if symbol == self.terminator {
            // Only the first terminator of a run closes a Pass; the rest are no-ops
            if self.position > 0 {
                *self.pass_lengths.entry(self.position).or_default() += 1;
            }
            self.position = 0;
            return;
        }

        if self.groups.len() <= self.position {
            self.groups.push(Vec::new());
        }

        if symbol < DIGIT_COUNT {
            self.groups[self.position].push(symbol);
        }

        self.position += 1;
    }

    /// Estimated number of digits in the message, or `None` if no Pass was delimited.
    ///
    /// Most frequent run length; ties go to the longer run.
    pub fn message_length(&self) -> Option<usize> {
        self.pass_lengths
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)))
            .map(|(&length, _)| length)
    }

    /// Resolve every kept group to a digit.
    pub fn finish(self) -> Verdict {
        let kept = match self.message_length() {
            Some(length) => length.min(self.groups.len()),
            None => self.groups.len().saturating_sub(1),
        };

        let mut verdict = Verdict {
            text: String::with_capacity(kept),
            ambiguous_positions: Vec::new(),
            passes_observed: self.pass_lengths.values().sum(),
            dropped_groups: self.groups.len() - kept,
        };

        for (position, group) in self.groups.iter().take(kept).enumerate() {
            match majority(group) {
                Some(Choice::Majority(digit)) => verdict.text.push(digit_char(digit)),
                Some(Choice::FirstEntry(digit)) => {
                    verdict.text.push(digit_char(digit));
                    verdict.ambiguous_positions.push(position);
                }
                // Every cell at this position landed in an unassigned bin
                None => verdict.ambiguous_positions.push(position),
            }
        }

        verdict
    }
}

/// Aggregate a whole symbol stream.
pub fn aggregate(symbols: &[Symbol], terminator: Symbol) -> Verdict {
    let mut aggregator = GroupAggregator::new(terminator);
    for &symbol in symbols {
        aggregator.push(symbol);
    }
    aggregator.finish()
}

enum Choice {
    Majority(Symbol),
    FirstEntry(Symbol),
}

/// Digit held by strictly more than half of the group, else the group's first entry.
fn majority(group: &[Symbol]) -> Option<Choice> {
    let first = *group.first()?;

    let mut counts = [0usize; DIGIT_COUNT as usize];
    for &digit in group {
        counts[digit as usize] += 1;
    }

    let winner = counts
        .iter()
        .position(|&count| count * 2 > group.len())
        .map(|digit| Choice::Majority(digit as Symbol));

    Some(winner.unwrap_or(Choice::FirstEntry(first)))
}

fn digit_char(digit: Symbol) -> char {
    char::from(b'0' + digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Symbol = 10;

    fn passes(message: &[Symbol], count: usize) -> Vec<Symbol> {
        let mut stream = Vec::new();
        for _ in 0..count {
            stream.extend_from_slice(message);
            stream.extend_from_slice(&[T, T]);
        }
        stream
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(aggregate(&[], T).text, "");
        assert_eq!(GroupAggregator::new(T).finish(), Verdict::default());
    }

    #[test]
    fn test_clean_passes_recover_message() {
        let mut stream = passes(&[0, 7], 5);
        // Interrupted sixth Pass
        stream.push(0);
        assert_eq!(aggregate(&stream, T).text, "07");
    }

    #[test]
    fn test_stream_ending_on_full_group() {
        let mut stream = passes(&[0, 7], 3);
        stream.extend_from_slice(&[0, 7]);
        assert_eq!(aggregate(&stream, T).text, "07");
    }

    #[test]
    fn test_zero_tail_fragment_is_dropped() {
        let mut stream = passes(&[4, 2], 4);
        // Buffer cut between the digits and the terminators, silent tail classified as 5
        stream.extend_from_slice(&[4, 2, 5]);

        let mut aggregator = GroupAggregator::new(T);
        stream.iter().for_each(|&s| aggregator.push(s));
        let verdict = aggregator.finish();

        assert_eq!(verdict.text, "42");
        assert_eq!(verdict.dropped_groups, 1);
        assert_eq!(verdict.passes_observed, 4);
    }

    #[test]
    fn test_repeated_terminators_are_idempotent() {
        let stream = [1, 2, 3, T, T, T, T, T, 1, 2, 3, T, 1];
        assert_eq!(aggregate(&stream, T).text, "123");
    }

    #[test]
    fn test_majority_corrects_minority_errors() {
        let stream = [
            3, 1, T, T,
            3, 1, T, T,
            8, 1, T, T, // position 0 corrupted
            3, 6, T, T, // position 1 corrupted
            3, 1, T, T,
        ];
        assert_eq!(aggregate(&stream, T).text, "31");
    }

    #[test]
    fn test_tie_falls_back_to_first_entry() {
        let stream = [4, 9, T, 6, 9, T, 6, 9, T, 4, 9, T];
        let mut aggregator = GroupAggregator::new(T);
        stream.iter().for_each(|&s| aggregator.push(s));
        let verdict = aggregator.finish();

        assert_eq!(verdict.text, "49");
        assert_eq!(verdict.ambiguous_positions, vec![0]);
    }

    #[test]
    fn test_lost_terminator_run_does_not_extend_message() {
        // The terminators after the second Pass were corrupted into digits
        let stream = [
            5, 5, 1, T, T,
            5, 5, 1, 2, 2,
            5, 5, 1, T, T,
            5, 5, 1, T, T,
            5, 5, 1, T, T,
        ];
        assert_eq!(aggregate(&stream, T).text, "551");
    }

    #[test]
    fn test_no_delimited_pass_drops_highest_group() {
        // Long message, buffer ended before the first terminator run
        let stream = [1, 2, 3, 4, 5];
        assert_eq!(aggregate(&stream, T).text, "1234");
    }

    #[test]
    fn test_unassigned_bins_keep_alignment() {
        // 13-bin alphabet: 10 and 11 are unassigned, 12 terminates
        let terminator = 12;
        let stream = [
            1, 2, 3, terminator,
            1, 11, 3, terminator,
            1, 2, 3, terminator,
        ];
        assert_eq!(aggregate(&stream, terminator).text, "123");
    }

    #[test]
    fn test_message_length_prefers_common_run() {
        let mut aggregator = GroupAggregator::new(T);
        for &s in &[1, 2, 3, T, 1, T, 1, 2, 3, T, 1, 2, 3, T] {
            aggregator.push(s);
        }
        assert_eq!(aggregator.message_length(), Some(3));
    }
}
