use std::fmt;

use crate::matcher::{SequenceMatcher, Tag};

/// One span-level edit between an old and a new token sequence, with the
/// affected tokens joined by single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp {
    Equal(String),
    Replace { old: String, new: String },
    Delete(String),
    Insert(String),
}

impl fmt::Display for DiffOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffOp::Equal(text) => write!(f, "= {text}"),
            DiffOp::Replace { old, new } => write!(f, "~ {old} -> {new}"),
            DiffOp::Delete(text) => write!(f, "- {text}"),
            DiffOp::Insert(text) => write!(f, "+ {text}"),
        }
    }
}

/// Per-kind counts over a batch of diff operations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    pub equal: usize,
    pub replace: usize,
    pub delete: usize,
    pub insert: usize,
}

impl DiffSummary {
    pub fn add(&mut self, op: &DiffOp) {
        match op {
            DiffOp::Equal(_) => self.equal += 1,
            DiffOp::Replace { .. } => self.replace += 1,
            DiffOp::Delete(_) => self.delete += 1,
            DiffOp::Insert(_) => self.insert += 1,
        }
    }
}

fn join(tokens: &[String]) -> String {
    tokens.join(" ")
}

/// Lazily yields the diff operations turning `old` into `new`.
pub fn generate_diff<'a>(
    old: &'a [String],
    new: &'a [String],
) -> impl Iterator<Item = DiffOp> + 'a {
    let opcodes = SequenceMatcher::new(old, new).opcodes();
    opcodes.into_iter().map(move |op| {
        let old_span = &old[op.a_start..op.a_end];
        let new_span = &new[op.b_start..op.b_end];
        match op.tag {
            Tag::Replace => DiffOp::Replace { old: join(old_span), new: join(new_span) },
            Tag::Delete => DiffOp::Delete(join(old_span)),
            Tag::Insert => DiffOp::Insert(join(new_span)),
            Tag::Equal => DiffOp::Equal(join(old_span)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn new_text(op: &DiffOp) -> Option<&str> {
        match op {
            DiffOp::Equal(text) | DiffOp::Insert(text) => Some(text),
            DiffOp::Replace { new, .. } => Some(new),
            DiffOp::Delete(_) => None,
        }
    }

    #[test]
    fn identical_sequences_give_one_equal_op() {
        let t = words("the cat sat on the mat");
        let ops: Vec<DiffOp> = generate_diff(&t, &t).collect();
        assert_eq!(ops, vec![DiffOp::Equal("the cat sat on the mat".to_string())]);
    }

    #[test]
    fn classifies_each_gap() {
        let old = words("a b c d");
        let new = words("a x c d e");
        let ops: Vec<DiffOp> = generate_diff(&old, &new).collect();
        assert_eq!(
            ops,
            vec![
                DiffOp::Equal("a".into()),
                DiffOp::Replace { old: "b".into(), new: "x".into() },
                DiffOp::Equal("c d".into()),
                DiffOp::Insert("e".into()),
            ]
        );

        let ops: Vec<DiffOp> = generate_diff(&words("a b c"), &words("a c")).collect();
        assert_eq!(
            ops,
            vec![DiffOp::Equal("a".into()), DiffOp::Delete("b".into()), DiffOp::Equal("c".into())]
        );
    }

    #[test]
    fn new_sequence_is_rebuilt_from_ops() {
        let old = words("we went to the market yesterday morning");
        let new = words("they went to a market this morning too");
        let ops: Vec<DiffOp> = generate_diff(&old, &new).collect();
        let rebuilt: Vec<String> = ops
            .iter()
            .filter_map(new_text)
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect();
        assert_eq!(rebuilt, new);
    }

    #[test]
    fn display_marks_the_kind() {
        let op = DiffOp::Replace { old: "b".into(), new: "x".into() };
        assert_eq!(op.to_string(), "~ b -> x");
        assert_eq!(DiffOp::Delete("b".into()).to_string(), "- b");
    }

    #[test]
    fn summary_counts_kinds() {
        let mut summary = DiffSummary::default();
        for op in generate_diff(&words("a b c d"), &words("a x c d e")) {
            summary.add(&op);
        }
        assert_eq!(summary, DiffSummary { equal: 2, replace: 1, delete: 0, insert: 1 });
    }
}
