use anyhow::{anyhow, bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::cmp::Ordering;

use crate::TokenizedLine;
use crate::matcher::SequenceMatcher;

/// Ratcliff/Obershelp similarity between two token sequences.
pub fn ratio(a: &[String], b: &[String]) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

/// Mean similarity ratio over all hypothesis/reference pairs.
pub fn average_ratio(pairs: &[(Vec<String>, Vec<String>)]) -> Result<f64> {
    if pairs.is_empty() {
        bail!("no hypothesis/reference line pairs to compare");
    }
    let total: f64 = pairs.iter().map(|(h, r)| ratio(h, r)).sum();
    Ok(total / pairs.len() as f64)
}

/// Unit-cost Levenshtein distance between token sequences.
pub fn edit_distance(a: &[String], b: &[String]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, tok_a) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, tok_b) in b.iter().enumerate() {
            let cost = usize::from(tok_a != tok_b);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit distance from `reference` to `hyp` divided by the reference length.
/// `None` for an empty reference.
pub fn normalized_distance(reference: &[String], hyp: &[String]) -> Option<f64> {
    if reference.is_empty() {
        return None;
    }
    Some(edit_distance(reference, hyp) as f64 / reference.len() as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLine {
    pub distance: f64,
    pub hyp: String,
    pub reference: String,
    pub src: String,
    /// 1-based position in the aligned inputs.
    pub index: usize,
}

impl ScoredLine {
    fn compare(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.hyp.cmp(&other.hyp))
            .then_with(|| self.reference.cmp(&other.reference))
            .then_with(|| self.src.cmp(&other.src))
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Scores every aligned line and returns them sorted, closest match first.
pub fn score_lines(lines: &[TokenizedLine]) -> Result<Vec<ScoredLine>> {
    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?,
    );
    pb.set_message("scoring");

    let mut scored = Vec::with_capacity(lines.len());
    for (line, index) in lines.iter().zip(1..) {
        let distance = normalized_distance(&line.reference, &line.hyp)
            .ok_or_else(|| anyhow!("reference line {index} is empty, cannot normalize its edit distance"))?;
        scored.push(ScoredLine {
            distance,
            hyp: line.hyp.join(" "),
            reference: line.reference.join(" "),
            src: line.src.join(" "),
            index,
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    scored.sort_by(ScoredLine::compare);
    debug!("scored {} lines", scored.len());
    Ok(scored)
}

/// Splits sorted lines into the `how_many` best and `how_many` worst.
pub fn best_and_worst(scored: &[ScoredLine], how_many: usize) -> (&[ScoredLine], &[ScoredLine]) {
    let total = scored.len();
    if how_many > total {
        warn!("--how_many {how_many} exceeds the {total} scored lines; both groups hold every line");
    } else if how_many.saturating_mul(2) > total {
        warn!("--how_many {how_many} is more than half of {total} lines; best and worst overlap");
    }
    let n = how_many.min(total);
    (&scored[..n], &scored[total - n..])
}
