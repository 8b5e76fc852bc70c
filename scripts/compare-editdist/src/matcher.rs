use std::collections::{HashMap, HashSet};
use std::hash::Hash;

// Second sequences at least this long get the popular-element heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A run of identical tokens: `a[a_start..a_start + size] == b[b_start..b_start + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// Half-open ranges `a[a_start..a_end]` and `b[b_start..b_end]` classified by `tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: Tag,
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
}

/// Ratcliff/Obershelp block matcher between two token sequences.
///
/// Finds the longest contiguous matching block, then recurses on the parts
/// left and right of it. Elements of `b` that are very frequent in long
/// sequences are kept out of the index and only picked up when extending an
/// existing match.
pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            let popular: HashSet<&T> = b2j
                .iter()
                .filter(|(_, idxs)| idxs.len() > ntest)
                .map(|(elt, _)| *elt)
                .collect();
            for elt in popular {
                b2j.remove(elt);
            }
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    /// A zero-size block means no match.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending with a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(idxs) = self.b2j.get(&a[i]) {
                for &j in idxs {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
                    let k = prev + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Popular elements never appear in b2j; grow the block across them.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        Block { a_start: best_i, b_start: best_j, size: best_size }
    }

    /// Non-overlapping matching blocks in increasing order, adjacent blocks
    /// merged, terminated by the sentinel `(len_a, len_b, 0)`.
    pub fn matching_blocks(&self) -> Vec<Block> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            let (i, j, k) = (block.a_start, block.b_start, block.size);
            blocks.push(block);
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        blocks.sort();

        let mut collapsed = Vec::with_capacity(blocks.len() + 1);
        let mut current = Block { a_start: 0, b_start: 0, size: 0 };
        for block in blocks {
            if current.a_start + current.size == block.a_start
                && current.b_start + current.size == block.b_start
            {
                current.size += block.size;
            } else {
                if current.size > 0 {
                    collapsed.push(current);
                }
                current = block;
            }
        }
        if current.size > 0 {
            collapsed.push(current);
        }
        collapsed.push(Block { a_start: la, b_start: lb, size: 0 });
        collapsed
    }

    /// Edit script turning `a` into `b`, covering both sequences in order.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut ops = Vec::new();
        let (mut i, mut j) = (0, 0);
        for block in self.matching_blocks() {
            let (ai, bj) = (block.a_start, block.b_start);
            let tag = if i < ai && j < bj {
                Some(Tag::Replace)
            } else if i < ai {
                Some(Tag::Delete)
            } else if j < bj {
                Some(Tag::Insert)
            } else {
                None
            };
            if let Some(tag) = tag {
                ops.push(Opcode { tag, a_start: i, a_end: ai, b_start: j, b_end: bj });
            }
            i = ai + block.size;
            j = bj + block.size;
            if block.size > 0 {
                ops.push(Opcode { tag: Tag::Equal, a_start: ai, a_end: i, b_start: bj, b_end: j });
            }
        }
        ops
    }

    /// Similarity in [0, 1]: twice the matched length over the total length.
    pub fn ratio(&self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|b| b.size).sum();
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * matches as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn longest_match_prefers_earliest_block() {
        let a = chars(" abcd");
        let b = chars("abcd abcd");
        let m = SequenceMatcher::new(&a, &b);
        assert_eq!(m.find_longest_match(0, 5, 0, 9), Block { a_start: 0, b_start: 4, size: 5 });
    }

    #[test]
    fn matching_blocks_end_with_sentinel() {
        let a = chars("abxcd");
        let b = chars("abcd");
        let m = SequenceMatcher::new(&a, &b);
        assert_eq!(
            m.matching_blocks(),
            vec![
                Block { a_start: 0, b_start: 0, size: 2 },
                Block { a_start: 3, b_start: 2, size: 2 },
                Block { a_start: 5, b_start: 4, size: 0 },
            ]
        );
    }

    #[test]
    fn opcodes_cover_both_sequences() {
        let a = chars("qabxcd");
        let b = chars("abycdf");
        let m = SequenceMatcher::new(&a, &b);
        let tags: Vec<Tag> = m.opcodes().iter().map(|op| op.tag).collect();
        assert_eq!(
            tags,
            vec![Tag::Delete, Tag::Equal, Tag::Replace, Tag::Equal, Tag::Insert]
        );
        let ops = m.opcodes();
        assert_eq!(ops.first().map(|op| (op.a_start, op.b_start)), Some((0, 0)));
        assert_eq!(ops.last().map(|op| (op.a_end, op.b_end)), Some((6, 6)));
    }

    #[test]
    fn ratio_matches_known_values() {
        let a = chars("abcd");
        let b = chars("bcde");
        assert!((SequenceMatcher::new(&a, &b).ratio() - 0.75).abs() < 1e-12);

        let empty: Vec<char> = Vec::new();
        assert_eq!(SequenceMatcher::new(&empty, &empty).ratio(), 1.0);
        assert_eq!(SequenceMatcher::new(&a, &empty).ratio(), 0.0);
    }

    #[test]
    fn popular_elements_are_matched_by_extension() {
        // 300 copies of 'x' make 'x' popular in b; the run is still matched.
        let a: Vec<char> = std::iter::repeat('x').take(300).collect();
        let b = a.clone();
        let m = SequenceMatcher::new(&a, &b);
        assert!(!m.b2j.contains_key(&'x'));
        assert_eq!(m.ratio(), 1.0);
    }
}
