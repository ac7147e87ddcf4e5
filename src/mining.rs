//! Level-wise frequent itemset mining (Apriori) over a basket matrix

use std::collections::HashSet;

use log::debug;

use crate::basket::BasketMatrix;
use crate::config::{validate_min_support, DEFAULT_MIN_SUPPORT};
use crate::error::DashboardError;

/// A set of item descriptions together with the fraction of invoices holding all of them
#[derive(Debug, Clone, PartialEq)]
pub struct Itemset {
    /// Item descriptions, sorted ascending
    pub items: Vec<String>,
    /// Fraction of invoices containing every item (0.0 to 1.0)
    pub support: f64,
}

impl Itemset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Candidate of the current level: item columns and the invoices containing all of them
struct Candidate {
    items: Vec<usize>,
    tids: Vec<usize>,
}

/// Apriori frequent itemset miner.
///
/// # Algorithm
///
/// 1. Keep every item whose support reaches `min_support`
/// 2. Join frequent k-itemsets sharing their first k-1 items into (k+1)-candidates
/// 3. Drop candidates with an infrequent k-subset, then those below `min_support`
/// 4. Repeat until a level comes out empty
///
/// Support is counted on the vertical layout: each candidate carries the sorted
/// invoice rows it occurs in, obtained by intersecting its two parents.
#[derive(Debug, Clone)]
pub struct Apriori {
    min_support: f64,
}

impl Apriori {
    /// Miner with the default minimum support of 0.03
    pub fn new() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
        }
    }

    pub fn with_min_support(mut self, min_support: f64) -> Self {
        self.min_support = min_support;
        self
    }

    /// Mine every itemset of any size whose support is at least `min_support`
    ///
    /// Output is grouped by size; callers should not rely on any further order.
    /// An empty matrix, or one where nothing is frequent, yields an empty vector.
    pub fn fit(&self, matrix: &BasketMatrix) -> Result<Vec<Itemset>, DashboardError> {
        validate_min_support(self.min_support)?;

        if matrix.is_empty() {
            return Ok(Vec::new());
        }
        let n_invoices = matrix.n_invoices();

        let mut level: Vec<Candidate> = matrix
            .item_tidsets()
            .into_iter()
            .enumerate()
            .map(|(item, tids)| Candidate {
                items: vec![item],
                tids,
            })
            .filter(|candidate| self.is_frequent(candidate.tids.len(), n_invoices))
            .collect();

        let labels = matrix.items();
        let mut frequent = Vec::new();
        let mut size = 1;

        while !level.is_empty() {
            debug!("Level {}: {} frequent itemsets", size, level.len());
            let next = self.next_level(&level, n_invoices);

            frequent.extend(level.into_iter().map(|candidate| Itemset {
                items: candidate.items.iter().map(|&i| labels[i].clone()).collect(),
                support: support(candidate.tids.len(), n_invoices),
            }));

            level = next;
            size += 1;
        }

        Ok(frequent)
    }

    fn is_frequent(&self, count: usize, n_invoices: usize) -> bool {
        support(count, n_invoices) >= self.min_support
    }

    /// Generate, prune and count the candidates one item larger than `level`.
    ///
    /// `level` must be sorted lexicographically by item indices, and the
    /// output keeps that order.
    fn next_level(&self, level: &[Candidate], n_invoices: usize) -> Vec<Candidate> {
        let known: HashSet<&[usize]> = level.iter().map(|c| c.items.as_slice()).collect();
        let mut next = Vec::new();

        for (i, left) in level.iter().enumerate() {
            let prefix = &left.items[..left.items.len() - 1];

            for right in &level[i + 1..] {
                if &right.items[..right.items.len() - 1] != prefix {
                    break;
                }

                let mut items = left.items.clone();
                items.push(right.items[right.items.len() - 1]);

                if has_infrequent_subset(&items, &known) {
                    continue;
                }

                let tids = intersect(&left.tids, &right.tids);
                if self.is_frequent(tids.len(), n_invoices) {
                    next.push(Candidate { items, tids });
                }
            }
        }

        next
    }
}

impl Default for Apriori {
    fn default() -> Self {
        Self::new()
    }
}

fn support(count: usize, n_invoices: usize) -> f64 {
    count as f64 / n_invoices as f64
}

/// The two subsets dropping one of the last two items are the join parents
/// and are known to be frequent, so only the others are checked.
fn has_infrequent_subset(items: &[usize], known: &HashSet<&[usize]>) -> bool {
    let mut subset = Vec::with_capacity(items.len() - 1);

    (0..items.len().saturating_sub(2)).any(|skip| {
        subset.clear();
        subset.extend(
            items
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &item)| item),
        );
        !known.contains(subset.as_slice())
    })
}

fn intersect(left: &[usize], right: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }

    out
}
