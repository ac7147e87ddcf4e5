//! Association rules derived from a frequent itemset collection

use std::collections::HashMap;

use crate::config::validate_min_lift;
use crate::error::DashboardError;
use crate::mining::Itemset;

/// Association rule: antecedents => consequents
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    /// Items on the left side, sorted
    pub antecedents: Vec<String>,
    /// Items on the right side, sorted and disjoint from the antecedents
    pub consequents: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support: P(antecedents ∪ consequents)
    pub support: f64,
    /// Confidence: P(consequents | antecedents) = support / P(antecedents)
    pub confidence: f64,
    /// Lift: confidence / P(consequents)
    pub lift: f64,
    /// Leverage: support - P(antecedents) * P(consequents)
    pub leverage: f64,
    /// Conviction: (1 - P(consequents)) / (1 - confidence), infinite for exact rules
    pub conviction: f64,
}

/// Generate every rule with lift at least `min_lift`, sorted by lift descending.
///
/// Each itemset of two or more items is split into every non-empty proper
/// antecedent and its complement. Both sides must themselves be in
/// `itemsets`; a split whose side was pruned from the collection yields no
/// rule. Ties in lift keep enumeration order.
///
/// # Errors
/// * `InvalidThreshold` if `min_lift` is negative or not finite
/// * `DivisionByZero` if an antecedent in the collection has zero support
pub fn generate_rules(
    itemsets: &[Itemset],
    min_lift: f64,
) -> Result<Vec<AssociationRule>, DashboardError> {
    validate_min_lift(min_lift)?;

    let supports: HashMap<&[String], f64> = itemsets
        .iter()
        .map(|set| (set.items.as_slice(), set.support))
        .collect();

    let mut rules = Vec::new();

    for itemset in itemsets.iter().filter(|set| set.len() >= 2) {
        let n = itemset.len();

        // Masks 1..2^n-1 are exactly the non-empty proper subsets
        for mask in 1..(1usize << n) - 1 {
            let (antecedents, consequents) = split(&itemset.items, mask);

            let (Some(&antecedent_support), Some(&consequent_support)) = (
                supports.get(antecedents.as_slice()),
                supports.get(consequents.as_slice()),
            ) else {
                continue;
            };

            if antecedent_support == 0.0 {
                return Err(DashboardError::DivisionByZero { antecedent: antecedents });
            }

            let confidence = itemset.support / antecedent_support;
            let lift = confidence / consequent_support;
            if lift < min_lift {
                continue;
            }

            let conviction = if confidence >= 1.0 {
                f64::INFINITY
            } else {
                (1.0 - consequent_support) / (1.0 - confidence)
            };

            rules.push(AssociationRule {
                antecedents,
                consequents,
                antecedent_support,
                consequent_support,
                support: itemset.support,
                confidence,
                lift,
                leverage: itemset.support - antecedent_support * consequent_support,
                conviction,
            });
        }
    }

    // sort_by is stable, so equal lifts stay in enumeration order
    rules.sort_by(|a, b| b.lift.total_cmp(&a.lift));

    Ok(rules)
}

/// Split sorted `items` by bit mask into (selected, remaining), both still sorted
fn split(items: &[String], mask: usize) -> (Vec<String>, Vec<String>) {
    let mut selected = Vec::new();
    let mut remaining = Vec::new();

    for (i, item) in items.iter().enumerate() {
        if mask & (1 << i) != 0 {
            selected.push(item.clone());
        } else {
            remaining.push(item.clone());
        }
    }

    (selected, remaining)
}
