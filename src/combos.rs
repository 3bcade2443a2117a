//! Arm-configuration generators for sweeps.
//!
//! Position matters to index-based tie-breaking and to the round-robin
//! policies, so a sweep usually runs every ordering of each base
//! configuration.

use crate::arm::ArmConfig;
use crate::error::{Result, SimError};

/// Every ordering of `values`, without repeats, in lexicographic index order.
///
/// Equal values are compared bitwise; `[0.9, 0.9, 0.8]` yields 3 orderings,
/// not 6.
pub fn permutations(values: &[f64]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = Vec::new();
    for order in index_permutations(values.len()) {
        let perm: Vec<f64> = order.iter().map(|&i| values[i]).collect();
        if !out.iter().any(|p| same_bits(p, &perm)) {
            out.push(perm);
        }
    }
    out
}

/// Every ordering of each base configuration, with variances (for Normal
/// arms) permuted alongside their means.
pub fn expand(bases: &[ArmConfig]) -> Vec<ArmConfig> {
    let mut out: Vec<ArmConfig> = Vec::new();
    for base in bases {
        for order in index_permutations(base.means().len()) {
            let pick = |xs: &[f64]| -> Vec<f64> { order.iter().map(|&i| xs[i]).collect() };
            let cfg = match base {
                ArmConfig::Bernoulli { means } => ArmConfig::bernoulli(pick(means)),
                ArmConfig::Normal { means, variances } => {
                    ArmConfig::normal(pick(means), pick(variances))
                }
            };
            if !out.contains(&cfg) {
                out.push(cfg);
            }
        }
    }
    out
}

/// Problems built from a pool of single-arm means.
///
/// Yields every ordered pair of distinct values, then every ordering of
/// three values in which exactly two coincide. All values must lie in
/// `(0, 1]`.
pub fn from_individual_means(values: &[f64]) -> Result<Vec<Vec<f64>>> {
    if let Some(&bad) = values.iter().find(|&&v| !(v > 0.0 && v <= 1.0)) {
        return Err(SimError::invalid(format!("arm mean {bad} must lie in (0, 1]")));
    }
    let mut pool: Vec<f64> = Vec::new();
    for &v in values {
        if !pool.iter().any(|p| p.to_bits() == v.to_bits()) {
            pool.push(v);
        }
    }

    let mut out: Vec<Vec<f64>> = Vec::new();
    let mut push_all = |perms: Vec<Vec<f64>>| {
        for p in perms {
            if !out.iter().any(|q| same_bits(q, &p)) {
                out.push(p);
            }
        }
    };
    for i in 0..pool.len() {
        for j in i + 1..pool.len() {
            push_all(permutations(&[pool[i], pool[j]]));
        }
    }
    for (i, &doubled) in pool.iter().enumerate() {
        for (j, &single) in pool.iter().enumerate() {
            if i != j {
                push_all(permutations(&[doubled, doubled, single]));
            }
        }
    }
    Ok(out)
}

/// The base configurations of the reference sweep.
pub fn reference_bases() -> Vec<ArmConfig> {
    [
        &[0.9, 0.8, 0.7][..],
        &[0.9, 0.85, 0.8],
        &[0.9, 0.9, 0.8],
        &[0.9, 0.85, 0.85],
        &[0.9, 0.895, 0.8],
        &[0.9, 0.895, 0.89],
        &[0.9, 0.6, 0.3],
        &[0.9, 0.8],
        &[0.9, 0.6],
        &[0.9, 0.3],
        &[0.9, 0.7],
        &[0.9, 0.85],
        &[0.9, 0.89],
        &[0.9, 0.895],
        &[0.5, 0.495],
        &[0.5, 0.49],
        &[0.5, 0.48],
    ]
    .into_iter()
    .map(|means| ArmConfig::bernoulli(means.to_vec()))
    .collect()
}

fn same_bits(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

/// All orderings of `0..n` in lexicographic order.
fn index_permutations(n: usize) -> Vec<Vec<usize>> {
    fn go(prefix: &mut Vec<usize>, used: &mut [bool], out: &mut Vec<Vec<usize>>) {
        if prefix.len() == used.len() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..used.len() {
            if !used[i] {
                used[i] = true;
                prefix.push(i);
                go(prefix, used, out);
                prefix.pop();
                used[i] = false;
            }
        }
    }
    let mut out = Vec::new();
    go(&mut Vec::with_capacity(n), &mut vec![false; n], &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutations_skip_duplicate_orderings() {
        assert_eq!(
            permutations(&[0.9, 0.8, 0.7]),
            vec![
                vec![0.9, 0.8, 0.7],
                vec![0.9, 0.7, 0.8],
                vec![0.8, 0.9, 0.7],
                vec![0.8, 0.7, 0.9],
                vec![0.7, 0.9, 0.8],
                vec![0.7, 0.8, 0.9],
            ]
        );
        assert_eq!(permutations(&[0.9, 0.9, 0.8]).len(), 3);
    }

    #[test]
    fn expand_keeps_variances_with_their_means() {
        let cfgs = expand(&[ArmConfig::normal(vec![1.0, 2.0], vec![0.1, 0.2])]);
        assert_eq!(
            cfgs,
            vec![
                ArmConfig::normal(vec![1.0, 2.0], vec![0.1, 0.2]),
                ArmConfig::normal(vec![2.0, 1.0], vec![0.2, 0.1]),
            ]
        );
    }

    #[test]
    fn individual_means_pairs_and_doubled_triples() {
        let combos = from_individual_means(&[0.9, 0.8]).unwrap();
        // 2 ordered pairs + 3 orderings each of [.9,.9,.8] and [.8,.8,.9].
        assert_eq!(combos.len(), 8);
        assert!(combos.contains(&vec![0.8, 0.9]));
        assert!(combos.contains(&vec![0.9, 0.8, 0.9]));
        assert!(!combos.iter().any(|c| c.len() == 3 && c[0] == c[1] && c[1] == c[2]));

        let three = from_individual_means(&[0.9, 0.8, 0.7]).unwrap();
        // 6 ordered pairs, 6 doubled/single choices x 3 orderings.
        assert_eq!(three.len(), 6 + 18);
        assert!(!three.contains(&vec![0.9, 0.8, 0.7]));
    }

    #[test]
    fn individual_means_must_be_probabilities() {
        assert!(from_individual_means(&[0.5, 1.2]).is_err());
        assert!(from_individual_means(&[0.0, 0.5]).is_err());
    }

    #[test]
    fn reference_bases_expand_to_unique_names() {
        let all = expand(&reference_bases());
        let mut names: Vec<String> = all.iter().map(ArmConfig::name).collect();
        let n = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), n);
        for cfg in &all {
            cfg.validate().unwrap();
        }
    }
}
