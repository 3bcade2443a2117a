//! Summaries over the iterations of an experiment.
//!
//! Pure functions of the checkpoint rows: the same input always yields the
//! same output, regardless of row order.

use std::collections::BTreeMap;

use crate::error::{Result, SimError};
use crate::experiment::CheckpointRecord;
use crate::utils::quantile_linear;

/// Means across iterations at one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateRow {
    pub timestep: u64,
    pub total_reward: f64,
    pub suboptimal_arm_count: f64,
    pub total_regret: f64,
    pub zeros_count: f64,
    pub ones_count: f64,
}

/// Value-at-Risk of total regret at one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarRow {
    pub timestep: u64,
    pub alpha: f64,
    /// The `(1 - alpha)`-quantile of total regret across iterations.
    pub value_at_risk: f64,
}

/// Mean as `first + sum(x - first) / n`.
///
/// Exact when every value is equal, which `sum / n` is not (ten copies of
/// `0.1` sum to `0.9999999999999999`).
fn mean_of(xs: impl IntoIterator<Item = f64>) -> f64 {
    let mut xs = xs.into_iter();
    let Some(first) = xs.next() else {
        return f64::NAN;
    };
    let mut n = 1.0;
    let mut offset = 0.0;
    for x in xs {
        offset += x - first;
        n += 1.0;
    }
    first + offset / n
}

fn by_timestep(rows: &[CheckpointRecord]) -> BTreeMap<u64, Vec<&CheckpointRecord>> {
    let mut groups: BTreeMap<u64, Vec<&CheckpointRecord>> = BTreeMap::new();
    for r in rows {
        groups.entry(r.timestep).or_default().push(r);
    }
    groups
}

/// Per-checkpoint means of the five counters, in ascending timestep order.
///
/// Rows are summed in iteration order so the result does not depend on how
/// the input happens to be ordered. Averaging copies of one record returns
/// that record's values unchanged.
pub fn aggregate(rows: &[CheckpointRecord]) -> Vec<AggregateRow> {
    by_timestep(rows)
        .into_iter()
        .map(|(timestep, mut group)| {
            group.sort_by_key(|r| r.iteration);
            let mean = |f: fn(&CheckpointRecord) -> f64| -> f64 {
                mean_of(group.iter().map(|r| f(*r)))
            };
            AggregateRow {
                timestep,
                total_reward: mean(|r| r.total_reward),
                suboptimal_arm_count: mean(|r| r.suboptimal_arm_count as f64),
                total_regret: mean(|r| r.total_regret),
                zeros_count: mean(|r| r.zeros_count as f64),
                ones_count: mean(|r| r.ones_count as f64),
            }
        })
        .collect()
}

/// Per-checkpoint `(1 - alpha)`-quantile of total regret, linearly
/// interpolated between order statistics.
pub fn value_at_risk(rows: &[CheckpointRecord], alpha: f64) -> Result<Vec<VarRow>> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(SimError::invalid(format!("alpha={alpha} must lie in (0, 1)")));
    }
    Ok(by_timestep(rows)
        .into_iter()
        .filter_map(|(timestep, group)| {
            let mut regrets: Vec<f64> = group.iter().map(|r| r.total_regret).collect();
            quantile_linear(&mut regrets, 1.0 - alpha).map(|value_at_risk| VarRow {
                timestep,
                alpha,
                value_at_risk,
            })
        })
        .collect())
}

/// Average the aggregates of several algorithms, checkpoint by checkpoint.
///
/// All inputs must cover the same checkpoints.
pub fn group_average(per_algorithm: &[Vec<AggregateRow>]) -> Result<Vec<AggregateRow>> {
    let Some(first) = per_algorithm.first() else {
        return Err(SimError::invalid("group average of zero algorithms"));
    };
    let timesteps: Vec<u64> = first.iter().map(|r| r.timestep).collect();
    for rows in per_algorithm {
        if rows.iter().map(|r| r.timestep).ne(timesteps.iter().copied()) {
            return Err(SimError::invalid(
                "group average over algorithms with different checkpoints",
            ));
        }
    }
    Ok(timesteps
        .iter()
        .enumerate()
        .map(|(i, &timestep)| {
            let mean = |f: fn(&AggregateRow) -> f64| -> f64 {
                mean_of(per_algorithm.iter().map(|rows| f(&rows[i])))
            };
            AggregateRow {
                timestep,
                total_reward: mean(|r| r.total_reward),
                suboptimal_arm_count: mean(|r| r.suboptimal_arm_count),
                total_regret: mean(|r| r.total_regret),
                zeros_count: mean(|r| r.zeros_count),
                ones_count: mean(|r| r.ones_count),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(timestep: u64, iteration: u32, regret: f64) -> CheckpointRecord {
        CheckpointRecord {
            timestep,
            iteration,
            total_reward: timestep as f64 / 2.0,
            suboptimal_arm_count: iteration as u64,
            total_regret: regret,
            zeros_count: timestep / 2,
            ones_count: timestep - timestep / 2,
        }
    }

    #[test]
    fn means_per_checkpoint() {
        let rows = vec![row(10, 1, 1.0), row(10, 2, 3.0), row(20, 1, 2.0), row(20, 2, 6.0)];
        let agg = aggregate(&rows);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg[0].timestep, 10);
        assert_eq!(agg[0].total_regret, 2.0);
        assert_eq!(agg[0].suboptimal_arm_count, 1.5);
        assert_eq!(agg[1].total_regret, 4.0);
        assert_eq!(agg[1].zeros_count + agg[1].ones_count, 20.0);
    }

    #[test]
    fn aggregation_is_order_independent_and_repeatable() {
        let rows: Vec<_> = (1..=7)
            .flat_map(|it| [row(5, it, 0.1 * it as f64), row(50, it, 0.37 * it as f64)])
            .collect();
        let mut shuffled = rows.clone();
        shuffled.reverse();
        assert_eq!(aggregate(&rows), aggregate(&rows));
        assert_eq!(aggregate(&rows), aggregate(&shuffled));
        assert_eq!(value_at_risk(&rows, 0.05).unwrap(), value_at_risk(&shuffled, 0.05).unwrap());
    }

    #[test]
    fn copies_of_one_record_average_to_that_record() {
        let rec = CheckpointRecord {
            timestep: 2_000,
            iteration: 1,
            total_reward: 0.07,
            suboptimal_arm_count: 3,
            total_regret: 0.1,
            zeros_count: 7,
            ones_count: 11,
        };
        let expected = AggregateRow {
            timestep: 2_000,
            total_reward: 0.07,
            suboptimal_arm_count: 3.0,
            total_regret: 0.1,
            zeros_count: 7.0,
            ones_count: 11.0,
        };
        for n in [1u32, 3, 10, 100] {
            let rows: Vec<_> = (1..=n)
                .map(|iteration| CheckpointRecord { iteration, ..rec })
                .collect();
            let agg = aggregate(&rows);
            assert_eq!(agg, vec![expected], "n={n}");
            let grouped = group_average(&vec![agg; n as usize]).unwrap();
            assert_eq!(grouped, vec![expected], "n={n}");
        }
    }

    #[test]
    fn var_interpolates_linearly() {
        // Regrets 0..=10 at one checkpoint; the 0.95 quantile sits at position 9.5.
        let rows: Vec<_> = (0..=10).map(|i| row(100, i + 1, i as f64)).collect();
        let var = value_at_risk(&rows, 0.05).unwrap();
        assert_eq!(var.len(), 1);
        assert!((var[0].value_at_risk - 9.5).abs() < 1e-12);
        let var = value_at_risk(&rows, 0.1).unwrap();
        assert!((var[0].value_at_risk - 9.0).abs() < 1e-12);
        assert!(value_at_risk(&rows, 0.0).is_err());
        assert!(value_at_risk(&rows, 1.0).is_err());
    }

    #[test]
    fn group_average_needs_matching_checkpoints() {
        let a = aggregate(&[row(10, 1, 1.0), row(20, 1, 2.0)]);
        let b = aggregate(&[row(10, 1, 3.0), row(20, 1, 4.0)]);
        let g = group_average(&[a.clone(), b]).unwrap();
        assert_eq!(g[0].total_regret, 2.0);
        assert_eq!(g[1].total_regret, 3.0);

        let c = aggregate(&[row(10, 1, 3.0)]);
        assert!(group_average(&[a, c]).is_err());
        assert!(group_average(&[]).is_err());
    }
}
