//! Outer orchestration: every algorithm against every arm configuration,
//! one JSON artifact per pair.
//!
//! Layout under the output directory:
//!
//! ```text
//! <out>/<algorithm label>/<arm configuration name>.json
//! <out>/groups/<group>/<arm configuration name>.json
//! ```
//!
//! Artifacts are written to a temporary file and renamed into place, and a
//! pair whose artifact already exists is skipped, so an interrupted sweep can
//! simply be re-run.

use std::fs;
use std::io::{BufWriter, Write};

use tempfile::NamedTempFile;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, group_average, value_at_risk, AggregateRow, VarRow};
use crate::arm::ArmConfig;
use crate::config::SweepConfig;
use crate::error::{Result, SimError};
use crate::experiment::{CheckpointRecord, Experiment, Interrupt};
use crate::policy::{AlgorithmGroup, PolicyConfig};

/// Everything recorded for one (algorithm, arm configuration) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub algorithm: PolicyConfig,
    pub label: String,
    pub group: AlgorithmGroup,
    pub arms: ArmConfig,
    pub iterations: u32,
    pub seed: u64,
    pub checkpoints: Vec<CheckpointRecord>,
    pub aggregate: Vec<AggregateRow>,
    pub value_at_risk: Vec<VarRow>,
}

/// Aggregates averaged over the algorithms of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupArtifact {
    pub group: AlgorithmGroup,
    pub arms: ArmConfig,
    pub algorithms: Vec<String>,
    pub aggregate: Vec<AggregateRow>,
}

/// What happened to one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub written: usize,
    pub skipped: usize,
    /// `(label, arm configuration name, error)` for every pair that failed.
    pub failed: Vec<(String, String, String)>,
    pub groups_written: usize,
}

/// File-system friendly form of a label: `UCB-V(theta=1,c=1,b=1)` ->
/// `UCB-V_theta-1_c-1_b-1`.
pub fn slug(label: &str) -> String {
    let mapped: String = label
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') => c,
            '=' => '-',
            _ => '_',
        })
        .collect();
    mapped.trim_end_matches('_').to_string()
}

pub struct Sweep {
    config: SweepConfig,
    out_dir: PathBuf,
    interrupt: Interrupt,
}

impl Sweep {
    pub fn new(config: SweepConfig, out_dir: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            out_dir: out_dir.into(),
            interrupt: Interrupt::new(),
        })
    }

    /// Share a cancellation flag with the caller.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn artifact_path(&self, algorithm: &PolicyConfig, arms: &ArmConfig) -> PathBuf {
        self.out_dir
            .join(slug(&algorithm.label()))
            .join(format!("{}.json", arms.name()))
    }

    fn group_path(&self, group: AlgorithmGroup, arms: &ArmConfig) -> PathBuf {
        self.out_dir
            .join("groups")
            .join(slug(group.label()))
            .join(format!("{}.json", arms.name()))
    }

    /// Run one pair and write its artifact, unless it already exists.
    pub fn run_one(&self, algorithm: &PolicyConfig, arms: &ArmConfig) -> Result<Outcome> {
        self.interrupt.check()?;
        let path = self.artifact_path(algorithm, arms);
        if path.exists() {
            tracing::debug!(path = %path.display(), "artifact exists, skipping");
            return Ok(Outcome::Skipped);
        }
        let experiment = Experiment::new(algorithm.clone(), arms.clone(), &self.config.checkpoints)?
            .with_iterations(self.config.iterations)?
            .with_seed(self.config.seed);
        let rows = experiment.run(&self.interrupt)?;
        let mut var_rows = Vec::new();
        for &alpha in &self.config.alphas {
            var_rows.extend(value_at_risk(&rows, alpha)?);
        }
        let artifact = Artifact {
            algorithm: algorithm.clone(),
            label: algorithm.label(),
            group: algorithm.group(),
            arms: arms.clone(),
            iterations: self.config.iterations,
            seed: self.config.seed,
            aggregate: aggregate(&rows),
            value_at_risk: var_rows,
            checkpoints: rows,
        };
        write_json_atomic(&path, &artifact)?;
        Ok(Outcome::Written)
    }

    /// Run every pair, then write the group averages.
    ///
    /// A failing pair is logged and reported in the summary; the sweep moves
    /// on. An interrupt stops the sweep with [`SimError::Interrupted`].
    pub fn run(&self) -> Result<SweepSummary> {
        let combinations = self.config.combinations();
        let mut summary = SweepSummary::default();
        for algorithm in &self.config.algorithms {
            let label = algorithm.label();
            for arms in &combinations {
                let name = arms.name();
                match self.run_one(algorithm, arms) {
                    Ok(Outcome::Written) => {
                        tracing::info!(algorithm = %label, arms = %name, "artifact written");
                        summary.written += 1;
                    }
                    Ok(Outcome::Skipped) => summary.skipped += 1,
                    Err(SimError::Interrupted) => {
                        tracing::warn!(algorithm = %label, arms = %name, "interrupted");
                        return Err(SimError::Interrupted);
                    }
                    Err(e) => {
                        tracing::error!(algorithm = %label, arms = %name, error = %e, "combination failed");
                        summary.failed.push((label.clone(), name, e.to_string()));
                    }
                }
            }
        }
        summary.groups_written = self.write_group_averages(&combinations)?;
        Ok(summary)
    }

    /// Average the artifacts of each group's algorithms per arm
    /// configuration. Groups with no configured algorithm, or with a missing
    /// artifact, are left out.
    fn write_group_averages(&self, combinations: &[ArmConfig]) -> Result<usize> {
        let mut written = 0;
        for group in AlgorithmGroup::ALL {
            let members: Vec<&PolicyConfig> = self
                .config
                .algorithms
                .iter()
                .filter(|a| a.group() == group)
                .collect();
            if members.is_empty() {
                continue;
            }
            for arms in combinations {
                let mut per_algorithm = Vec::with_capacity(members.len());
                for m in &members {
                    let path = self.artifact_path(m, arms);
                    if !path.exists() {
                        break;
                    }
                    per_algorithm.push(read_artifact(&path)?.aggregate);
                }
                if per_algorithm.len() < members.len() {
                    continue;
                }
                let artifact = GroupArtifact {
                    group,
                    arms: arms.clone(),
                    algorithms: members.iter().map(|m| m.label()).collect(),
                    aggregate: group_average(&per_algorithm)?,
                };
                write_json_atomic(&self.group_path(group, arms), &artifact)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

pub fn read_artifact(path: &Path) -> Result<Artifact> {
    let f = fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(f))?)
}

/// Serialize into a temporary file beside `path`, then rename it over `path`.
///
/// On any error the temporary file is removed and `path` is untouched.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut w, value)?;
        w.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SweepConfig {
        SweepConfig {
            algorithms: vec![
                PolicyConfig::Ucb,
                PolicyConfig::Greedy { epsilon: 0.1 },
                PolicyConfig::UcbTuned,
            ],
            arms: vec![ArmConfig::bernoulli(vec![0.9, 0.6])],
            permute: true,
            checkpoints: vec![10, 50],
            iterations: 4,
            seed: 1,
            alphas: vec![0.05, 0.1],
        }
    }

    #[test]
    fn slugs_are_path_safe() {
        assert_eq!(slug("UCB-V(theta=1,c=1,b=1)"), "UCB-V_theta-1_c-1_b-1");
        assert_eq!(slug("Greedy(epsilon=0.05)"), "Greedy_epsilon-0.05");
        assert_eq!(slug("Standard Algorithms"), "Standard_Algorithms");
    }

    #[test]
    fn writes_then_skips_existing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = Sweep::new(small_config(), dir.path()).unwrap();
        let first = sweep.run().unwrap();
        assert_eq!(first.written, 6);
        assert_eq!(first.skipped, 0);
        assert!(first.failed.is_empty());
        // UCB + Greedy form the standard group; UCB-Tuned the variance-aware one.
        assert_eq!(first.groups_written, 4);

        let art = read_artifact(&sweep.artifact_path(&PolicyConfig::Ucb, &ArmConfig::bernoulli(vec![0.6, 0.9])))
            .unwrap();
        assert_eq!(art.checkpoints.len(), 8);
        assert_eq!(art.aggregate.len(), 2);
        assert_eq!(art.value_at_risk.len(), 4);
        assert_eq!(art.label, "UCB");

        let second = sweep.run().unwrap();
        assert_eq!(second.written, 0);
        assert_eq!(second.skipped, 6);
        assert_eq!(second.groups_written, 4);
    }

    #[test]
    fn failed_write_leaves_no_files_behind() {
        struct Unserializable;
        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("refused"))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair").join("900_600.json");
        assert!(write_json_atomic(&path, &Unserializable).is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 0);

        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("900_600.json")]);
    }

    #[test]
    fn interrupted_sweep_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stop = Interrupt::new();
        stop.trigger();
        let sweep = Sweep::new(small_config(), dir.path())
            .unwrap()
            .with_interrupt(stop);
        assert!(matches!(sweep.run(), Err(SimError::Interrupted)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rerun_reproduces_artifact_bytes() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let cfg = SweepConfig {
            algorithms: vec![PolicyConfig::Eucbv { rho: 0.5 }],
            ..small_config()
        };
        Sweep::new(cfg.clone(), a.path()).unwrap().run().unwrap();
        let sweep_b = Sweep::new(cfg, b.path()).unwrap();
        sweep_b.run().unwrap();
        let arms = ArmConfig::bernoulli(vec![0.9, 0.6]);
        let rel = sweep_b
            .artifact_path(&PolicyConfig::Eucbv { rho: 0.5 }, &arms)
            .strip_prefix(b.path())
            .unwrap()
            .to_path_buf();
        assert_eq!(fs::read(a.path().join(&rel)).unwrap(), fs::read(b.path().join(&rel)).unwrap());
    }
}
