// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job specifications as users describe them, and their resolution into the
//! request the daemon runs.
//!
//! VASP and LAMMPS jobs run through a site launcher script that reads its
//! parameters from `GPUJOB_*` environment variables. Custom jobs run the
//! given program directly.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use gj_core::{InvalidRequest, NewJob};
use thiserror::Error;

/// VASP releases the launcher knows how to run.
pub const VASP_VERSIONS: &[&str] = &["6.3.0", "6.3.1"];

/// OpenMP threads per GPU rank when the user gives none.
const DEFAULT_GPU_OPENMP_THREADS: u32 = 2;

const DEFAULT_LAMMPS_INPUT: &str = "lammps.in";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VaspVariant {
    Std,
    Gam,
    Ncl,
}

impl fmt::Display for VaspVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VaspVariant::Std => "std",
            VaspVariant::Gam => "gam",
            VaspVariant::Ncl => "ncl",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSpec {
    Vasp {
        version: String,
        variant: VaspVariant,
        gpus: BTreeSet<u32>,
        mpi_threads: Option<u32>,
        openmp_threads: Option<u32>,
    },
    Lammps {
        input: Option<String>,
        gpus: BTreeSet<u32>,
        mpi_threads: Option<u32>,
        openmp_threads: Option<u32>,
    },
    Custom {
        program: String,
        args: Vec<String>,
        cores: Option<u32>,
        gpus: BTreeSet<u32>,
    },
}

/// Options shared by every kind of job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub workdir: PathBuf,
    pub run_now: bool,
    pub in_container: bool,
    pub comment: String,
}

/// Launcher programs for the packaged applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launchers {
    pub vasp: String,
    pub lammps: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("unsupported VASP version {0} (supported: {versions})", versions = VASP_VERSIONS.join(", "))]
    UnsupportedVaspVersion(String),
    #[error("--mpi-threads is required {0}")]
    MissingMpiThreads(&'static str),
    #[error("--openmp-threads is required {0}")]
    MissingOpenMpThreads(&'static str),
    #[error("--cores must be a positive number")]
    MissingCores,
    #[error("no program given")]
    MissingProgram,
    #[error("{threads} threads do not fit in a core count")]
    TooManyThreads { threads: u64 },
    #[error(transparent)]
    Invalid(#[from] InvalidRequest),
}

/// Zero counts mean "not given".
fn positive(n: Option<u32>) -> Option<u32> {
    n.filter(|n| *n > 0)
}

fn cores_for(a: u32, b: u32) -> Result<u32, SpecError> {
    let threads = u64::from(a) * u64::from(b);
    u32::try_from(threads).map_err(|_| SpecError::TooManyThreads { threads })
}

fn gpu_list(gpus: &BTreeSet<u32>) -> String {
    gpus.iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl JobSpec {
    /// Build the daemon request for this spec.
    pub fn resolve(self, placement: Placement, launchers: &Launchers) -> Result<NewJob, SpecError> {
        let builder = match self {
            JobSpec::Vasp {
                version,
                variant,
                gpus,
                mpi_threads,
                openmp_threads,
            } => {
                if !VASP_VERSIONS.contains(&version.as_str()) {
                    return Err(SpecError::UnsupportedVaspVersion(version));
                }
                let builder = NewJob::builder(&launchers.vasp)
                    .env("GPUJOB_VASP_VERSION", version)
                    .env("GPUJOB_VASP_VARIANT", variant.to_string());

                if gpus.is_empty() {
                    let mpi = positive(mpi_threads)
                        .ok_or(SpecError::MissingMpiThreads("for VASP on CPU"))?;
                    let omp = positive(openmp_threads)
                        .ok_or(SpecError::MissingOpenMpThreads("for VASP on CPU"))?;
                    builder
                        .env("GPUJOB_USING_GPU", "0")
                        .env("GPUJOB_MPI_THREADS", mpi.to_string())
                        .env("GPUJOB_OPENMP_THREADS", omp.to_string())
                        .cores(cores_for(mpi, omp)?)
                } else {
                    // One MPI rank per GPU.
                    let ranks = gpus.len() as u32;
                    let omp = positive(openmp_threads).unwrap_or(DEFAULT_GPU_OPENMP_THREADS);
                    builder
                        .env("GPUJOB_USING_GPU", "1")
                        .env("GPUJOB_GPUS", gpu_list(&gpus))
                        .env("GPUJOB_MPI_THREADS", ranks.to_string())
                        .env("GPUJOB_OPENMP_THREADS", omp.to_string())
                        .cores(cores_for(ranks, omp)?)
                        .gpus(gpus)
                }
            }
            JobSpec::Lammps {
                input,
                gpus,
                mpi_threads,
                openmp_threads,
            } => {
                let mpi = positive(mpi_threads)
                    .ok_or(SpecError::MissingMpiThreads("for LAMMPS"))?;
                let mut builder = NewJob::builder(&launchers.lammps)
                    .env("GPUJOB_MPI_THREADS", mpi.to_string())
                    .env(
                        "GPUJOB_LAMMPS_INPUT",
                        input.unwrap_or_else(|| DEFAULT_LAMMPS_INPUT.to_string()),
                    );
                builder = match positive(openmp_threads) {
                    Some(omp) => builder
                        .env("GPUJOB_LAMMPS_OPENMP", "1")
                        .env("GPUJOB_OPENMP_THREADS", omp.to_string())
                        .cores(cores_for(mpi, omp)?),
                    None => builder.env("GPUJOB_LAMMPS_OPENMP", "0").cores(mpi),
                };
                if gpus.is_empty() {
                    builder.env("GPUJOB_USING_GPU", "0")
                } else {
                    builder
                        .env("GPUJOB_USING_GPU", "1")
                        .env("GPUJOB_GPUS", gpu_list(&gpus))
                        .env("GPUJOB_LAMMPS_GPUSF", "1")
                        .gpus(gpus)
                }
            }
            JobSpec::Custom {
                program,
                args,
                cores,
                gpus,
            } => {
                if program.trim().is_empty() {
                    return Err(SpecError::MissingProgram);
                }
                let cores = positive(cores).ok_or(SpecError::MissingCores)?;
                NewJob::builder(program)
                    .args(args)
                    .env("GPUJOB_MPI_THREADS", cores.to_string())
                    .cores(cores)
                    .gpus(gpus)
            }
        };

        let job = builder
            .workdir(placement.workdir)
            .run_now(placement.run_now)
            .in_container(placement.in_container)
            .comment(placement.comment)
            .build();
        job.validate()?;
        Ok(job)
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
