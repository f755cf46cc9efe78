// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gj submit` - resolve a job spec and drop it into the inbox

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use gj_core::NewJob;

use crate::client::Client;
use crate::env;
use crate::output::{print_json, OutputFormat};
use crate::spec::{JobSpec, Launchers, Placement, VaspVariant};

#[derive(Args)]
pub struct SubmitArgs {
    #[command(subcommand)]
    pub kind: SubmitKind,
}

#[derive(Subcommand)]
pub enum SubmitKind {
    /// Run VASP through the site launcher
    #[command(disable_version_flag = true)]
    Vasp {
        /// VASP release (6.3.0 or 6.3.1)
        #[arg(long = "version")]
        vasp_version: String,

        /// Build variant
        #[arg(long, value_enum)]
        variant: VaspVariant,

        #[command(flatten)]
        threads: ThreadArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run LAMMPS through the site launcher
    Lammps {
        /// Input script (default: lammps.in)
        #[arg(long)]
        input: Option<String>,

        #[command(flatten)]
        threads: ThreadArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run an arbitrary program
    Custom {
        /// Cores the program will use
        #[arg(long)]
        cores: Option<u32>,

        /// GPU ids, comma separated (e.g. 0,1)
        #[arg(long = "gpu", value_delimiter = ',')]
        gpus: Vec<u32>,

        #[command(flatten)]
        common: CommonArgs,

        /// Program and its arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

#[derive(Args)]
pub struct ThreadArgs {
    /// GPU ids, comma separated (e.g. 0,1)
    #[arg(long = "gpu", value_delimiter = ',')]
    pub gpus: Vec<u32>,

    /// MPI ranks (required on CPU)
    #[arg(long)]
    pub mpi_threads: Option<u32>,

    /// OpenMP threads per rank
    #[arg(long)]
    pub openmp_threads: Option<u32>,
}

#[derive(Args)]
pub struct CommonArgs {
    /// Directory to run in (default: current directory)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Start immediately, ignoring free cores
    #[arg(long)]
    pub run_now: bool,

    /// Run inside the configured container
    #[arg(long)]
    pub container: bool,

    /// Free-form label shown in `gj list`
    #[arg(long, default_value = "")]
    pub comment: String,
}

impl SubmitKind {
    /// Split into the job spec and its placement, with `cwd` resolving
    /// relative or missing work directories.
    pub fn into_parts(self, cwd: &Path) -> (JobSpec, Placement) {
        let (spec, common) = match self {
            SubmitKind::Vasp {
                vasp_version,
                variant,
                threads,
                common,
            } => (
                JobSpec::Vasp {
                    version: vasp_version,
                    variant,
                    gpus: threads.gpus.into_iter().collect(),
                    mpi_threads: threads.mpi_threads,
                    openmp_threads: threads.openmp_threads,
                },
                common,
            ),
            SubmitKind::Lammps {
                input,
                threads,
                common,
            } => (
                JobSpec::Lammps {
                    input,
                    gpus: threads.gpus.into_iter().collect(),
                    mpi_threads: threads.mpi_threads,
                    openmp_threads: threads.openmp_threads,
                },
                common,
            ),
            SubmitKind::Custom {
                cores,
                gpus,
                common,
                mut command,
            } => {
                let program = if command.is_empty() {
                    String::new()
                } else {
                    command.remove(0)
                };
                (
                    JobSpec::Custom {
                        program,
                        args: command,
                        cores,
                        gpus: gpus.into_iter().collect::<BTreeSet<_>>(),
                    },
                    common,
                )
            }
        };

        let workdir = match common.workdir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        };
        let placement = Placement {
            workdir,
            run_now: common.run_now,
            in_container: common.container,
            comment: common.comment,
        };
        (spec, placement)
    }
}

pub fn launchers_from_env() -> Launchers {
    Launchers {
        vasp: env::vasp_launcher(),
        lammps: env::lammps_launcher(),
    }
}

pub fn handle(args: SubmitArgs, client: &Client, format: OutputFormat) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let (spec, placement) = args.kind.into_parts(&cwd);
    let job = spec.resolve(placement, &launchers_from_env())?;
    let request = client.submit(vec![job.clone()])?;

    match format {
        OutputFormat::Text => println!("{}", describe(&job)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "request": request,
            "job": job,
        }))?,
    }
    Ok(())
}

/// One-line confirmation, e.g. `Submitted vasp (4 cores, GPUs 0,1) in /home/alice/run`.
pub(crate) fn describe(job: &NewJob) -> String {
    let program = Path::new(&job.program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.program.clone());
    let cores = if job.using_cores == 1 {
        "1 core".to_string()
    } else {
        format!("{} cores", job.using_cores)
    };
    let mut resources = cores;
    if !job.using_gpus.is_empty() {
        let gpus: Vec<String> = job.using_gpus.iter().map(|g| g.to_string()).collect();
        let label = if gpus.len() == 1 { "GPU" } else { "GPUs" };
        resources.push_str(&format!(", {} {}", label, gpus.join(",")));
    }
    if job.run_now {
        resources.push_str(", run now");
    }
    format!(
        "Submitted {} ({}) in {}",
        program,
        resources,
        job.workdir.display()
    )
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
