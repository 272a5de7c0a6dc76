use crate::analyzer::pod_resources::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kubectl-resource_aggregate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aggregate the effective resource requests and limits of a workload")]
#[command(long_about = "Reads a Kubernetes workload manifest (Pod, Deployment, StatefulSet, DaemonSet, ReplicaSet, Job or CronJob) and reports, per resource, the largest init container request/limit, the sum over main containers, and the effective value the scheduler reserves.")]
pub struct Cli {
    /// Manifest file to read ("-" or omitted reads stdin)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Output format (defaults to the configured format, else table)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Skip documents whose kind has no pod template instead of failing
    #[arg(long)]
    pub skip_unsupported: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress warnings and log output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }

    /// Input path, `None` for stdin.
    pub fn input(&self) -> Option<&PathBuf> {
        self.file.as_ref().filter(|p| p.as_os_str() != "-")
    }
}
