use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "oprec",
    about = "Reconcile dygraph and static operator declarations into shared canonical files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Operator yaml root; relative paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// TOML file overriding the default file layout
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Move consistent ops into the canonical files
    Reconcile(ReconcileArgs),
    /// Report consistency between dygraph and static declarations
    Verify(VerifyArgs),
    /// List the records of one declaration file
    Extract(ExtractArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Plan and report without writing any file
    #[arg(long)]
    pub dry_run: bool,
    /// Also write split/compare results under this directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// List inconsistent record names
    #[arg(short, long)]
    pub list: bool,
}

#[derive(Args)]
pub struct ExtractArgs {
    pub file: PathBuf,
    /// Read `- backward_op:` records instead of `- op:`
    #[arg(short, long)]
    pub backward: bool,
    /// Write the extracted records back out to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reconcile() {
        let cli = Cli::try_parse_from(["oprec", "reconcile"]).unwrap();
        if let Command::Reconcile(args) = cli.command {
            assert!(!args.dry_run);
            assert!(args.report_dir.is_none());
        } else { panic!("wrong command"); }
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn parse_reconcile_dry_run() {
        let cli = Cli::try_parse_from(["oprec", "reconcile", "--dry-run", "--report-dir", "verify"]).unwrap();
        if let Command::Reconcile(args) = cli.command {
            assert!(args.dry_run);
            assert_eq!(args.report_dir, Some(PathBuf::from("verify")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_root_and_config() {
        let cli = Cli::try_parse_from([
            "oprec", "verify", "--root", "/Paddle/paddle/phi/ops/yaml", "-c", "oprec.toml",
        ]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
        assert_eq!(cli.root, PathBuf::from("/Paddle/paddle/phi/ops/yaml"));
        assert_eq!(cli.config, Some(PathBuf::from("oprec.toml")));
    }

    #[test]
    fn parse_verify_list() {
        let cli = Cli::try_parse_from(["oprec", "verify", "-l"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert!(args.list);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_extract_backward() {
        let cli = Cli::try_parse_from(["oprec", "extract", "backward.yaml", "--backward"]).unwrap();
        if let Command::Extract(args) = cli.command {
            assert!(args.backward);
            assert_eq!(args.file, PathBuf::from("backward.yaml"));
            assert!(args.output.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_extract_output() {
        let cli = Cli::try_parse_from(["oprec", "extract", "ops.yaml", "-o", "sorted.yaml"]).unwrap();
        if let Command::Extract(args) = cli.command {
            assert_eq!(args.output, Some(PathBuf::from("sorted.yaml")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_extract_requires_file() {
        assert!(Cli::try_parse_from(["oprec", "extract"]).is_err());
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["oprec", "--verbose", "config"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["oprec", "--format", "json", "verify"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
