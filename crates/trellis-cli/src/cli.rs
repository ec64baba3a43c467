use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "trellis",
    about = "Trellis: file status and history for a working tree",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Run as if started in <DIR>
    #[arg(short = 'C', global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init(InitArgs),
    /// Show changed files
    Status(StatusArgs),
    /// Stage files
    Add(PathsArgs),
    /// Unstage files, resetting them to the last commit
    Reset(PathsArgs),
    /// Remove files from the index, keeping them on disk
    Rm(PathsArgs),
    /// Record the index as a new commit
    Commit(CommitArgs),
    /// Show working changes to a file against the last commit
    Diff(DiffArgs),
    /// Show commit history
    Log(LogArgs),
    /// Show the files changed by a commit
    Show(ShowArgs),
    /// Print a file as of a commit
    Cat(CatArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Paths to report on; all changed files when empty
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct PathsArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
    /// Replace the last commit instead of adding one
    #[arg(long)]
    pub amend: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    /// Draw the branch graph
    #[arg(long)]
    pub graph: bool,
    /// Collapse linear chains of unreferenced commits
    #[arg(long)]
    pub simplify: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub commit: String,
    /// Compare against this commit instead of the parents
    #[arg(long)]
    pub against: Option<String>,
}

#[derive(Args)]
pub struct CatArgs {
    pub commit: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["trellis", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(InitArgs { path: None })));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_commit() {
        let cli = Cli::try_parse_from(["trellis", "commit", "-m", "hello"]).unwrap();
        if let Command::Commit(args) = cli.command {
            assert_eq!(args.message, "hello");
            assert!(!args.amend);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_commit_amend() {
        let cli = Cli::try_parse_from(["trellis", "commit", "--amend", "--message", "fixed"]).unwrap();
        if let Command::Commit(args) = cli.command {
            assert_eq!(args.message, "fixed");
            assert!(args.amend);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn commit_requires_message() {
        assert!(Cli::try_parse_from(["trellis", "commit"]).is_err());
    }

    #[test]
    fn parse_log_options() {
        let cli = Cli::try_parse_from(["trellis", "log", "--graph", "--simplify", "-n", "5"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert!(args.graph);
            assert!(args.simplify);
            assert_eq!(args.limit, Some(5));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_log_defaults() {
        let cli = Cli::try_parse_from(["trellis", "log"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert!(!args.graph);
            assert!(!args.simplify);
            assert_eq!(args.limit, None);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_show_against() {
        let cli = Cli::try_parse_from(["trellis", "show", "HEAD", "--against", "abcd1234"]).unwrap();
        if let Command::Show(args) = cli.command {
            assert_eq!(args.commit, "HEAD");
            assert_eq!(args.against, Some("abcd1234".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_options() {
        let cli = Cli::try_parse_from([
            "trellis", "-C", "/tmp/work", "status", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/work")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn parse_add_paths() {
        let cli = Cli::try_parse_from(["trellis", "add", "a.txt", "src/b.rs"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.paths, vec![PathBuf::from("a.txt"), PathBuf::from("src/b.rs")]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn add_requires_a_path() {
        assert!(Cli::try_parse_from(["trellis", "add"]).is_err());
        assert!(Cli::try_parse_from(["trellis", "rm"]).is_err());
    }

    #[test]
    fn parse_cat() {
        let cli = Cli::try_parse_from(["trellis", "cat", "main", "src/lib.rs"]).unwrap();
        if let Command::Cat(args) = cli.command {
            assert_eq!(args.commit, "main");
            assert_eq!(args.path, "src/lib.rs");
        } else { panic!("wrong command"); }
    }
}
