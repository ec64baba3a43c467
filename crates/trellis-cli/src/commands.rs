use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::{debug, info};
use trellis_sdk::{Change, ChangeKind, FileStatus, Tracker};

use crate::cli::*;
use crate::render::{self, JsonChange, JsonChangedFile, JsonGraph};

/// Where the command runs and how it prints.
struct Ctx {
    base: PathBuf,
    format: OutputFormat,
}

impl Ctx {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// A user-supplied path, taken relative to the base directory.
    fn path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }

    fn open(&self) -> anyhow::Result<Tracker> {
        let tracker = Tracker::open(&self.base)?;
        debug!(base = %self.base.display(), repo = %tracker, "opened tracker");
        if !tracker.has_repository() {
            bail!("not inside a trellis repository: {}", self.base.display());
        }
        Ok(tracker)
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let base = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("reading current directory")?,
    };
    let ctx = Ctx {
        base,
        format: cli.format,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&ctx, args),
        Command::Status(args) => cmd_status(&ctx, args),
        Command::Add(args) => cmd_add(&ctx, args),
        Command::Reset(args) => cmd_reset(&ctx, args),
        Command::Rm(args) => cmd_rm(&ctx, args),
        Command::Commit(args) => cmd_commit(&ctx, args),
        Command::Diff(args) => cmd_diff(&ctx, args),
        Command::Log(args) => cmd_log(&ctx, args),
        Command::Show(args) => cmd_show(&ctx, args),
        Command::Cat(args) => cmd_cat(&ctx, args),
    }
}

fn cmd_init(ctx: &Ctx, args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.map_or_else(|| ctx.base.clone(), |p| ctx.path(&p));
    let tracker = Tracker::init(&path)?;
    let work_dir = tracker.work_dir().unwrap_or(&path);
    println!(
        "{} Initialized empty repository in {}",
        "✓".green().bold(),
        work_dir.display().to_string().bold()
    );
    println!("  Branch: {}", "main".yellow());
    Ok(())
}

fn status_colored(status: FileStatus) -> colored::ColoredString {
    let code = status.code();
    if status.is_staged() {
        code.green()
    } else if status == FileStatus::Ignored {
        code.dimmed()
    } else {
        code.red()
    }
}

fn cmd_status(ctx: &Ctx, args: StatusArgs) -> anyhow::Result<()> {
    let mut tracker = ctx.open()?;

    if !args.paths.is_empty() {
        let mut rows = Vec::with_capacity(args.paths.len());
        for path in &args.paths {
            let abs = ctx.path(path);
            let status = tracker.file_status(&abs)?;
            let rel = tracker
                .relative_path(&abs)
                .unwrap_or_else(|| path.display().to_string());
            rows.push((rel, status));
        }
        if ctx.json() {
            let out: Vec<_> = rows
                .iter()
                .map(|(path, status)| JsonChangedFile {
                    path,
                    status: status.to_string(),
                    staged: status.is_staged(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            for (path, status) in &rows {
                println!("{:>2} {}", status_colored(*status), path);
            }
        }
        return Ok(());
    }

    let branch = tracker.current_branch()?;
    let files = tracker.changed_files()?;
    if ctx.json() {
        let out: Vec<JsonChangedFile<'_>> = files.iter().map(Into::into).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match branch {
        Some(branch) => println!("On branch {}", branch.yellow().bold()),
        None => println!("{}", "HEAD detached".yellow().bold()),
    }
    if files.is_empty() {
        println!("\nNothing changed. Working directory clean.");
        return Ok(());
    }
    println!();
    for file in files {
        println!("{:>2} {}", status_colored(file.status), file.path);
    }
    Ok(())
}

fn cmd_add(ctx: &Ctx, args: PathsArgs) -> anyhow::Result<()> {
    let mut tracker = ctx.open()?;
    for path in &args.paths {
        tracker.stage(&ctx.path(path))?;
        println!("  {} {}", "staged:".green(), path.display());
    }
    Ok(())
}

fn cmd_reset(ctx: &Ctx, args: PathsArgs) -> anyhow::Result<()> {
    let mut tracker = ctx.open()?;
    for path in &args.paths {
        tracker.unstage(&ctx.path(path))?;
        println!("  {} {}", "unstaged:".yellow(), path.display());
    }
    Ok(())
}

fn cmd_rm(ctx: &Ctx, args: PathsArgs) -> anyhow::Result<()> {
    let mut tracker = ctx.open()?;
    for path in &args.paths {
        tracker.remove(&ctx.path(path))?;
        println!("  {} {}", "removed:".red(), path.display());
    }
    Ok(())
}

fn cmd_commit(ctx: &Ctx, args: CommitArgs) -> anyhow::Result<()> {
    let mut tracker = ctx.open()?;
    let id = if args.amend {
        tracker.amend_commit(&args.message)?
    } else {
        tracker.commit(&args.message)?
    };
    let Some(id) = id else {
        bail!("nothing was committed");
    };
    info!(id = %id.short_hex(), amend = args.amend, "recorded commit");
    if ctx.json() {
        println!("{}", serde_json::json!({ "id": id.to_hex() }));
        return Ok(());
    }
    let branch = tracker.current_branch()?.unwrap_or_else(|| "HEAD".into());
    let verb = if args.amend { "Amended" } else { "Committed" };
    println!(
        "{} {} [{} {}]",
        "✓".green().bold(),
        verb,
        branch.yellow(),
        id.short_hex().dimmed()
    );
    println!("  {}", args.message.lines().next().unwrap_or_default());
    Ok(())
}

fn cmd_diff(ctx: &Ctx, args: DiffArgs) -> anyhow::Result<()> {
    let tracker = ctx.open()?;
    let diff = tracker.diff_file(&ctx.path(&args.path));
    if ctx.json() {
        println!("{}", serde_json::json!({ "diff": diff }));
        return Ok(());
    }
    if diff.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{line}");
        }
    }
    Ok(())
}

fn cmd_log(ctx: &Ctx, args: LogArgs) -> anyhow::Result<()> {
    let mut tracker = ctx.open()?;
    debug!(limit = ?args.limit, graph = args.graph, simplify = args.simplify, "log");
    if args.simplify {
        tracker.set_simplified(true);
    }
    let limit = args.limit.unwrap_or(usize::MAX);
    let Some(graph) = tracker.graph()? else {
        return Ok(());
    };

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&JsonGraph::new(graph, limit))?);
        return Ok(());
    }
    if graph.nodes.is_empty() {
        println!("No commits yet.");
        return Ok(());
    }

    for (lanes, node) in render::graph_rows(graph, limit) {
        let refs = if node.refs.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = node.refs.iter().map(|r| r.short_name()).collect();
            format!(" ({})", names.join(", "))
        };
        let summary = node.message.lines().next().unwrap_or_default();
        let prefix = if args.graph { lanes } else { String::new() };
        println!(
            "{}{}{} {}  {}, {}",
            prefix,
            node.id.short_hex().yellow(),
            refs.green(),
            summary,
            node.committer_name.dimmed(),
            node.commit_date_relative.dimmed()
        );
    }
    Ok(())
}

fn change_colored(change: &Change) -> colored::ColoredString {
    let kind = change.kind.to_string();
    match change.kind {
        ChangeKind::Added => kind.green(),
        ChangeKind::Deleted => kind.red(),
        ChangeKind::Modified => kind.yellow(),
        ChangeKind::TypeChanged => kind.cyan(),
    }
}

fn cmd_show(ctx: &Ctx, args: ShowArgs) -> anyhow::Result<()> {
    let tracker = ctx.open()?;
    let Some(id) = tracker.resolve(&args.commit)? else {
        bail!("unknown revision: {}", args.commit);
    };

    let changes = match &args.against {
        Some(against) => tracker.changes_between(against, &args.commit)?,
        None => {
            let is_merge = tracker
                .parents(&id)?
                .is_some_and(|parents| parents.len() > 1);
            if is_merge {
                tracker.merge_changes(&args.commit)?
            } else {
                tracker.changes(&args.commit)?
            }
        }
    };
    let changes = changes.unwrap_or_default();

    if ctx.json() {
        let out: Vec<JsonChange<'_>> = changes.iter().map(Into::into).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "id": id.to_hex(),
                "changes": out,
            }))?
        );
        return Ok(());
    }

    println!("commit {}", id.to_hex().yellow());
    if changes.is_empty() {
        println!("\nNo file changes.");
        return Ok(());
    }
    println!();
    for change in &changes {
        println!("  {:<12} {}", change_colored(change), change.path);
    }
    Ok(())
}

fn cmd_cat(ctx: &Ctx, args: CatArgs) -> anyhow::Result<()> {
    let tracker = ctx.open()?;
    let Some(content) = tracker.file_content_at(&args.commit, &args.path)? else {
        bail!("{} not found in {}", args.path, args.commit);
    };
    let mut out = std::io::stdout().lock();
    out.write_all(&content)?;
    out.flush()?;
    Ok(())
}
