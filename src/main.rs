use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use similar::{ChangeTag, TextDiff};
use stackgen::generate::{
    create_page, create_table, create_webhook, GenerateError, GenerationReport, PageKind,
};
use stackgen::naming::Identifier;
use stackgen::patch::PatchOutcome;
use stackgen::project::{PathOverrides, ProjectConfig};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackgen")]
#[command(about = "Scaffold pages, tables and webhooks into a SolidJS + Hono project", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (defaults to <root>/stackgen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Show unified diff of patched files
    #[arg(short, long, global = true)]
    diff: bool,

    /// Verbose logging (same as RUST_LOG=stackgen=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a client page entry, wired into the vite config
    CreatePage {
        /// Page name in kebab-case
        name: String,

        /// Page type
        #[arg(short = 't', long = "type", value_enum)]
        page_type: PageTypeArg,

        #[command(flatten)]
        paths: PathArgs,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Add a row schema and a shard table with CRUD methods
    CreateTable {
        /// Table name in kebab-case
        name: String,

        #[command(flatten)]
        paths: PathArgs,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Create a webhook handler and register its route
    CreateWebhook {
        /// Webhook name in kebab-case
        name: String,

        #[command(flatten)]
        paths: PathArgs,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Args)]
struct PathArgs {
    /// Schema file
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// Server route file
    #[arg(long)]
    routes: Option<PathBuf>,

    /// User shard class file
    #[arg(long)]
    user_shard: Option<PathBuf>,
}

impl From<PathArgs> for PathOverrides {
    fn from(args: PathArgs) -> Self {
        PathOverrides {
            routes: args.routes,
            schemas: args.schemas,
            user_shard: args.user_shard,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PageTypeArg {
    Static,
    Dashboard,
    Feed,
}

impl From<PageTypeArg> for PageKind {
    fn from(arg: PageTypeArg) -> Self {
        match arg {
            PageTypeArg::Static => PageKind::Static,
            PageTypeArg::Dashboard => PageKind::Dashboard,
            PageTypeArg::Feed => PageKind::Feed,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "stackgen=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = match cli.command {
        Commands::CreatePage {
            name,
            page_type,
            paths,
            yes,
        } => {
            let kind = PageKind::from(page_type);
            cmd_generate(&cli.global, paths, yes, &name, &format!("{kind} page"), |config| {
                create_page(config, &name, kind, cli.global.dry_run)
            })
        }
        Commands::CreateTable { name, paths, yes } => {
            cmd_generate(&cli.global, paths, yes, &name, "table", |config| {
                create_table(config, &name, cli.global.dry_run)
            })
        }
        Commands::CreateWebhook { name, paths, yes } => {
            cmd_generate(&cli.global, paths, yes, &name, "webhook", |config| {
                create_webhook(config, &name, cli.global.dry_run)
            })
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red(), e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(global: &GlobalArgs, paths: PathArgs) -> Result<ProjectConfig> {
    let root = match &global.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let config = ProjectConfig::load(root, global.config.as_deref())?;
    Ok(config.with_overrides(paths.into()))
}

/// Confirmation is skipped with `-y`, in dry runs, and when stdin is not a
/// terminal.
fn confirm(prompt: &str, yes: bool, dry_run: bool) -> Result<bool> {
    if yes || dry_run || !std::io::stdin().is_terminal() {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()?)
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn cmd_generate<F>(
    global: &GlobalArgs,
    paths: PathArgs,
    yes: bool,
    name: &str,
    what: &str,
    generate: F,
) -> Result<()>
where
    F: FnOnce(&ProjectConfig) -> Result<GenerationReport, GenerateError>,
{
    // Validate before prompting so a bad name never reaches the filesystem.
    let id = Identifier::parse(name)?;
    let config = load_config(global, paths)?;

    println!("Project: {}", config.root().display());
    if global.dry_run {
        println!("{}", "[DRY RUN - nothing will be written]".cyan());
    }

    if !confirm(
        &format!("Create {what} '{}' ({})?", id.kebab(), id.pascal()),
        yes,
        global.dry_run,
    )? {
        println!("{}", "Aborted; no files were changed.".yellow());
        return Ok(());
    }

    let bar = spinner(&format!("Generating {what} '{}'", id.kebab()));
    let result = generate(&config);
    bar.finish_and_clear();
    let report = result?;

    print_report(&report, config.root(), global.diff);
    Ok(())
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn print_report(report: &GenerationReport, root: &Path, show_diff: bool) {
    let verb = if report.dry_run { "Would create" } else { "Created" };
    for file in &report.files {
        println!(
            "{} {} {}",
            "✓".green(),
            verb,
            relative(&file.path, root).display()
        );
    }

    let mut applied = 0;
    let mut already = 0;
    let mut skipped = 0;

    for outcome in &report.patches {
        let file = relative(outcome.file(), root);
        match outcome {
            PatchOutcome::Applied {
                before,
                after,
                warning,
                ..
            } => {
                let verb = if report.dry_run { "Would patch" } else { "Patched" };
                println!("{} {} {}", "✓".green(), verb, file.display());
                if let Some(warning) = warning {
                    println!("  {} {}", "⚠".yellow(), warning);
                }
                if show_diff {
                    display_diff(file, before, after);
                }
                applied += 1;
            }
            PatchOutcome::Created { after, .. } => {
                let verb = if report.dry_run { "Would create" } else { "Created" };
                println!("{} {} {}", "✓".green(), verb, file.display());
                if show_diff {
                    display_diff(file, "", after);
                }
                applied += 1;
            }
            PatchOutcome::AlreadyApplied { .. } => {
                println!("{} Already applied to {}", "⊙".yellow(), file.display());
                already += 1;
            }
            PatchOutcome::Skipped { warning, .. } => {
                println!("{} {}", "⚠".yellow(), warning);
                skipped += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files created", format!("{}", report.files.len()).green());
    println!("  {} patched", format!("{}", applied).green());
    println!("  {} already applied", format!("{}", already).yellow());
    println!("  {} need manual changes", format!("{}", skipped).cyan());

    if !report.next_steps.is_empty() {
        println!();
        println!("{}", "Next steps:".bold());
        for (idx, step) in report.next_steps.iter().enumerate() {
            let mut lines = step.lines();
            if let Some(first) = lines.next() {
                println!("  {}. {}", idx + 1, first);
            }
            for line in lines {
                println!("       {}", line.dimmed());
            }
        }
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            println!("{}", "...".dimmed());
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => format!("-{}", change).red(),
                    ChangeTag::Insert => format!("+{}", change).green(),
                    ChangeTag::Equal => format!(" {}", change).normal(),
                };
                print!("{}", sign);
            }
        }
    }
    println!();
}
