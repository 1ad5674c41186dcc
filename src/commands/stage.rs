//! Stage command implementation
//!
//! Stages every file of a manifest into the scratch directory, writing only
//! files whose content changed. With `--follow`, each line read from stdin
//! (for example from a file watcher piping change events) triggers another
//! pass; triggers that arrive while a pass is running coalesce into a single
//! follow-up pass.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use stagehand::defaults::ROOT_ENV_VAR;
use stagehand::filesystem::{DiskFs, MemoryFs, ScratchFs};
use stagehand::scratch::ScratchStore;
use stagehand::serializer::RunHandle;
use stagehand::stage::{stager, StageReport};

/// Arguments for the stage command
#[derive(Args, Debug)]
pub struct StageArgs {
    /// Path to the manifest file
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "STAGEHAND_MANIFEST",
        default_value = "stagehand.yaml"
    )]
    pub manifest: PathBuf,

    /// Scratch directory (defaults to the platform cache directory)
    #[arg(long, value_name = "PATH", env = ROOT_ENV_VAR)]
    pub root: Option<PathBuf>,

    /// Re-stage on every line read from stdin until it closes
    #[arg(short, long)]
    pub follow: bool,

    /// Stage into memory only; nothing is written to disk
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print one JSON report per pass
    #[arg(long)]
    pub json: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
    quiet: bool,
    dry_run: bool,
}

impl Output {
    fn report(&self, report: &StageReport) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(report)?);
            return Ok(());
        }
        if self.quiet {
            return Ok(());
        }

        println!(
            "✅ Stage pass {}: {} written, {} unchanged",
            report.pass, report.written, report.unchanged
        );
        println!(
            "   Scratch directory: {}",
            style(report.root.display()).dim()
        );
        if self.dry_run {
            println!("   🔎 DRY RUN - nothing was written to disk");
        }
        Ok(())
    }
}

/// Execute the stage command
pub async fn execute(args: StageArgs) -> Result<()> {
    if !args.manifest.exists() {
        anyhow::bail!("Manifest file not found: {}", args.manifest.display());
    }

    let output = Output {
        json: args.json,
        quiet: args.quiet,
        dry_run: args.dry_run,
    };

    let fs: Arc<dyn ScratchFs> = if args.dry_run {
        Arc::new(MemoryFs::new())
    } else {
        Arc::new(DiskFs)
    };
    let store = ScratchStore::open(super::scratch_config(args.root), fs).await?;
    let stage = stager(args.manifest, Arc::new(store));

    let report = stage.invoke().await?;
    output.report(&report)?;

    if args.follow {
        follow(|| stage.invoke(), output).await?;
    }
    Ok(())
}

/// Trigger a pass per stdin line and report each distinct pass once.
async fn follow<F>(invoke: F, output: Output) -> Result<()>
where
    F: Fn() -> RunHandle<StageReport>,
{
    follow_lines(BufReader::new(tokio::io::stdin()), invoke, output).await?;
    Ok(())
}

/// Trigger a pass per line of `input`. Finished reporters are reaped as
/// lines arrive, so only reporters of unfinished passes are held.
async fn follow_lines<R, F>(input: R, invoke: F, output: Output) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: Fn() -> RunHandle<StageReport>,
{
    let mut lines = input.lines();
    let mut last: Option<RunHandle<StageReport>> = None;
    let mut reporters = JoinSet::new();
    let mut reported = 0;

    while lines.next_line().await?.is_some() {
        while let Some(finished) = reporters.try_join_next() {
            finished?;
            reported += 1;
        }

        let handle = invoke();
        if last.as_ref().is_some_and(|previous| previous.ptr_eq(&handle)) {
            continue;
        }
        last = Some(handle.clone());
        reporters.spawn(async move {
            match handle.await {
                Ok(report) => {
                    if let Err(e) = output.report(&report) {
                        eprintln!("❌ {}", e);
                    }
                }
                Err(e) => eprintln!("❌ Stage pass failed: {}", e),
            }
        });
    }

    while let Some(finished) = reporters.join_next().await {
        finished?;
        reported += 1;
    }
    Ok(reported)
}
