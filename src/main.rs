//! meshflash - download and flash Meshtastic firmware
//!
//! Resolves a GitHub release, caches the platform bundle, picks the update
//! image for a board and drives the bundled `device-update.sh` script.

mod archive;
mod cache;
mod cli;
mod config;
mod download;
mod error;
mod firmware;
mod flash;
mod logging;
mod port;
mod preflight;
mod prompt;
mod releases;
mod utils;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::cache::BundleCache;
use crate::cli::Cli;
use crate::error::Result;
use crate::firmware::{MatchKind, Selection};
use crate::flash::{FlashOrchestrator, FlashPlan, ProcessRunner};
use crate::releases::GithubClient;
use crate::utils::{get_cache_dir, strip_archive_ext};

const MODULE: &str = "main";

async fn run(cli: Cli) -> Result<()> {
    let env_port = std::env::var(config::firmware::PORT_ENV).ok();
    let port = port::resolve_port(cli.port.as_deref(), env_port.as_deref())?;

    if cli.dry_run {
        log_debug!(MODULE, "Dry run: skipping esptool check");
    } else {
        preflight::require_esptool()?;
    }

    let query = cli.release_query();
    let client = GithubClient::new(&cli.repo, cli.github_token.clone())?;
    let release = releases::resolve_release(&client, &query).await?;

    let cache_root: PathBuf = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| get_cache_dir(config::app::NAME));
    let cache = BundleCache::new(cache_root);
    log_debug!(MODULE, "Bundle cache root: {}", cache.root().display());

    let platform = cli.firmware.token();
    let bundle = cache.ensure_bundle(&release, platform, &client).await?;

    let script = firmware::locate_flash_script(&bundle.path)?;
    let image = match firmware::select_image(&bundle.path, cli.board.as_deref(), &release.tag)? {
        Selection::Chosen(image) => image,
        Selection::Candidates(candidates) => {
            let stdin = io::stdin();
            prompt::choose_image(&candidates, &mut stdin.lock(), &mut io::stdout())?
        }
    };

    println!("\nRelease:      {} [{}]", release.tag, release.channel());
    if let Some(name) = &bundle.asset_name {
        println!("Bundle:       {}", strip_archive_ext(name));
    }
    println!(
        "Cache:        {}{}",
        bundle.path.display(),
        if bundle.downloaded { "" } else { " (cached)" }
    );
    println!("Flash script: {}", script.display());
    println!(
        "Image:        {}{}",
        image.filename,
        if image.match_kind == Some(MatchKind::Loose) {
            " (loose match)"
        } else {
            ""
        }
    );
    println!("Port:         {}", port);

    if !cli.yes && !cli.dry_run {
        let stdin = io::stdin();
        prompt::confirm_ready(&mut stdin.lock(), &mut io::stdout())?;
    }

    let plan = FlashPlan::new(&script, &image.path, &port, cli.change_mode, cli.dry_run);
    let mut orchestrator = FlashOrchestrator::new(ProcessRunner).echo(cli.verbose > 0);
    let outcome = orchestrator.execute(plan);
    log_debug!(
        MODULE,
        "Flash states: {}",
        orchestrator
            .history()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    if outcome.is_err() {
        log_debug!(MODULE, "Flash stopped in state {}", orchestrator.state());
    }
    let report = outcome?;
    log_debug!(MODULE, "Final state: {}", report.final_state);

    if report.previewed {
        println!(
            "\nDry run complete: {} command(s) shown, nothing was flashed.",
            report.commands.len()
        );
    } else {
        println!("\nFlashing complete: {} on {}", image.filename, port);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    log_info!(
        MODULE,
        "{} {} starting",
        config::app::NAME,
        env!("CARGO_PKG_VERSION")
    );

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_debug!(MODULE, "Run failed: {:?}", err);
            eprintln!("Error: {}", err);
            for hint in err.hints() {
                eprintln!("  {}", hint);
            }
            ExitCode::from(err.exit_code().clamp(1, 255) as u8)
        }
    }
}
