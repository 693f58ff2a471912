use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use epsview::cli::{CliArgs, Command};
use epsview::commands::{open_preview, render_files};
use epsview::logging::{self, LogTarget};
use epsview::preview::{ChannelNotifier, ConsoleNotifier, Notifier};
use epsview::session::SessionEvent;
use epsview::utils::{format_elapsed, format_size, format_time};
use epsview::{filesystem, tui, Config, Converter, PanelTarget, SessionContext, SessionRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();
    let target = if args.uses_dashboard() { LogTarget::File } else { LogTarget::Console };
    logging::init(args.verbose, target);

    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load(),
    };
    config.apply_env();
    config.apply_overrides(&args.overrides());
    tracing::debug!("Using {:?}", config);

    let panels = PanelTarget::File { out_dir: config.out_dir.clone() };

    match args.command {
        Command::Render { ref inputs, recursive } => {
            let files = filesystem::expand_inputs(inputs, recursive).context("Invalid input pattern")?;
            render(&files, &config, &panels).await
        }
        Command::Watch { ref inputs, recursive, no_tui } => {
            let files = filesystem::expand_inputs(inputs, recursive).context("Invalid input pattern")?;
            watch(&files, &config, &panels, !no_tui).await
        }
    }
}

async fn render(files: &[PathBuf], config: &Config, panels: &PanelTarget) -> anyhow::Result<ExitCode> {
    if files.is_empty() {
        eprintln!("{}", "No EPS files to render".yellow());
        return Ok(ExitCode::FAILURE);
    }

    let converter = Converter::from_config(config);
    let reports = render_files(files, &converter, panels).await;

    let mut failed = 0;
    for report in &reports {
        match report.result {
            Ok(outcome) => {
                let target = report
                    .location
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!(
                    "{} {} → {} ({}, {})",
                    "✓".green(),
                    report.source.display(),
                    target,
                    format_size(outcome.bytes),
                    format_elapsed(outcome.elapsed)
                );
            }
            Err(ref err) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), report.source.display(), err);
            }
        }
    }

    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn watch(
    files: &[PathBuf],
    config: &Config,
    panels: &PanelTarget,
    dashboard: bool,
) -> anyhow::Result<ExitCode> {
    if files.is_empty() {
        eprintln!("{}", "No EPS files to watch".yellow());
        return Ok(ExitCode::FAILURE);
    }

    let (events_tx, events_rx) = unbounded_channel();
    let notifier: Arc<dyn Notifier> = if dashboard {
        Arc::new(ChannelNotifier::new(events_tx.clone()))
    } else {
        Arc::new(ConsoleNotifier)
    };
    let ctx = SessionContext::new(Converter::from_config(config), notifier)
        .with_events(events_tx)
        .with_debounce(config.debounce());
    let mut registry = SessionRegistry::new(ctx);

    for file in files {
        open_preview(Some(file), panels, &mut registry).await;
    }

    if dashboard {
        tui::run(&mut registry, events_rx).await?;
    } else {
        print_events(events_rx).await;
        registry.close_all().await;
    }
    Ok(ExitCode::SUCCESS)
}

async fn print_events(mut events: UnboundedReceiver<SessionEvent>) {
    println!("{}", "Watching for changes, Ctrl-C to stop".dimmed());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Some(SessionEvent::Rendered { source, at, bytes, elapsed }) => println!(
                    "{} {} {} ({}, {})",
                    format_time(&at).dimmed(),
                    "rendered".green(),
                    source.display(),
                    format_size(bytes),
                    format_elapsed(elapsed)
                ),
                Some(SessionEvent::Failed { source, at, message }) => println!(
                    "{} {} {}: {}",
                    format_time(&at).dimmed(),
                    "failed".red(),
                    source.display(),
                    message
                ),
                Some(SessionEvent::Closed { source }) => {
                    println!("{} {}", "closed".dimmed(), source.display())
                }
                Some(SessionEvent::Notice { .. }) => {}
                None => break,
            },
        }
    }
}
