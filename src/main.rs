use anyhow::Result;
use clap::Parser;
use console::{Term, style};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use video_preview_kit::cli::{Cli, Commands};
use video_preview_kit::config::Config;
use video_preview_kit::menu::show_main_menu;
use video_preview_kit::signal::setup_shutdown_signal;
use video_preview_kit::{commands, init};

fn main() -> Result<()> {
    init::init();
    let cli = Cli::parse();
    let shutdown_signal = setup_shutdown_signal()?;

    let mut config = Config::new(cli.config.as_deref())?;
    config.jobs_override = cli.jobs;

    let Some(command) = cli.command else {
        return run_menu(&shutdown_signal, &mut config);
    };

    match command {
        Commands::Ingest => {
            commands::ingest(&config)?;
        }
        Commands::Rebuild { all } => {
            commands::rebuild(&config, &shutdown_signal, all)?;
        }
        Commands::Probe => {
            commands::probe(&config, &shutdown_signal)?;
        }
        Commands::Preview { force } => {
            commands::preview(&config, &shutdown_signal, force)?;
        }
        Commands::Serve { bind } => {
            commands::serve(&config, &shutdown_signal, bind.as_deref())?;
        }
    }

    Ok(())
}

fn run_menu(shutdown_signal: &Arc<AtomicBool>, config: &mut Config) -> Result<()> {
    let term = Term::stdout();

    loop {
        match show_main_menu(&term, shutdown_signal, config) {
            Ok(true) if shutdown_signal.load(Ordering::SeqCst) => {
                info!("收到中斷訊號，程式結束");
                break;
            }
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("再見！").green().bold());
                info!("程式正常結束");
                break;
            }
            Err(e) => {
                warn!("程式錯誤: {e}");
                eprintln!("{} {}", style("錯誤:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
