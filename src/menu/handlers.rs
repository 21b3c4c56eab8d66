use crate::commands;
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 錯誤只顯示，不離開選單
fn report<T>(term: &Term, result: Result<T>) -> Result<()> {
    if let Err(e) = result {
        print_error(e);
    }
    pause(term)
}

fn print_error(e: impl Display) {
    eprintln!("{} {e:#}", style("錯誤:").red().bold());
}

pub fn run_ingest(term: &Term, config: &Config) -> Result<()> {
    report(term, commands::ingest(config))
}

pub fn run_rebuild(term: &Term, shutdown_signal: &Arc<AtomicBool>, config: &Config) -> Result<()> {
    report(term, commands::rebuild(config, shutdown_signal, false))
}

pub fn run_probe(term: &Term, shutdown_signal: &Arc<AtomicBool>, config: &Config) -> Result<()> {
    report(term, commands::probe(config, shutdown_signal))
}

pub fn run_preview(term: &Term, shutdown_signal: &Arc<AtomicBool>, config: &Config) -> Result<()> {
    report(term, commands::preview(config, shutdown_signal, false))
}

/// 伺服器結束後重設中斷旗標，回到選單
pub fn run_server(term: &Term, shutdown_signal: &Arc<AtomicBool>, config: &Config) -> Result<()> {
    let result = commands::serve(config, shutdown_signal, None);
    shutdown_signal.store(false, Ordering::SeqCst);
    report(term, result)
}
