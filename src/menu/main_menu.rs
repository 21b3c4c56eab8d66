use crate::config::{Config, save_settings};
use crate::menu::handlers::{run_ingest, run_preview, run_probe, run_rebuild, run_server};
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 影片預覽工具 ===").cyan().bold());
    println!("{}", style("按 ESC 離開").dim());

    let options = [
        "同步影片庫",
        "重建影片容器",
        "修復影片資訊（長度、尺寸、畫質）",
        "產生預覽圖",
        "啟動伺服器",
        "設定",
        "離開",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => run_ingest(term, config)?,
        Some(1) => run_rebuild(term, shutdown_signal, config)?,
        Some(2) => run_probe(term, shutdown_signal, config)?,
        Some(3) => run_preview(term, shutdown_signal, config)?,
        Some(4) => run_server(term, shutdown_signal, config)?,
        Some(5) => show_settings_menu(term, config)?,
        _ => return Ok(false),
    }

    Ok(true)
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style("=== 設定 ===").cyan().bold());
        println!("{}", style("按 ESC 返回").dim());
        println!(
            "\n{} {}",
            style("設定檔:").dim(),
            config.settings_path.display()
        );
        println!();

        let options = [
            format!("影片庫資料夾（{} 個）", config.settings.library_dirs.len()),
            format!(
                "預覽圖網格（{}x{}）",
                config.settings.sprite.cols, config.settings.sprite.rows
            ),
            format!("同時處理數量（{}）", config.effective_jobs()),
            "返回".to_string(),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇設定項目")
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => show_library_dirs_menu(term, config)?,
            Some(1) => edit_sprite_grid(config)?,
            Some(2) => edit_jobs(config)?,
            _ => break,
        }
    }

    Ok(())
}

fn show_library_dirs_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style("=== 影片庫資料夾 ===").cyan().bold());

    let mut items: Vec<String> = config
        .settings
        .library_dirs
        .iter()
        .map(|dir| format!("移除 {}", dir.display()))
        .collect();
    items.push("新增資料夾".to_string());

    let Some(selection) = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("選擇要移除的資料夾，或新增")
        .items(&items)
        .default(items.len() - 1)
        .interact_on_opt(term)?
    else {
        return Ok(());
    };

    if selection < config.settings.library_dirs.len() {
        config.settings.library_dirs.remove(selection);
    } else {
        let path: String = Input::new()
            .with_prompt("請輸入影片資料夾路徑")
            .interact_text()?;
        let path = PathBuf::from(path.trim());
        if !path.is_dir() {
            println!("{}", style(format!("資料夾不存在: {}", path.display())).red());
            std::thread::sleep(std::time::Duration::from_secs(1));
            return Ok(());
        }
        if config.settings.library_dirs.contains(&path) {
            return Ok(());
        }
        config.settings.library_dirs.push(path);
    }

    save_and_notify(config)
}

fn edit_sprite_grid(config: &mut Config) -> Result<()> {
    let cols: u32 = Input::new()
        .with_prompt("欄數")
        .default(config.settings.sprite.cols)
        .validate_with(|v: &u32| if *v > 0 { Ok(()) } else { Err("必須大於 0") })
        .interact_text()?;
    let rows: u32 = Input::new()
        .with_prompt("列數")
        .default(config.settings.sprite.rows)
        .validate_with(|v: &u32| if *v > 0 { Ok(()) } else { Err("必須大於 0") })
        .interact_text()?;

    config.settings.sprite.cols = cols;
    config.settings.sprite.rows = rows;
    save_and_notify(config)
}

fn edit_jobs(config: &mut Config) -> Result<()> {
    let jobs: usize = Input::new()
        .with_prompt("同時處理的影片數量")
        .default(config.settings.jobs)
        .validate_with(|v: &usize| if *v > 0 { Ok(()) } else { Err("必須大於 0") })
        .interact_text()?;

    config.settings.jobs = jobs;
    config.jobs_override = None;
    save_and_notify(config)
}

fn save_and_notify(config: &Config) -> Result<()> {
    save_settings(&config.settings_path, &config.settings)?;
    println!("\n{}", style("設定已儲存").green());
    std::thread::sleep(std::time::Duration::from_secs(1));
    Ok(())
}
