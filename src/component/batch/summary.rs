use console::style;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// 因中斷而沒有處理到的數量
    #[must_use]
    pub const fn not_processed(&self) -> usize {
        self.total
            .saturating_sub(self.succeeded + self.skipped + self.failed)
    }
}

pub fn print_summary(title: &str, summary: &BatchSummary) {
    println!();
    println!("{}", style(format!("=== {title} ===")).cyan().bold());
    println!("  總數: {} 個", summary.total);
    println!("  成功: {} 個", style(summary.succeeded).green());
    if summary.skipped > 0 {
        println!("  跳過: {} 個", style(summary.skipped).yellow());
    }
    if summary.failed > 0 {
        println!("  失敗: {} 個", style(summary.failed).red());
    }
    let not_processed = summary.not_processed();
    if not_processed > 0 {
        println!("  未處理（已中斷）: {} 個", style(not_processed).dim());
    }
}
