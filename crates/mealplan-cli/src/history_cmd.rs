use anyhow::Result;

use mealplan_core::backend::HistoryEntry;
use mealplan_core::{ClientConfig, HttpBackend, MealPlanBackend};

const PREVIEW_WIDTH: usize = 60;

/// Execute `mealplan history`: list previously generated plans.
pub async fn run_history(config: &ClientConfig, limit: u32) -> Result<()> {
    let backend = HttpBackend::from_config(config)?;
    let history = backend.history(&config.user_id, limit).await?;

    if history.history.is_empty() {
        println!("No meal plans found for {}.", config.user_id);
        return Ok(());
    }

    println!("Meal plans for {} (newest first):", config.user_id);
    for entry in &history.history {
        println!("  {}", summary_line(entry));
    }

    Ok(())
}

fn summary_line(entry: &HistoryEntry) -> String {
    let created = entry
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let preview = entry
        .meal_plan_text()
        .as_deref()
        .and_then(|text| text.lines().find(|l| !l.trim().is_empty()))
        .map(|line| truncate(line.trim(), PREVIEW_WIDTH))
        .unwrap_or_else(|| "(no plan saved)".to_string());
    format!("#{:<5} {:<16}  {}", entry.id, created, preview)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}
