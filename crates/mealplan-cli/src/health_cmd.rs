use anyhow::{Result, bail};

use mealplan_core::{ClientConfig, HttpBackend, MealPlanBackend};

/// Execute `mealplan health`: probe the server's health endpoint.
pub async fn run_health(config: &ClientConfig) -> Result<()> {
    let backend = HttpBackend::from_config(config)?;
    let health = backend.health().await?;

    if !health.is_healthy() {
        bail!(
            "server at {} reports status {:?}",
            config.base_url,
            health.status
        );
    }

    println!("Server at {} is {}.", config.base_url, health.status);
    Ok(())
}
