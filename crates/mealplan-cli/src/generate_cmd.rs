use anyhow::{Result, bail};

use mealplan_core::{ClientConfig, MealPlanOutcome, MealPlanRequester};

/// Execute `mealplan generate`: run one request and print its outcome.
///
/// With `quiet`, only report that a plan was generated and leave the plan
/// itself unprinted.
pub async fn run_generate(config: &ClientConfig, quiet: bool) -> Result<()> {
    let requester = MealPlanRequester::from_config(config)?;

    println!(
        "Generating meal plan for {} via {}...",
        config.user_id,
        config.generate_url()
    );

    let outcome = requester.generate_meal_plan().await;
    match &outcome {
        MealPlanOutcome::Success { .. } => {
            println!("{}", render_success(&outcome, quiet));
            Ok(())
        }
        MealPlanOutcome::Failure { message } => {
            bail!("meal plan generation failed: {message}")
        }
    }
}

fn render_success(outcome: &MealPlanOutcome, quiet: bool) -> String {
    if quiet {
        "Meal plan generated.".to_string()
    } else {
        outcome.text().to_string()
    }
}
