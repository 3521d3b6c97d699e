//! Command execution - renders engine output for the terminal.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use rewards_core::{QueryFacade, RewardsEngine, UploadResult};

/// `rewardsctl upload`
pub fn upload(
    engine: &RewardsEngine,
    user: &str,
    date: Option<&str>,
    event_key: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = date
        .map(|s| {
            s.parse::<NaiveDate>()
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
        })
        .transpose()?;

    let result = engine.record_upload(user, date, event_key)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_upload_result(engine, &result);
    Ok(())
}

fn print_upload_result(engine: &RewardsEngine, result: &UploadResult) {
    if result.duplicate {
        println!(
            "{} duplicate event, nothing credited",
            "Already recorded:".yellow().bold()
        );
        return;
    }

    println!(
        "{} +{} points",
        "Upload recorded:".green().bold(),
        result.points_earned
    );

    for m in &result.earned_milestones {
        println!(
            "  {} {} (+{} points) - {}",
            "Milestone!".magenta().bold(),
            m.name,
            m.points,
            m.description
        );
    }

    if result.level_up {
        println!(
            "  {} level {} -> {}",
            "Level up!".cyan().bold(),
            result.previous_level,
            result.new_level
        );
        // Only the newly reached level's benefits are "new"
        if let Some(unlocked) = engine.level_benefits(result.new_level).last() {
            for b in &unlocked.benefits {
                println!("    unlocked: {} - {}", b.name.bold(), b.description);
            }
        }
    }
}

/// `rewardsctl stats`
pub fn stats(facade: &QueryFacade, user: &str, json: bool) -> Result<()> {
    let stats = facade.receipt_upload_stats(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let p = &stats.progression;
    println!("{}", format!("Progression for {}", p.user_id).bold());
    println!("  Level:          {}", p.level.to_string().cyan());
    println!("  Total points:   {}", p.total_points);
    println!("  Total uploads:  {}", p.total_uploads);
    println!("  Today's uploads: {}", p.daily_uploads);

    match stats.points_to_next_level {
        Some(needed) => println!("  Next level in:  {} points", needed),
        None => println!("  Next level:     {}", "top level reached".dimmed()),
    }

    match &stats.next_daily_milestone {
        Some(next) => println!(
            "  Next daily milestone: {} ({}/{})",
            next.name, next.current, next.threshold
        ),
        None => println!(
            "  Next daily milestone: {}",
            "all daily milestones reached".dimmed()
        ),
    }
    match &stats.next_total_milestone {
        Some(next) => println!(
            "  Next total milestone: {} ({}/{})",
            next.name, next.current, next.threshold
        ),
        None => println!(
            "  Next total milestone: {}",
            "all total milestones reached".dimmed()
        ),
    }

    if !p.recent_activity.is_empty() {
        println!("  Recent activity:");
        for day in &p.recent_activity {
            println!("    {}  {} uploads", day.date, day.uploads);
        }
    }

    Ok(())
}

/// `rewardsctl milestones`
pub fn milestones(facade: &QueryFacade, json: bool) -> Result<()> {
    let catalog = facade.receipt_milestones();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("{}", "Daily milestones".bold());
    for m in &catalog.daily {
        println!(
            "  {:>4} uploads/day  {} (+{} points)",
            m.threshold, m.name, m.points
        );
    }
    println!("{}", "Total milestones".bold());
    for m in &catalog.total {
        println!(
            "  {:>4} uploads      {} (+{} points)",
            m.threshold, m.name, m.points
        );
    }
    Ok(())
}

/// `rewardsctl benefits`
pub fn benefits(facade: &QueryFacade, level: u32, json: bool) -> Result<()> {
    let benefits = facade.level_benefits(level);

    if json {
        println!("{}", serde_json::to_string_pretty(&benefits)?);
        return Ok(());
    }

    for entry in &benefits {
        println!("{}", format!("Level {}", entry.level).bold());
        if entry.benefits.is_empty() {
            println!("  {}", "no benefits".dimmed());
        }
        for b in &entry.benefits {
            println!("  {} - {}", b.name, b.description);
        }
    }
    Ok(())
}
