use std::path::PathBuf;

use chrono::Duration;
use clap::Args;
use slotplan_core::{EventFilter, ScheduleError, SlotScheduler};
use tracing::info;

use crate::plan::PlanFile;

#[derive(Args)]
pub struct ScheduleArgs {
    /// Plan file (JSON with tasks, slots, busy and events)
    #[arg(short, long)]
    input: PathBuf,
    /// Config file to use instead of ~/.config/slotplan/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Repeat the plan's slots over this many periods
    #[arg(long, conflicts_with = "until_fits")]
    periods: Option<u32>,
    /// Add periods until every task is placed, up to --max-periods
    #[arg(long)]
    until_fits: bool,
    /// Length of one period in hours
    #[arg(long, default_value_t = 24)]
    period_hours: i64,
    /// Upper bound for --until-fits
    #[arg(long, default_value_t = 14)]
    max_periods: u32,
    /// Pretty-print the result
    #[arg(long)]
    pretty: bool,
}

pub fn run(args: ScheduleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(args.config.as_deref())?;
    let plan = PlanFile::read(&args.input)?;
    let busy = plan.busy_intervals(&EventFilter::from_config(&config.calendar))?;
    let scheduler = SlotScheduler::with_config(config.scheduler);

    if args.periods.is_none() && !args.until_fits {
        let result = scheduler.schedule(&plan.tasks, &plan.slots, &busy)?;
        info!(
            placed = result.placements.len(),
            unplaced = result.unplaced.len(),
            "scheduled {}",
            args.input.display()
        );
        return super::print_json(&result, args.pretty);
    }

    let period = Duration::try_hours(args.period_hours).ok_or_else(|| {
        ScheduleError::InvalidPeriod(format!("{} hours is out of range", args.period_hours))
    })?;
    let run = match args.periods {
        Some(count) => {
            scheduler.schedule_periods(&plan.tasks, &plan.slots, &busy, period, count)?
        }
        None => scheduler.schedule_until_fits(
            &plan.tasks,
            &plan.slots,
            &busy,
            period,
            args.max_periods,
        )?,
    };
    info!(
        periods = run.periods,
        placed = run.result.placements.len(),
        unplaced = run.result.unplaced.len(),
        "scheduled {}",
        args.input.display()
    );

    super::print_json(&run, args.pretty)
}
