use std::path::PathBuf;

use clap::Args;
use slotplan_core::{capacity, EventFilter};

use crate::plan::PlanFile;

#[derive(Args)]
pub struct CapacityArgs {
    /// Plan file (JSON with tasks, slots, busy and events)
    #[arg(short, long)]
    input: PathBuf,
    /// Config file to use instead of ~/.config/slotplan/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

pub fn run(args: CapacityArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(args.config.as_deref())?;
    let plan = PlanFile::read(&args.input)?;
    let busy = plan.busy_intervals(&EventFilter::from_config(&config.calendar))?;

    let report = capacity::estimate(&plan.tasks, &plan.slots, &busy)?;
    super::print_json(&report, args.pretty)
}
