use super::Context;
use color_eyre::Result;
use serde_json::json;
use watch_progress_core::RecordOutcome;
use watch_progress_models::{format_time, ProgressReport};

pub fn run_record(context: &Context, report: &ProgressReport) -> Result<()> {
    let store = context.open_store()?;
    let output = &context.output;
    let outcome = store.record_progress(report);

    if output.format() != crate::output::OutputFormat::Human {
        output.json(&json!({
            "type": "record",
            "id": report.id,
            "outcome": outcome_name(outcome),
            "percentage": report.percentage(),
        }));
        return Ok(());
    }

    let position = format!("{} / {}", format_time(report.current_time), format_time(report.duration));
    match outcome {
        RecordOutcome::Saved => {
            output.success(format!("Saved {} at {} ({:.1}%)", report.title, position, report.percentage()))
        }
        RecordOutcome::Completed => output.success(format!("Finished {}, removed from history", report.title)),
        RecordOutcome::BelowThreshold => output.info(format!(
            "{} is only {:.1}% in, not saved yet",
            report.title,
            report.percentage()
        )),
        RecordOutcome::Rejected => output.warn("Report ignored: id must be set and duration must be positive"),
        RecordOutcome::Throttled => output.info("Write throttled"),
        RecordOutcome::StorageFailed => output.warn("Storage unavailable, progress was not saved"),
    }

    Ok(())
}

pub fn outcome_name(outcome: RecordOutcome) -> &'static str {
    match outcome {
        RecordOutcome::Saved => "saved",
        RecordOutcome::Completed => "completed",
        RecordOutcome::BelowThreshold => "below_threshold",
        RecordOutcome::Rejected => "rejected",
        RecordOutcome::Throttled => "throttled",
        RecordOutcome::StorageFailed => "storage_failed",
    }
}
