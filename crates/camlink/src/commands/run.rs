//! `camlink run`: one correlation pass.

use std::time::Duration;

use tabled::Tabled;

use camlink_core::{CameraOutcome, Merger, OutcomeKind, RunReport};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Camera")]
    camera: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Via")]
    source: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Owner")]
    owner: String,
}

impl OutcomeRow {
    fn new(o: &CameraOutcome, color: bool) -> Self {
        Self {
            camera: o.camera.clone(),
            ip: o.ip.as_ref().map(ToString::to_string).unwrap_or_default(),
            source: o.source.as_ref().map(ToString::to_string).unwrap_or_default(),
            mac: o.mac.as_ref().map(ToString::to_string).unwrap_or_default(),
            outcome: output::paint_outcome(o.kind, color),
            owner: o.owner.clone().unwrap_or_default(),
        }
    }
}

fn plain_line(o: &CameraOutcome) -> String {
    format!(
        "{}\t{}\t{}",
        o.device_id,
        o.kind,
        o.mac.as_ref().map_or_else(|| "-".into(), ToString::to_string)
    )
}

/// One-line run summary for stderr.
fn summary(report: &RunReport) -> String {
    let elapsed = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();
    let elapsed = Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    let verb = if report.dry_run { "Would link" } else { "Linked" };
    format!(
        "{verb} {} of {} camera(s) ({} MAC mapping(s), {} Frigate address(es)) in {}",
        report.updated(),
        report.cameras,
        report.mac_mappings,
        report.frigate_cameras,
        humantime::format_duration(elapsed)
    )
}

// ── Rendering ───────────────────────────────────────────────────────

/// Print a finished run. Cameras already linked are hidden unless `all`.
pub fn print_report(report: &RunReport, global: &GlobalOpts, all: bool) {
    let color = output::should_color(&global.color);
    let shown: Vec<&CameraOutcome> = report
        .outcomes
        .iter()
        .filter(|o| all || o.kind != OutcomeKind::AlreadyLinked)
        .collect();

    let out = match global.output {
        OutputFormat::Table => {
            let rows: Vec<OutcomeRow> = shown.iter().map(|o| OutcomeRow::new(o, color)).collect();
            output::render_table(&rows)
        }
        OutputFormat::Plain => shown.iter().map(|o| plain_line(o)).collect::<Vec<_>>().join("\n"),
        _ => output::render_single(&global.output, report, |_| String::new(), |_| String::new()),
    };
    output::print_output(&out, global.quiet);

    if !global.quiet && matches!(global.output, OutputFormat::Table) {
        if let Some(ref err) = report.frigate_error {
            eprintln!("Frigate API unavailable, fallback strategies only: {err}");
        }
        eprintln!("{}", summary(report));
    }
}

pub async fn handle(merger: &Merger, args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let report = if args.dry_run {
        merger.plan().await?
    } else {
        merger.run().await?
    };
    print_report(&report, global, args.all);
    Ok(())
}

