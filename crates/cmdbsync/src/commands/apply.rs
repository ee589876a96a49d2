//! `cmdbsync apply`: run a manifest of tasks in one session.

use tracing::info;

use cmdbsync_core::{
    Manifest, ReconcileMode, Reconciler, TaskOutcome, TaskReport, apply_manifest,
};

use crate::cli::{ApplyArgs, GlobalOpts};
use crate::commands::{report, util};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ApplyArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let manifest = Manifest::from_path(&args.manifest)?;
    let registry = config::registry(cfg)?;

    let deletes = manifest
        .tasks
        .iter()
        .filter(|t| matches!(ReconcileMode::parse(&t.state), Ok(ReconcileMode::Absent)))
        .count();
    if deletes > 0 {
        let prompt = format!("Manifest deletes {deletes} object(s). Continue?");
        if !util::confirm(&prompt, "apply", global.yes)? {
            return Err(CliError::Aborted);
        }
    }

    let session_cfg = config::session_config(global, cfg)?;
    let session = session_cfg.open()?;
    let reconciler = Reconciler::new(registry);

    info!(
        manifest = %args.manifest.display(),
        tasks = manifest.tasks.len(),
        "applying manifest"
    );
    let outcomes = apply_manifest(
        &reconciler,
        &manifest,
        &session_cfg.scope,
        &session,
        &session_cfg.connection(),
    )
    .await;

    let reports: Vec<TaskReport> = outcomes.iter().map(TaskOutcome::report).collect();
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &reports,
        |r| report::ReportRow::new(r, color),
        report::plain_line,
    );
    output::print_output(&out, global.quiet);

    let failed = reports.iter().filter(|r| r.report.failed).count();
    if failed > 0 {
        return Err(CliError::BatchFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}
