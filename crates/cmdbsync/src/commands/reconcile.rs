//! `cmdbsync reconcile`: converge one resource.

use tracing::debug;

use cmdbsync_core::{
    DesiredState, ReconcileError, ReconcileMode, ReconcileRequest, Reconciler, TaskReport,
    with_session,
};

use crate::cli::{GlobalOpts, ReconcileArgs};
use crate::commands::{report, util};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ReconcileArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let registry = config::registry(cfg)?;
    let Some(schema) = registry.lookup(&args.resource) else {
        return Err(CliError::NotFound {
            resource: args.resource,
        });
    };
    let mode = ReconcileMode::parse(&args.state)?;
    let data = desired_state(&args)?;

    if mode == ReconcileMode::Absent {
        if schema.is_singleton() {
            return Err(ReconcileError::AbsentUnsupported {
                resource: schema.token(),
            }
            .into());
        }
        let prompt = format!("Delete {} from the appliance?", schema.token());
        if !util::confirm(&prompt, "delete", global.yes)? {
            return Err(CliError::Aborted);
        }
    }

    let session_cfg = config::session_config(global, cfg)?;
    let session = session_cfg.open()?;

    let mut request = ReconcileRequest::new(schema.token(), mode, data)
        .with_scope(session_cfg.scope.clone());
    if let Some(ref mkey) = args.mkey {
        request = request.with_mkey(util::parse_mkey(mkey));
    }
    debug!(resource = %request.resource, %mode, vdom = %request.scope, "reconcile");

    let reconciler = Reconciler::new(registry);
    let reconciler = &reconciler;
    let request_ref = &request;
    let connection = session_cfg.connection();
    let outcome = with_session(&session, &connection, |s| reconciler.run(request_ref, s)).await;

    let task = TaskReport {
        resource: request.resource.clone(),
        report: outcome.report(),
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &task,
        |r| report::detail(r, color),
        report::plain_line,
    );
    output::print_output(&out, global.quiet);

    match outcome.into_error() {
        None => Ok(()),
        Some(ReconcileError::ApiFailure {
            status,
            http_status,
        }) => Err(CliError::Rejected {
            resource: request.resource,
            status,
            http_status,
        }),
        Some(other) => Err(other.into()),
    }
}

/// Merge `--from-file` with `--set` overrides (later wins).
fn desired_state(args: &ReconcileArgs) -> Result<DesiredState, CliError> {
    let mut data = match args.from_file {
        Some(ref path) => util::read_data_file(path)?,
        None => DesiredState::new(),
    };
    for raw in &args.set {
        let (field, value) = util::parse_assignment(raw)?;
        data.insert(field, value);
    }
    Ok(data)
}
