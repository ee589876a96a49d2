//! Rendering of reconciliation reports shared by `reconcile` and `apply`.

use std::fmt::Write;

use serde_json::Value;
use tabled::Tabled;

use cmdbsync_core::TaskReport;

use crate::output;

/// One table row per task.
#[derive(Tabled)]
pub struct ReportRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Key")]
    mkey: String,
    #[tabled(rename = "HTTP")]
    http: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl ReportRow {
    pub fn new(report: &TaskReport, color: bool) -> Self {
        let meta = report.report.meta.as_ref();
        Self {
            resource: report.resource.clone(),
            status: output::status_cell(report, color),
            mkey: meta
                .and_then(|m| m.mkey.as_ref())
                .map(display_value)
                .unwrap_or_default(),
            http: meta
                .map(|m| format!("{} {}", m.http_method, m.http_status))
                .unwrap_or_default(),
            message: report.report.msg.clone().unwrap_or_default(),
        }
    }
}

/// `resource<TAB>status` for plain output.
pub fn plain_line(report: &TaskReport) -> String {
    format!("{}\t{}", report.resource, output::status_word(report))
}

/// Key/value detail view for a single report.
pub fn detail(report: &TaskReport, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Resource:  {}", report.resource);
    let _ = writeln!(out, "Status:    {}", output::status_cell(report, color));

    if let Some(ref meta) = report.report.meta {
        let _ = writeln!(out, "Reply:     {} ({} {})", meta.status, meta.http_method, meta.http_status);
        if let Some(ref mkey) = meta.mkey {
            let _ = writeln!(out, "Key:       {}", display_value(mkey));
        }
        if let Some(ref vdom) = meta.vdom {
            let _ = writeln!(out, "VDOM:      {vdom}");
        }
        if let Some(ref revision) = meta.revision {
            let _ = writeln!(out, "Revision:  {revision}");
        }
    }
    if let Some(ref msg) = report.report.msg {
        let _ = writeln!(out, "Message:   {msg}");
    }

    out.trim_end().to_owned()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
