//! `cmdbsync resources`: inspect the resource catalog.

use serde::Serialize;
use tabled::Tabled;

use cmdbsync_core::ResourceSchema;

use crate::cli::{GlobalOpts, ResourcesArgs, ResourcesCommand};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Serializable view of one schema.
#[derive(Debug, Serialize)]
struct ResourceView {
    resource: String,
    category: String,
    table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    singleton: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    fields: Vec<String>,
}

impl From<&ResourceSchema> for ResourceView {
    fn from(schema: &ResourceSchema) -> Self {
        Self {
            resource: schema.token(),
            category: schema.category().to_owned(),
            table: schema.table().to_owned(),
            key: schema.key().map(str::to_owned),
            singleton: schema.is_singleton(),
            description: schema.description().map(str::to_owned),
            fields: schema.allowed_fields().iter().cloned().collect(),
        }
    }
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&ResourceView> for ResourceRow {
    fn from(view: &ResourceView) -> Self {
        Self {
            resource: view.resource.clone(),
            key: view.key.clone().unwrap_or_else(|| "(singleton)".into()),
            fields: view.fields.len(),
            description: view.description.clone().unwrap_or_default(),
        }
    }
}

fn detail(view: &ResourceView) -> String {
    let mut lines = vec![
        format!("Resource:  {}", view.resource),
        format!("Path:      /api/v2/cmdb/{}/{}", view.category, view.table),
        format!(
            "Key:       {}",
            view.key.as_deref().unwrap_or("(singleton, cannot be deleted)")
        ),
    ];
    if let Some(ref description) = view.description {
        lines.push(format!("About:     {description}"));
    }
    lines.push(format!("Fields:    {}", view.fields.join(", ")));
    lines.join("\n")
}

pub fn handle(args: ResourcesArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let registry = config::registry(cfg)?;

    match args.command {
        ResourcesCommand::List => {
            let views: Vec<ResourceView> =
                registry.iter().map(|s| ResourceView::from(s.as_ref())).collect();
            let out = output::render_list(&global.output, &views, |v| ResourceRow::from(v), |v| {
                v.resource.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ResourcesCommand::Show { resource } => {
            let schema = registry
                .lookup(&resource)
                .ok_or(CliError::NotFound { resource })?;
            let view = ResourceView::from(schema.as_ref());
            let out = output::render_single(&global.output, &view, detail, |v| v.fields.join("\n"));
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
