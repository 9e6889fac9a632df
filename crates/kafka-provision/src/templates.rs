//! Broker configuration and systemd unit templates

use std::error::Error as _;
use std::path::Path;

use tera::{Context, Tera};

use crate::context::InstallerContext;
use crate::error::StepError;

const SERVER_PROPERTIES: &str = include_str!("../templates/server.properties.tera");
const SERVICE_UNIT: &str = include_str!("../templates/kafka.service.tera");

/// Render `server.properties`. Only the log directory varies.
pub fn server_properties(log_dir: &Path) -> Result<String, StepError> {
    let mut context = Context::new();
    context.insert("log_dir", &log_dir.display().to_string());
    render("server.properties", SERVER_PROPERTIES, &context)
}

/// Render the systemd unit starting the broker with `config_file`
pub fn service_unit(ctx: &InstallerContext, config_file: &Path) -> Result<String, StepError> {
    let mut context = Context::new();
    context.insert("requires", &ctx.coordination_unit);
    context.insert("user", &ctx.service_user);
    context.insert("java_home", &ctx.java_home);
    context.insert("install_root", &ctx.install_root.display().to_string());
    context.insert("config_file", &config_file.display().to_string());
    render("kafka.service", SERVICE_UNIT, &context)
}

fn render(name: &str, template: &str, context: &Context) -> Result<String, StepError> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template)
        .and_then(|()| tera.render(name, context))
        .map_err(|e| {
            // tera keeps the useful part in the source chain
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                message = format!("{message}: {cause}");
                source = cause.source();
            }
            StepError::Render {
                name: name.to_string(),
                message,
            }
        })
}
