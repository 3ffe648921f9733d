pub mod domain;
pub mod services;

pub use domain::{
    CommandAction, CommandRequest, CommandResponse, CommandStatus, FilterPayload, OptionsPayload,
    PanelPayload, ResponseMeta, SelectionPayload,
};

use anyhow::{Context, Result};
use domain::{merge_json, parse_payload, CommandOutcome, ErrorEnvelope, HintKind};
use feats_filter::FilterConfig;
use std::path::PathBuf;
use std::time::Instant;

/// Settings resolved from flags and the environment before a request runs
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub catalog_path: PathBuf,
    pub config: FilterConfig,
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    fn effective_config(&self, overrides: Option<&serde_json::Value>) -> Result<FilterConfig> {
        let Some(overrides) = overrides else {
            return Ok(self.config.clone());
        };
        let mut merged = serde_json::to_value(&self.config)?;
        merge_json(&mut merged, overrides);
        let config: FilterConfig =
            serde_json::from_value(merged).context("Invalid config override in request")?;
        config
            .validate()
            .context("Invalid config override in request")?;
        Ok(config)
    }
}

pub async fn execute(request: CommandRequest, ctx: &CommandContext) -> CommandResponse {
    let started = Instant::now();
    let action = request.action;
    let catalog_path = request
        .catalog
        .as_deref()
        .map_or_else(|| ctx.catalog_path.clone(), PathBuf::from);

    let mut meta = ResponseMeta {
        catalog_path: Some(catalog_path.display().to_string()),
        config_path: ctx.config_path.as_ref().map(|p| p.display().to_string()),
        ..ResponseMeta::default()
    };

    let outcome = run(request, ctx, &catalog_path, &mut meta).await;
    meta.duration_ms = Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));

    match outcome {
        Ok(outcome) => CommandResponse {
            status: CommandStatus::Ok,
            message: None,
            error: None,
            hints: outcome.hints,
            data: outcome.data,
            meta,
        },
        Err(err) => {
            let message = format!("{err:#}");
            log::warn!("{} failed: {message}", action.as_str());
            CommandResponse::from_error(message, meta)
        }
    }
}

async fn run(
    request: CommandRequest,
    ctx: &CommandContext,
    catalog_path: &std::path::Path,
    meta: &mut ResponseMeta,
) -> Result<CommandOutcome> {
    let config = ctx.effective_config(request.config.as_ref())?;
    let mut session = services::open_session(catalog_path, config).await?;
    meta.catalog_records = session.catalog().map(|c| c.len());

    match request.action {
        CommandAction::Facets => CommandOutcome::from_value(services::facets(&session)?),
        CommandAction::Filter => {
            let payload: FilterPayload = parse_payload(request.payload)?;
            let output = services::filter(&mut session, &payload)?;
            let empty = output.empty_message.is_some();
            let outcome = CommandOutcome::from_value(output)?;
            Ok(if empty {
                outcome.with_hint(HintKind::Info, "Remove a filter indicator to widen results.")
            } else {
                outcome
            })
        }
        CommandAction::Options => {
            let payload: OptionsPayload = parse_payload(request.payload)?;
            CommandOutcome::from_value(services::options(&mut session, &payload)?)
        }
        CommandAction::Panel => {
            let payload: PanelPayload = parse_payload(request.payload)?;
            CommandOutcome::from_value(services::panel(&mut session, &payload)?)
        }
    }
}

/// Error envelope for a request that could not even be parsed
pub fn invalid_request(message: String) -> CommandResponse {
    let mut response = CommandResponse::from_error(message.clone(), ResponseMeta::default());
    response.error = Some(ErrorEnvelope {
        code: "invalid_request".to_string(),
        message,
        hint: Some(
            "Requests look like {\"action\": \"filter\", \"payload\": {\"selection\": {...}}}."
                .to_string(),
        ),
    });
    response
}
