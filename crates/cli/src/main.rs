use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use command::{
    CommandAction, CommandContext, CommandRequest, CommandResponse, FilterPayload, OptionsPayload,
    SelectionPayload,
};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

mod command;
mod config;
mod render;

#[derive(Parser)]
#[command(name = "feats")]
#[command(about = "Browse and filter a feat catalog by facet", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// Filter config file, TOML or JSON (overrides FEATS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog JSON file (overrides FEATS_CATALOG; default: ./feats.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List primary facet values (Type, Ancestry, Class, Tier)
    Facets(FacetsArgs),

    /// Filter the catalog and print matching feats
    Filter(FilterArgs),

    /// Show the secondary panel options for the primary selection
    Options(OptionsArgs),

    /// Execute a JSON Command API request
    Command(CommandArgs),
}

#[derive(Args)]
struct FacetsArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PrimaryArgs {
    /// Category to include (repeatable)
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// Ancestry to include (repeatable)
    #[arg(long)]
    ancestry: Vec<String>,

    /// Class to include (repeatable)
    #[arg(long)]
    class: Vec<String>,

    /// Tier a feat must offer (repeatable)
    #[arg(long)]
    tier: Vec<String>,
}

#[derive(Args)]
struct FilterArgs {
    #[command(flatten)]
    primary: PrimaryArgs,

    /// Parent trait to include (repeatable)
    #[arg(long)]
    parent: Vec<String>,

    /// Feat id to include (repeatable)
    #[arg(long)]
    feat: Vec<String>,

    /// Spell level to include, e.g. 3rd (repeatable)
    #[arg(long)]
    spell_level: Vec<String>,

    /// Required feature level to include, e.g. 5th (repeatable)
    #[arg(long)]
    feature_level: Vec<String>,

    /// Show only tier descriptions for the selected tiers
    #[arg(long)]
    only_selected_tiers: bool,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct OptionsArgs {
    #[command(flatten)]
    primary: PrimaryArgs,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CommandArgs {
    /// Inline JSON request (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing the JSON request
    #[arg(long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

impl PrimaryArgs {
    fn selection(&self) -> SelectionPayload {
        SelectionPayload {
            types: self.types.clone(),
            ancestry: self.ancestry.clone(),
            class: self.class.clone(),
            tier: self.tier.clone(),
            ..SelectionPayload::default()
        }
    }
}

impl FilterArgs {
    fn payload(&self) -> FilterPayload {
        FilterPayload {
            selection: SelectionPayload {
                parent: self.parent.clone(),
                feat: self.feat.clone(),
                spell_level: self.spell_level.clone(),
                feature_level: self.feature_level.clone(),
                ..self.primary.selection()
            },
            only_selected_tiers: self.only_selected_tiers,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Facets(args) => args.json,
        Commands::Filter(args) => args.json,
        Commands::Options(args) => args.json,
        Commands::Command(_) => true,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let resolved = config::resolve_config(cli.config.as_deref())?;
    let ctx = CommandContext {
        catalog_path: config::resolve_catalog_path(cli.catalog.as_deref()),
        config: resolved.config,
        config_path: resolved.path,
    };

    match cli.command {
        Commands::Facets(args) => run_facets(args, &ctx).await?,
        Commands::Filter(args) => run_filter(args, &ctx).await?,
        Commands::Options(args) => run_options(args, &ctx).await?,
        Commands::Command(args) => run_command(args, &ctx).await?,
    }

    Ok(())
}

/// Print a JSON response and exit non-zero when it carries an error
fn print_json(response: &CommandResponse, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    println!("{output}");
    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_json(
    action: CommandAction,
    payload: impl serde::Serialize,
    ctx: &CommandContext,
) -> Result<()> {
    let request = CommandRequest {
        action,
        payload: serde_json::to_value(payload)?,
        config: None,
        catalog: None,
    };
    let response = command::execute(request, ctx).await;
    print_json(&response, true)
}

async fn run_facets(args: FacetsArgs, ctx: &CommandContext) -> Result<()> {
    if args.json {
        return run_json(CommandAction::Facets, serde_json::json!({}), ctx).await;
    }
    let session = command::services::open_session(&ctx.catalog_path, ctx.config.clone()).await?;
    let output = command::services::facets(&session)?;
    log::info!("{} feats in catalog", output.records);
    print!("{}", render::render_facets(&output.facets));
    Ok(())
}

async fn run_filter(args: FilterArgs, ctx: &CommandContext) -> Result<()> {
    let payload = args.payload();
    if args.json {
        return run_json(CommandAction::Filter, &payload, ctx).await;
    }
    let mut session =
        command::services::open_session(&ctx.catalog_path, ctx.config.clone()).await?;
    let output = command::services::filter(&mut session, &payload)?;
    print!("{}", render::render_indicators(&output.indicators));
    print!("{}", render::render_cards(&output.results));
    log::info!(
        "{} feats shown ({} in primary scope)",
        output.total,
        output.primary_subset
    );
    Ok(())
}

async fn run_options(args: OptionsArgs, ctx: &CommandContext) -> Result<()> {
    let payload = OptionsPayload {
        selection: args.primary.selection(),
    };
    if args.json {
        return run_json(CommandAction::Options, &payload, ctx).await;
    }
    let mut session =
        command::services::open_session(&ctx.catalog_path, ctx.config.clone()).await?;
    let view = command::services::options(&mut session, &payload)?;
    print!("{}", render::render_options(&view));
    Ok(())
}

async fn run_command(args: CommandArgs, ctx: &CommandContext) -> Result<()> {
    let raw = read_payload(&args)?;
    let response = match serde_json::from_str::<CommandRequest>(&raw) {
        Ok(request) => command::execute(request, ctx).await,
        Err(err) => command::invalid_request(format!("Invalid request: {err}")),
    };
    print_json(&response, args.pretty)
}

fn read_payload(args: &CommandArgs) -> Result<String> {
    if let Some(raw) = &args.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Command request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}
