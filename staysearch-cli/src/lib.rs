mod cli;

pub use cli::{Cli, OutputMode};

use staysearch_core::config::{AppConfig, ConfigError, validate_query};
use staysearch_core::extract::{DecodeError, decode_search_results};
use staysearch_core::model::{AnthropicClient, TextGenerator};
use staysearch_core::process::ProcessLauncher;
use staysearch_core::report::{render_direct, render_tool_list};
use staysearch_core::session::{InvocationRequest, InvocationResult, SessionError, with_session};
use staysearch_core::summary::Summarizer;
use staysearch_core::SearchResultSet;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Applies command-line overrides on top of the loaded configuration.
pub fn apply_cli_overrides(cli: &Cli, config: &mut AppConfig) {
    let query = &mut config.search.query;
    if let Some(location) = &cli.location {
        query.location = location.clone();
    }
    if cli.check_in.is_some() {
        query.check_in = cli.check_in;
    }
    if cli.check_out.is_some() {
        query.check_out = cli.check_out;
    }
    if let Some(min) = cli.min_price {
        query.min_price = Some(min.to_string());
    }
    if let Some(max) = cli.max_price {
        query.max_price = Some(max.to_string());
    }
    if cli.adults.is_some() {
        query.adults = cli.adults;
    }
    if let Some(cursor) = &cli.cursor {
        query.cursor = Some(cursor.clone());
    }
    if let Some(tool) = &cli.tool {
        config.search.tool = tool.clone();
    }
    if let Some(limit) = cli.limit {
        config.report.limit = limit.max(1);
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting staysearch");
    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_cli_overrides(&cli, &mut config);
    validate_query(&config.search.query)?;
    debug!(?config.server, ?config.session, "Configuration resolved");

    let request = InvocationRequest::new(
        config.search.tool.clone(),
        config.search.query.to_arguments(),
    );
    let list_only = cli.list_tools;

    println!("Searching for listings in {}...", config.search.query.location);
    let fetched = with_session::<_, Option<InvocationResult>, CliError, _>(
        &ProcessLauncher,
        &config.server,
        config.session,
        move |session| {
            Box::pin(async move {
                session.initialize().await?;
                let tools = session.discover().await?;
                print!("{}", render_tool_list(&tools));
                if list_only {
                    return Ok(None);
                }
                if !tools.iter().any(|tool| tool.name == request.name) {
                    warn!(
                        operation = %request.name,
                        "tool is not advertised by the provider; invoking anyway"
                    );
                }
                match session.invoke(&request).await {
                    Ok(result) => Ok(Some(result)),
                    Err(err) => {
                        error!(
                            operation = %request.name,
                            arguments = %request.summary(),
                            error = %err,
                            "search invocation failed"
                        );
                        Err(err.into())
                    }
                }
            })
        },
    )
    .await?;

    let Some(result) = fetched else {
        return Ok(());
    };
    let results = decode(&result)?;
    info!(count = results.len(), "Search returned listings");

    let client = if cli.output.wants_summary() {
        AnthropicClient::from_config(&config.summarizer)
            .inspect_err(|err| warn!(error = %err, "text-generation client unavailable"))
            .ok()
    } else {
        None
    };
    let generator = client.as_ref().map(|client| client as &dyn TextGenerator);
    print!("{}", render_outputs(&config, &results, cli.output, generator).await);

    info!("staysearch finished");
    Ok(())
}

fn decode(result: &InvocationResult) -> Result<SearchResultSet, DecodeError> {
    decode_search_results(result).inspect_err(|err| {
        debug!(raw = %err.raw, "undecodable search payload");
    })
}

/// Builds the text printed after a successful search.
///
/// When a summary is wanted but cannot be produced, the direct report is
/// included instead so the fetched listings are never lost.
pub async fn render_outputs(
    config: &AppConfig,
    results: &SearchResultSet,
    mode: OutputMode,
    generator: Option<&dyn TextGenerator>,
) -> String {
    let limit = config.report.limit;
    let mut out = String::new();
    let mut direct_written = false;
    if mode.wants_summary() {
        out.push_str("\nSummarizing results...\n\n");
        match summarize(config, results, limit, generator).await {
            Some(text) => {
                out.push_str(&text);
                out.push('\n');
            }
            None if !mode.wants_direct() => {
                out.push_str(&render_direct(results, limit));
                out.push('\n');
                direct_written = true;
            }
            None => {}
        }
    }
    if mode.wants_direct() && !direct_written {
        out.push_str("\nDIRECT-FORMATTED RESULTS:\n");
        out.push_str(&render_direct(results, limit));
    }
    out
}

async fn summarize(
    config: &AppConfig,
    results: &SearchResultSet,
    limit: usize,
    generator: Option<&dyn TextGenerator>,
) -> Option<String> {
    let generator = generator?;
    let summarizer = Summarizer::new(config.summarizer.clone());
    match summarizer.summarize(results, limit, generator).await {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(error = %err, "summary unavailable, showing direct report instead");
            None
        }
    }
}

pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
