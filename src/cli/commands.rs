//! Command implementations for Unisearch CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use log::debug;

use crate::backend::lexical::LexicalClient;
use crate::backend::memory::{MemoryLexicalBackend, MemoryVectorBackend};
use crate::backend::opensearch::{OpenSearchLexicalClient, OpenSearchVectorClient};
use crate::backend::vector::VectorClient;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::SearchConfig;
use crate::search::dispatcher::QueryDispatcher;
use crate::search::request::{SearchRequest, Weighting};

/// Execute a CLI command.
///
/// Returns whether the command succeeded; a failed search is still printed.
pub async fn execute_command(args: UnisearchArgs) -> anyhow::Result<bool> {
    let config = load_config(&args)?;
    match &args.command {
        Command::Search(search_args) => run_search(search_args, config, &args).await,
        Command::Config => {
            print_config(&config, &args)?;
            Ok(true)
        }
    }
}

fn load_config(args: &UnisearchArgs) -> anyhow::Result<SearchConfig> {
    match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            SearchConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => Ok(SearchConfig::default()),
    }
}

async fn run_search(
    search_args: &SearchArgs,
    config: SearchConfig,
    cli_args: &UnisearchArgs,
) -> anyhow::Result<bool> {
    let request = build_request(search_args)?;
    let (lexical, vector) = build_backends(&search_args.backends, &config)?;
    let dispatcher = QueryDispatcher::new(config, lexical, vector)?;

    let response = dispatcher.handle(&request).await;
    print_response(&response, cli_args)?;
    Ok(response.success)
}

/// Assemble a request from a request file and/or flags. Flags win.
pub fn build_request(args: &SearchArgs) -> anyhow::Result<SearchRequest> {
    let mut request = match &args.request {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read request {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("malformed request {}", path.display()))?
        }
        None => SearchRequest::default(),
    };

    if let Some(query) = &args.query {
        request.lexical_query = Some(query.clone());
    }
    if let Some(mode) = args.mode {
        request.search_mode = Some(mode.into());
    }
    if let Some(embedding) = &args.embedding {
        request.embedding = Some(embedding.clone());
    }
    if let Some(path) = &args.embedding_file {
        request.embedding = Some(read_embedding(path)?);
    }
    if let Some(page) = args.page {
        request.page = page;
    }
    if let Some(page_size) = args.page_size {
        request.page_size = Some(page_size);
    }
    if let Some(file_type) = &args.file_type {
        request.file_type = Some(file_type.clone());
    }
    if let (Some(lexical), Some(vector)) = (args.lexical_weight, args.vector_weight) {
        request.weighting = Some(Weighting::new(lexical, vector));
    }

    Ok(request)
}

fn read_embedding(path: &Path) -> anyhow::Result<Vec<f32>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read embedding {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} must hold a JSON array of numbers", path.display()))
}

type Backends = (Box<dyn LexicalClient>, Box<dyn VectorClient>);

/// In-memory corpora take precedence over a configured cluster.
fn build_backends(args: &BackendArgs, config: &SearchConfig) -> anyhow::Result<Backends> {
    if args.uses_memory() {
        let lexical = match &args.lexical_corpus {
            Some(path) => MemoryLexicalBackend::from_jsonl(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => MemoryLexicalBackend::new(),
        };
        let vector = match &args.vector_corpus {
            Some(path) => MemoryVectorBackend::from_jsonl(path, config.vector_dimension)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => MemoryVectorBackend::new(config.vector_dimension),
        };
        debug!(
            "Using in-memory backends ({} lexical docs, {} vectors)",
            lexical.len(),
            vector.len()
        );
        return Ok((Box::new(lexical), Box::new(vector)));
    }

    let Some(opensearch) = &config.opensearch else {
        bail!("no backend configured: pass --lexical-corpus/--vector-corpus or set opensearch in the config file");
    };
    debug!("Using OpenSearch at {}", opensearch.endpoint);
    let lexical = OpenSearchLexicalClient::new(opensearch, config.lexical_timeout())?;
    let vector = OpenSearchVectorClient::new(
        opensearch,
        config.vector_dimension,
        config.vector_timeout(),
    )?;
    Ok((Box::new(lexical), Box::new(vector)))
}
