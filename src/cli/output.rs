//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{OutputFormat, UnisearchArgs};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::search::merger::MergedResult;
use crate::search::response::SearchResponse;

/// Print a search response in the requested format.
pub fn print_response(response: &SearchResponse, args: &UnisearchArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => print_json(response, args.pretty),
        OutputFormat::Human => {
            println!("{}", format_response(response, args.verbosity()));
            Ok(())
        }
    }
}

/// Print the effective configuration. Always JSON; `--pretty` is implied for
/// human output.
pub fn print_config(config: &SearchConfig, args: &UnisearchArgs) -> Result<()> {
    let pretty = args.pretty || args.output_format == OutputFormat::Human;
    print_json(config, pretty)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

/// Render a response as a plain-text table.
pub fn format_response(response: &SearchResponse, verbosity: u8) -> String {
    let mut out = String::new();

    if let Some(error) = &response.error {
        out.push_str(&format!("Search failed [{}]: {}", error.kind, error.message));
        return out;
    }
    let Some(data) = &response.data else {
        return out;
    };

    if verbosity > 0 {
        out.push_str(&format!(
            "{} search: {} result(s), page {} of {} (lexical hits: {}, vector hits: {})\n",
            data.query_type,
            data.total,
            data.page,
            data.total.div_ceil(data.page_size.max(1)).max(1),
            data.backend_hit_counts.lexical,
            data.backend_hit_counts.vector,
        ));
    }
    if let Some(failed) = data.failed_backend {
        out.push_str(&format!(
            "warning: {failed} backend failed, showing partial results\n"
        ));
    }

    let offset = (data.page - 1) * data.page_size;
    for (i, result) in data.results.iter().enumerate() {
        out.push_str(&format_result(offset + i + 1, result, verbosity));
        out.push('\n');
    }
    if data.results.is_empty() {
        out.push_str("No results.\n");
    }

    out.trim_end().to_string()
}

fn format_result(rank: usize, result: &MergedResult, verbosity: u8) -> String {
    let backends = result
        .contributing_backends
        .iter()
        .map(|b| b.as_str())
        .collect::<Vec<_>>()
        .join("+");
    let name = result
        .fields
        .get("file_name")
        .and_then(|v| v.as_str())
        .unwrap_or("-");

    let mut line = format!(
        "{rank:>4}. {:.4}  {backends:<14} {name}  {}",
        result.combined_score, result.id
    );
    if verbosity > 1 {
        if let Some(score) = result.lexical_score {
            line.push_str(&format!("  lexical={score:.4}"));
        }
        if let Some(score) = result.vector_score {
            line.push_str(&format!("  vector={score:.4}"));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::backend::types::BackendKind;
    use crate::error::UnisearchError;
    use crate::search::request::QueryType;
    use crate::search::response::{BackendHitCounts, SearchData};

    fn response() -> SearchResponse {
        SearchResponse::success(SearchData {
            results: vec![MergedResult {
                id: "/docs/a.pdf".to_string(),
                fields: BTreeMap::from([("file_name".to_string(), "a.pdf".into())]),
                combined_score: 0.68,
                contributing_backends: BTreeSet::from([BackendKind::Lexical, BackendKind::Vector]),
                lexical_score: Some(0.8),
                vector_score: Some(0.5),
            }],
            total: 11,
            page: 2,
            page_size: 10,
            query_type: QueryType::Hybrid,
            backend_hit_counts: BackendHitCounts {
                lexical: 6,
                vector: 6,
            },
            partial: true,
            failed_backend: Some(BackendKind::Vector),
        })
    }

    #[test]
    fn test_format_results() {
        let text = format_response(&response(), 2);
        assert!(text.starts_with("hybrid search: 11 result(s), page 2 of 2"));
        assert!(text.contains("warning: vector backend failed"));
        assert!(text.contains("  11. 0.6800  lexical+vector"));
        assert!(text.contains("a.pdf  /docs/a.pdf"));
        assert!(text.contains("lexical=0.8000"));
    }

    #[test]
    fn test_format_error() {
        let response = SearchResponse::failure(&UnisearchError::invalid_request("no query"));
        assert_eq!(
            format_response(&response, 1),
            "Search failed [InvalidRequest]: Invalid request: no query"
        );
    }
}
