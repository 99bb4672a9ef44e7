use axum::{
    Router,
    routing::get,
    extract::{Query, State},
    response::Html,
};
use crate::models::{AppState, SearchParams};
use crate::render::{error_message, NO_RESULTS_MESSAGE};
use crate::types::{AppResult, Match};
use tracing::error;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/search", get(search_page))
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(render_page("", None))
}

async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let query = params.q.trim();
    if query.is_empty() {
        return Html(render_page("", None));
    }

    let outcome = state.pipeline.search(query).await;
    if let Err(e) = &outcome {
        error!(error = %e, "Search failed");
    }

    Html(render_page(query, Some(&outcome)))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_results(outcome: &AppResult<Vec<Match>>) -> String {
    match outcome {
        Err(e) => format!(
            r#"<div class="error">{}</div>"#,
            escape_html(&error_message(e))
        ),
        Ok(matches) if matches.is_empty() => format!("<p>{}</p>", NO_RESULTS_MESSAGE),
        Ok(matches) => {
            let rows: String = matches
                .iter()
                .map(|m| {
                    format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                        m.rank,
                        escape_html(&m.code),
                        escape_html(&m.title)
                    )
                })
                .collect();
            format!(
                "<p>Search Results:</p>\n<table>\n<thead><tr><th>#</th><th>code</th><th>title</th></tr></thead>\n<tbody>{}</tbody>\n</table>",
                rows
            )
        }
    }
}

/// Search form, followed by results or an error banner when a search ran
pub fn render_page(query: &str, outcome: Option<&AppResult<Vec<Match>>>) -> String {
    let results = outcome.map(render_results).unwrap_or_default();

    format!(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Uniclass Search Engine</title>
  <style>
    body {{ font-family: Arial, sans-serif; margin: 2rem; color: #1d1d1f; max-width: 960px; }}
    h1 {{ margin-bottom: 0.5rem; }}
    .card {{ border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }}
    label {{ display: block; margin-bottom: 0.5rem; font-weight: 600; }}
    input {{ width: 100%; padding: 0.5rem; box-sizing: border-box; }}
    button {{ margin-top: 1rem; padding: 0.6rem 1rem; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ border: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; }}
    .error {{ background: #fdecea; color: #611a15; padding: 0.75rem 1rem; border-radius: 6px; }}
  </style>
</head>
<body>
  <h1>Uniclass Search Engine</h1>

  <form class="card" method="get" action="/search">
    <label for="q">Enter a search term</label>
    <input id="q" name="q" value="{query}" autofocus />
    <button type="submit">Search</button>
  </form>

  <p>Prototype semantic search over the Uniclass classification. Queries are embedded with OpenAI and matched against a Pinecone index of Uniclass codes.</p>

  {results}
</body>
</html>"#,
        query = escape_html(query),
        results = results,
    )
}
