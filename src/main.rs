use std::net::SocketAddr;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use uniclass_search::{
    config::Config,
    render::{error_message, render_table, NO_RESULTS_MESSAGE},
    routes::create_router,
    utils::{init_logger, DEFAULT_LOG_FILTER},
    AppState, SearchPipeline,
};

#[derive(Parser)]
#[command(name = "uniclass-search", version, about = "Semantic search over Uniclass classification codes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print the results table
    Search {
        /// Free-text search term, e.g. "external wall"
        query: String,

        /// Number of matches to return
        #[arg(long)]
        top_k: Option<u32>,

        /// Pinecone namespace to search
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Start the web search page and JSON API
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Search { query, top_k, namespace } => {
            init_logger("uniclass_search=warn");
            let config = Config::from_env()?;
            run_search(&config, &query, top_k, namespace).await
        }
        Command::Serve { port } => {
            init_logger(DEFAULT_LOG_FILTER);
            let config = Config::from_env()?;
            serve(config, port).await
        }
    }
}

async fn run_search(
    config: &Config,
    query: &str,
    top_k: Option<u32>,
    namespace: Option<String>,
) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Enter a search term");
    }

    let mut pipeline = SearchPipeline::from_config(config)?;
    if let Some(top_k) = top_k {
        pipeline = pipeline.with_top_k(top_k)?;
    }
    if let Some(namespace) = namespace {
        pipeline = pipeline.with_namespace(namespace);
    }

    match pipeline.search(query).await {
        Ok(matches) if matches.is_empty() => println!("{}", NO_RESULTS_MESSAGE),
        Ok(matches) => {
            println!("Search Results:");
            println!("{}", render_table(&matches));
        }
        Err(e) => {
            eprintln!("{}", error_message(&e));
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let pipeline = SearchPipeline::from_config(&config)?;
    info!(
        model = %config.embedding.model,
        namespace = %pipeline.settings().namespace,
        top_k = pipeline.settings().top_k,
        "Search pipeline ready"
    );

    let app = create_router(AppState::new(pipeline));

    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
