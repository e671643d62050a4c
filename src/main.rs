use anyhow::Result;
use clap::{Parser, Subcommand};
use coffee_assistant::chat::{answer_question, run_session};
use coffee_assistant::config::AppConfig;
use coffee_assistant::dashboard::{
    preview, DashboardSummary, DatasetView, DEFAULT_CHART_WIDTH, EXPLORER_ROWS, ORDERS_PREVIEW_ROWS,
};
use coffee_assistant::data::text::text_block;
use coffee_assistant::data::CoffeeData;
use coffee_assistant::llm::ExplanationAdapter;
use coffee_assistant::resolver::is_blank_query;
use coffee_assistant::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coffee-assistant")]
#[command(about = "Coffee shop analytics dashboard and keyword chatbot")]
struct Args {
    /// Directory holding the eight CSV tables (or set COFFEE_DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Chat-completion model (or set OPENAI_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Order totals and a bar chart of the most ordered drinks
    Dashboard {
        #[arg(long, default_value_t = DEFAULT_CHART_WIDTH)]
        width: usize,
    },
    /// First rows of the merged orders/items view
    Orders {
        #[arg(short, long, default_value_t = ORDERS_PREVIEW_ROWS)]
        rows: usize,
    },
    /// Browse a dataset: merged, or any raw table (inventory, staff, ...)
    Explore {
        #[arg(default_value = "merged")]
        dataset: DatasetView,
        #[arg(short, long, default_value_t = EXPLORER_ROWS)]
        rows: usize,
    },
    /// Ask the chatbot a single question
    Ask {
        question: Vec<String>,
        /// Append an AI explanation (requires an API key)
        #[arg(long)]
        ai: bool,
    },
    /// Interactive chatbot session
    Chat {
        /// Do not request AI explanations even when a key is configured
        #[arg(long)]
        no_ai: bool,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env().with_overrides(args.data_dir, args.api_key, args.model);
    config.validate()?;

    if let Some(masked) = config.masked_key() {
        info!("OpenAI connected (key: {})", masked);
    }

    let data = Arc::new(CoffeeData::load(&config.data_dir)?);

    let adapter = ExplanationAdapter::from_config(config);
    if adapter.is_enabled() {
        info!("AI explanations use model {}", adapter.model());
    }

    match args.command {
        Command::Dashboard { width } => {
            let summary = DashboardSummary::build(&data)?;
            print!("{}", summary.render(width));
        }
        Command::Orders { rows } => {
            println!("Orders Preview");
            println!("{}", text_block(&preview(data.merged(), rows))?);
        }
        Command::Explore { dataset, rows } => {
            match dataset {
                DatasetView::Merged => println!("Dataset: merged orders and items"),
                DatasetView::Table(name) => println!(
                    "Dataset: {} ({})",
                    name,
                    data.data_dir().join(name.file_name()).display()
                ),
            }
            println!("{}", text_block(&preview(dataset.frame(&data), rows))?);
        }
        Command::Ask { question, ai } => {
            let question = question.join(" ");
            if is_blank_query(&question) {
                println!("Nothing to ask.");
                return Ok(());
            }
            print!("{}", answer_question(&data, &adapter, &question, ai).await?);
        }
        Command::Chat { no_ai } => {
            let stdin = std::io::stdin();
            run_session(&data, &adapter, !no_ai, stdin.lock(), std::io::stdout()).await?;
        }
        Command::Serve { addr } => {
            let state = Arc::new(AppState { data, adapter });
            server::serve(&addr, state).await?;
        }
    }

    Ok(())
}
