mod reclassify;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relabel_core::Category;
use relabel_db::PoolConfig;

#[derive(Debug, Parser)]
#[command(name = "relabel")]
#[command(about = "Catalog reclassification maintenance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reclassify records in a category using the canonical rule table
    Reclassify(reclassify::ReclassifyArgs),
    /// Print the category/subcategory distribution of the catalog
    Report {
        /// Restrict the report to a single category
        #[arg(long)]
        category: Option<Category>,
    },
    /// Edit a single record (admin path); brand values are run through the
    /// corrector before writing
    Set {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        sub_category: Option<String>,
        #[arg(long)]
        brand: Option<String>,
    },
    /// Run pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = relabel_core::load_app_config_from_env()?;
    let pool = relabel_db::connect_pool(&config.database_url, PoolConfig::from_app_config(&config))
        .await?;
    relabel_db::ping(&pool).await?;

    match cli.command {
        Commands::Reclassify(args) => {
            let any_failed = reclassify::run(&pool, &config, &args).await?;
            if any_failed {
                std::process::exit(1);
            }
        }
        Commands::Report { category } => report::run(&pool, category).await?,
        Commands::Set {
            id,
            category,
            sub_category,
            brand,
        } => {
            let corrections = relabel_core::BrandCorrections::from_app_config(&config)?;
            let patch = relabel_core::RecordPatch {
                category: category.map(|c| c.as_str().to_string()),
                sub_category,
                brand: brand.map(|b| corrections.correct(&b).to_string()),
            };
            if patch.is_empty() {
                anyhow::bail!(
                    "nothing to update: pass at least one of --category, --sub-category, --brand"
                );
            }
            let row = relabel_db::update_one(&pool, id, &patch).await?;
            println!(
                "updated record {}: category={} sub_category={} brand={}",
                row.id,
                row.category,
                row.sub_category.as_deref().unwrap_or("-"),
                row.brand.as_deref().unwrap_or("-")
            );
        }
        Commands::Migrate => {
            let applied = relabel_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
        }
    }

    Ok(())
}
