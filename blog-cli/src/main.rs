use std::sync::Arc;

use blog_server::application::catalog_service::CatalogService;
use blog_server::data::category_repository::PostgresCategoryRepository;
use blog_server::data::location_repository::PostgresLocationRepository;
use blog_server::infrastructure::database::{create_pool, run_migrations};
use clap::{Parser, Subcommand};
use uuid::Uuid;

type Catalog = CatalogService<PostgresCategoryRepository, PostgresLocationRepository>;

/// Manages the categories and locations posts are filed under.
#[derive(Parser, Debug)]
struct Cli {
    #[clap(long, env = "DATABASE_URL")]
    database_url: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(subcommand)]
    Category(CategoryCommand),
    #[clap(subcommand)]
    Location(LocationCommand),
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create {
        #[clap(long)]
        title: String,
        #[clap(long)]
        slug: String,
        #[clap(long, default_value = "")]
        description: String,
        /// Create the category hidden from readers.
        #[clap(long)]
        hidden: bool,
    },
    List,
    Publish {
        slug: String,
    },
    Hide {
        slug: String,
    },
    Delete {
        slug: String,
    },
}

#[derive(Subcommand, Debug)]
enum LocationCommand {
    Create {
        #[clap(long)]
        name: String,
        #[clap(long)]
        hidden: bool,
    },
    List,
    Publish {
        id: Uuid,
    },
    Hide {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
}

fn published(flag: bool) -> &'static str {
    if flag { "published" } else { "hidden" }
}

async fn run_category(
    catalog: &Catalog,
    command: CategoryCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        CategoryCommand::Create {
            title,
            slug,
            description,
            hidden,
        } => {
            let category = catalog
                .create_category(&title, &description, &slug, !hidden)
                .await?;
            println!("Category created: {} ({})", category.title, category.slug);
        }
        CategoryCommand::List => {
            let categories = catalog.list_categories().await?;
            println!("Categories ({})", categories.len());
            for category in categories {
                println!(
                    "- [{}] {} ({})",
                    category.slug,
                    category.title,
                    published(category.is_published)
                );
            }
        }
        CategoryCommand::Publish { slug } => {
            catalog.set_category_published(&slug, true).await?;
            println!("Category {slug} published");
        }
        CategoryCommand::Hide { slug } => {
            catalog.set_category_published(&slug, false).await?;
            println!("Category {slug} hidden");
        }
        CategoryCommand::Delete { slug } => {
            catalog.delete_category(&slug).await?;
            println!("Category {slug} deleted; its posts are now uncategorised");
        }
    }
    Ok(())
}

async fn run_location(
    catalog: &Catalog,
    command: LocationCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        LocationCommand::Create { name, hidden } => {
            let location = catalog.create_location(&name, !hidden).await?;
            println!("Location created! ID: {}", location.id);
        }
        LocationCommand::List => {
            let locations = catalog.list_locations().await?;
            println!("Locations ({})", locations.len());
            for location in locations {
                println!(
                    "- [{}] {} ({})",
                    location.id,
                    location.name,
                    published(location.is_published)
                );
            }
        }
        LocationCommand::Publish { id } => {
            catalog.set_location_published(id, true).await?;
            println!("Location {id} published");
        }
        LocationCommand::Hide { id } => {
            catalog.set_location_published(id, false).await?;
            println!("Location {id} hidden");
        }
        LocationCommand::Delete { id } => {
            catalog.delete_location(id).await?;
            println!("Location {id} deleted");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let pool = create_pool(&args.database_url, 2).await?;
    run_migrations(&pool).await?;

    let catalog = CatalogService::new(
        Arc::new(PostgresCategoryRepository::new(pool.clone())),
        Arc::new(PostgresLocationRepository::new(pool)),
    );

    match args.command {
        Command::Category(command) => run_category(&catalog, command).await?,
        Command::Location(command) => run_location(&catalog, command).await?,
    }

    Ok(())
}
