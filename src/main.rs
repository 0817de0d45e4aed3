use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use storefront_sync::catalog::ImageUpload;
use storefront_sync::health::HealthService;
use storefront_sync::logging::{self, LogTarget};
use storefront_sync::view::{Debouncer, SortMode, DEFAULT_MAX_PRICE};
use storefront_sync::{
  CachedCatalog, CatalogView, Category, CategoryDraft, Config, HttpCatalogClient, LocalStore,
  MemoryStorage, Product, ProductDraft, QueryClient, SqliteStorage, SyncStore,
};

#[derive(Parser, Debug)]
#[command(name = "storefront-sync")]
#[command(about = "Storefront catalog client that keeps working while the API is down")]
#[command(version)]
struct Cli {
  /// Path to config file (default: $XDG_CONFIG_HOME/storefront-sync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overriding the config file
  #[arg(long)]
  api_url: Option<String>,

  /// Keep local state in memory only
  #[arg(long)]
  memory: bool,

  /// Log to stderr instead of the log file
  #[arg(long)]
  log_stderr: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Product operations
  #[command(subcommand)]
  Products(ProductCommand),
  /// Category operations
  #[command(subcommand)]
  Categories(CategoryCommand),
  /// Upload an image and print its URL
  Upload {
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = Target::Product)]
    target: Target,
  },
  /// API connectivity checks
  #[command(subcommand)]
  Health(HealthCommand),
  /// Browse the product listing with filters and paging
  Shop(ShopArgs),
  /// Delete every locally held product
  ClearLocal,
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
  List,
  Get { id: i64 },
  Create(ProductArgs),
  Update {
    id: i64,
    #[command(flatten)]
    fields: ProductArgs,
  },
  Delete { id: i64 },
  /// Record a purchase
  Buy { id: i64 },
  MostRequested,
  BestSellers,
  ByCategory { category_id: i64 },
  Search { term: String },
}

#[derive(Args, Debug)]
struct ProductArgs {
  #[arg(long)]
  name: String,
  #[arg(long)]
  price: Option<f64>,
  #[arg(long)]
  category: Option<i64>,
  #[arg(long)]
  description: Option<String>,
  #[arg(long)]
  country: Option<String>,
  #[arg(long)]
  address: Option<String>,
  #[arg(long)]
  info: Option<String>,
  /// Image URL, may be repeated
  #[arg(long = "image")]
  images: Vec<String>,
  #[arg(long)]
  best_seller: bool,
}

impl From<ProductArgs> for ProductDraft {
  fn from(args: ProductArgs) -> Self {
    ProductDraft {
      name: args.name,
      description: args.description,
      price: args.price,
      category_id: args.category,
      images: args.images,
      best_seller: args.best_seller,
      country_of_origin: args.country,
      address: args.address,
      product_information: args.info,
    }
  }
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
  List,
  Get { id: i64 },
  Create(CategoryArgs),
  Update {
    id: i64,
    #[command(flatten)]
    fields: CategoryArgs,
  },
  Delete { id: i64 },
}

#[derive(Args, Debug)]
struct CategoryArgs {
  #[arg(long)]
  name: String,
  #[arg(long)]
  description: Option<String>,
  #[arg(long)]
  image: Option<String>,
}

impl From<CategoryArgs> for CategoryDraft {
  fn from(args: CategoryArgs) -> Self {
    CategoryDraft {
      name: args.name,
      description: args.description,
      image: args.image,
    }
  }
}

#[derive(Subcommand, Debug)]
enum HealthCommand {
  /// Probe the products endpoint once
  Check,
  /// Probe every main endpoint
  All,
  /// Keep probing until interrupted
  Watch {
    /// Seconds between checks (default from config)
    #[arg(long)]
    interval: Option<u64>,
  },
  /// Show the last stored result
  Last,
}

#[derive(Args, Debug)]
struct ShopArgs {
  #[arg(long, default_value = "")]
  search: String,
  #[arg(long, default_value_t = 0.0)]
  min: f64,
  #[arg(long, default_value_t = DEFAULT_MAX_PRICE)]
  max: f64,
  #[arg(long)]
  category: Option<i64>,
  /// price-asc, price-desc, best-seller or most-requested
  #[arg(long, default_value = "")]
  sort: String,
  #[arg(long, default_value_t = 1)]
  page: usize,
  /// Read search terms from stdin and re-render as they settle
  #[arg(long)]
  interactive: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
  Product,
  Category,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse();

  let target = if cli.log_stderr {
    LogTarget::Stderr
  } else {
    LogTarget::default_directory()?
  };
  let _log_guard = logging::init(target)?;

  let mut config = Config::load(cli.config.as_deref())?;
  if let Some(url) = &cli.api_url {
    config.api.base_url = url.clone();
  }

  if cli.memory || !config.storage.persist {
    run(cli.command, config, MemoryStorage::new()).await
  } else {
    let storage = match &config.storage.path {
      Some(path) => SqliteStorage::open(path)?,
      None => SqliteStorage::open_default()?,
    };
    run(cli.command, config, storage).await
  }
}

async fn run<S: LocalStore + 'static>(command: Command, config: Config, storage: S) -> Result<()> {
  let api = Arc::new(HttpCatalogClient::new(&config.api)?);
  let storage = Arc::new(storage);
  let store = SyncStore::from_shared(Arc::clone(&api), Arc::clone(&storage));
  let catalog = CachedCatalog::new(
    store,
    QueryClient::new().with_stale_time(config.catalog.stale_time()),
  );

  match command {
    Command::Products(cmd) => products(&catalog, cmd).await,
    Command::Categories(cmd) => categories(&catalog, cmd).await,
    Command::Upload { file, target } => {
      let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
      let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
      let upload = ImageUpload::from_file(file_name, bytes);

      let url = match target {
        Target::Product => catalog.store().upload_product_image(&upload).await?,
        Target::Category => catalog.store().upload_category_image(&upload).await?,
      };
      println!("{}", url);
      Ok(())
    }
    Command::Health(cmd) => {
      let service = HealthService::new(api, storage);
      health(&service, cmd, &config).await
    }
    Command::Shop(args) => shop(&catalog, args, &config).await,
    Command::ClearLocal => {
      catalog.clear_local()?;
      println!("Local products cleared");
      Ok(())
    }
  }
}

type Catalog<S> = CachedCatalog<HttpCatalogClient, S>;

async fn products<S: LocalStore>(catalog: &Catalog<S>, cmd: ProductCommand) -> Result<()> {
  match cmd {
    ProductCommand::List => print_products(&catalog.list_products().await),
    ProductCommand::Get { id } => print_json(&catalog.get_product(id).await?)?,
    ProductCommand::Create(args) => {
      let product = catalog.create_product(&args.into()).await?;
      print_json(&product)?;
    }
    ProductCommand::Update { id, fields } => {
      let product = catalog.update_product(id, &fields.into()).await?;
      print_json(&product)?;
    }
    ProductCommand::Delete { id } => {
      let origin = catalog.delete_product(id).await?;
      println!("Deleted product {} ({:?})", id, origin);
    }
    ProductCommand::Buy { id } => {
      let product = catalog.increment_purchase_count(id).await?;
      println!("{} purchased {} times", product.name, product.purchase_count);
    }
    ProductCommand::MostRequested => print_products(&catalog.most_requested().await),
    ProductCommand::BestSellers => print_products(&catalog.best_sellers().await),
    ProductCommand::ByCategory { category_id } => {
      print_products(&catalog.products_by_category(category_id).await)
    }
    ProductCommand::Search { term } => print_products(&catalog.search_products(&term).await),
  }
  Ok(())
}

async fn categories<S: LocalStore>(catalog: &Catalog<S>, cmd: CategoryCommand) -> Result<()> {
  match cmd {
    CategoryCommand::List => print_categories(&catalog.list_categories().await),
    CategoryCommand::Get { id } => print_json(&catalog.get_category(id).await?)?,
    CategoryCommand::Create(args) => print_json(&catalog.create_category(&args.into()).await?)?,
    CategoryCommand::Update { id, fields } => {
      print_json(&catalog.update_category(id, &fields.into()).await?)?
    }
    CategoryCommand::Delete { id } => {
      catalog.delete_category(id).await?;
      println!("Deleted category {}", id);
    }
  }
  Ok(())
}

async fn health<S: LocalStore + 'static>(
  service: &HealthService<HttpCatalogClient, S>,
  cmd: HealthCommand,
  config: &Config,
) -> Result<()> {
  match cmd {
    HealthCommand::Check => print_json(&service.check_api_health().await)?,
    HealthCommand::All => print_json(&service.test_all_endpoints().await)?,
    HealthCommand::Last => match service.last_health_status() {
      Some(status) => print_json(&status)?,
      None => println!("No health check recorded"),
    },
    HealthCommand::Watch { interval } => {
      let secs = interval.unwrap_or(config.health.interval_secs).max(1);
      let monitor = service.start_monitoring(Duration::from_secs(secs));
      let mut updates = monitor.subscribe();

      loop {
        tokio::select! {
          changed = updates.changed() => {
            if changed.is_err() {
              break;
            }
            if let Some(status) = updates.borrow_and_update().clone() {
              let state = if status.is_healthy { "up" } else { "DOWN" };
              println!("{} {} ({})", status.timestamp.to_rfc3339(), state, status.status);
            }
          }
          _ = tokio::signal::ctrl_c() => break,
        }
      }
    }
  }
  Ok(())
}

async fn shop<S: LocalStore>(catalog: &Catalog<S>, args: ShopArgs, config: &Config) -> Result<()> {
  let products = catalog.list_products().await;

  let mut view = CatalogView::new(config.catalog.page_size);
  view.set_search(args.search);
  view.set_price_range(args.min, args.max);
  view.set_category(args.category);
  view.set_sort(args.sort.parse::<SortMode>().unwrap_or_default());
  view.set_page(args.page);
  print_page(&mut view, &products);

  if !args.interactive {
    return Ok(());
  }

  println!("Type to search, :n / :p to page, :q to quit");
  let (debouncer, mut settled) = Debouncer::new(Duration::from_millis(config.search.debounce_ms));
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  loop {
    tokio::select! {
      line = lines.next_line() => {
        let Some(line) = line.map_err(|e| eyre!("Failed to read input: {}", e))? else {
          break;
        };
        match line.trim() {
          ":q" => break,
          ":n" => {
            view.next_page();
            print_page(&mut view, &products);
          }
          ":p" => {
            view.prev_page();
            print_page(&mut view, &products);
          }
          term => {
            debouncer.push(term.to_string());
          }
        }
      }
      Some(term) = settled.recv() => {
        view.set_search(term);
        print_page(&mut view, &products);
      }
    }
  }
  Ok(())
}

fn print_page(view: &mut CatalogView, products: &[Product]) {
  let page = view.render(products);
  for product in &page.items {
    print_product(product);
  }
  println!(
    "-- page {}/{} ({} products)",
    page.page,
    page.total_pages.max(1),
    page.total_items
  );
}

fn print_products(products: &[Product]) {
  if products.is_empty() {
    println!("No products");
  }
  for product in products {
    print_product(product);
  }
}

fn print_product(product: &Product) {
  let marker = if product.is_local { " [local]" } else { "" };
  println!(
    "{:>14}  {:<32} {:>10.2}  sold {}{}",
    product.id, product.name, product.price, product.purchase_count, marker
  );
}

fn print_categories(categories: &[Category]) {
  for category in categories {
    println!("{:>6}  {}", category.id, category.name);
  }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  let json =
    serde_json::to_string_pretty(value).map_err(|e| eyre!("Failed to format output: {}", e))?;
  println!("{}", json);
  Ok(())
}
