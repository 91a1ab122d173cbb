use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "drape", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the products of a catalog.
    Products(ProductsArgs),
    /// Compose a product preview and write it as a PNG.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ProductsArgs {
    /// Catalog JSON.
    #[arg(long)]
    catalog: PathBuf,

    /// Only list one garment family.
    #[arg(long, value_enum)]
    category: Option<CategoryChoice>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Catalog JSON. Product image paths are resolved against its directory.
    #[arg(long)]
    catalog: PathBuf,

    /// Product id.
    #[arg(long)]
    product: String,

    /// Tint color as hex (`#RRGGBB` or `#RGB`). Defaults to the product's first color.
    #[arg(long)]
    color: Option<String>,

    /// Tint blend policy.
    #[arg(long, value_enum, default_value_t = BlendChoice::AlphaMultiply)]
    blend: BlendChoice,

    /// Design image to upload.
    #[arg(long)]
    design: Option<PathBuf>,

    /// JSON array of input events to replay after loading.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Also print the export as a data URI on stdout.
    #[arg(long)]
    data_uri: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CategoryChoice {
    Tshirt,
    Hoodie,
    Sweatshirt,
}

impl From<CategoryChoice> for drape::ProductCategory {
    fn from(c: CategoryChoice) -> Self {
        match c {
            CategoryChoice::Tshirt => drape::ProductCategory::Tshirt,
            CategoryChoice::Hoodie => drape::ProductCategory::Hoodie,
            CategoryChoice::Sweatshirt => drape::ProductCategory::Sweatshirt,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BlendChoice {
    AlphaMultiply,
    Multiply,
    Tint,
}

impl From<BlendChoice> for drape::TintBlend {
    fn from(b: BlendChoice) -> Self {
        match b {
            BlendChoice::AlphaMultiply => drape::TintBlend::AlphaMultiply,
            BlendChoice::Multiply => drape::TintBlend::Multiply,
            BlendChoice::Tint => drape::TintBlend::Tint,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Products(args) => cmd_products(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_products(args: ProductsArgs) -> anyhow::Result<()> {
    let catalog = drape::Catalog::from_path(&args.catalog)?;
    let products: Vec<&drape::ProductDescriptor> = match args.category {
        Some(c) => catalog.by_category(c.into()).collect(),
        None => catalog.products.iter().collect(),
    };
    for p in products {
        let colors: Vec<String> = p.colors.iter().map(|c| c.to_hex()).collect();
        println!(
            "{}\t{}\t{}x{}\t{}",
            p.id,
            p.name,
            p.canvas.width,
            p.canvas.height,
            colors.join(",")
        );
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let catalog = drape::Catalog::from_path(&args.catalog)?;
    let product = catalog
        .get(&args.product)
        .with_context(|| format!("product '{}' not in catalog", args.product))?
        .clone();

    let root = args.catalog.parent().unwrap_or_else(|| Path::new("."));
    let image_path = drape::Catalog::image_path(root, &product)?;
    let photo = std::fs::read(&image_path)
        .with_context(|| format!("read product image '{}'", image_path.display()))?;

    let color = match &args.color {
        Some(hex) => drape::Rgb8::from_hex(hex)?,
        None => product.default_color(),
    };

    let opts = drape::CompositorOpts::default().with_tint_blend(args.blend.into());
    let mut compositor = drape::Compositor::new(opts)?;
    compositor.set_color(color)?;
    expect_applied(compositor.load_product(product, &photo)?, "product image")?;

    if let Some(path) = &args.design {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read design '{}'", path.display()))?;
        expect_applied(compositor.load_design(&bytes), "design")?;
    }

    if let Some(path) = &args.events {
        let f = File::open(path).with_context(|| format!("open events '{}'", path.display()))?;
        for event in drape::InputEvent::list_from_reader(BufReader::new(f))? {
            compositor.dispatch(event)?;
        }
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let png = compositor.export_png()?;
    std::fs::write(&args.out, &png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    if args.data_uri {
        println!("{}", compositor.export_data_uri()?);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn expect_applied(outcome: drape::DecodeOutcome, what: &str) -> anyhow::Result<()> {
    match outcome {
        drape::DecodeOutcome::Applied => Ok(()),
        drape::DecodeOutcome::Stale => anyhow::bail!("{what} load was superseded"),
        drape::DecodeOutcome::Failed(msg) => anyhow::bail!("{what} could not be loaded: {msg}"),
    }
}
