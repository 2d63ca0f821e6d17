use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stockroom_core::DiscountAnchor;

#[derive(Debug, Clone, ValueEnum)]
pub enum IndexKind {
    /// Persistent index in the SQLite database
    Sqlite,
    /// Throwaway index rebuilt from a scan on every run
    Memory,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AnchorArg {
    Amount,
    Percentage,
}

impl From<AnchorArg> for DiscountAnchor {
    fn from(a: AnchorArg) -> Self {
        match a {
            AnchorArg::Amount => DiscountAnchor::Amount,
            AnchorArg::Percentage => DiscountAnchor::Percentage,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(name = "stockroom", version, about = "Reseller inventory: prices, discounts and product folders")]
pub struct Cli {
    /// Directory holding folders_paths.txt and excel_and_sheet_path.txt (defaults to app data dir)
    #[arg(long, global = true)]
    pub settings_dir: Option<PathBuf>,

    /// SQLite folder index path (defaults to inventory_management.db in the settings dir)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = IndexKind::Sqlite, global = true)]
    pub index: IndexKind,

    /// Log filter, e.g. `debug` or `stockroom_core=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Treat this date (MM/DD/YYYY) as today
    #[arg(long, global = true)]
    pub today: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show or change the settings files
    #[command(subcommand)]
    Settings(SettingsCmd),
    /// Rebuild the folder index from the folder roots
    Scan,
    /// Find product folders whose name contains every term
    Search { terms: Vec<String> },
    /// Show one product with its folder and category
    Show {
        product_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Price quote from a fair market value
    Price { fair_market_value: String },
    /// Discount breakdown for a price including IVU
    Discount(DiscountArgs),
    /// Edit a product row, save the workbook and move its folder
    Edit(EditArgs),
    /// Move one product's folder to where its row says it belongs
    Relocate { product_id: String },
    /// Move every misplaced product folder, then rebuild the index
    Reconcile,
    /// Fill missing prices, ASINs and To Sell After dates in the workbook
    Backfill(BackfillArgs),
    /// Write the products-to-sell report into the to-sell folder
    Report,
    /// Product counts and list value per folder category
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Folder index operations
    #[command(subcommand)]
    Index(IndexCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum SettingsCmd {
    Show,
    /// Set the inventory, sold and to-sell roots
    Folders {
        inventory: PathBuf,
        sold: PathBuf,
        to_sell: Option<PathBuf>,
    },
    /// Set the workbook path and inventory sheet name
    Workbook { path: PathBuf, sheet: String },
}

#[derive(Debug, Args, Clone)]
pub struct DiscountArgs {
    pub price_after_ivu: String,
    #[arg(long, conflicts_with = "percentage")]
    pub amount: Option<String>,
    #[arg(long)]
    pub percentage: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct EditArgs {
    pub product_id: String,

    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub comments: Option<String>,
    #[arg(long)]
    pub order_link: Option<String>,
    #[arg(long)]
    pub asin: Option<String>,
    #[arg(long)]
    pub rack_id: Option<String>,

    /// New price including IVU; an empty value wipes every price field
    #[arg(long)]
    pub price_after_ivu: Option<String>,
    #[arg(long, conflicts_with = "discount_percentage")]
    pub discount: Option<String>,
    #[arg(long)]
    pub discount_percentage: Option<String>,
    /// Which half of the discount survives a price change (prompted when omitted)
    #[arg(long, value_enum)]
    pub keep: Option<AnchorArg>,

    #[arg(long, value_parser = BoolishValueParser::new())]
    pub damaged: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub personal: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub cancelled_order: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub reviewed: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub pictures_downloaded: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub uploaded_to_site: Option<bool>,

    /// Dates are MM/DD/YYYY; an empty value clears the date
    #[arg(long)]
    pub to_sell_after: Option<String>,
    #[arg(long)]
    pub order_date: Option<String>,
    #[arg(long)]
    pub sold_date: Option<String>,
    #[arg(long)]
    pub sold_price: Option<String>,
    #[arg(long)]
    pub payment_type: Option<String>,

    /// Save the workbook but leave the folder where it is
    #[arg(long)]
    pub no_move: bool,
}

#[derive(Debug, Args, Clone)]
pub struct BackfillArgs {
    /// Keep a row's existing Discount Percentage instead of the 10% baseline
    #[arg(long)]
    pub preserve_discount: bool,
    /// Report what would change without writing the workbook
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum IndexCmd {
    List,
    /// Write the index as CSV (folder,path)
    Export { path: PathBuf },
}
