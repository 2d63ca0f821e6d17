use crate::cli::edit::edit_cmd;
use crate::cli::opts::*;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stockroom_core::index::memory::MemoryIndex;
use stockroom_core::{
    apply_discount_change, backfill_prices, cascade, fill_blank_fields, format_money,
    format_percent, parse_date, parse_money, product_id_of, quote_str, rebuild_from_scan,
    reconcile_folders, relocate_product, search_folders, sorted_folder_names, summarize,
    to_sell_candidates, DiscountChange, DiscountPolicy, FolderCategory, FolderIndex,
    FolderRoots, PriceFields, RelocateOutcome,
};
use stockroom_files::{
    archive_old_reports, backup_workbook, data_root, default_db_path, latest_previous_report,
    prepare_report_folder, report_file_name, FolderSettings, WorkbookSettings,
};
use stockroom_sqlite::SqliteIndex;
use stockroom_xlsx::{
    read_report_ids, read_workbook, save_row_updates, write_to_sell_report, PreviousReport,
};
use tracing::{info, warn};

/// Settings and index resolved from the global options.
pub struct Session {
    pub settings_dir: PathBuf,
    pub db_path: Option<PathBuf>,
    pub index_kind: IndexKind,
    pub today: NaiveDate,
}

impl Session {
    pub fn from_cli(args: &Cli) -> Result<Self> {
        let today = match &args.today {
            Some(raw) => parse_date(raw).context("--today")?,
            None => Local::now().date_naive(),
        };
        Ok(Self {
            settings_dir: args.settings_dir.clone().unwrap_or_else(data_root),
            db_path: args.db_path.clone(),
            index_kind: args.index.clone(),
            today,
        })
    }

    /// `today` at the current wall-clock time.
    pub fn now(&self) -> NaiveDateTime {
        self.today.and_time(Local::now().time())
    }

    pub fn folder_settings(&self) -> Result<FolderSettings> {
        FolderSettings::load(&self.settings_dir)?
            .ok_or_else(|| anyhow!("folder paths not set; run `stockroom settings folders`"))
    }

    pub fn workbook_settings(&self) -> Result<WorkbookSettings> {
        WorkbookSettings::load(&self.settings_dir)?
            .ok_or_else(|| anyhow!("workbook not set; run `stockroom settings workbook`"))
    }

    pub fn roots(&self) -> Result<FolderRoots> {
        Ok(self.folder_settings()?.roots()?)
    }

    pub async fn index(&self) -> Result<Arc<dyn FolderIndex>> {
        match self.index_kind {
            IndexKind::Sqlite => {
                let p = self
                    .db_path
                    .clone()
                    .unwrap_or_else(|| default_db_path(&self.settings_dir));
                if let Some(parent) = p.parent() {
                    fs::create_dir_all(parent).ok();
                }
                let s = SqliteIndex::open_file(&p).await?;
                Ok(Arc::new(s))
            }
            IndexKind::Memory => {
                let idx = MemoryIndex::new();
                let roots = self.roots()?;
                let paths: Vec<&Path> = roots.all().into_iter().map(|(_, p)| p).collect();
                rebuild_from_scan(&idx, &paths).await?;
                Ok(Arc::new(idx))
            }
        }
    }
}

pub async fn run_cli(args: Cli) -> Result<()> {
    let s = Session::from_cli(&args)?;
    match args.cmd {
        Command::Settings(cmd) => settings_cmd(&s, cmd),
        Command::Scan => scan_cmd(&s).await,
        Command::Search { terms } => search_cmd(&s, &terms.join(" ")).await,
        Command::Show { product_id, json } => show_cmd(&s, &product_id, json).await,
        Command::Price { fair_market_value } => {
            price_cmd(&fair_market_value);
            Ok(())
        }
        Command::Discount(d) => discount_cmd(d),
        Command::Edit(e) => edit_cmd(&s, e).await,
        Command::Relocate { product_id } => relocate_cmd(&s, &product_id).await,
        Command::Reconcile => reconcile_cmd(&s).await,
        Command::Backfill(b) => backfill_cmd(&s, b),
        Command::Report => report_cmd(&s),
        Command::Stats { json } => stats_cmd(&s, json),
        Command::Index(cmd) => index_cmd(&s, cmd).await,
    }
}

fn settings_cmd(s: &Session, cmd: SettingsCmd) -> Result<()> {
    match cmd {
        SettingsCmd::Show => {
            println!("settings dir\t{}", s.settings_dir.display());
            match FolderSettings::load(&s.settings_dir)? {
                Some(f) => {
                    println!("inventory\t{}", f.inventory.display());
                    println!("sold\t{}", f.sold.display());
                    match &f.to_sell {
                        Some(t) => println!("to sell\t{}", t.display()),
                        None => println!("to sell\t(not set)"),
                    }
                }
                None => println!("folders\t(not set)"),
            }
            match WorkbookSettings::load(&s.settings_dir)? {
                Some(w) => println!("workbook\t{}\t[{}]", w.path.display(), w.sheet),
                None => println!("workbook\t(not set)"),
            }
        }
        SettingsCmd::Folders {
            inventory,
            sold,
            to_sell,
        } => {
            for p in [Some(&inventory), Some(&sold), to_sell.as_ref()].into_iter().flatten() {
                if !p.is_dir() {
                    warn!(path = %p.display(), "folder does not exist yet");
                }
            }
            FolderSettings {
                inventory,
                sold,
                to_sell,
            }
            .save(&s.settings_dir)?;
            println!("folder paths saved");
        }
        SettingsCmd::Workbook { path, sheet } => {
            if !path.is_file() {
                warn!(path = %path.display(), "workbook does not exist yet");
            }
            WorkbookSettings { path, sheet }.save(&s.settings_dir)?;
            println!("workbook settings saved");
        }
    }
    Ok(())
}

async fn scan_cmd(s: &Session) -> Result<()> {
    let roots = s.roots()?;
    let paths: Vec<&Path> = roots.all().into_iter().map(|(_, p)| p).collect();
    let index = s.index().await?;
    let n = rebuild_from_scan(&*index, &paths).await?;
    println!("indexed {n} folders");
    Ok(())
}

async fn search_cmd(s: &Session, query: &str) -> Result<()> {
    let index = s.index().await?;
    let entries = index.list().await?;
    for name in search_folders(&entries, query) {
        println!("{name}");
    }
    Ok(())
}

async fn show_cmd(s: &Session, product_id: &str, as_json: bool) -> Result<()> {
    let wbs = s.workbook_settings()?;
    let wb = read_workbook(&wbs.path)?;
    let record = wb.sheet(&wbs.sheet)?.record(product_id)?;
    let folder = s.index().await?.get(&record.product_id).await?;
    let category = record.category(s.today);

    if as_json {
        let view = json!({
            "record": record,
            "folder": folder,
            "category": category,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}\t{}", record.product_id, record.product_name);
    println!("category\t{}", category.label());
    match folder {
        Some(p) => println!("folder\t{}", p.display()),
        None => println!("folder\t(not indexed)"),
    }
    print_prices(&record.prices);
    if let Some(d) = record.to_sell_after {
        println!("to sell after\t{}", d.format(stockroom_core::DATE_FORMAT));
    }
    if record.flags.sold {
        let date = record
            .sale
            .sold_date
            .map(|d| d.format(stockroom_core::DATE_FORMAT).to_string())
            .unwrap_or_default();
        let price = record.sale.sold_price.map(format_money).unwrap_or_default();
        println!(
            "sold\t{date}\t{price}\t{}",
            record.sale.payment_type.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn print_prices(p: &PriceFields) {
    println!("price\t{}", format_money(p.product_price));
    println!("ivu\t{}", format_money(p.ivu_tax));
    println!("price after ivu\t{}", format_money(p.price_after_ivu));
    println!(
        "discount\t{}\t{}",
        format_money(p.discount),
        format_percent(p.discount_percentage)
    );
    println!("price after discount\t{}", format_money(p.price_after_discount));
    println!("ivu after discount\t{}", format_money(p.ivu_after_discount));
    println!("final\t{}", format_money(p.price_after_ivu_and_discount));
}

fn price_cmd(fair_market_value: &str) {
    let q = quote_str(fair_market_value);
    println!("regular price\t{}", format_money(q.regular_product_price));
    println!("ivu\t{}", format_money(q.ivu_tax));
    println!("total\t{}", format_money(q.total_price));
    println!("baseline discount\t{}", format_money(q.price_discount));
    let fields = q.with_baseline_discount();
    println!("after discount\t{}", format_money(fields.price_after_ivu_and_discount));
}

fn discount_cmd(d: DiscountArgs) -> Result<()> {
    let price = parse_money(&d.price_after_ivu);
    let base = cascade(price, Decimal::ZERO, Decimal::ZERO);
    let fields = match (d.amount, d.percentage) {
        (Some(_), Some(_)) => bail!("give either --amount or --percentage, not both"),
        (Some(a), None) => apply_discount_change(&base, DiscountChange::Amount(parse_money(&a))),
        (None, Some(p)) => {
            apply_discount_change(&base, DiscountChange::Percentage(parse_money(&p)))
        }
        (None, None) => base,
    };
    print_prices(&fields);
    Ok(())
}

async fn relocate_cmd(s: &Session, product_id: &str) -> Result<()> {
    let roots = s.roots()?;
    let wbs = s.workbook_settings()?;
    let record = read_workbook(&wbs.path)?.sheet(&wbs.sheet)?.record(product_id)?;
    let index = s.index().await?;
    match relocate_product(&*index, &roots, &record, s.today).await? {
        RelocateOutcome::Moved { from, to, category } => {
            println!("{} -> {} ({})", from.display(), to.display(), category.label());
        }
        RelocateOutcome::Unchanged { path, category } => {
            println!("{} already in {}", path.display(), category.label());
        }
    }
    Ok(())
}

async fn reconcile_cmd(s: &Session) -> Result<()> {
    let roots = s.roots()?;
    let wbs = s.workbook_settings()?;
    let records = read_workbook(&wbs.path)?.sheet(&wbs.sheet)?.records();
    let index = s.index().await?;
    let report = reconcile_folders(&*index, &roots, &records, s.today).await?;

    for (from, to) in &report.moved {
        println!("moved\t{}\t{}", from.display(), to.display());
    }
    for name in &report.unmatched {
        println!("no row\t{name}");
    }
    for (name, err) in &report.failed {
        println!("failed\t{name}\t{err}");
    }
    println!(
        "{} moved, {} in place, {} without a row, {} failed",
        report.moved.len(),
        report.unchanged,
        report.unmatched.len(),
        report.failed.len()
    );
    Ok(())
}

fn backfill_cmd(s: &Session, b: BackfillArgs) -> Result<()> {
    let wbs = s.workbook_settings()?;
    let mut wb = read_workbook(&wbs.path)?;
    let sheet = wb.sheet_mut(&wbs.sheet)?;
    let before = sheet.rows.clone();

    let policy = if b.preserve_discount {
        DiscountPolicy::PreserveExisting
    } else {
        DiscountPolicy::FixedBaseline
    };
    let priced = backfill_prices(&mut sheet.rows, policy);
    let filled = fill_blank_fields(&mut sheet.rows);
    println!(
        "{priced} rows priced, {} ASINs filled, {} to-sell dates filled",
        filled.asin, filled.to_sell_after
    );

    if b.dry_run || (priced == 0 && filled.asin == 0 && filled.to_sell_after == 0) {
        return Ok(());
    }
    let folders = s.folder_settings()?;
    backup_workbook(&wbs.path, &folders.inventory, s.now())
        .context("backup failed; workbook not changed")?;
    let rows = save_row_updates(&wbs.path, &wbs.sheet, &sheet.changes_since(&before))?;
    info!(path = %wbs.path.display(), rows, "workbook backfilled");
    Ok(())
}

fn report_cmd(s: &Session) -> Result<()> {
    let folders = s.folder_settings()?;
    let roots = folders.roots()?;
    let wbs = s.workbook_settings()?;

    let ids_in_to_sell = top_level_ids(&roots.to_sell)?;
    let report_folder = prepare_report_folder(&roots.to_sell, s.today)?;

    let previous = match latest_previous_report(&report_folder, &folders.inventory, s.today) {
        Some((path, date)) => match read_report_ids(&path) {
            Ok(ids) => PreviousReport {
                date: Some(date),
                ids,
            },
            Err(e) => {
                warn!(error = %e, path = %path.display(), "previous report unreadable");
                PreviousReport::default()
            }
        },
        None => PreviousReport::default(),
    };

    let records = read_workbook(&wbs.path)?.sheet(&wbs.sheet)?.records();
    let rows = to_sell_candidates(&records, &ids_in_to_sell, s.today);
    let target = report_folder.join(report_file_name(s.today));
    write_to_sell_report(&target, &wbs.sheet, &rows, &previous, s.now())?;
    let archived = archive_old_reports(&report_folder, &target, &folders.inventory)?;

    let new_count = rows
        .iter()
        .filter(|r| !previous.ids.contains(&r.product_id))
        .count();
    println!(
        "{} products in {} ({new_count} new, {archived} old reports archived)",
        rows.len(),
        target.display()
    );
    Ok(())
}

/// Product IDs of the folders directly under the to-sell root.
fn top_level_ids(to_sell: &Path) -> Result<HashSet<String>> {
    let mut ids = HashSet::new();
    for e in fs::read_dir(to_sell).with_context(|| format!("reading {}", to_sell.display()))? {
        let e = e?;
        if e.file_type()?.is_dir() {
            let id = product_id_of(&e.file_name().to_string_lossy());
            if !id.is_empty() {
                ids.insert(id);
            }
        }
    }
    Ok(ids)
}

fn stats_cmd(s: &Session, as_json: bool) -> Result<()> {
    let wbs = s.workbook_settings()?;
    let records = read_workbook(&wbs.path)?.sheet(&wbs.sheet)?.records();
    let summary = summarize(&records, s.today);

    if as_json {
        let per: serde_json::Map<String, serde_json::Value> = summary
            .per_category
            .iter()
            .map(|(c, t)| {
                (
                    c.label().to_string(),
                    json!({
                        "count": t.count,
                        "list_value": t.list_value.to_string(),
                        "average": t.average().to_string(),
                    }),
                )
            })
            .collect();
        let view = json!({
            "count": summary.totals.count,
            "list_value": summary.totals.list_value.to_string(),
            "average": summary.totals.average().to_string(),
            "per_category": per,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("category\tcount\tlist value\taverage");
    for c in FolderCategory::ALL {
        let t = summary.per_category.get(&c).cloned().unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}",
            c.label(),
            t.count,
            format_money(t.list_value),
            format_money(t.average())
        );
    }
    println!(
        "total\t{}\t{}\t{}",
        summary.totals.count,
        format_money(summary.totals.list_value),
        format_money(summary.totals.average())
    );
    Ok(())
}

async fn index_cmd(s: &Session, cmd: IndexCmd) -> Result<()> {
    let index = s.index().await?;
    let entries = index.list().await?;
    match cmd {
        IndexCmd::List => {
            for name in sorted_folder_names(&entries) {
                if let Some(e) = entries.iter().find(|e| e.folder == name) {
                    println!("{}\t{}", e.folder, e.path.display());
                }
            }
        }
        IndexCmd::Export { path } => {
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(["folder", "path"])?;
            for e in &entries {
                let path = e.path.to_string_lossy();
                wtr.write_record([e.folder.as_str(), path.as_ref()])?;
            }
            wtr.flush()?;
            println!("exported {} entries to {}", entries.len(), path.display());
        }
    }
    Ok(())
}

pub fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    stdin().read_line(&mut s)?;
    Ok(s)
}
