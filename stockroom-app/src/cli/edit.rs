use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use stockroom_core::{
    apply_discount_change, needs_anchor, parse_date, parse_money, relocate_product, reprice,
    DiscountAnchor, DiscountChange, ProductRecord, RelocateOutcome,
};
use stockroom_files::backup_workbook;
use stockroom_xlsx::{read_workbook, save_row_updates};
use tracing::{info, warn};

use crate::cli::commands::{read_line, Session};
use crate::cli::opts::EditArgs;

/// `Some("")` clears, `Some(text)` sets, `None` leaves the value alone.
fn edit_text(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *target = v.trim().to_string();
    }
}

fn edit_date(target: &mut Option<chrono::NaiveDate>, value: &Option<String>, field: &str) -> Result<()> {
    if let Some(v) = value {
        *target = if v.trim().is_empty() {
            None
        } else {
            Some(parse_date(v).with_context(|| field.to_string())?)
        };
    }
    Ok(())
}

/// Applies the command-line edits to a copy of `current`.
///
/// `choose_anchor` is only called when the price-with-tax changes on a
/// record that carries a discount.
pub fn apply_edits(
    current: &ProductRecord,
    e: &EditArgs,
    choose_anchor: impl FnOnce() -> Result<DiscountAnchor>,
) -> Result<ProductRecord> {
    let mut r = current.clone();

    edit_text(&mut r.product_name, &e.name);
    edit_text(&mut r.product_description, &e.description);
    edit_text(&mut r.comments, &e.comments);
    edit_text(&mut r.order_link, &e.order_link);
    edit_text(&mut r.asin, &e.asin);
    edit_text(&mut r.rack_id, &e.rack_id);

    for (flag, value) in [
        (&mut r.flags.damaged, e.damaged),
        (&mut r.flags.personal, e.personal),
        (&mut r.flags.cancelled_order, e.cancelled_order),
        (&mut r.flags.reviewed, e.reviewed),
        (&mut r.flags.pictures_downloaded, e.pictures_downloaded),
        (&mut r.flags.uploaded_to_site, e.uploaded_to_site),
    ] {
        if let Some(v) = value {
            *flag = v;
        }
    }

    edit_date(&mut r.to_sell_after, &e.to_sell_after, "To Sell After")?;
    edit_date(&mut r.order_date, &e.order_date, "Order Date")?;
    edit_date(&mut r.sale.sold_date, &e.sold_date, "Sold Date")?;
    if let Some(p) = &e.sold_price {
        r.sale.sold_price = (!p.trim().is_empty()).then(|| parse_money(p));
    }
    if let Some(p) = &e.payment_type {
        r.sale.payment_type = Some(p.trim().to_string()).filter(|s| !s.is_empty());
    }

    if let Some(raw) = &e.price_after_ivu {
        let new_price = (!raw.trim().is_empty()).then(|| parse_money(raw));
        let anchor = match new_price {
            Some(p) if p > Decimal::ZERO && needs_anchor(&r.prices, p) => match e.keep {
                Some(k) => k.into(),
                None => choose_anchor()?,
            },
            _ => DiscountAnchor::Percentage,
        };
        r.prices = reprice(&r.prices, new_price, anchor);
    }

    let change = match (&e.discount, &e.discount_percentage) {
        (Some(_), Some(_)) => bail!("give either --discount or --discount-percentage, not both"),
        (Some(a), None) => Some(DiscountChange::Amount(parse_money(a))),
        (None, Some(p)) => Some(DiscountChange::Percentage(parse_money(p))),
        (None, None) => None,
    };
    if let Some(c) = change {
        if r.prices.price_after_ivu.is_zero() {
            warn!("discount edited on a product without a price");
        }
        r.prices = apply_discount_change(&r.prices, c);
    }

    r.normalize_sold();
    Ok(r)
}

fn prompt_anchor() -> Result<DiscountAnchor> {
    loop {
        let answer = read_line(
            "The price changed and a discount is set. Keep the discount [a]mount or [p]ercentage? ",
        )?;
        match answer.trim().to_lowercase().as_str() {
            "a" | "amount" => return Ok(DiscountAnchor::Amount),
            "p" | "percentage" | "percent" => return Ok(DiscountAnchor::Percentage),
            "" => bail!("no discount choice given"),
            _ => println!("please answer a or p"),
        }
    }
}

/// Edit, validate, back up, save, then move the folder. A failed save stops
/// before the folder is touched. The folder is checked even when no cell
/// changed, so a move interrupted after an earlier save is finished here.
pub async fn edit_cmd(s: &Session, e: EditArgs) -> Result<()> {
    let folders = s.folder_settings()?;
    let roots = folders.roots()?;
    let wbs = s.workbook_settings()?;

    let mut wb = read_workbook(&wbs.path)?;
    let sheet = wb.sheet_mut(&wbs.sheet)?;
    let current = sheet.record(&e.product_id)?;
    let before = sheet.rows.clone();

    let updated = apply_edits(&current, &e, prompt_anchor)?;
    updated.validate_for_save()?;
    sheet.update_record(&updated)?;
    let changes = sheet.changes_since(&before);

    if changes.is_empty() {
        println!("nothing to save");
    } else {
        if let Err(err) = backup_workbook(&wbs.path, &folders.inventory, s.now()) {
            warn!(error = %err, "workbook backup failed, saving anyway");
        }
        save_row_updates(&wbs.path, &wbs.sheet, &changes)
            .context("workbook not saved; folder left in place")?;
        info!(product_id = %updated.product_id, "product saved");
        println!("saved {}", updated.product_id);
    }

    if e.no_move {
        return Ok(());
    }
    let index = s.index().await?;
    match relocate_product(&*index, &roots, &updated, s.today).await {
        Ok(RelocateOutcome::Moved { to, category, .. }) => {
            println!("moved to {} ({})", to.display(), category.label());
        }
        Ok(RelocateOutcome::Unchanged { category, .. }) => {
            println!("folder already in {}", category.label());
        }
        Err(err) => bail!("folder not moved: {err}"),
    }
    Ok(())
}
