use crate::{CellValue, CoreError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One spreadsheet row, keyed by header text.
pub type Row = BTreeMap<String, CellValue>;

pub mod columns {
    pub const PRODUCT_ID: &str = "Product ID";
    pub const PRODUCT_NAME: &str = "Product Name";
    pub const PRODUCT_DESCRIPTION: &str = "Product Description";
    pub const COMMENTS: &str = "Comments";
    pub const ORDER_LINK: &str = "Order Link";
    pub const ASIN: &str = "ASIN";
    pub const RACK_ID: &str = "Rack ID";

    pub const FAIR_MARKET_VALUE: &str = "Fair Market Value";
    pub const PRODUCT_PRICE: &str = "Product Price";
    pub const IVU_TAX: &str = "IVU Tax";
    pub const PRICE_AFTER_IVU: &str = "Product Price After IVU";
    pub const DISCOUNT: &str = "Discount";
    pub const DISCOUNT_PERCENTAGE: &str = "Discount Percentage";
    pub const PRICE_AFTER_DISCOUNT: &str = "Product Price After Discount";
    pub const IVU_AFTER_DISCOUNT: &str = "IVU Tax After Discount";
    pub const PRICE_AFTER_IVU_AND_DISCOUNT: &str = "Product Price After IVU and Discount";

    pub const SOLD: &str = "Sold";
    pub const DAMAGED: &str = "Damaged";
    pub const PERSONAL: &str = "Personal";
    pub const CANCELLED_ORDER: &str = "Cancelled Order";
    pub const REVIEWED: &str = "Reviewed";
    pub const PICTURES_DOWNLOADED: &str = "Pictures Downloaded";
    pub const UPLOADED_TO_SITE: &str = "Uploaded to Site";

    pub const TO_SELL_AFTER: &str = "To Sell After";
    pub const ORDER_DATE: &str = "Order Date";
    pub const SOLD_DATE: &str = "Sold Date";
    pub const SOLD_PRICE: &str = "Sold Price";
    pub const PAYMENT_TYPE: &str = "Payment Type";
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub sold: bool,
    pub cancelled_order: bool,
    pub damaged: bool,
    pub personal: bool,
    pub reviewed: bool,
    pub pictures_downloaded: bool,
    pub uploaded_to_site: bool,
}

/// The nine derived price columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFields {
    pub product_price: Decimal,
    pub ivu_tax: Decimal,
    pub price_after_ivu: Decimal,
    pub discount: Decimal,
    pub discount_percentage: Decimal,
    pub price_after_discount: Decimal,
    pub ivu_after_discount: Decimal,
    pub price_after_ivu_and_discount: Decimal,
}

impl PriceFields {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn has_discount(&self) -> bool {
        self.discount > Decimal::ZERO || self.discount_percentage > Decimal::ZERO
    }

    pub fn apply_to_row(&self, row: &mut Row) {
        use columns::*;
        for (k, v) in [
            (PRODUCT_PRICE, self.product_price),
            (IVU_TAX, self.ivu_tax),
            (PRICE_AFTER_IVU, self.price_after_ivu),
            (DISCOUNT, self.discount),
            (DISCOUNT_PERCENTAGE, self.discount_percentage),
            (PRICE_AFTER_DISCOUNT, self.price_after_discount),
            (IVU_AFTER_DISCOUNT, self.ivu_after_discount),
            (PRICE_AFTER_IVU_AND_DISCOUNT, self.price_after_ivu_and_discount),
        ] {
            row.insert(k.to_string(), CellValue::Number(crate::round_cents(v)));
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleInfo {
    pub sold_date: Option<NaiveDate>,
    pub sold_price: Option<Decimal>,
    pub payment_type: Option<String>,
}

impl SaleInfo {
    fn filled(&self) -> usize {
        [
            self.sold_date.is_some(),
            self.sold_price.is_some(),
            self.payment_type.as_deref().map(|p| !p.trim().is_empty()).unwrap_or(false),
        ]
        .into_iter()
        .filter(|x| *x)
        .count()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_name: String,
    pub product_description: String,
    pub comments: String,
    pub order_link: String,
    pub asin: String,
    pub rack_id: String,

    pub fair_market_value: Decimal,
    pub prices: PriceFields,
    pub flags: StatusFlags,

    pub to_sell_after: Option<NaiveDate>,
    pub order_date: Option<NaiveDate>,
    pub sale: SaleInfo,
}

impl ProductRecord {
    pub fn new(product_id: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into().trim().to_uppercase(),
            product_name: product_name.into(),
            ..Self::default()
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, CoreError> {
        use columns::*;
        let cell = |k: &str| row.get(k).cloned().unwrap_or_default();

        let product_id = cell(PRODUCT_ID).as_text().to_uppercase();
        if product_id.is_empty() {
            return Err(CoreError::Invalid("row has no Product ID"));
        }

        let sold_price = cell(SOLD_PRICE);
        let payment_type = cell(PAYMENT_TYPE).as_text();

        Ok(Self {
            product_id,
            product_name: cell(PRODUCT_NAME).as_text(),
            product_description: cell(PRODUCT_DESCRIPTION).as_text(),
            comments: cell(COMMENTS).as_text(),
            order_link: cell(ORDER_LINK).as_text(),
            asin: cell(ASIN).as_text(),
            rack_id: cell(RACK_ID).as_text(),
            fair_market_value: cell(FAIR_MARKET_VALUE).as_decimal(),
            prices: PriceFields {
                product_price: cell(PRODUCT_PRICE).as_decimal(),
                ivu_tax: cell(IVU_TAX).as_decimal(),
                price_after_ivu: cell(PRICE_AFTER_IVU).as_decimal(),
                discount: cell(DISCOUNT).as_decimal(),
                discount_percentage: cell(DISCOUNT_PERCENTAGE).as_decimal(),
                price_after_discount: cell(PRICE_AFTER_DISCOUNT).as_decimal(),
                ivu_after_discount: cell(IVU_AFTER_DISCOUNT).as_decimal(),
                price_after_ivu_and_discount: cell(PRICE_AFTER_IVU_AND_DISCOUNT).as_decimal(),
            },
            flags: StatusFlags {
                sold: cell(SOLD).as_bool(),
                cancelled_order: cell(CANCELLED_ORDER).as_bool(),
                damaged: cell(DAMAGED).as_bool(),
                personal: cell(PERSONAL).as_bool(),
                reviewed: cell(REVIEWED).as_bool(),
                pictures_downloaded: cell(PICTURES_DOWNLOADED).as_bool(),
                uploaded_to_site: cell(UPLOADED_TO_SITE).as_bool(),
            },
            to_sell_after: cell(TO_SELL_AFTER).as_date()?,
            order_date: cell(ORDER_DATE).as_date()?,
            sale: SaleInfo {
                sold_date: cell(SOLD_DATE).as_date()?,
                sold_price: (!sold_price.is_blank()).then(|| sold_price.as_decimal()),
                payment_type: (!payment_type.is_empty()).then_some(payment_type),
            },
        })
    }

    /// Writes the record's columns into `row`, leaving unrelated columns alone.
    pub fn apply_to_row(&self, row: &mut Row) {
        use columns::*;
        let money = |d: Decimal| CellValue::Number(crate::round_cents(d));

        self.prices.apply_to_row(row);
        for (k, v) in [
            (PRODUCT_ID, CellValue::Text(self.product_id.clone())),
            (PRODUCT_NAME, CellValue::from_text(self.product_name.clone())),
            (PRODUCT_DESCRIPTION, CellValue::from_text(self.product_description.clone())),
            (COMMENTS, CellValue::from_text(self.comments.clone())),
            (ORDER_LINK, CellValue::from_text(self.order_link.clone())),
            (ASIN, CellValue::from_text(self.asin.clone())),
            (RACK_ID, CellValue::from_text(self.rack_id.clone())),
            (FAIR_MARKET_VALUE, money(self.fair_market_value)),
            (SOLD, CellValue::from_bool(self.flags.sold)),
            (CANCELLED_ORDER, CellValue::from_bool(self.flags.cancelled_order)),
            (DAMAGED, CellValue::from_bool(self.flags.damaged)),
            (PERSONAL, CellValue::from_bool(self.flags.personal)),
            (REVIEWED, CellValue::from_bool(self.flags.reviewed)),
            (PICTURES_DOWNLOADED, CellValue::from_bool(self.flags.pictures_downloaded)),
            (UPLOADED_TO_SITE, CellValue::from_bool(self.flags.uploaded_to_site)),
            (TO_SELL_AFTER, CellValue::from_date(self.to_sell_after)),
            (ORDER_DATE, CellValue::from_date(self.order_date)),
            (SOLD_DATE, CellValue::from_date(self.sale.sold_date)),
            (SOLD_PRICE, self.sale.sold_price.map(money).unwrap_or_default()),
            (
                PAYMENT_TYPE,
                CellValue::from_text(self.sale.payment_type.clone().unwrap_or_default()),
            ),
        ] {
            row.insert(k.to_string(), v);
        }
    }

    /// `Sold` follows `Sold Date`: set when a date is present, cleared otherwise.
    pub fn normalize_sold(&mut self) {
        self.flags.sold = self.sale.sold_date.is_some();
    }

    /// Checks run before a record is written back to the workbook.
    pub fn validate_for_save(&self) -> Result<(), CoreError> {
        match self.sale.filled() {
            0 | 3 => Ok(()),
            _ => Err(CoreError::Invalid(
                "Sold Price, Sold Date and Payment Type must be filled together",
            )),
        }
    }
}

/// Folder name to absolute path, as kept by the folder index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderIndexEntry {
    pub folder: String,
    pub path: PathBuf,
}

impl FolderIndexEntry {
    pub fn new(folder: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            path: path.into(),
        }
    }

    /// Upper-cased text before the first space of the folder name.
    pub fn product_id(&self) -> String {
        product_id_of(&self.folder)
    }
}

pub fn product_id_of(folder_name: &str) -> String {
    folder_name
        .split(' ')
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase()
}
