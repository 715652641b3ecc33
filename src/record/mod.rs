pub mod raw;

use crate::error::{LedgerError, Result};
use crate::filter::{DateRange, View};
use crate::loader::{PAID_AMOUNT, RawTable, SALES_VALUE};
use crate::money::Money;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use num_traits::Zero;
use raw::{Layout, RawRecord};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{info, warn};

pub const OUTSTANDING: &str = "outstanding";
pub const EXECUTIVE_COMMISSION: &str = "executive commission";

/// 1% of the paid amount goes to the executive handling the order.
pub const EXECUTIVE_COMMISSION_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Date formats tried in order when none are configured.
pub const DEFAULT_DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Strict amount parse, `None` for blank or malformed text.
pub fn parse_amount(s: &str) -> Option<Money> {
    s.parse().ok()
}

/// Missing or malformed amounts count as zero.
pub fn coerce_amount(s: &str) -> Money {
    parse_amount(s).unwrap_or_else(Money::zero)
}

/// Calendar date of a record, or an explicit marker for text that is not a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LedgerDate {
    Unknown,
    Known(NaiveDate),
}

impl LedgerDate {
    /// Tries each format, then RFC 3339. Anything else is `Unknown`.
    pub fn parse<S: AsRef<str>>(s: &str, formats: &[S]) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Self::Unknown;
        }
        for format in formats {
            let format = format.as_ref();
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return Self::Known(date);
            }
            if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
                return Self::Known(datetime.date());
            }
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::Known(dt.date_naive()))
            .unwrap_or(Self::Unknown)
    }

    pub fn known(&self) -> Option<NaiveDate> {
        match self {
            Self::Known(date) => Some(*date),
            Self::Unknown => None,
        }
    }

    /// Inclusive range test. An unknown date is never inside an explicit range.
    pub fn within(&self, range: &DateRange) -> bool {
        match self {
            Self::Known(date) => range.from() <= *date && *date <= range.to(),
            Self::Unknown => false,
        }
    }
}

impl fmt::Display for LedgerDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(date) => f.pad(&date.format("%Y-%m-%d").to_string()),
            Self::Unknown => f.pad(""),
        }
    }
}

impl Serialize for LedgerDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.known().serialize(serializer)
    }
}

/// The seven monetary inputs of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Amounts {
    pub opening_balance: Money,
    pub sales_value: Money,
    pub sales_return: Money,
    pub sales_in_and_out: Money,
    pub paid_amount: Money,
    pub cashback: Money,
    pub commission: Money,
}

impl Amounts {
    /// `None` when the amounts are too large to combine.
    pub fn outstanding(&self) -> Option<Money> {
        self.opening_balance
            .checked_add(self.sales_value)?
            .checked_sub(self.sales_return)?
            .checked_sub(self.sales_in_and_out)?
            .checked_sub(self.paid_amount)?
            .checked_sub(self.cashback)?
            .checked_sub(self.commission)
    }

    pub fn executive_commission(&self) -> Money {
        self.paid_amount.scale(EXECUTIVE_COMMISSION_RATE)
    }
}

impl From<&RawRecord> for Amounts {
    fn from(raw: &RawRecord) -> Self {
        Self {
            opening_balance: coerce_amount(&raw.opening_balance),
            sales_value: coerce_amount(&raw.sales_value),
            sales_return: coerce_amount(&raw.sales_return),
            sales_in_and_out: coerce_amount(&raw.sales_in_and_out),
            paid_amount: coerce_amount(&raw.paid_amount),
            cashback: coerce_amount(&raw.cashback),
            commission: coerce_amount(&raw.commission),
        }
    }
}

/// A fully derived ledger row. Derived fields are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    date: LedgerDate,
    order_no: String,
    executive: String,
    customer: String,
    amounts: Amounts,
    outstanding: Money,
    executive_commission: Money,
    extra: Vec<String>,
}

impl Record {
    pub fn new(
        date: LedgerDate,
        order_no: &str,
        executive: &str,
        customer: &str,
        amounts: Amounts,
        extra: Vec<String>,
    ) -> Result<Self> {
        let outstanding = amounts
            .outstanding()
            .ok_or_else(|| LedgerError::RowOverflow {
                order_no: order_no.to_owned(),
            })?;
        Ok(Record {
            date,
            order_no: order_no.to_owned(),
            executive: executive.to_owned(),
            customer: customer.to_owned(),
            outstanding,
            executive_commission: amounts.executive_commission(),
            amounts,
            extra,
        })
    }

    pub fn derive<S: AsRef<str>>(raw: RawRecord, date_formats: &[S]) -> Result<Self> {
        let amounts = Amounts::from(&raw);
        Self::new(
            LedgerDate::parse(&raw.date, date_formats),
            &raw.order_no,
            &raw.executive_name,
            &raw.customer_name,
            amounts,
            raw.extra,
        )
    }

    pub fn date(&self) -> LedgerDate {
        self.date
    }
    pub fn order_no(&self) -> &str {
        &self.order_no
    }
    pub fn executive(&self) -> &str {
        &self.executive
    }
    pub fn customer(&self) -> &str {
        &self.customer
    }
    pub fn amounts(&self) -> &Amounts {
        &self.amounts
    }
    pub fn outstanding(&self) -> Money {
        self.outstanding
    }
    pub fn executive_commission(&self) -> Money {
        self.executive_commission
    }
    /// Values of the ledger's extra columns, aligned with `Ledger::extra_columns`.
    pub fn extra(&self) -> &[String] {
        &self.extra
    }
}

/// Sums of absolute values of the aggregated columns must fit a `Money`.
fn check_totals(records: &[Record]) -> Result<()> {
    let columns: [(&'static str, fn(&Record) -> Money); 3] = [
        (SALES_VALUE, |r| r.amounts.sales_value),
        (PAID_AMOUNT, |r| r.amounts.paid_amount),
        (OUTSTANDING, |r| r.outstanding),
    ];
    for (column, value) in columns {
        records
            .iter()
            .try_fold(Money::zero(), |total, r| total.checked_add(value(r).abs()))
            .ok_or(LedgerError::TotalOverflow { column })?;
    }
    Ok(())
}

/// Derived record set of one upload. Never mutated after derivation.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    columns: Vec<String>,
    extra_columns: Vec<String>,
    records: Vec<Record>,
}

impl Ledger {
    /// Fails when a record, or a column total of the whole ledger, overflows.
    /// Any view's sums are bounded by those totals, so aggregation cannot overflow.
    pub fn derive<S: AsRef<str>>(table: &RawTable, date_formats: &[S]) -> Result<Self> {
        let layout = Layout::new(table, &[OUTSTANDING, EXECUTIVE_COMMISSION]);
        let extra_columns = layout.extra_columns();
        let columns = table
            .columns()
            .iter()
            .filter(|c| c.as_str() != OUTSTANDING && c.as_str() != EXECUTIVE_COMMISSION)
            .unique()
            .cloned()
            .chain([OUTSTANDING.to_string(), EXECUTIVE_COMMISSION.to_string()])
            .collect();

        let mut coerced = 0;
        let mut unknown_dates = 0;
        let records: Vec<Record> = table
            .rows()
            .iter()
            .map(|row| -> Result<Record> {
                let raw = layout.record(row);
                coerced += raw
                    .amounts()
                    .iter()
                    .filter(|s| !s.is_empty() && parse_amount(s).is_none())
                    .count();
                let record = Record::derive(raw, date_formats)?;
                if record.date() == LedgerDate::Unknown {
                    unknown_dates += 1;
                }
                Ok(record)
            })
            .collect::<Result<_>>()?;
        check_totals(&records)?;

        if coerced > 0 {
            warn!(cells = coerced, "unparsable amounts treated as zero");
        }
        if unknown_dates > 0 {
            warn!(records = unknown_dates, "records with unknown dates");
        }
        info!(records = records.len(), "derived ledger");
        Ok(Ledger {
            columns,
            extra_columns,
            records,
        })
    }

    pub fn from_records(extra_columns: Vec<String>, records: Vec<Record>) -> Result<Self> {
        check_totals(&records)?;
        let columns = crate::loader::REQUIRED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(extra_columns.iter().cloned())
            .chain([OUTSTANDING.to_string(), EXECUTIVE_COMMISSION.to_string()])
            .collect();
        Ok(Ledger {
            columns,
            extra_columns,
            records,
        })
    }

    /// Column order for presenting records: source order, then derived columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest known dates.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.records
            .iter()
            .filter_map(|r| r.date().known())
            .minmax()
            .into_option()
    }

    /// Unfiltered view of every record.
    pub fn view(&self) -> View<'_> {
        View::new(self, self.records.iter().collect())
    }
}
