pub mod pages;

use crate::aggregate::{CustomerAverages, CustomerSummary, DailySummary, ExecutiveSummary, Totals};
use crate::filter::View;
use crate::loader::{self, CUSTOMER_NAME, EXECUTIVE_NAME};
use crate::money::Money;
use crate::record::{EXECUTIVE_COMMISSION, LedgerDate, OUTSTANDING, Record};
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::fmt;

/// One cell of a presentable table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Text(String),
    Amount(Money),
    Date(LedgerDate),
    Count(usize),
}

impl Field {
    fn is_numeric(&self) -> bool {
        matches!(self, Field::Amount(_) | Field::Count(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text(text) => f.pad(text),
            Field::Amount(money) => fmt::Display::fmt(money, f),
            Field::Date(date) => fmt::Display::fmt(date, f),
            Field::Count(n) => fmt::Display::fmt(n, f),
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_owned())
    }
}

impl From<Money> for Field {
    fn from(m: Money) -> Self {
        Field::Amount(m)
    }
}

/// Plain structured output: a title, ordered column names and rows of fields.
/// Renderers and exporters only ever see this.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Field>>,
    pub note: Option<String>,
}

impl Table {
    pub fn new(title: &str, columns: &[&str]) -> Self {
        Table {
            title: title.to_owned(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_owned());
        self
    }

    pub fn push(&mut self, row: Vec<Field>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every record of a view with the ledger's columns.
    pub fn from_view(title: &str, view: &View) -> Self {
        let ledger = view.ledger();
        let columns = ledger.columns().to_vec();
        let rows = view
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record_field(record, column, ledger.extra_columns()))
                    .collect()
            })
            .collect();
        Table {
            title: title.to_owned(),
            columns,
            rows,
            note: None,
        }
    }

    /// Named metrics as a two column table.
    pub fn metrics(title: &str, metrics: Vec<(&str, Field)>) -> Self {
        let mut table = Table::new(title, &["metric", "value"]);
        for (name, value) in metrics {
            table.push(vec![Field::from(name), value]);
        }
        table
    }
}

fn record_field(record: &Record, column: &str, extra_columns: &[String]) -> Field {
    let a = record.amounts();
    match column {
        loader::DATE => Field::Date(record.date()),
        loader::ORDER_NO => Field::from(record.order_no()),
        EXECUTIVE_NAME => Field::from(record.executive()),
        CUSTOMER_NAME => Field::from(record.customer()),
        loader::OPENING_BALANCE => Field::Amount(a.opening_balance),
        loader::SALES_VALUE => Field::Amount(a.sales_value),
        loader::SALES_RETURN => Field::Amount(a.sales_return),
        loader::SALES_IN_AND_OUT => Field::Amount(a.sales_in_and_out),
        loader::PAID_AMOUNT => Field::Amount(a.paid_amount),
        loader::CASHBACK => Field::Amount(a.cashback),
        loader::COMMISSION => Field::Amount(a.commission),
        OUTSTANDING => Field::Amount(record.outstanding()),
        EXECUTIVE_COMMISSION => Field::Amount(record.executive_commission()),
        other => extra_columns
            .iter()
            .position(|c| c == other)
            .and_then(|i| record.extra().get(i))
            .map(|s| Field::from(s.as_str()))
            .unwrap_or_else(|| Field::from("")),
    }
}

impl From<&Totals> for Table {
    fn from(totals: &Totals) -> Self {
        Table::metrics(
            "Totals",
            vec![
                ("Total Sales", totals.sales_value.into()),
                ("Total Paid", totals.paid_amount.into()),
                ("Outstanding", totals.outstanding.into()),
                ("Exec Commission", totals.executive_commission.into()),
                (
                    "Team Leader Commission (0.2%)",
                    totals.team_leader_commission.into(),
                ),
            ],
        )
    }
}

impl From<&CustomerAverages> for Table {
    fn from(averages: &CustomerAverages) -> Self {
        Table::metrics(
            "Customer Summary",
            vec![
                ("Total Customers", Field::Count(averages.customers)),
                ("Avg. Sales per Customer", averages.sales_value.into()),
                ("Avg. Outstanding per Customer", averages.outstanding.into()),
            ],
        )
    }
}

impl From<&[ExecutiveSummary]> for Table {
    fn from(summaries: &[ExecutiveSummary]) -> Self {
        let mut table = Table::new(
            "Sales vs Paid by Executive",
            &[EXECUTIVE_NAME, loader::SALES_VALUE, loader::PAID_AMOUNT],
        );
        for s in summaries {
            table.push(vec![
                Field::from(s.executive.as_str()),
                s.sales_value.into(),
                s.paid_amount.into(),
            ]);
        }
        table
    }
}

impl From<&[CustomerSummary]> for Table {
    fn from(summaries: &[CustomerSummary]) -> Self {
        let mut table = Table::new(
            "Customers",
            &[
                CUSTOMER_NAME,
                loader::SALES_VALUE,
                loader::PAID_AMOUNT,
                OUTSTANDING,
            ],
        );
        for s in summaries {
            table.push(vec![
                Field::from(s.customer.as_str()),
                s.sales_value.into(),
                s.paid_amount.into(),
                s.outstanding.into(),
            ]);
        }
        table
    }
}

impl From<&[DailySummary]> for Table {
    fn from(summaries: &[DailySummary]) -> Self {
        let mut table = Table::new(
            "Sales & Paid Trend",
            &[loader::DATE, loader::SALES_VALUE, loader::PAID_AMOUNT],
        );
        for s in summaries {
            table.push(vec![
                Field::Date(LedgerDate::Known(s.date)),
                s.sales_value.into(),
                s.paid_amount.into(),
            ]);
        }
        table
    }
}

/// Outstanding per customer only, as downloaded and printed.
pub fn customer_outstanding(summaries: &[CustomerSummary]) -> Table {
    let mut table = Table::new("Customer Outstanding", &[CUSTOMER_NAME, OUTSTANDING]);
    for s in summaries {
        table.push(vec![Field::from(s.customer.as_str()), s.outstanding.into()]);
    }
    table
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                rendered
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect();

        writeln!(f, "{}", self.title)?;
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:<width$}", column, width = *width))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for (row, cells) in self.rows.iter().zip(&rendered) {
            let line: Vec<String> = cells
                .iter()
                .zip(row)
                .zip(&widths)
                .map(|((cell, field), width)| {
                    if field.is_numeric() {
                        format!("{:>width$}", cell, width = *width)
                    } else {
                        format!("{:<width$}", cell, width = *width)
                    }
                })
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())?;
        }
        if let Some(note) = &self.note {
            writeln!(f, "{}", note)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;
    use crate::aggregate;
    use crate::record::{Amounts, Ledger};
    use anyhow::Result;
    use chrono::NaiveDate;

    fn ledger() -> Result<Ledger> {
        let amounts = Amounts {
            opening_balance: "100".parse()?,
            sales_value: "50".parse()?,
            paid_amount: "30".parse()?,
            cashback: "5".parse()?,
            commission: "2".parse()?,
            ..Default::default()
        };
        let date = LedgerDate::Known(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        Ok(Ledger::from_records(
            vec!["region".to_string()],
            vec![
                Record::new(date, "1001", "Asha", "Acme", amounts, vec!["North".to_string()])?,
                Record::new(
                    LedgerDate::Unknown,
                    "1002",
                    "Ravi",
                    "Globex Corporation",
                    Amounts::default(),
                    vec!["South".to_string()],
                )?,
            ],
        )?)
    }

    #[test]
    fn view_table_keeps_column_order() -> Result<()> {
        let ledger = ledger()?;
        let table = Table::from_view("sales", &ledger.view());
        assert_eq!(table.columns.len(), 14);
        assert_eq!(table.columns[11], "region");
        assert_eq!(table.rows[0][11], Field::from("North"));
        assert_eq!(table.rows[0][12], Field::Amount("113".parse()?));
        assert_eq!(table.rows[0][13], Field::Amount("0.3".parse()?));
        assert_eq!(table.rows[1][0], Field::Date(LedgerDate::Unknown));
        Ok(())
    }

    #[test]
    fn display_pads_and_aligns() -> Result<()> {
        let ledger = ledger()?;
        let summaries = aggregate::by_customer(&ledger.view());
        let table = customer_outstanding(&summaries);
        assert_eq!(
            table.to_string(),
            "Customer Outstanding\n\
             customer name      | outstanding\n\
             -------------------+------------\n\
             Acme               |      113.00\n\
             Globex Corporation |        0.00\n"
        );
        Ok(())
    }

    #[test]
    fn totals_as_metrics() -> Result<()> {
        let ledger = ledger()?;
        let table = Table::from(&aggregate::totals(&ledger.view()));
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[2], vec![Field::from("Outstanding"), Field::Amount("113".parse()?)]);
        assert_eq!(
            table.rows[4][1],
            Field::Amount("0.06".parse()?),
            "team leader commission"
        );
        Ok(())
    }

    #[test]
    fn json_is_plain_data() -> Result<()> {
        let ledger = ledger()?;
        let table = Table::from(aggregate::by_date(&ledger.view()).as_slice());
        let json = serde_json::to_value(&table)?;
        assert_eq!(json["columns"][0], "date");
        assert_eq!(json["rows"][0][0], "2024-01-05");
        assert_eq!(json["rows"][0][1], 50.0);
        assert!(json.get("note").is_none());
        Ok(())
    }
}
