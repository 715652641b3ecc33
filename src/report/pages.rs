//! The five views of the tracker, each built from a filtered view.

use super::{Field, Table, customer_outstanding};
use crate::aggregate;
use crate::filter::{ExecutiveFilter, View};
use crate::loader::REQUIRED_COLUMNS;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Home,
    Dashboard,
    SalesAnalysis,
    CustomerAnalysis,
    AllCustomerOutstanding,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Dashboard => "Dashboard",
            Page::SalesAnalysis => "Sales Analysis",
            Page::CustomerAnalysis => "Customer Analysis",
            Page::AllCustomerOutstanding => "All Customer Outstanding",
        }
    }

    /// Whether the page needs an uploaded ledger.
    pub fn needs_ledger(&self) -> bool {
        !matches!(self, Page::Home)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.title())
    }
}

pub const USAGE: &str = "\
This tool tracks sales, outstanding amounts, and commissions.

To get started:
  1. Pass an Excel or CSV file with the required columns (--file)
  2. Pick a view: dashboard, sales, customers or outstanding
  3. Narrow it with --from, --to and --executive
  4. Export with --export xlsx or --export pdf";

/// Welcome text and the expected file layout.
pub fn home() -> Vec<Table> {
    let mut columns = Table::new("Required columns in your data", &["column"]).with_note(USAGE);
    for column in REQUIRED_COLUMNS {
        columns.push(vec![Field::from(column)]);
    }
    vec![columns]
}

/// Headline metrics plus the data behind the three dashboard charts.
pub fn dashboard(view: &View) -> Vec<Table> {
    let mut tables = vec![Table::from(&aggregate::totals(view))];
    let by_executive = aggregate::by_executive(view);
    if !by_executive.is_empty() {
        tables.push(Table::from(by_executive.as_slice()));
    }
    let by_customer = aggregate::by_customer(view);
    if !by_customer.is_empty() {
        let mut outstanding = customer_outstanding(&by_customer);
        outstanding.title = "Outstanding by Customer".to_string();
        tables.push(outstanding);
    }
    let by_date = aggregate::by_date(view);
    if !by_date.is_empty() {
        tables.push(Table::from(by_date.as_slice()));
    }
    tables
}

/// The records of the view. A sub-selection of executives narrows it further;
/// without one the whole view is shown.
pub fn sales_analysis(view: &View, only: Option<&ExecutiveFilter>) -> Table {
    let narrowed = match only {
        Some(executives) => view.for_executives(executives),
        None => view.clone(),
    };
    Table::from_view("Sales Analysis", &narrowed)
}

/// Per-customer summary, with an optional single customer profile.
pub fn customer_analysis(view: &View, customer: Option<&str>) -> Vec<Table> {
    let by_customer = aggregate::by_customer(view);
    let mut tables = vec![
        Table::from(&aggregate::customer_averages(view)),
        Table::from(by_customer.as_slice()),
    ];
    if let Some(customer) = customer {
        let profile = view.for_customer(customer);
        let totals = aggregate::totals(&profile);
        let mut summary = Table::metrics(
            &format!("Customer Profile: {customer}"),
            vec![
                ("Total Sales", totals.sales_value.into()),
                ("Total Paid", totals.paid_amount.into()),
                ("Outstanding", totals.outstanding.into()),
            ],
        );
        if profile.is_empty() {
            summary = summary.with_note(&format!("No records for customer {customer}"));
        }
        tables.push(summary);
        tables.push(Table::from_view(&format!("Records: {customer}"), &profile));
    }
    tables
}

/// Outstanding per customer, the table behind the outstanding downloads.
pub fn all_customer_outstanding(view: &View) -> Table {
    let mut table = customer_outstanding(&aggregate::by_customer(view));
    table.title = "All Customer Outstanding".to_string();
    table
}
