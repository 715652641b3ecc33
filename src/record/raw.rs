use crate::loader::{RawTable, REQUIRED_COLUMNS};

/// Raw text of one ledger row, before any coercion
#[derive(Debug, PartialEq, Clone, Default)]
pub struct RawRecord {
    pub date: String,
    pub order_no: String,
    pub executive_name: String,
    pub customer_name: String,
    pub opening_balance: String,
    pub sales_value: String,
    pub sales_return: String,
    pub sales_in_and_out: String,
    pub paid_amount: String,
    pub cashback: String,
    pub commission: String,
    pub extra: Vec<String>,
}

impl RawRecord {
    /// Amount cells in formula order.
    pub fn amounts(&self) -> [&str; 7] {
        [
            &self.opening_balance,
            &self.sales_value,
            &self.sales_return,
            &self.sales_in_and_out,
            &self.paid_amount,
            &self.cashback,
            &self.commission,
        ]
    }
}

/// Where each column of a validated table lives.
#[derive(Debug, Clone)]
pub struct Layout {
    required: Vec<usize>,
    extra: Vec<(String, usize)>,
}

impl Layout {
    /// `derived` names are dropped from the extra columns since they are recomputed.
    pub fn new(table: &RawTable, derived: &[&str]) -> Self {
        let required = REQUIRED_COLUMNS
            .iter()
            // validated tables always carry every required column
            .map(|c| table.position(c).unwrap_or_default())
            .collect();
        let mut extra: Vec<(String, usize)> = Vec::new();
        for (i, column) in table.columns().iter().enumerate() {
            if REQUIRED_COLUMNS.contains(&column.as_str()) || derived.contains(&column.as_str()) {
                continue;
            }
            match extra.iter_mut().find(|(name, _)| name == column) {
                Some(existing) => existing.1 = i,
                None => extra.push((column.clone(), i)),
            }
        }
        Self { required, extra }
    }

    pub fn extra_columns(&self) -> Vec<String> {
        self.extra.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn record(&self, row: &[String]) -> RawRecord {
        let cell = |i: usize| row.get(i).map(|s| s.trim().to_owned()).unwrap_or_default();
        let r = &self.required;
        RawRecord {
            date: cell(r[0]),
            order_no: cell(r[1]),
            executive_name: cell(r[2]),
            customer_name: cell(r[3]),
            opening_balance: cell(r[4]),
            sales_value: cell(r[5]),
            sales_return: cell(r[6]),
            sales_in_and_out: cell(r[7]),
            paid_amount: cell(r[8]),
            cashback: cell(r[9]),
            commission: cell(r[10]),
            extra: self.extra.iter().map(|(_, i)| cell(*i)).collect(),
        }
    }
}
