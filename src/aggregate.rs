//! Totals and group-by sums over a view. Every function accepts an empty view.
//! `Ledger` construction bounds each column's absolute total, so no sum here overflows.

use crate::filter::View;
use crate::money::Money;
use crate::record::Record;
use chrono::NaiveDate;
use num_traits::Zero;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// 0.2% of all paid amounts in a view goes to the team leader.
pub const TEAM_LEADER_COMMISSION_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 3);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub sales_value: Money,
    pub paid_amount: Money,
    pub outstanding: Money,
    pub executive_commission: Money,
    pub team_leader_commission: Money,
}

pub fn team_leader_commission(paid_amount: Money) -> Money {
    paid_amount.scale(TEAM_LEADER_COMMISSION_RATE)
}

pub fn totals(view: &View) -> Totals {
    let mut totals = view.iter().fold(Totals::default(), |mut acc, r| {
        acc.sales_value += r.amounts().sales_value;
        acc.paid_amount += r.amounts().paid_amount;
        acc.outstanding += r.outstanding();
        acc.executive_commission += r.executive_commission();
        acc
    });
    totals.team_leader_commission = team_leader_commission(totals.paid_amount);
    debug!(records = view.len(), "computed totals");
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub executive: String,
    pub sales_value: Money,
    pub paid_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer: String,
    pub sales_value: Money,
    pub paid_amount: Money,
    pub outstanding: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub sales_value: Money,
    pub paid_amount: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CustomerAverages {
    pub customers: usize,
    pub sales_value: Money,
    pub outstanding: Money,
}

/// Sums per key, sorted by key.
fn group_sum<'a, K, F, const N: usize>(
    view: &View<'a>,
    key: F,
    values: fn(&Record) -> [Money; N],
) -> BTreeMap<K, [Money; N]>
where
    K: Ord,
    F: Fn(&'a Record) -> Option<K>,
{
    view.iter().fold(BTreeMap::new(), |mut groups, record| {
        if let Some(k) = key(record) {
            let sums = groups.entry(k).or_insert([Money::zero(); N]);
            for (sum, value) in sums.iter_mut().zip(values(record)) {
                *sum += value;
            }
        }
        groups
    })
}

/// Sales value and paid amount per executive.
pub fn by_executive(view: &View) -> Vec<ExecutiveSummary> {
    group_sum::<_, _, 2>(view, |r| Some(r.executive()), |r| {
        [r.amounts().sales_value, r.amounts().paid_amount]
    })
    .into_iter()
    .map(|(executive, [sales_value, paid_amount])| ExecutiveSummary {
        executive: executive.to_owned(),
        sales_value,
        paid_amount,
    })
    .collect()
}

/// Sales value, paid amount and outstanding per customer.
pub fn by_customer(view: &View) -> Vec<CustomerSummary> {
    group_sum::<_, _, 3>(view, |r| Some(r.customer()), |r| {
        [r.amounts().sales_value, r.amounts().paid_amount, r.outstanding()]
    })
    .into_iter()
    .map(
        |(customer, [sales_value, paid_amount, outstanding])| CustomerSummary {
            customer: customer.to_owned(),
            sales_value,
            paid_amount,
            outstanding,
        },
    )
    .collect()
}

/// Sales value and paid amount per known date. Unknown dates form no group.
pub fn by_date(view: &View) -> Vec<DailySummary> {
    group_sum::<_, _, 2>(view, |r| r.date().known(), |r| {
        [r.amounts().sales_value, r.amounts().paid_amount]
    })
    .into_iter()
    .map(|(date, [sales_value, paid_amount])| DailySummary {
        date,
        sales_value,
        paid_amount,
    })
    .collect()
}

/// Mean per-customer sales and outstanding over the distinct customers of this view.
pub fn customer_averages(view: &View) -> CustomerAverages {
    let customers = by_customer(view);
    let n = customers.len();
    let sales_value: Money = customers.iter().map(|c| c.sales_value).sum();
    let outstanding: Money = customers.iter().map(|c| c.outstanding).sum();
    CustomerAverages {
        customers: n,
        sales_value: sales_value.mean_over(n),
        outstanding: outstanding.mean_over(n),
    }
}
