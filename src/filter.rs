use crate::error::{LedgerError, Result};
use crate::record::{Ledger, Record};
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Inclusive date range with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(LedgerError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }
}

/// Which executives a view keeps. `Only` with an empty set keeps nobody.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutiveFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl ExecutiveFilter {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    pub fn matches(&self, executive: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(executive),
        }
    }
}

/// Date range and executive selection, applied together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub date_range: Option<DateRange>,
    pub executives: ExecutiveFilter,
}

impl Filter {
    pub fn new(date_range: Option<DateRange>, executives: ExecutiveFilter) -> Self {
        Filter {
            date_range,
            executives,
        }
    }

    /// Builds the range first so a reversed range fails before anything is filtered.
    pub fn between(from: NaiveDate, to: NaiveDate, executives: ExecutiveFilter) -> Result<Self> {
        Ok(Self::new(Some(DateRange::new(from, to)?), executives))
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.date_range
            .as_ref()
            .is_none_or(|range| record.date().within(range))
            && self.executives.matches(record.executive())
    }
}

/// A subset of a ledger's records. Filtering a view yields another view.
#[derive(Debug, Clone)]
pub struct View<'a> {
    ledger: &'a Ledger,
    records: Vec<&'a Record>,
}

impl<'a> View<'a> {
    pub fn new(ledger: &'a Ledger, records: Vec<&'a Record>) -> Self {
        View { ledger, records }
    }

    pub fn ledger(&self) -> &'a Ledger {
        self.ledger
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter(&self, filter: &Filter) -> View<'a> {
        let view = self.retain(|r| filter.matches(r));
        debug!(before = self.len(), after = view.len(), ?filter, "filtered view");
        view
    }

    pub fn between(&self, range: &DateRange) -> View<'a> {
        self.retain(|r| r.date().within(range))
    }

    pub fn for_executives(&self, executives: &ExecutiveFilter) -> View<'a> {
        self.retain(|r| executives.matches(r.executive()))
    }

    /// Records of a single customer, for a customer profile.
    pub fn for_customer(&self, customer: &str) -> View<'a> {
        self.retain(|r| r.customer() == customer)
    }

    /// Distinct executives in the view, sorted.
    pub fn executives(&self) -> Vec<&'a str> {
        self.iter().map(Record::executive).unique().sorted().collect()
    }

    /// Distinct customers in the view, sorted.
    pub fn customers(&self) -> Vec<&'a str> {
        self.iter().map(Record::customer).unique().sorted().collect()
    }

    fn retain<F: Fn(&Record) -> bool>(&self, keep: F) -> View<'a> {
        View::new(
            self.ledger,
            self.records.iter().copied().filter(|r| keep(r)).collect(),
        )
    }
}

#[cfg(test)]
mod filter_tests {
    use super::*;
    use crate::money::Money;
    use crate::record::{Amounts, LedgerDate};
    use anyhow::Result;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn ledger() -> Ledger {
        let rec = |date: LedgerDate, exec: &str, cust: &str| {
            let amounts = Amounts {
                sales_value: Money::try_from(10.0).unwrap(),
                ..Default::default()
            };
            Record::new(date, "1", exec, cust, amounts, Vec::new()).unwrap()
        };
        Ledger::from_records(
            Vec::new(),
            vec![
                rec(LedgerDate::Known(day(1)), "Asha", "Acme"),
                rec(LedgerDate::Known(day(2)), "Ravi", "Acme"),
                rec(LedgerDate::Known(day(3)), "Asha", "Globex"),
                rec(LedgerDate::Unknown, "Meera", "Initech"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn reversed_range_is_rejected() {
        let result = DateRange::new(day(5), day(1));
        assert!(matches!(
            result,
            Err(LedgerError::InvalidRange { from, to }) if from == day(5) && to == day(1)
        ));
        assert!(Filter::between(day(5), day(1), ExecutiveFilter::All).is_err());
    }

    #[test]
    fn range_is_inclusive_and_drops_unknown_dates() -> Result<()> {
        let ledger = ledger();
        let view = ledger.view().between(&DateRange::new(day(1), day(2))?);
        assert_eq!(view.len(), 2);
        let everything = ledger.view().between(&DateRange::new(NaiveDate::MIN, NaiveDate::MAX)?);
        assert_eq!(everything.len(), 3);
        Ok(())
    }

    #[test]
    fn empty_selection_is_empty_view() {
        let ledger = ledger();
        let view = ledger.view().for_executives(&ExecutiveFilter::none());
        assert!(view.is_empty());
    }

    #[test]
    fn full_selection_is_unfiltered_view() {
        let ledger = ledger();
        let all = ledger.view();
        let selection = ExecutiveFilter::only(all.executives());
        let view = all.for_executives(&selection);
        assert_eq!(view.records(), all.records());
    }

    #[test]
    fn filters_compose_and_are_idempotent() -> Result<()> {
        let ledger = ledger();
        let filter = Filter::between(day(1), day(3), ExecutiveFilter::only(["Asha"]))?;
        let once = ledger.view().filter(&filter);
        assert_eq!(once.len(), 2);
        assert!(once.iter().all(|r| r.executive() == "Asha"));
        let twice = once.filter(&filter);
        assert_eq!(twice.records(), once.records());
        // base ledger untouched
        assert_eq!(ledger.len(), 4);
        Ok(())
    }

    #[test]
    fn no_filter_keeps_unknown_dates() {
        let ledger = ledger();
        assert_eq!(ledger.view().filter(&Filter::default()).len(), 4);
    }

    #[test]
    fn distinct_names() {
        let ledger = ledger();
        assert_eq!(ledger.view().executives(), vec!["Asha", "Meera", "Ravi"]);
        assert_eq!(ledger.view().customers(), vec!["Acme", "Globex", "Initech"]);
        assert_eq!(ledger.view().for_customer("Acme").len(), 2);
    }
}
