use anyhow::Result;
use chrono::NaiveDate;
use indoc::{formatdoc, indoc};
use itertools::Itertools;
use proptest::prelude::*;
use rust_decimal::Decimal;
use sales_tracker::aggregate;
use sales_tracker::export::xlsx::XlsxExporter;
use sales_tracker::export::{ExportFormat, ExportOptions, Exporter};
use sales_tracker::loader::REQUIRED_COLUMNS;
use sales_tracker::money::Money;
use sales_tracker::record::{Amounts, DEFAULT_DATE_FORMATS};
use sales_tracker::report::{Table, pages};
use sales_tracker::*;

const LEDGER: &str = "./tests/fixtures/ledger.csv";

fn m(s: &str) -> Money {
    s.parse().unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

async fn session() -> Result<Session> {
    let bytes = input::read_input(LEDGER).await?;
    let mut session = Session::new(Settings::default());
    session.upload(LEDGER, &bytes, InputFormat::Csv)?;
    Ok(session)
}

#[async_std::test]
async fn test_pipeline_totals() -> Result<()> {
    let session = session().await?;
    let view = session.view(&Selection::default())?.unwrap();
    assert_eq!(view.len(), 5);

    let totals = aggregate::totals(&view);
    assert_eq!(totals.sales_value, m("490"));
    assert_eq!(totals.paid_amount, m("340"));
    assert_eq!(totals.outstanding, m("222"));
    assert_eq!(totals.executive_commission, m("3.4"));
    assert_eq!(totals.team_leader_commission, m("0.68"));
    Ok(())
}

#[async_std::test]
async fn test_derived_columns_follow_source_columns() -> Result<()> {
    let session = session().await?;
    let ledger = session.ledger().unwrap();
    assert_eq!(
        ledger.columns().iter().skip(10).collect_vec(),
        vec!["commission", "region", "outstanding", "executive commission"]
    );
    let outstanding = ledger.records().iter().map(Record::outstanding).collect_vec();
    assert_eq!(
        outstanding,
        vec![m("113"), m("40"), m("32"), m("40"), m("-3")]
    );
    // blank paid amount counts as zero
    assert_eq!(ledger.records()[3].executive_commission(), Money::default());
    Ok(())
}

#[test]
fn test_worked_example() -> Result<()> {
    let csv = indoc! {"
        date,order no,executive name,customer name,opening balance,sales value,sales return,sales in and out,paid amount,cashback,commission
        2024-03-01,1,Asha,Acme,100,50,0,0,30,5,2
    "};
    let table = RawTable::read(csv.as_bytes(), InputFormat::Csv)?;
    let ledger = Ledger::derive(&table, &DEFAULT_DATE_FORMATS)?;
    let record = &ledger.records()[0];
    assert_eq!(record.outstanding(), m("113"));
    assert_eq!(record.executive_commission(), m("0.30"));
    Ok(())
}

#[test]
fn test_each_missing_column_is_named() {
    for dropped in REQUIRED_COLUMNS {
        let header = REQUIRED_COLUMNS
            .iter()
            .filter(|c| **c != dropped)
            .join(",");
        let csv = formatdoc! {"
            {header}
            1,2,3,4,5,6,7,8,9,10
        "};
        match RawTable::read(csv.as_bytes(), InputFormat::Csv) {
            Err(LedgerError::MissingColumns(missing)) => assert_eq!(missing, vec![dropped]),
            other => panic!("expected missing {dropped}, got {other:?}"),
        }
    }
}

#[async_std::test]
async fn test_missing_commission_fixture() -> Result<()> {
    let bytes = input::read_input("./tests/fixtures/ledger_missing_commission.csv").await?;
    let mut session = Session::new(Settings::default());
    let err = session
        .upload("ledger_missing_commission.csv", &bytes, InputFormat::Csv)
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing columns: commission");
    assert!(session.ledger().is_none());
    Ok(())
}

#[async_std::test]
async fn test_reversed_range_is_rejected() -> Result<()> {
    let session = session().await?;
    let selection = Selection {
        from: Some(day(12)),
        to: Some(day(5)),
        ..Default::default()
    };
    assert!(matches!(
        session.view(&selection),
        Err(LedgerError::InvalidRange { .. })
    ));
    Ok(())
}

#[async_std::test]
async fn test_date_range_is_inclusive() -> Result<()> {
    let session = session().await?;
    let selection = Selection {
        from: Some(day(6)),
        to: Some(day(10)),
        ..Default::default()
    };
    let view = session.view(&selection)?.unwrap();
    assert_eq!(
        view.iter().map(Record::order_no).collect_vec(),
        vec!["1002", "1003", "1004"]
    );
    Ok(())
}

#[async_std::test]
async fn test_executive_selection() -> Result<()> {
    let session = session().await?;
    let everyone = session.view(&Selection::default())?.unwrap();

    let nobody = Selection {
        executives: ExecutiveFilter::none(),
        ..Default::default()
    };
    let empty = session.view(&nobody)?.unwrap();
    assert!(empty.is_empty());
    assert_eq!(aggregate::totals(&empty), aggregate::Totals::default());

    let all = Selection {
        executives: ExecutiveFilter::only(everyone.executives()),
        ..Default::default()
    };
    let full = session.view(&all)?.unwrap();
    assert_eq!(full.records(), everyone.records());
    Ok(())
}

#[async_std::test]
async fn test_customer_outstanding_sums_to_total() -> Result<()> {
    let session = session().await?;
    let view = session.view(&Selection::default())?.unwrap();
    let customers = aggregate::by_customer(&view);
    assert_eq!(
        customers.iter().map(|c| c.customer.as_str()).collect_vec(),
        vec!["Acme", "Globex", "Initech"]
    );
    let summed: Money = customers.iter().map(|c| c.outstanding).sum();
    assert_eq!(summed, aggregate::totals(&view).outstanding);
    Ok(())
}

#[async_std::test]
async fn test_outstanding_page_display() -> Result<()> {
    let session = session().await?;
    let view = session.view(&Selection::default())?.unwrap();
    let table = pages::all_customer_outstanding(&view);
    assert_eq!(
        table.to_string(),
        "All Customer Outstanding\n\
         customer name | outstanding\n\
         --------------+------------\n\
         Acme          |      110.00\n\
         Globex        |       72.00\n\
         Initech       |       40.00\n"
    );
    Ok(())
}

#[async_std::test]
async fn test_sales_page_sub_selection() -> Result<()> {
    let session = session().await?;
    let selection = Selection {
        executives: ExecutiveFilter::only(["Asha", "Ravi"]),
        ..Default::default()
    };
    let view = session.view(&selection)?.unwrap();
    assert_eq!(pages::sales_analysis(&view, None).rows.len(), 4);
    let only = ExecutiveFilter::only(["Ravi"]);
    assert_eq!(pages::sales_analysis(&view, Some(&only)).rows.len(), 2);
    Ok(())
}

#[async_std::test]
async fn test_spreadsheet_round_trip() -> Result<()> {
    let session = session().await?;
    let ledger = session.ledger().unwrap();
    let table = Table::from_view("Sales Analysis", &ledger.view());
    let options = ExportOptions {
        sheet_name: "sales".to_string(),
        title: "Sales".to_string(),
        generated: day(31),
    };
    let bytes = XlsxExporter.export(&table, &options)?;

    let reread = RawTable::read(&bytes, InputFormat::Workbook)?;
    let again = Ledger::derive(&reread, &DEFAULT_DATE_FORMATS)?;
    assert_eq!(again.columns(), ledger.columns());
    assert_eq!(again.records(), ledger.records());
    Ok(())
}

#[test]
fn test_oversized_amounts_fail_the_upload() {
    let header = REQUIRED_COLUMNS.join(",");
    let one_row = formatdoc! {"
        {header}
        2024-01-05,1001,Asha,Acme,50000000000000000000000000000,50000000000000000000000000000,0,0,0,0,0
    "};
    let mut session = Session::new(Settings::default());
    let result = session.upload("big.csv", one_row.as_bytes(), InputFormat::Csv);
    assert!(matches!(result, Err(LedgerError::RowOverflow { .. })));

    let two_rows = formatdoc! {"
        {header}
        2024-01-05,1001,Asha,Acme,40000000000000000000000000000,0,0,0,0,0,0
        2024-01-06,1002,Ravi,Acme,40000000000000000000000000000,0,0,0,0,0,0
    "};
    let result = session.upload("big.csv", two_rows.as_bytes(), InputFormat::Csv);
    assert!(matches!(result, Err(LedgerError::TotalOverflow { .. })));
    assert!(session.ledger().is_none());
}

#[test]
fn test_largest_accepted_totals_aggregate() -> Result<()> {
    let header = REQUIRED_COLUMNS.join(",");
    let csv = formatdoc! {"
        {header}
        2024-01-05,1001,Asha,Acme,0,30000000000000000000000000000,0,0,0,0,0
        2024-01-06,1002,Ravi,Globex,0,30000000000000000000000000000,0,0,0,0,0
    "};
    let mut session = Session::new(Settings::default());
    session.upload("big.csv", csv.as_bytes(), InputFormat::Csv)?;
    let view = session.view(&Selection::default())?.unwrap();
    let totals = aggregate::totals(&view);
    assert_eq!(totals.sales_value, m("60000000000000000000000000000"));
    assert_eq!(totals.outstanding, m("60000000000000000000000000000"));
    assert_eq!(
        aggregate::customer_averages(&view).sales_value,
        m("30000000000000000000000000000")
    );
    Ok(())
}

#[test]
fn test_short_csv_rows_upload() -> Result<()> {
    let header = REQUIRED_COLUMNS.join(",");
    let csv = formatdoc! {"
        {header}
        2024-01-05,1001,Asha,Acme,100,50
    "};
    let mut session = Session::new(Settings::default());
    let ledger = session.upload("short.csv", csv.as_bytes(), InputFormat::Csv)?;
    assert_eq!(ledger.records()[0].outstanding(), m("150"));
    Ok(())
}

#[test]
fn test_wide_amounts_survive_spreadsheet_round_trip() -> Result<()> {
    let header = REQUIRED_COLUMNS.join(",");
    let csv = formatdoc! {"
        {header}
        2024-01-05,1001,Asha,Acme,1234567890123.456789,0,0,0,0,0,0
    "};
    let table = RawTable::read(csv.as_bytes(), InputFormat::Csv)?;
    let ledger = Ledger::derive(&table, &DEFAULT_DATE_FORMATS)?;
    let options = ExportOptions {
        sheet_name: "sales".to_string(),
        title: "Sales".to_string(),
        generated: day(31),
    };
    let bytes = XlsxExporter.export(&Table::from_view("Sales Analysis", &ledger.view()), &options)?;
    let again = Ledger::derive(&RawTable::read(&bytes, InputFormat::Workbook)?, &DEFAULT_DATE_FORMATS)?;
    assert_eq!(
        again.records()[0].amounts().opening_balance,
        m("1234567890123.456789")
    );
    assert_eq!(again.records(), ledger.records());
    Ok(())
}

#[cfg(feature = "pdf")]
#[async_std::test]
async fn test_outstanding_pdf() -> Result<()> {
    let session = session().await?;
    let view = session.view(&Selection::default())?.unwrap();
    let table = pages::all_customer_outstanding(&view);
    let (path, bytes) = session.export(Download::Outstanding, ExportFormat::Pdf, &table)?;
    assert!(path.ends_with("outstanding.pdf"));
    assert!(bytes.starts_with(b"%PDF"));
    Ok(())
}

proptest! {
    #[test]
    fn outstanding_formula_holds(values in proptest::array::uniform7(-1_000_000_00i64..1_000_000_00)) {
        let [ob, sv, sr, sio, paid, cashback, commission] = values.map(|cents| Money(Decimal::new(cents, 2)));
        let amounts = Amounts {
            opening_balance: ob,
            sales_value: sv,
            sales_return: sr,
            sales_in_and_out: sio,
            paid_amount: paid,
            cashback,
            commission,
        };
        prop_assert_eq!(
            amounts.outstanding(),
            Some(ob + sv - sr - sio - paid - cashback - commission)
        );
        prop_assert_eq!(amounts.executive_commission(), Money(paid.0 / Decimal::from(100)));
    }
}
