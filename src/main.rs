use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use clap::{Arg, ArgMatches, Command};
use itertools::Itertools;
use sales_tracker::export::ExportFormat;
use sales_tracker::report::pages::{self, Page};
use sales_tracker::report::{Field, Table};
use sales_tracker::session::{Download, Selection, Session};
use sales_tracker::{ExecutiveFilter, InputFormat, Settings, View, input};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn out_arg() -> Arg<'static> {
    Arg::new("out")
        .long("out")
        .help("Directory for exported files")
        .value_name("DIR")
        .takes_value(true)
}

fn export_arg(formats: &'static [&'static str]) -> Arg<'static> {
    Arg::new("export")
        .short('e')
        .long("export")
        .help("Exports the table, may be repeated")
        .value_name("FORMAT")
        .possible_values(formats.iter().copied())
        .multiple_occurrences(true)
        .takes_value(true)
}

fn cli() -> Command<'static> {
    Command::new("Sales Tracker")
        .version("0.1.0")
        .about("Tracks sales, outstanding amounts and commissions")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .help("Sets the CSV or Excel file of sales records, or '-' for stdin")
                .value_name("FILE")
                .takes_value(true),
        )
        .arg(
            Arg::new("input format")
                .long("input-format")
                .help("Format of the file, needed for stdin")
                .value_name("FORMAT")
                .possible_values(["csv", "workbook"])
                .takes_value(true),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .help("Start date (YYYY-MM-DD), defaults to the earliest date")
                .value_name("DATE")
                .takes_value(true),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .help("End date (YYYY-MM-DD), defaults to the latest date")
                .value_name("DATE")
                .takes_value(true),
        )
        .arg(
            Arg::new("executive")
                .short('x')
                .long("executive")
                .help("Executive filter, may be repeated")
                .value_name("EXECUTIVE")
                .multiple_occurrences(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Settings file, defaults to $SALES_TRACKER_CONFIG")
                .value_name("FILE")
                .takes_value(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output format")
                .value_name("FORMAT")
                .possible_values(["table", "json"])
                .default_value("table")
                .takes_value(true),
        )
        .subcommand_required(true)
        .subcommand(Command::new("home").about("Shows usage and the required columns"))
        .subcommand(Command::new("info").about("Shows what was loaded from the file"))
        .subcommand(Command::new("dashboard").about("Shows totals, commissions and trends"))
        .subcommand(
            Command::new("sales")
                .about("Shows the filtered sales records")
                .arg(
                    Arg::new("only")
                        .long("only")
                        .help("Narrows the records to these executives, may be repeated")
                        .value_name("EXECUTIVE")
                        .multiple_occurrences(true)
                        .takes_value(true),
                )
                .arg(export_arg(&["xlsx"]))
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("customers")
                .about("Shows customer averages and per-customer sums")
                .arg(
                    Arg::new("customer")
                        .long("customer")
                        .help("Shows the profile of one customer")
                        .value_name("NAME")
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new("outstanding")
                .about("Shows outstanding per customer")
                .arg(export_arg(&["xlsx", "pdf"]))
                .arg(out_arg()),
        )
}

fn parse_date(matches: &ArgMatches, name: &str) -> Result<Option<NaiveDate>> {
    matches
        .value_of(name)
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("Invalid --{name} date {s:?}, expected YYYY-MM-DD"))
        })
        .transpose()
}

fn selection(matches: &ArgMatches) -> Result<Selection> {
    Ok(Selection {
        from: parse_date(matches, "from")?,
        to: parse_date(matches, "to")?,
        executives: match matches.values_of("executive") {
            Some(names) => ExecutiveFilter::only(names),
            None => ExecutiveFilter::All,
        },
    })
}

fn input_format(matches: &ArgMatches, file: &str) -> Result<InputFormat> {
    match matches.value_of("input format") {
        Some(format) => format.parse(),
        None => InputFormat::from_path(file)
            .ok_or_else(|| anyhow!("Cannot tell the format of {file:?}, pass --input-format")),
    }
}

fn print_tables(tables: &[Table], output: &str) -> Result<()> {
    if output == "json" {
        println!("{}", serde_json::to_string_pretty(tables)?);
    } else {
        println!("{}", tables.iter().join("\n"));
    }
    Ok(())
}

async fn export(
    session: &Session,
    download: Download,
    matches: &ArgMatches,
    table: &Table,
) -> Result<()> {
    let Some(formats) = matches.values_of("export") else {
        return Ok(());
    };
    for format in formats.unique() {
        let format: ExportFormat = format.parse()?;
        if !session.exporters().supports(format) {
            eprintln!("{format} export is not available in this build");
            continue;
        }
        let (path, bytes) = session.export(download, format, table)?;
        input::write_output(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn info_table(session: &Session, view: &View) -> Table {
    let ledger = view.ledger();
    let span = ledger
        .date_span()
        .map(|(min, max)| format!("{min} to {max}"))
        .unwrap_or_default();
    let mut table = Table::metrics(
        "Loaded File",
        vec![
            ("Source", Field::from(session.source().unwrap_or_default())),
            ("Records", Field::Count(ledger.len())),
            ("Selected Records", Field::Count(view.len())),
            ("Dates", Field::Text(span)),
            ("Executives", Field::Text(ledger.view().executives().join(", "))),
            ("Columns", Field::Text(ledger.columns().join(", "))),
        ],
    );
    if view.is_empty() {
        table = table.with_note("No data for the selected filters");
    }
    table
}

#[async_std::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let output = matches.value_of("output").unwrap_or("table");

    let mut settings = Settings::load(matches.value_of("config")).await?;
    if let Some(("sales" | "outstanding", sub)) = matches.subcommand() {
        if let Some(out) = sub.value_of("out") {
            settings.output_dir = out.into();
        }
    }
    let mut session = Session::new(settings);

    if let Some(file) = matches.value_of("file") {
        let format = input_format(&matches, file)?;
        let bytes = input::read_input(file)
            .await
            .with_context(|| format!("Failed to read {file}"))?;
        session.upload(file, &bytes, format)?;
    }

    if matches.subcommand_matches("home").is_some() {
        return print_tables(&pages::home(), output);
    }

    let page = match matches.subcommand_name() {
        Some("dashboard") => Some(Page::Dashboard),
        Some("sales") => Some(Page::SalesAnalysis),
        Some("customers") => Some(Page::CustomerAnalysis),
        Some("outstanding") => Some(Page::AllCustomerOutstanding),
        _ => None,
    };
    let Some(view) = session.view(&selection(&matches)?)? else {
        match page {
            Some(page) if page.needs_ledger() => bail!("Upload a file with --file to view {page}"),
            _ => bail!("Upload a file with --file first"),
        }
    };
    if let Some(page) = page {
        info!(%page, records = view.len(), "rendering page");
        if view.is_empty() {
            eprintln!("No data for the selected filters");
        }
    }

    match matches.subcommand() {
        Some(("info", _)) => print_tables(&[info_table(&session, &view)], output)?,
        Some(("dashboard", _)) => print_tables(&pages::dashboard(&view), output)?,
        Some(("sales", sales)) => {
            let only = sales.values_of("only").map(ExecutiveFilter::only);
            let table = pages::sales_analysis(&view, only.as_ref());
            print_tables(std::slice::from_ref(&table), output)?;
            export(&session, Download::Sales, sales, &table).await?;
        }
        Some(("customers", customers)) => {
            let tables = pages::customer_analysis(&view, customers.value_of("customer"));
            print_tables(&tables, output)?;
        }
        Some(("outstanding", outstanding)) => {
            let table = pages::all_customer_outstanding(&view);
            print_tables(std::slice::from_ref(&table), output)?;
            export(&session, Download::Outstanding, outstanding, &table).await?;
        }
        _ => unreachable!("subcommand required"),
    }
    Ok(())
}
