mod logging;

use std::{
    backtrace::{Backtrace, BacktraceStatus},
    error::Error,
    path::PathBuf,
    process::ExitCode,
};

use card_statement_rs::{
    PdfDocument, StatementParser, TableSource, dump_tables,
    errors::{StatementParseError, StatementResult},
    write_csv,
};
use clap::Parser;

/// Exit status for a malformed percentage or amount in the statement.
const EXIT_FIELD_ERROR: u8 = 1;
/// Exit status for anything else (I/O, unreadable PDF, ...).
const EXIT_FAILURE: u8 = 2;

/// Parse a credit card statement PDF into a CSV ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dump all tables to csv files instead of parsing
    #[arg(short = 'c')]
    dump_tables: bool,

    /// Negate amounts (make expenses negative values)
    #[arg(short = 'n')]
    negate: bool,

    /// Input file (.pdf)
    infile: PathBuf,

    /// Output file (.csv)
    outfile: PathBuf,
}

fn main() -> ExitCode {
    logging::setup_logging();

    let args = Args::parse();
    tracing::debug!("Starting with args: {:?}", args);

    let result = run(&args);
    match &result {
        Ok(()) => {}
        Err(e) if e.is_field_error() => tracing::error!("{}", e),
        Err(e) => report(e),
    }

    ExitCode::from(exit_status(&result))
}

/// Process exit status for the outcome of a run.
fn exit_status(result: &StatementResult<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) if e.is_field_error() => EXIT_FIELD_ERROR,
        Err(_) => EXIT_FAILURE,
    }
}

fn run(args: &Args) -> StatementResult<()> {
    let parser = StatementParser::builder().negate_amounts(args.negate).build()?;
    let document = PdfDocument::open(&args.infile)?;

    if args.dump_tables {
        let tables = document.tables(parser.options().pages)?;
        let written = dump_tables(&tables, &args.outfile)?;
        tracing::info!("Dumped {} tables from {}", written.len(), document.path().display());
        return Ok(());
    }

    let statement = parser.parse_source(&document)?;
    if let Some((first, last)) = statement.date_span() {
        tracing::info!("{} ledger rows from {} to {}", statement.len(), first, last);
    }

    write_csv(&statement, &args.outfile)?;
    tracing::info!("Wrote {}", args.outfile.display());
    Ok(())
}

/// Logs the error with its whole chain of causes, plus a backtrace when
/// `RUST_BACKTRACE` asks for one.
fn report(error: &StatementParseError) {
    tracing::error!("{}", error);
    tracing::error!("{:?}", error);

    let mut source = error.source();
    while let Some(cause) = source {
        tracing::error!("  caused by: {}", cause);
        source = cause.source();
    }

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        tracing::error!("backtrace:\n{}", backtrace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io;

    #[rstest]
    #[case(Ok(()), 0)]
    #[case(Err(StatementParseError::InvalidPercent("two%".into())), EXIT_FIELD_ERROR)]
    #[case(Err(StatementParseError::InvalidPercentValue("99999999999999999999999%".into())), EXIT_FIELD_ERROR)]
    #[case(Err(StatementParseError::InvalidAmount("5.00".into())), EXIT_FIELD_ERROR)]
    #[case(Err(StatementParseError::InvalidAmountValue("$99999999999999999999999999999.00".into())), EXIT_FIELD_ERROR)]
    #[case(Err(StatementParseError::Io(io::Error::new(io::ErrorKind::NotFound, "statement.pdf"))), EXIT_FAILURE)]
    #[case(Err(StatementParseError::Pdf(lopdf::Error::Type)), EXIT_FAILURE)]
    #[case(Err(StatementParseError::InvalidPageRange { first: 0, last: None }), EXIT_FAILURE)]
    fn test_exit_status(#[case] result: StatementResult<()>, #[case] expected: u8) {
        assert_eq!(exit_status(&result), expected);
    }

    #[test]
    fn test_report_walks_source_chain() {
        let error = StatementParseError::Io(io::Error::other("disk full"));
        report(&error);
        assert_eq!(error.source().map(|e| e.to_string()), Some("disk full".to_string()));
    }
}
