//! Helpers for presenting ledger data to the user.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};
use time_tz::{Offset, TimeZone};

use crate::models::TransactionType;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Format `number` as pesos with two decimal places, e.g. "₱1,500.00".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();
    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    // numfmt renders zero as "0".
    if number == 0.0 {
        return "₱0.00".to_owned();
    }

    let formatter = if number < 0.0 {
        NEGATIVE_FMT.get_or_init(|| currency_formatter("-₱"))
    } else {
        POSITIVE_FMT.get_or_init(|| currency_formatter("₱"))
    };

    let formatted = match formatter {
        Some(formatter) => formatter.fmt_string(number.abs()),
        None if number < 0.0 => format!("-₱{:.2}", number.abs()),
        None => format!("₱{number:.2}"),
    };

    pad_decimals(formatted)
}

fn currency_formatter(prefix: &str) -> Option<Formatter> {
    Formatter::currency(prefix)
        .ok()
        .map(|formatter| formatter.precision(Precision::Decimals(2)))
}

/// numfmt drops trailing zeros, so "12.30" comes out as "12.3" and "12.00" as "12".
fn pad_decimals(formatted: String) -> String {
    match formatted.rsplit_once('.') {
        Some((_, decimals)) if decimals.len() >= 2 => formatted,
        Some((_, decimals)) => format!("{formatted}{}", "0".repeat(2 - decimals.len())),
        None => format!("{formatted}.00"),
    }
}

/// Format a transaction amount with its direction, "-₱100.00" for cash in
/// and "+₱100.00" for cash out.
pub fn format_transaction_amount(kind: TransactionType, amount: f64) -> String {
    let sign = match kind {
        TransactionType::CashIn => '-',
        TransactionType::CashOut => '+',
    };

    format!("{sign}{}", format_currency(amount.abs()))
}

/// Format a balance, showing a missing balance as zero.
pub fn format_balance(balance: Option<f64>) -> String {
    format_currency(balance.unwrap_or(0.0))
}

/// Convert `at` to `canonical_timezone`, keeping it in UTC if the timezone is
/// unknown.
pub fn to_local(at: OffsetDateTime, canonical_timezone: &str) -> OffsetDateTime {
    match time_tz::timezones::get_by_name(canonical_timezone) {
        Some(tz) => at.to_offset(tz.get_offset_utc(&at).to_utc()),
        None => {
            tracing::warn!("Unknown timezone \"{canonical_timezone}\", showing times in UTC");
            at.to_offset(UtcOffset::UTC)
        }
    }
}

/// Format `at` as local date and time, e.g. "2025-07-01 16:30".
pub fn format_timestamp(at: OffsetDateTime, canonical_timezone: &str) -> String {
    let local = to_local(at, canonical_timezone);

    local
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| local.to_string())
}

/// The greeting for the local hour: "Morning" before noon, "Afternoon" before
/// 5 pm and "Evening" after that.
pub fn greeting(hour: u8) -> &'static str {
    match hour {
        0..12 => "Morning",
        12..17 => "Afternoon",
        _ => "Evening",
    }
}
