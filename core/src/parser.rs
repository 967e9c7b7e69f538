//! CSV ingestion boundary.
//!
//! RULE: parsing never fails. A short line leaves trailing fields empty,
//! an unparseable number becomes 0.0, and the row is still produced.
//! Columns are split on every comma; quoting is not interpreted.

use crate::record::Record;

/// Header row of the transaction CSV, in column order.
pub const HEADER: &str = "transaction_id,timestamp,sender_account,receiver_account,amount,\
transaction_type,merchant_category,location,device_used,is_fraud,fraud_type,\
time_since_last_transaction,spending_deviation_score,velocity_score,\
geo_anomaly_score,payment_channel,ip_address,device_hash";

/// A parsed row plus the number of numeric columns that held text which
/// could not be read as a number and were defaulted to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub record:    Record,
    pub defaulted: u32,
}

/// Parse one data line into a record.
pub fn parse_line(line: &str) -> ParsedRow {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut cols = line.split(',');
    let mut defaulted = 0;
    let mut text = || cols.next().unwrap_or_default().to_string();

    let transaction_id    = text();
    let timestamp         = text();
    let sender_account    = text();
    let receiver_account  = text();
    let amount_raw        = text();
    let transaction_type  = text();
    let merchant_category = text();
    let location          = text();
    let device_used       = text();
    let fraud_raw         = text();
    let fraud_type        = text();
    let time_since_last   = text();
    let spending_dev      = text();
    let velocity_raw      = text();
    let geo_raw           = text();
    let payment_channel   = text();
    let ip_address        = text();
    let device_hash       = text();

    let mut number = |raw: &str| match parse_number(raw) {
        Some(v) => v,
        None => {
            defaulted += 1;
            0.0
        }
    };
    let amount            = number(&amount_raw);
    let velocity_score    = number(&velocity_raw);
    let geo_anomaly_score = number(&geo_raw);

    ParsedRow {
        record: Record {
            transaction_id,
            timestamp,
            sender_account,
            receiver_account,
            amount,
            transaction_type,
            merchant_category,
            location,
            device_used,
            is_fraud: parse_flag(&fraud_raw),
            fraud_type,
            time_since_last_transaction: time_since_last,
            spending_deviation_score: spending_dev,
            velocity_score,
            geo_anomaly_score,
            payment_channel,
            ip_address,
            device_hash,
        },
        defaulted,
    }
}

/// Empty text is a legitimately missing value and is not counted as a
/// defect. Anything that does not parse to a finite f64 is, including
/// `inf`, `NaN` and overflowing literals such as `1e999`.
fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Only the exact token `true`, in any letter case, is set.
fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// Drop a leading UTF-8 byte-order mark, as editors write at the start
/// of a file.
pub fn strip_bom(line: &str) -> &str {
    line.strip_prefix('\u{feff}').unwrap_or(line)
}

/// True when the line is the CSV header rather than data.
pub fn is_header(line: &str) -> bool {
    strip_bom(line)
        .trim_end_matches('\r')
        .split(',')
        .next()
        .is_some_and(|first| first.trim() == "transaction_id")
}

/// Render a record back into one CSV line in column order.
pub fn to_line(r: &Record) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        r.transaction_id,
        r.timestamp,
        r.sender_account,
        r.receiver_account,
        r.amount,
        r.transaction_type,
        r.merchant_category,
        r.location,
        r.device_used,
        r.is_fraud,
        r.fraud_type,
        r.time_since_last_transaction,
        r.spending_deviation_score,
        r.velocity_score,
        r.geo_anomaly_score,
        r.payment_channel,
        r.ip_address,
        r.device_hash,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "T100,2023-08-22T09:22:43,ACC1,ACC2,250.75,transfer,retail,Tokyo,\
mobile,TRUE,none,12.5,0.8,7,0.31,UPI,10.0.0.1,abc123";

    #[test]
    fn parses_every_column_in_order() {
        let row = parse_line(FULL);
        let r = &row.record;
        assert_eq!(row.defaulted, 0);
        assert_eq!(r.transaction_id, "T100");
        assert_eq!(r.amount, 250.75);
        assert_eq!(r.transaction_type, "transfer");
        assert_eq!(r.location, "Tokyo");
        assert!(r.is_fraud);
        assert_eq!(r.time_since_last_transaction, "12.5");
        assert_eq!(r.velocity_score, 7.0);
        assert_eq!(r.geo_anomaly_score, 0.31);
        assert_eq!(r.payment_channel, "UPI");
        assert_eq!(r.device_hash, "abc123");
    }

    #[test]
    fn bad_numbers_default_to_zero_and_are_counted() {
        let row = parse_line("T1,ts,a,b,not-a-number,deposit,m,NY,d,false,f,,,oops,,card,ip,h");
        assert_eq!(row.record.amount, 0.0);
        assert_eq!(row.record.velocity_score, 0.0);
        assert_eq!(row.record.geo_anomaly_score, 0.0);
        assert_eq!(row.defaulted, 2);
        assert_eq!(row.record.payment_channel, "card");
    }

    #[test]
    fn short_line_leaves_trailing_fields_empty() {
        let row = parse_line("T9,ts,a,b,5\r");
        assert_eq!(row.record.amount, 5.0);
        assert_eq!(row.record.location, "");
        assert_eq!(row.record.payment_channel, "");
        assert!(!row.record.is_fraud);
    }

    #[test]
    fn fraud_flag_is_case_insensitive() {
        let cases = [("True", true), ("tRuE", true), ("yes", false), ("", false), (" true", false)];
        for (raw, expected) in cases {
            let line = format!("T,ts,a,b,1,t,m,L,d,{raw},f,,,,,card,ip,h");
            assert_eq!(parse_line(&line).record.is_fraud, expected, "flag {raw:?}");
        }
    }

    #[test]
    fn non_finite_numbers_are_counted_as_defaults() {
        let row = parse_line("T1,ts,a,b,1e999,deposit,m,NY,d,false,f,,,inf,-inf,card,ip,h");
        assert_eq!(row.record.amount, 0.0);
        assert_eq!(row.record.velocity_score, 0.0);
        assert_eq!(row.record.geo_anomaly_score, 0.0);
        assert_eq!(row.defaulted, 3);
        assert_eq!(parse_line("T2,ts,a,b,NaN,d,m,L,d,false,f,,,,,card,ip,h").defaulted, 1);
    }

    #[test]
    fn header_detection() {
        assert!(is_header(HEADER));
        assert!(is_header(&format!("\u{feff}{HEADER}")));
        assert!(!is_header(FULL));
        assert_eq!(strip_bom("\u{feff}T1,x"), "T1,x");
        assert_eq!(strip_bom("T1,x"), "T1,x");
    }

    #[test]
    fn to_line_parses_back() {
        let record = parse_line(FULL).record;
        assert_eq!(parse_line(&to_line(&record)).record, record);
    }
}
