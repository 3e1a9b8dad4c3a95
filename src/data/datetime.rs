//! Strict parsing and canonical rendering of temporal literals.
//!
//! Literals are validated eagerly: a malformed string is a semantic-check
//! failure when the value is constructed, never a deferred evaluation error.

use crate::expression::{ExpressionError, ExpressionResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn parse_date(text: &str) -> ExpressionResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| {
        ExpressionError::semantic(format!(
            "date:{} in unsupported format, please use yyyy-MM-dd",
            text
        ))
    })
}

pub fn parse_time(text: &str) -> ExpressionResult<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), TIME_FORMAT).map_err(|_| {
        ExpressionError::semantic(format!(
            "time:{} in unsupported format, please use HH:mm:ss[.SSSSSSSSS]",
            text
        ))
    })
}

pub fn parse_datetime(text: &str) -> ExpressionResult<NaiveDateTime> {
    try_parse_datetime(text).ok_or_else(|| {
        ExpressionError::semantic(format!(
            "datetime:{} in unsupported format, please use yyyy-MM-dd HH:mm:ss[.SSSSSSSSS]",
            text
        ))
    })
}

/// Parse a timestamp literal; the text is read as UTC
pub fn parse_timestamp(text: &str) -> ExpressionResult<DateTime<Utc>> {
    try_parse_datetime(text)
        .map(|datetime| Utc.from_utc_datetime(&datetime))
        .ok_or_else(|| {
            ExpressionError::semantic(format!(
                "timestamp:{} in unsupported format, please use yyyy-MM-dd HH:mm:ss[.SSSSSSSSS]",
                text
            ))
        })
}

fn try_parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Render a time, with a fraction only when it is non-zero
pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMATS[0]).to_string()
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    format_datetime(&timestamp.naive_utc())
}
