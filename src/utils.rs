//! Stateless helpers shared by the function libraries.
//!
//! - **matches** / **WildcardMatcher**: SQL wildcard matching for LIKE
//! - **Period**: `YYYYMM` / `YYMM` period encoding used by PERIOD_ADD and PERIOD_DIFF
//! - **to_unix_time**: decoding of compact numeric datetimes such as `YYMMDD`
//!
//! Both compact encodings resolve two-digit years with the same [`PIVOT_YEAR`].

use crate::expression::{ExpressionError, ExpressionResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;
use regex::Regex;

/// Two-digit years below this value belong to the 2000s, the rest to the 1900s
pub const PIVOT_YEAR: i32 = 70;

const ESCAPE: char = '\\';

/// Expand a two-digit year with the pivot rule
pub fn pivot_year(two_digit_year: i32) -> i32 {
    if two_digit_year < PIVOT_YEAR {
        2000 + two_digit_year
    } else {
        1900 + two_digit_year
    }
}

/// Translate a wildcard pattern into an anchored regular expression.
///
/// `%` matches any sequence, `_` exactly one character and `\` makes the
/// following character literal. Everything else is matched literally.
pub fn pattern_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');
    let mut escaped = false;
    for c in pattern.chars() {
        if !escaped && c == ESCAPE {
            escaped = true;
            continue;
        }
        match c {
            '%' if !escaped => regex.push_str(".*"),
            '_' if !escaped => regex.push('.'),
            _ => regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        escaped = false;
    }
    regex.push('$');
    regex
}

fn compile_pattern(pattern: &str) -> ExpressionResult<Regex> {
    Regex::new(&pattern_to_regex(pattern)).map_err(|e| {
        ExpressionError::evaluation(format!("invalid wildcard pattern {}: {}", pattern, e))
    })
}

/// Case-sensitive wildcard match of the whole `text` against `pattern`
pub fn matches(pattern: &str, text: &str) -> ExpressionResult<bool> {
    Ok(compile_pattern(pattern)?.is_match(text))
}

/// Wildcard matcher that keeps the last compiled pattern, so a constant
/// pattern is compiled once per query rather than once per tuple.
#[derive(Debug, Default)]
pub struct WildcardMatcher {
    last: Mutex<Option<(String, Regex)>>,
}

impl WildcardMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same result as [`matches`]
    pub fn matches(&self, pattern: &str, text: &str) -> ExpressionResult<bool> {
        let mut last = self.last.lock();
        match last.as_ref() {
            Some((cached, regex)) if cached == pattern => Ok(regex.is_match(text)),
            _ => {
                let regex = compile_pattern(pattern)?;
                let matched = regex.is_match(text);
                *last = Some((pattern.to_string(), regex));
                Ok(matched)
            }
        }
    }

    #[cfg(test)]
    fn cached_pattern(&self) -> Option<String> {
        self.last.lock().as_ref().map(|(pattern, _)| pattern.clone())
    }
}

/// A year and month pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: i32,
}

impl Period {
    /// Months elapsed since year zero
    pub fn total_months(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month - 1)
    }

    pub fn from_total_months(months: i64) -> ExpressionResult<Self> {
        let year = i32::try_from(months.div_euclid(12))
            .map_err(|_| ExpressionError::evaluation(format!("period out of range: {} months", months)))?;
        Ok(Self {
            year,
            month: months.rem_euclid(12) as i32 + 1,
        })
    }

    pub fn plus_months(&self, months: i64) -> ExpressionResult<Self> {
        let total = self.total_months().checked_add(months).ok_or_else(|| {
            ExpressionError::evaluation(format!("period overflow: {:?} plus {} months", self, months))
        })?;
        Period::from_total_months(total)
    }
}

/// Decode a `YYMM` or `YYYYMM` period.
///
/// Values below 10000 carry a two-digit year resolved with [`PIVOT_YEAR`],
/// so `9912` is December 1999 and `0001` is January 2000.
pub fn to_period(period: i64) -> ExpressionResult<Period> {
    let month = period % 100;
    if period < 0 || !(1..=12).contains(&month) {
        return Err(ExpressionError::evaluation(format!(
            "invalid period {}, please use format YYMM or YYYYMM",
            period
        )));
    }
    let year = period / 100;
    let year = if period < 10_000 {
        pivot_year(year as i32)
    } else {
        i32::try_from(year)
            .map_err(|_| ExpressionError::evaluation(format!("period out of range: {}", period)))?
    };
    Ok(Period {
        year,
        month: month as i32,
    })
}

/// Encode a period as `YYYYMM`
pub fn from_period(period: &Period) -> i64 {
    i64::from(period.year) * 100 + i64::from(period.month)
}

/// Quarter (1 to 4) of a month (1 to 12)
pub fn quarter(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

/// Decode a compact numeric datetime.
///
/// The number of digits selects the layout: up to 6 digits is `YYMMDD`, up to
/// 8 is `YYYYMMDD`, up to 12 is `YYMMDDhhmmss` and anything longer is
/// `YYYYMMDDhhmmss`. Two-digit years go through [`pivot_year`].
pub fn to_unix_time(time: i64) -> ExpressionResult<NaiveDateTime> {
    let invalid = || ExpressionError::evaluation(format!("invalid compact datetime value {}", time));
    if time < 0 {
        return Err(invalid());
    }
    let (date_part, time_part, two_digit_year) = match time {
        t if t < 1_000_000 => (t, 0, true),
        t if t < 100_000_000 => (t, 0, false),
        t if t < 1_000_000_000_000 => (t / 1_000_000, t % 1_000_000, true),
        t => (t / 1_000_000, t % 1_000_000, false),
    };
    let year = (date_part / 10_000) as i32;
    let year = if two_digit_year { pivot_year(year) } else { year };
    let month = (date_part / 100 % 100) as u32;
    let day = (date_part % 100) as u32;
    let hour = (time_part / 10_000) as u32;
    let minute = (time_part / 100 % 100) as u32;
    let second = (time_part % 100) as u32;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    let time_of_day = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
    Ok(date.and_time(time_of_day))
}

/// Decode a compact numeric datetime carrying a fractional second
pub fn to_unix_time_fraction(time: f64) -> ExpressionResult<NaiveDateTime> {
    let whole = time.trunc();
    let datetime = to_unix_time(whole as i64)?;
    let nanos = ((time - whole) * 1e9).round() as i64;
    Ok(datetime + chrono::Duration::nanoseconds(nanos))
}
