//! Date and time functions.
//!
//! Date-part extractors accept DATE, DATETIME and TIMESTAMP; time-part
//! extractors accept TIME, DATETIME and TIMESTAMP. Temporal types never widen
//! into each other, so every accepted type gets its own overload.
//!
//! Format strings use MySQL `%` specifiers (`%Y-%m-%d %H:%i:%s`).
//! Compact numeric datetimes and periods decode through [`crate::utils`].

use crate::data::datetime::{parse_date, parse_datetime, parse_time};
use crate::data::{ExprType, ExprValue};
use crate::expression::{ExpressionError, ExpressionResult};
use crate::function::{FunctionResolver, RepositoryBuilder};
use crate::utils;
use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc,
};

const DATE: ExprType = ExprType::Date;
const TIME: ExprType = ExprType::Time;
const DATETIME: ExprType = ExprType::Datetime;
const TIMESTAMP: ExprType = ExprType::Timestamp;
const STRING: ExprType = ExprType::String;
const INTEGER: ExprType = ExprType::Integer;
const LONG: ExprType = ExprType::Long;
const DOUBLE: ExprType = ExprType::Double;

/// Types carrying a calendar date
const DATE_LIKE: [ExprType; 3] = [DATE, DATETIME, TIMESTAMP];
/// Types carrying a time of day
const TIME_LIKE: [ExprType; 3] = [TIME, DATETIME, TIMESTAMP];

/// Days between year 0 and `0001-01-01`, the origin chrono counts from
const DAYS_BEFORE_COMMON_ERA: i64 = 365;
const SECONDS_PER_DAY: i64 = 86_400;

type Extractor = fn(&ExprValue) -> ExpressionResult<ExprValue>;

pub fn register(repo: &mut RepositoryBuilder) {
    register_arithmetic(repo);
    register_clock(repo);
    register_conversions(repo);
    register_formatting(repo);
    register_parts(repo);
    register_unix_time(repo);
    register_periods(repo);
}

fn register_arithmetic(repo: &mut RepositoryBuilder) {
    for (name, sign) in [("adddate", 1), ("date_add", 1), ("subdate", -1), ("date_sub", -1)] {
        repo.register(
            FunctionResolver::new(name)
                .scalar(&[DATE, LONG], DATE, move |args| {
                    let days = signed_days(&args[1], sign)?;
                    Ok(ExprValue::Date(plus_days(args[0].date_value()?, days)?))
                })
                .scalar(&[DATETIME, LONG], DATETIME, move |args| {
                    let days = signed_days(&args[1], sign)?;
                    Ok(ExprValue::Datetime(plus_days(args[0].datetime_value()?, days)?))
                })
                .scalar(&[TIMESTAMP, LONG], DATETIME, move |args| {
                    let days = signed_days(&args[1], sign)?;
                    Ok(ExprValue::Datetime(plus_days(args[0].datetime_value()?, days)?))
                }),
        );
    }

    for (name, sign) in [("addtime", 1), ("subtime", -1)] {
        let resolver = FunctionResolver::new(name).scalar(&[TIME, TIME], TIME, move |args| {
            let delta = since_midnight(args[1].time_value()?) * sign;
            Ok(ExprValue::Time(args[0].time_value()?.overflowing_add_signed(delta).0))
        });
        let resolver = DATE_LIKE.into_iter().fold(resolver, |resolver, ty| {
            resolver.scalar(&[ty, TIME], DATETIME, move |args| {
                let delta = since_midnight(args[1].time_value()?) * sign;
                Ok(ExprValue::Datetime(shift(args[0].datetime_value()?, delta)?))
            })
        });
        repo.register(resolver);
    }

    repo.register(
        FunctionResolver::new("convert_tz")
            .scalar(&[DATETIME, STRING, STRING], DATETIME, convert_tz)
            .scalar(&[TIMESTAMP, STRING, STRING], DATETIME, convert_tz),
    );

    let mut datediff = FunctionResolver::new("datediff");
    for left in DATE_LIKE {
        for right in DATE_LIKE {
            datediff = datediff.scalar(&[left, right], INTEGER, |args| {
                let days = args[0].date_value()?.signed_duration_since(args[1].date_value()?).num_days();
                Ok(ExprValue::Integer(days as i32))
            });
        }
    }
    repo.register(datediff);

    repo.register(
        FunctionResolver::new("timediff")
            .scalar(&[TIME, TIME], TIME, |args| {
                let delta = args[0].time_value()?.signed_duration_since(args[1].time_value()?);
                Ok(ExprValue::Time(NaiveTime::MIN.overflowing_add_signed(delta).0))
            })
            .scalar(&[DATETIME, DATETIME], TIME, datetime_diff)
            .scalar(&[TIMESTAMP, TIMESTAMP], TIME, datetime_diff),
    );
}

fn register_clock(repo: &mut RepositoryBuilder) {
    let clock = |name: &str, return_type: ExprType, now: fn() -> ExprValue| {
        FunctionResolver::new(name).unguarded(&[], return_type, move |_| Ok(now()))
    };
    repo.register(clock("curdate", DATE, || ExprValue::Date(Local::now().date_naive())));
    repo.register(clock("current_date", DATE, || ExprValue::Date(Local::now().date_naive())));
    repo.register(clock("curtime", TIME, || ExprValue::Time(Local::now().time())));
    repo.register(clock("current_time", TIME, || ExprValue::Time(Local::now().time())));
    repo.register(clock("now", TIMESTAMP, || ExprValue::Timestamp(Utc::now())));
    repo.register(clock("current_timestamp", TIMESTAMP, || ExprValue::Timestamp(Utc::now())));
    repo.register(clock("localtime", TIMESTAMP, || ExprValue::Timestamp(Utc::now())));
    repo.register(clock("localtimestamp", TIMESTAMP, || ExprValue::Timestamp(Utc::now())));
    repo.register(clock("sysdate", DATETIME, || ExprValue::Datetime(Local::now().naive_local())));
    repo.register(clock("utc_date", DATE, || ExprValue::Date(Utc::now().date_naive())));
    repo.register(clock("utc_time", TIME, || ExprValue::Time(Utc::now().time())));
    repo.register(clock("utc_timestamp", DATETIME, || ExprValue::Datetime(Utc::now().naive_utc())));
}

fn register_conversions(repo: &mut RepositoryBuilder) {
    repo.register(
        per_type("date", &DATE_LIKE, DATE, |v| Ok(ExprValue::Date(v.date_value()?))).scalar(
            &[STRING],
            DATE,
            |args| {
                let text = args[0].string_value()?;
                let date = match parse_date(text) {
                    Ok(date) => date,
                    Err(_) => parse_datetime(text)?.date(),
                };
                Ok(ExprValue::Date(date))
            },
        ),
    );
    repo.register(
        per_type("time", &TIME_LIKE, TIME, |v| Ok(ExprValue::Time(v.time_value()?))).scalar(
            &[STRING],
            TIME,
            |args| {
                let text = args[0].string_value()?;
                let time = match parse_time(text) {
                    Ok(time) => time,
                    Err(_) => parse_datetime(text)?.time(),
                };
                Ok(ExprValue::Time(time))
            },
        ),
    );

    let timestamp = per_type("timestamp", &DATE_LIKE, TIMESTAMP, |v| {
        Ok(ExprValue::Timestamp(v.timestamp_value()?))
    })
    .scalar(&[STRING], TIMESTAMP, |args| {
        Ok(ExprValue::timestamp(args[0].string_value()?)?)
    })
    .scalar(&[STRING, TIME], TIMESTAMP, |args| {
        let base = ExprValue::timestamp(args[0].string_value()?)?.datetime_value()?;
        let shifted = shift(base, since_midnight(args[1].time_value()?))?;
        Ok(ExprValue::Timestamp(Utc.from_utc_datetime(&shifted)))
    });
    let timestamp = DATE_LIKE.into_iter().fold(timestamp, |resolver, ty| {
        resolver.scalar(&[ty, TIME], TIMESTAMP, |args| {
            let shifted = shift(args[0].datetime_value()?, since_midnight(args[1].time_value()?))?;
            Ok(ExprValue::Timestamp(Utc.from_utc_datetime(&shifted)))
        })
    });
    repo.register(timestamp);

    repo.register(FunctionResolver::new("makedate").scalar(&[INTEGER, INTEGER], DATE, |args| {
        let year = args[0].integer_value()?;
        let day_of_year = args[1].integer_value()?;
        if day_of_year <= 0 {
            return Ok(ExprValue::Null);
        }
        let date = NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|first| first.checked_add_days(Days::new(u64::from(day_of_year.unsigned_abs()) - 1)));
        Ok(date.map_or(ExprValue::Null, ExprValue::Date))
    }));
    repo.register(
        FunctionResolver::new("maketime").scalar(&[INTEGER, INTEGER, DOUBLE], TIME, |args| {
            let hour = args[0].integer_value()?;
            let minute = args[1].integer_value()?;
            let seconds = args[2].double_value()?;
            Ok(make_time(hour, minute, seconds).map_or(ExprValue::Null, ExprValue::Time))
        }),
    );
    repo.register(FunctionResolver::new("sec_to_time").scalar(&[LONG], TIME, |args| {
        let seconds = args[0].long_value()?;
        let time = u32::try_from(seconds)
            .ok()
            .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0));
        Ok(time.map_or(ExprValue::Null, ExprValue::Time))
    }));
    repo.register(per_type("time_to_sec", &TIME_LIKE, LONG, |v| {
        Ok(ExprValue::Long(i64::from(v.time_value()?.num_seconds_from_midnight())))
    }));
    repo.register(FunctionResolver::new("str_to_date").scalar(&[STRING, STRING], DATE, |args| {
        let text = args[0].string_value()?;
        let format = to_chrono_format(args[1].string_value()?);
        let date = NaiveDate::parse_from_str(text, &format)
            .or_else(|_| NaiveDateTime::parse_from_str(text, &format).map(|dt| dt.date()));
        Ok(date.map_or(ExprValue::Null, ExprValue::Date))
    }));
}

fn register_formatting(repo: &mut RepositoryBuilder) {
    repo.register(DATE_LIKE.into_iter().fold(
        FunctionResolver::new("date_format"),
        |resolver, ty| {
            resolver.scalar(&[ty, STRING], STRING, |args| {
                let datetime = args[0].datetime_value()?;
                Ok(format_or_null(mysql_format(&datetime, args[1].string_value()?, false)))
            })
        },
    ));
    repo.register(TIME_LIKE.into_iter().fold(
        FunctionResolver::new("time_format"),
        |resolver, ty| {
            resolver.scalar(&[ty, STRING], STRING, |args| {
                let datetime = NaiveDate::default().and_time(args[0].time_value()?);
                Ok(format_or_null(mysql_format(&datetime, args[1].string_value()?, true)))
            })
        },
    ));
    repo.register(
        [DATE, TIME, DATETIME, TIMESTAMP]
            .into_iter()
            .fold(FunctionResolver::new("get_format"), |resolver, ty| {
                resolver.scalar(&[ty, STRING], STRING, get_format)
            }),
    );
}

fn register_parts(repo: &mut RepositoryBuilder) {
    let date_parts: [(&str, ExprType, Extractor); 16] = [
        ("day", INTEGER, |v| integer(v.date_value()?.day())),
        ("dayofmonth", INTEGER, |v| integer(v.date_value()?.day())),
        ("dayname", STRING, |v| Ok(ExprValue::String(v.date_value()?.format("%A").to_string()))),
        ("dayofweek", INTEGER, |v| integer(v.date_value()?.weekday().number_from_sunday())),
        ("dayofyear", INTEGER, |v| integer(v.date_value()?.ordinal())),
        ("week", INTEGER, |v| integer(v.date_value()?.iso_week().week())),
        ("weekofyear", INTEGER, |v| integer(v.date_value()?.iso_week().week())),
        ("weekday", INTEGER, |v| integer(v.date_value()?.weekday().number_from_monday())),
        ("year", INTEGER, |v| Ok(ExprValue::Integer(v.date_value()?.year()))),
        ("month", INTEGER, |v| integer(v.date_value()?.month())),
        ("monthname", STRING, |v| Ok(ExprValue::String(v.date_value()?.format("%B").to_string()))),
        ("quarter", INTEGER, |v| integer(utils::quarter(v.date_value()?.month()))),
        ("yearweek", INTEGER, |v| {
            let week = v.date_value()?.iso_week();
            Ok(ExprValue::Integer(week.year() * 100 + week.week() as i32))
        }),
        ("last_day", DATE, |v| {
            let date = v.date_value()?;
            let last = date
                .with_day(1)
                .and_then(|first| first.checked_add_months(chrono::Months::new(1)))
                .and_then(|next| next.pred_opt());
            Ok(last.map_or(ExprValue::Null, ExprValue::Date))
        }),
        ("to_days", LONG, |v| Ok(ExprValue::Long(to_days(v.date_value()?)))),
        ("to_seconds", LONG, |v| {
            let seconds = i64::from(v.time_value().map_or(0, |t| t.num_seconds_from_midnight()));
            Ok(ExprValue::Long(to_days(v.date_value()?) * SECONDS_PER_DAY + seconds))
        }),
    ];
    for (name, return_type, extract) in date_parts {
        repo.register(per_type(name, &DATE_LIKE, return_type, extract));
    }

    let time_parts: [(&str, Extractor); 4] = [
        ("hour", |v| integer(v.time_value()?.hour())),
        ("minute", |v| integer(v.time_value()?.minute())),
        ("second", |v| integer(v.time_value()?.second())),
        ("microsecond", |v| integer(v.time_value()?.nanosecond() / 1_000)),
    ];
    for (name, extract) in time_parts {
        repo.register(per_type(name, &TIME_LIKE, INTEGER, extract));
    }

    repo.register(
        FunctionResolver::new("from_days").scalar(&[LONG], DATE, |args| {
            let date = args[0]
                .long_value()?
                .checked_sub(DAYS_BEFORE_COMMON_ERA)
                .and_then(|days| i32::try_from(days).ok())
                .and_then(NaiveDate::from_num_days_from_ce_opt);
            Ok(date.map_or(ExprValue::Null, ExprValue::Date))
        }),
    );
}

fn register_unix_time(repo: &mut RepositoryBuilder) {
    repo.register(
        FunctionResolver::new("from_unixtime")
            .scalar(&[LONG], DATETIME, |args| {
                let datetime = DateTime::<Utc>::from_timestamp(args[0].long_value()?, 0);
                Ok(datetime.map_or(ExprValue::Null, |dt| ExprValue::Datetime(dt.naive_utc())))
            })
            .scalar(&[DOUBLE], DATETIME, |args| {
                let seconds = args[0].double_value()?;
                let whole = seconds.floor();
                let nanos = ((seconds - whole) * 1e9).round() as u32;
                let datetime = DateTime::<Utc>::from_timestamp(whole as i64, nanos.min(999_999_999));
                Ok(datetime.map_or(ExprValue::Null, |dt| ExprValue::Datetime(dt.naive_utc())))
            })
            .scalar(&[LONG, STRING], STRING, |args| {
                let Some(datetime) = DateTime::<Utc>::from_timestamp(args[0].long_value()?, 0) else {
                    return Ok(ExprValue::Null);
                };
                Ok(format_or_null(mysql_format(&datetime.naive_utc(), args[1].string_value()?, false)))
            }),
    );

    let unix_timestamp = FunctionResolver::new("unix_timestamp")
        .unguarded(&[], LONG, |_| Ok(ExprValue::Long(Utc::now().timestamp())))
        .scalar(&[LONG], LONG, |args| {
            let datetime = utils::to_unix_time(args[0].long_value()?)?;
            Ok(ExprValue::Long(Utc.from_utc_datetime(&datetime).timestamp()))
        })
        .scalar(&[DOUBLE], DOUBLE, |args| {
            let datetime = utils::to_unix_time_fraction(args[0].double_value()?)?;
            Ok(ExprValue::Double(epoch_seconds(&datetime)))
        })
        .scalar(&[TIME], LONG, |args| {
            Err(ExpressionError::evaluation(format!(
                "invalid call function unix_timestamp on [{}] type",
                args[0].expr_type()
            )))
        });
    repo.register(DATE_LIKE.into_iter().fold(unix_timestamp, |resolver, ty| {
        resolver.scalar(&[ty], LONG, |args| {
            Ok(ExprValue::Long(args[0].timestamp_value()?.timestamp()))
        })
    }));
}

fn register_periods(repo: &mut RepositoryBuilder) {
    repo.register(FunctionResolver::new("period_add").scalar(&[LONG, LONG], INTEGER, |args| {
        let period = utils::to_period(args[0].long_value()?)?.plus_months(args[1].long_value()?)?;
        period_integer(utils::from_period(&period))
    }));
    repo.register(FunctionResolver::new("period_diff").scalar(&[LONG, LONG], INTEGER, |args| {
        let left = utils::to_period(args[0].long_value()?)?;
        let right = utils::to_period(args[1].long_value()?)?;
        period_integer(left.total_months() - right.total_months())
    }));
}

fn per_type(name: &str, types: &[ExprType], return_type: ExprType, extract: Extractor) -> FunctionResolver {
    types
        .iter()
        .fold(FunctionResolver::new(name), |resolver, ty| {
            resolver.scalar(&[*ty], return_type, move |args| extract(&args[0]))
        })
}

fn integer(value: u32) -> ExpressionResult<ExprValue> {
    i32::try_from(value)
        .map(ExprValue::Integer)
        .map_err(|_| ExpressionError::evaluation(format!("integer overflow: {}", value)))
}

fn period_integer(value: i64) -> ExpressionResult<ExprValue> {
    i32::try_from(value)
        .map(ExprValue::Integer)
        .map_err(|_| ExpressionError::evaluation(format!("period out of range: {}", value)))
}

fn format_or_null(text: Option<String>) -> ExprValue {
    text.map_or(ExprValue::Null, ExprValue::String)
}

fn since_midnight(time: NaiveTime) -> Duration {
    time.signed_duration_since(NaiveTime::MIN)
}

fn shift(datetime: NaiveDateTime, delta: Duration) -> ExpressionResult<NaiveDateTime> {
    datetime
        .checked_add_signed(delta)
        .ok_or_else(|| ExpressionError::evaluation(format!("datetime overflow: {} + {}", datetime, delta)))
}

trait AddDays: Sized + Copy + std::fmt::Display {
    fn checked_add(self, days: Days) -> Option<Self>;
    fn checked_sub(self, days: Days) -> Option<Self>;
}

impl AddDays for NaiveDate {
    fn checked_add(self, days: Days) -> Option<Self> {
        self.checked_add_days(days)
    }
    fn checked_sub(self, days: Days) -> Option<Self> {
        self.checked_sub_days(days)
    }
}

impl AddDays for NaiveDateTime {
    fn checked_add(self, days: Days) -> Option<Self> {
        self.checked_add_days(days)
    }
    fn checked_sub(self, days: Days) -> Option<Self> {
        self.checked_sub_days(days)
    }
}

/// Day count of an interval argument, negated for the subtracting variants
fn signed_days(value: &ExprValue, sign: i64) -> ExpressionResult<i64> {
    let days = value.long_value()?;
    days.checked_mul(sign)
        .ok_or_else(|| ExpressionError::evaluation(format!("day interval overflow: {}", days)))
}

fn plus_days<T: AddDays>(value: T, days: i64) -> ExpressionResult<T> {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        value.checked_add(magnitude)
    } else {
        value.checked_sub(magnitude)
    };
    shifted.ok_or_else(|| ExpressionError::evaluation(format!("date overflow: {} plus {} days", value, days)))
}

fn datetime_diff(args: &[ExprValue]) -> ExpressionResult<ExprValue> {
    let delta = args[0].datetime_value()?.signed_duration_since(args[1].datetime_value()?);
    Ok(ExprValue::Time(NaiveTime::MIN.overflowing_add_signed(delta).0))
}

fn convert_tz(args: &[ExprValue]) -> ExpressionResult<ExprValue> {
    let datetime = args[0].datetime_value()?;
    let (Some(from), Some(to)) = (
        parse_offset(args[1].string_value()?),
        parse_offset(args[2].string_value()?),
    ) else {
        return Ok(ExprValue::Null);
    };
    let converted = from
        .from_local_datetime(&datetime)
        .single()
        .map(|instant| instant.with_timezone(&to).naive_local());
    Ok(converted.map_or(ExprValue::Null, ExprValue::Datetime))
}

/// Parse a `+hh:mm` / `-hh:mm` offset within `-13:59` and `+14:00`
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    let sign = match text.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let (hours, minutes) = text[1..].split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }
    let seconds = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60)?
        .checked_mul(sign)?;
    if !(-(13 * 3600 + 59 * 60)..=14 * 3600).contains(&seconds) {
        return None;
    }
    FixedOffset::east_opt(seconds)
}

fn make_time(hour: i32, minute: i32, seconds: f64) -> Option<NaiveTime> {
    if seconds < 0.0 || !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    NaiveTime::from_hms_nano_opt(
        u32::try_from(hour).ok()?,
        u32::try_from(minute).ok()?,
        whole as u32,
        nanos.min(999_999_999),
    )
}

fn to_days(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + DAYS_BEFORE_COMMON_ERA
}

fn epoch_seconds(datetime: &NaiveDateTime) -> f64 {
    let instant = Utc.from_utc_datetime(datetime);
    instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) / 1e9
}

fn get_format(args: &[ExprValue]) -> ExpressionResult<ExprValue> {
    let value = &args[0];
    let standard = args[1].string_value()?.to_uppercase();
    let pattern = match (value.expr_type(), standard.as_str()) {
        (ExprType::Date, "USA") => "%m.%d.%Y",
        (ExprType::Date, "JIS" | "ISO") => "%Y-%m-%d",
        (ExprType::Date, "EUR") => "%d.%m.%Y",
        (ExprType::Date, "INTERNAL") => "%Y%m%d",
        (ExprType::Datetime | ExprType::Timestamp, "USA" | "EUR") => "%Y-%m-%d %H.%i.%s",
        (ExprType::Datetime | ExprType::Timestamp, "JIS" | "ISO") => "%Y-%m-%d %H:%i:%s",
        (ExprType::Datetime | ExprType::Timestamp, "INTERNAL") => "%Y%m%d%H%i%s",
        (ExprType::Time, "USA" | "EUR") => "%H.%i.%s",
        (ExprType::Time, "JIS" | "ISO") => "%H:%i:%s",
        (ExprType::Time, "INTERNAL") => "%H%i%s",
        (ty, _) => {
            return Err(ExpressionError::evaluation(format!(
                "Invalid call of get_format function on {} type with standard {}",
                ty, standard
            )))
        }
    };
    let datetime = match value {
        ExprValue::Time(time) => NaiveDate::default().and_time(*time),
        other => other.datetime_value()?,
    };
    Ok(format_or_null(mysql_format(&datetime, pattern, false)))
}

const DATE_SPECIFIERS: &str = "abcDdejMmUuVvWwXxYy";

/// Render `datetime` with MySQL `%` specifiers.
///
/// With `time_only` a date specifier makes the whole result `None`.
fn mysql_format(datetime: &NaiveDateTime, pattern: &str, time_only: bool) -> Option<String> {
    let hour = datetime.hour();
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if hour < 12 { "AM" } else { "PM" };

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(spec) = chars.next() else {
            out.push('%');
            break;
        };
        if time_only && DATE_SPECIFIERS.contains(spec) {
            return None;
        }
        let piece = match spec {
            'H' => format!("{:02}", hour),
            'k' => hour.to_string(),
            'h' | 'I' => format!("{:02}", hour12),
            'l' => hour12.to_string(),
            'i' => format!("{:02}", datetime.minute()),
            'S' | 's' => format!("{:02}", datetime.second()),
            'f' => format!("{:06}", datetime.nanosecond() / 1_000),
            'p' => meridiem.to_string(),
            'r' => format!(
                "{:02}:{:02}:{:02} {}",
                hour12,
                datetime.minute(),
                datetime.second(),
                meridiem
            ),
            'T' => datetime.format("%H:%M:%S").to_string(),
            'Y' => format!("{:04}", datetime.year()),
            'y' => format!("{:02}", datetime.year().rem_euclid(100)),
            'm' => format!("{:02}", datetime.month()),
            'c' => datetime.month().to_string(),
            'd' => format!("{:02}", datetime.day()),
            'e' => datetime.day().to_string(),
            'D' => format!("{}{}", datetime.day(), ordinal_suffix(datetime.day())),
            'j' => format!("{:03}", datetime.ordinal()),
            'M' => datetime.format("%B").to_string(),
            'b' => datetime.format("%b").to_string(),
            'W' => datetime.format("%A").to_string(),
            'a' => datetime.format("%a").to_string(),
            'w' => datetime.weekday().num_days_from_sunday().to_string(),
            'U' | 'V' => datetime.format("%U").to_string(),
            'u' => datetime.format("%W").to_string(),
            'v' => format!("{:02}", datetime.iso_week().week()),
            'X' => format!("{:04}", datetime.year()),
            'x' => format!("{:04}", datetime.iso_week().year()),
            other => other.to_string(),
        };
        out.push_str(&piece);
    }
    Some(out)
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Translate MySQL `%` specifiers into a chrono parse format
fn to_chrono_format(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(spec) = chars.next() else {
            out.push_str("%%");
            break;
        };
        out.push_str(match spec {
            'Y' => "%Y",
            'y' => "%y",
            'm' | 'c' => "%m",
            'd' | 'e' => "%d",
            'M' => "%B",
            'b' => "%b",
            'W' => "%A",
            'a' => "%a",
            'j' => "%j",
            'H' | 'k' => "%H",
            'h' | 'I' | 'l' => "%I",
            'i' => "%M",
            'S' | 's' => "%S",
            'f' => "%6f",
            'p' => "%p",
            'T' => "%H:%M:%S",
            'r' => "%I:%M:%S %p",
            '%' => "%%",
            _ => "",
        });
    }
    out
}
