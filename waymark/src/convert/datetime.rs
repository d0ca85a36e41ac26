//! Converters for the `time` date and time types.
//!
//! Each converter tries its accepted layouts in order and the first successful parse wins:
//! the dashed layout (`2024-03-01 10:20:30`), epoch milliseconds, the CJK layout
//! (`2024年03月01日 10时20分30秒`), the slashed layout (`2024/03/01 10:20:30`) and finally
//! RFC 3339.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::convert::{ConvertError, ConverterRegistry};

type Attempt<T> = fn(&str) -> Option<T>;

pub(super) fn register(registry: &mut ConverterRegistry) {
    registry.register::<String, PrimitiveDateTime, _>(|s: &String| {
        first_parsed(s, DATE_TIME_ATTEMPTS)
    });
    registry.register::<String, OffsetDateTime, _>(|s: &String| {
        first_parsed(s, OFFSET_DATE_TIME_ATTEMPTS)
    });
    registry.register::<String, Date, _>(|s: &String| first_parsed(s, DATE_ATTEMPTS));
    registry.register::<String, Time, _>(|s: &String| first_parsed(s, TIME_ATTEMPTS));
}

fn first_parsed<T>(source: &str, attempts: &[Attempt<T>]) -> Result<T, ConvertError> {
    let source = source.trim();
    attempts
        .iter()
        .find_map(|attempt| attempt(source))
        .ok_or_else(|| ConvertError::unparsable::<T>(source))
}

const DATE_TIME_ATTEMPTS: &[Attempt<PrimitiveDateTime>] = &[
    dashed_date_time,
    epoch_date_time,
    cjk_date_time,
    slashed_date_time,
    iso_date_time,
    rfc3339_date_time,
];

const OFFSET_DATE_TIME_ATTEMPTS: &[Attempt<OffsetDateTime>] =
    &[rfc3339_offset_date_time, epoch_millis, utc_date_time];

const DATE_ATTEMPTS: &[Attempt<Date>] = &[dashed_date, cjk_date, slashed_date];

const TIME_ATTEMPTS: &[Attempt<Time>] = &[colon_time, cjk_time, short_time];

fn dashed_date_time(s: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .ok()
}

fn epoch_date_time(s: &str) -> Option<PrimitiveDateTime> {
    epoch_millis(s).map(|t| PrimitiveDateTime::new(t.date(), t.time()))
}

fn cjk_date_time(s: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]年[month]月[day]日 [hour]时[minute]分[second]秒"),
    )
    .ok()
}

fn slashed_date_time(s: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
    )
    .ok()
}

fn iso_date_time(s: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .ok()
}

fn rfc3339_date_time(s: &str) -> Option<PrimitiveDateTime> {
    rfc3339_offset_date_time(s).map(|t| PrimitiveDateTime::new(t.date(), t.time()))
}

fn rfc3339_offset_date_time(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).ok()
}

fn utc_date_time(s: &str) -> Option<OffsetDateTime> {
    first_parsed(s, DATE_TIME_ATTEMPTS)
        .ok()
        .map(|t| t.assume_offset(UtcOffset::UTC))
}

fn dashed_date(s: &str) -> Option<Date> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).ok()
}

fn cjk_date(s: &str) -> Option<Date> {
    Date::parse(s, format_description!("[year]年[month]月[day]日")).ok()
}

fn slashed_date(s: &str) -> Option<Date> {
    Date::parse(s, format_description!("[year]/[month]/[day]")).ok()
}

fn colon_time(s: &str) -> Option<Time> {
    Time::parse(s, format_description!("[hour]:[minute]:[second]")).ok()
}

fn cjk_time(s: &str) -> Option<Time> {
    Time::parse(s, format_description!("[hour]时[minute]分[second]秒")).ok()
}

fn short_time(s: &str) -> Option<Time> {
    Time::parse(s, format_description!("[hour]:[minute]")).ok()
}

fn epoch_millis(s: &str) -> Option<OffsetDateTime> {
    let millis: i128 = s.parse().ok()?;
    OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn date_time_layouts_in_order() {
        let registry = ConverterRegistry::new();
        let expected = datetime!(2024-03-01 10:20:30);

        for input in &[
            "2024-03-01 10:20:30",
            "2024年03月01日 10时20分30秒",
            "2024/03/01 10:20:30",
            "2024-03-01T10:20:30",
            "2024-03-01T10:20:30Z",
        ] {
            assert_eq!(
                registry.convert::<PrimitiveDateTime>(input),
                Some(expected),
                "{}",
                input
            );
        }
    }

    #[test]
    fn epoch_millis_are_utc() {
        let registry = ConverterRegistry::new();
        assert_eq!(
            registry.convert::<OffsetDateTime>("1709288430000"),
            Some(datetime!(2024-03-01 10:20:30 UTC))
        );
        assert_eq!(
            registry.convert::<PrimitiveDateTime>("0"),
            Some(datetime!(1970-01-01 0:00))
        );
    }

    #[test]
    fn dates_and_times() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.convert::<Date>("2024-03-01"), Some(date!(2024-03-01)));
        assert_eq!(registry.convert::<Date>("2024/03/01"), Some(date!(2024-03-01)));
        assert_eq!(registry.convert::<Time>("10:20:30"), Some(time!(10:20:30)));
        assert_eq!(registry.convert::<Time>("10:20"), Some(time!(10:20)));
        assert_eq!(registry.convert::<Date>("March 1st"), None);
    }

    #[test]
    fn out_of_range_epoch_millis_do_not_convert() {
        let registry = ConverterRegistry::new();
        let huge = i128::MAX.to_string();
        assert_eq!(registry.convert::<OffsetDateTime>(&huge), None);
        assert_eq!(registry.convert::<PrimitiveDateTime>(&huge), None);
        assert_eq!(
            registry.convert::<OffsetDateTime>("99999999999999999999999"),
            None
        );
    }
}
