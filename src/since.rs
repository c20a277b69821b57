//! `--from-date` parsing.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

/// Parse `YYYY-MM-DD` (local midnight) or a duration such as `24h`, `7d`
/// or `1h30m`, read as "that long before `now`".
pub fn parse_from_date(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        bail!("--from-date must not be empty");
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("invalid date: {input}"))?;
        let local = Local
            .from_local_datetime(&midnight)
            .earliest()
            .ok_or_else(|| anyhow!("{input} has no local midnight"))?;
        return Ok(local.with_timezone(&Utc));
    }

    let ago = parse_duration(input)?;
    now.checked_sub_signed(ago)
        .ok_or_else(|| anyhow!("invalid --from-date {input:?}: duration out of range"))
}

fn parse_duration(input: &str) -> Result<Duration> {
    let mut total = Duration::zero();
    let mut digits = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            bail!("invalid --from-date {input:?}: expected YYYY-MM-DD or a duration like 24h, 7d, 1h30m");
        }
        let n: i64 = digits
            .parse()
            .map_err(|_| anyhow!("invalid --from-date {input:?}: number too large"))?;
        digits.clear();

        let segment = match c {
            's' => Duration::try_seconds(n),
            'm' => Duration::try_minutes(n),
            'h' => Duration::try_hours(n),
            'd' => Duration::try_days(n),
            'w' => Duration::try_weeks(n),
            other => bail!("invalid --from-date {input:?}: unknown unit {other:?}"),
        };
        total = segment
            .and_then(|s| total.checked_add(&s))
            .ok_or_else(|| anyhow!("invalid --from-date {input:?}: duration out of range"))?;
    }

    if !digits.is_empty() {
        bail!("invalid --from-date {input:?}: missing unit after {digits}");
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    #[test]
    fn single_unit_durations() {
        assert_eq!(parse_from_date("24h", now()).unwrap(), now() - Duration::hours(24));
        assert_eq!(parse_from_date("7d", now()).unwrap(), now() - Duration::days(7));
        assert_eq!(parse_from_date("2w", now()).unwrap(), now() - Duration::weeks(2));
        assert_eq!(parse_from_date("90s", now()).unwrap(), now() - Duration::seconds(90));
    }

    #[test]
    fn compound_duration() {
        assert_eq!(
            parse_from_date("1h30m", now()).unwrap(),
            now() - Duration::minutes(90)
        );
    }

    #[test]
    fn date_is_local_midnight() {
        let at = parse_from_date("2025-02-01", now()).unwrap().with_timezone(&Local);
        assert_eq!(at.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!((at.hour(), at.minute(), at.second()), (0, 0, 0));
    }

    #[test]
    fn duration_reaching_before_representable_dates_is_an_error() {
        let err = parse_from_date("100000000w", now()).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn rejects_bad_input() {
        for bad in ["", "yesterday", "7", "h", "3x", "2025-13-01", "1h30"] {
            assert!(parse_from_date(bad, now()).is_err(), "{bad} should fail");
        }
    }
}
