use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use super::{PhraseResolver, Resolution};
use crate::ResolverError;

/// Recognizes `YYYY-MM-DD`, optionally followed by `[T ]HH:MM[:SS]`, in UTC.
///
/// A date without a time resolves to midnight.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoDateResolver;

fn iso_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2}))?)?")
            .expect("ISO date pattern is valid")
    })
}

impl PhraseResolver for IsoDateResolver {
    fn resolve(
        &self,
        phrase: &str,
        _reference_now: DateTime<Utc>,
    ) -> Result<Option<Resolution>, ResolverError> {
        for caps in iso_pattern().captures_iter(phrase) {
            let Some(whole) = caps.get(0) else { continue };
            let digit_before = phrase[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_digit());
            let digit_after = phrase[whole.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit());
            if digit_before || digit_after {
                continue;
            }

            let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
            let Some(date) = num(1)
                .zip(num(2))
                .zip(num(3))
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y as i32, m, d))
            else {
                continue;
            };
            let time = match num(4).zip(num(5)) {
                Some((h, m)) => match NaiveTime::from_hms_opt(h, m, num(6).unwrap_or(0)) {
                    Some(time) => time,
                    None => continue,
                },
                None => NaiveTime::MIN,
            };

            return Ok(Some(Resolution {
                at: date.and_time(time).and_utc(),
                span: whole.range(),
            }));
        }
        Ok(None)
    }
}
