//! Best-effort English deadline phrases.
//!
//! Understands dates (`friday`, `next tue`, `sep 15th`, `15 september 2030`,
//! `2030-01-01`, `tomorrow`, `end of month`), relative offsets (`in 3 days`,
//! `2 weeks from now`, `next month`) and times of day (`noon`, `3pm`,
//! `12:30 pm`, `17:00`, `evening`), in either order. A date without a time
//! means the end of that day. Everything is evaluated in one fixed UTC offset
//! so results never depend on the host's timezone.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeZone, Utc, Weekday,
};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

use super::{PhraseResolver, Resolution};
use crate::{ParserConfig, ParserConfigError, ResolverError};

/// Resolver for everyday English deadline phrases.
#[derive(Debug, Clone, Copy)]
pub struct NaturalDateResolver {
    offset: FixedOffset,
}

impl NaturalDateResolver {
    /// Interpret phrases in the given local offset.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Interpret phrases in UTC.
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn from_config(config: &ParserConfig) -> Result<Self, ParserConfigError> {
        Ok(Self::new(config.offset()?))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for NaturalDateResolver {
    fn default() -> Self {
        Self::utc()
    }
}

impl PhraseResolver for NaturalDateResolver {
    fn resolve(
        &self,
        phrase: &str,
        reference_now: DateTime<Utc>,
    ) -> Result<Option<Resolution>, ResolverError> {
        let now = reference_now.with_timezone(&self.offset).naive_local();
        let tokens = tokenize(phrase);

        for start in 0..tokens.len() {
            let mut cursor = Cursor {
                tokens: &tokens,
                pos: start,
                now,
            };
            let Some(local) = cursor.expression() else {
                continue;
            };
            let Some(last) = cursor.pos.checked_sub(1).and_then(|i| tokens.get(i)) else {
                continue;
            };
            let Some(at) = self.offset.from_local_datetime(&local).single() else {
                continue;
            };
            return Ok(Some(Resolution {
                at: at.with_timezone(&Utc),
                span: tokens[start].span.start..last.span.end,
            }));
        }
        Ok(None)
    }
}

// ── Tokens ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Ordinal,
    Meridiem(Meridiem),
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Number {
        value: u32,
        digits: usize,
        suffix: Option<Suffix>,
    },
    Clock {
        hour: u32,
        minute: u32,
        second: u32,
    },
    Iso {
        date: NaiveDate,
        time: Option<NaiveTime>,
    },
    Other,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    span: Range<usize>,
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)(?P<y>\d{4})-(?P<mo>\d{2})-(?P<d>\d{2})",
            r"(?:T(?P<ih>\d{1,2}):(?P<imi>\d{2})(?::(?P<is>\d{2}))?)?",
            r"|(?P<ch>\d{1,2}):(?P<cm>\d{2})(?::(?P<cs>\d{2}))?",
            r"|(?P<n>\d+)(?P<suf>st|nd|rd|th|am|pm)?",
            r"|(?P<word>[a-z]+)",
        ))
        .expect("phrase token pattern is valid")
    })
}

fn tokenize(phrase: &str) -> Vec<Token> {
    token_pattern()
        .captures_iter(phrase)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Token {
                tok: classify(&caps),
                span: whole.range(),
            })
        })
        .collect()
}

fn classify(caps: &Captures<'_>) -> Tok {
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    if caps.name("y").is_some() {
        let date = match (num("y"), num("mo"), num("d")) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y as i32, m, d),
            _ => None,
        };
        let time = match (num("ih"), num("imi")) {
            (Some(h), Some(m)) => match NaiveTime::from_hms_opt(h, m, num("is").unwrap_or(0)) {
                Some(time) => Some(time),
                None => return Tok::Other,
            },
            _ => None,
        };
        return match date {
            Some(date) => Tok::Iso { date, time },
            None => Tok::Other,
        };
    }

    if caps.name("ch").is_some() {
        return match (num("ch"), num("cm")) {
            (Some(hour), Some(minute)) => Tok::Clock {
                hour,
                minute,
                second: num("cs").unwrap_or(0),
            },
            _ => Tok::Other,
        };
    }

    if let Some(n) = caps.name("n") {
        let Ok(value) = n.as_str().parse::<u32>() else {
            return Tok::Other;
        };
        let suffix = caps
            .name("suf")
            .map(|s| s.as_str().to_ascii_lowercase())
            .and_then(|s| match s.as_str() {
                "am" => Some(Suffix::Meridiem(Meridiem::Am)),
                "pm" => Some(Suffix::Meridiem(Meridiem::Pm)),
                "st" | "nd" | "rd" | "th" => Some(Suffix::Ordinal),
                _ => None,
            });
        return Tok::Number {
            value,
            digits: n.as_str().len(),
            suffix,
        };
    }

    match caps.name("word") {
        Some(word) => Tok::Word(word.as_str().to_ascii_lowercase()),
        None => Tok::Other,
    }
}

// ── Grammar ─────────────────────────────────────────────────────────────

/// A date, possibly already carrying a time or an exact instant.
#[derive(Debug, Clone, Copy)]
enum DatePart {
    Day(NaiveDate),
    DayAt(NaiveDate, NaiveTime),
    Instant(NaiveDateTime),
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    now: NaiveDateTime,
}

impl<'t> Cursor<'t> {
    fn today(&self) -> NaiveDate {
        self.now.date()
    }

    fn peek(&self) -> Option<&'t Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_word(&self) -> Option<&'t str> {
        match self.peek()? {
            Tok::Word(word) => Some(word.as_str()),
            _ => None,
        }
    }

    fn bump(&mut self) -> Option<&'t Tok> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn eat_word(&mut self, words: &[&str]) -> bool {
        match self.peek_word() {
            Some(word) if words.contains(&word) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// `[at] time [on] [date]` or `[on] date [at] [time]`.
    fn expression(&mut self) -> Option<NaiveDateTime> {
        let start = self.pos;

        if let Some(time) = self.time_with_at() {
            let after_time = self.pos;
            self.eat_word(&["on"]);
            if let Some(part) = self.date() {
                return self.settle(part, Some(time));
            }
            self.pos = after_time;
            return self.time_only(time);
        }

        self.eat_word(&["on"]);
        let Some(part) = self.date() else {
            self.pos = start;
            return None;
        };
        let after_date = self.pos;
        if let Some(time) = self.time_with_at() {
            return self.settle(part, Some(time));
        }
        self.pos = after_date;
        self.settle(part, None)
    }

    fn settle(&self, part: DatePart, time: Option<NaiveTime>) -> Option<NaiveDateTime> {
        Some(match part {
            DatePart::Day(date) => date.and_time(match time {
                Some(time) => time,
                None => end_of_day()?,
            }),
            DatePart::DayAt(date, at) => date.and_time(time.unwrap_or(at)),
            DatePart::Instant(instant) => match time {
                Some(time) => instant.date().and_time(time),
                None => instant,
            },
        })
    }

    /// A bare time means its next occurrence.
    fn time_only(&self, time: NaiveTime) -> Option<NaiveDateTime> {
        let today_at = self.today().and_time(time);
        if today_at > self.now {
            Some(today_at)
        } else {
            today_at.checked_add_days(Days::new(1))
        }
    }

    // ── times ───────────────────────────────────────────────────────

    fn time_with_at(&mut self) -> Option<NaiveTime> {
        let start = self.pos;
        let at = self.eat_word(&["at", "around"]);
        let time = self.time(at);
        if time.is_none() {
            self.pos = start;
        }
        time
    }

    fn time(&mut self, allow_bare_hour: bool) -> Option<NaiveTime> {
        let start = self.pos;
        let time = match self.bump() {
            Some(Tok::Word(word)) => match word.as_str() {
                "noon" | "midday" => clock(12, 0, 0),
                "midnight" | "eod" => end_of_day(),
                "morning" => clock(9, 0, 0),
                "afternoon" => clock(15, 0, 0),
                "evening" => clock(19, 0, 0),
                "night" => clock(22, 0, 0),
                _ => None,
            },
            Some(Tok::Clock {
                hour,
                minute,
                second,
            }) => {
                let meridiem = self.meridiem();
                with_meridiem(*hour, *minute, *second, meridiem)
            }
            Some(Tok::Number {
                value,
                suffix: Some(Suffix::Meridiem(meridiem)),
                ..
            }) => with_meridiem(*value, 0, 0, Some(*meridiem)),
            Some(Tok::Number {
                value,
                suffix: None,
                ..
            }) => match self.meridiem() {
                Some(meridiem) => with_meridiem(*value, 0, 0, Some(meridiem)),
                None if allow_bare_hour => clock(*value, 0, 0),
                None => None,
            },
            _ => None,
        };
        if time.is_none() {
            self.pos = start;
        }
        time
    }

    fn meridiem(&mut self) -> Option<Meridiem> {
        let meridiem = match self.peek_word()? {
            "am" => Meridiem::Am,
            "pm" => Meridiem::Pm,
            _ => return None,
        };
        self.pos += 1;
        Some(meridiem)
    }

    // ── dates ───────────────────────────────────────────────────────

    fn date(&mut self) -> Option<DatePart> {
        let start = self.pos;
        let part = self.date_inner();
        if part.is_none() {
            self.pos = start;
        }
        part
    }

    fn date_inner(&mut self) -> Option<DatePart> {
        let today = self.today();
        match self.bump()? {
            Tok::Iso { date, time } => Some(match time {
                Some(time) => DatePart::DayAt(*date, *time),
                None => DatePart::Day(*date),
            }),
            Tok::Word(word) => match word.as_str() {
                "today" => Some(DatePart::Day(today)),
                "tonight" => Some(DatePart::DayAt(today, clock(20, 0, 0)?)),
                "tomorrow" | "tmrw" | "tmw" => Some(DatePart::Day(today.succ_opt()?)),
                "yesterday" => Some(DatePart::Day(today.pred_opt()?)),
                "next" => self.after_next(),
                "this" => {
                    let weekday = weekday(self.peek_word()?)?;
                    self.pos += 1;
                    Some(DatePart::Day(upcoming(today, weekday, false)?))
                }
                "end" => self.end_of(),
                "in" => self.offset_after_in(),
                "the" => self.after_the(),
                other => {
                    if let Some(weekday) = weekday(other) {
                        return Some(DatePart::Day(upcoming(today, weekday, false)?));
                    }
                    let month = month(other)?;
                    match self.bump()? {
                        Tok::Number {
                            value,
                            suffix: None | Some(Suffix::Ordinal),
                            ..
                        } => self.month_day(month, *value),
                        _ => None,
                    }
                }
            },
            Tok::Number {
                value,
                suffix: None | Some(Suffix::Ordinal),
                ..
            } => {
                let value = *value;
                if let Some(unit) = self.unit() {
                    let save = self.pos;
                    if !(self.eat_word(&["from"]) && self.eat_word(&["now"])) {
                        self.pos = save;
                        self.eat_word(&["later"]);
                    }
                    return self.offset(value, unit);
                }
                let ordinal = matches!(
                    self.tokens.get(self.pos - 1).map(|t| &t.tok),
                    Some(Tok::Number {
                        suffix: Some(Suffix::Ordinal),
                        ..
                    })
                );
                let save = self.pos;
                self.eat_word(&["of"]);
                match self.peek_word().and_then(month) {
                    Some(month) => {
                        self.pos += 1;
                        self.month_day(month, value)
                    }
                    None if ordinal => {
                        self.pos = save;
                        self.day_of_month(value)
                    }
                    None => None,
                }
            }
            _ => None,
        }
    }

    fn after_next(&mut self) -> Option<DatePart> {
        let word = self.peek_word()?;
        let part = match weekday(word) {
            Some(weekday) => DatePart::Day(upcoming(self.today(), weekday, true)?),
            None => match word {
                "week" => DatePart::Instant(self.now.checked_add_signed(Duration::weeks(1))?),
                "month" => DatePart::Instant(self.now.checked_add_months(Months::new(1))?),
                "year" => DatePart::Instant(self.now.checked_add_months(Months::new(12))?),
                _ => return None,
            },
        };
        self.pos += 1;
        Some(part)
    }

    /// After `end`: `[of] [the] (day|week|month|year)`.
    fn end_of(&mut self) -> Option<DatePart> {
        self.eat_word(&["of"]);
        self.eat_word(&["the", "this"]);
        let today = self.today();
        let date = match self.peek_word()? {
            "day" => today,
            "week" => {
                let to_sunday = 6 - today.weekday().num_days_from_monday();
                today.checked_add_days(Days::new(u64::from(to_sunday)))?
            }
            "month" => NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?
                .checked_add_months(Months::new(1))?
                .pred_opt()?,
            "year" => NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            _ => return None,
        };
        self.pos += 1;
        Some(DatePart::Day(date))
    }

    /// After `in`: `(N|a|an) unit`.
    fn offset_after_in(&mut self) -> Option<DatePart> {
        let amount = match self.bump()? {
            Tok::Number {
                value,
                suffix: None,
                ..
            } => *value,
            Tok::Word(word) if word == "a" || word == "an" => 1,
            _ => return None,
        };
        let unit = self.unit()?;
        self.offset(amount, unit)
    }

    /// After `the`: `Nth [of] [month]` or `end of ...`.
    fn after_the(&mut self) -> Option<DatePart> {
        if self.eat_word(&["end"]) {
            return self.end_of();
        }
        let day = match self.bump()? {
            Tok::Number {
                value,
                suffix: None | Some(Suffix::Ordinal),
                ..
            } => *value,
            _ => return None,
        };
        let save = self.pos;
        self.eat_word(&["of"]);
        match self.peek_word().and_then(month) {
            Some(month) => {
                self.pos += 1;
                self.month_day(month, day)
            }
            None => {
                self.pos = save;
                self.day_of_month(day)
            }
        }
    }

    fn unit(&mut self) -> Option<Unit> {
        let unit = match self.peek_word()? {
            "min" | "mins" | "minute" | "minutes" => Unit::Minute,
            "hr" | "hrs" | "hour" | "hours" => Unit::Hour,
            "day" | "days" => Unit::Day,
            "wk" | "wks" | "week" | "weeks" => Unit::Week,
            "month" | "months" => Unit::Month,
            "yr" | "yrs" | "year" | "years" => Unit::Year,
            _ => return None,
        };
        self.pos += 1;
        Some(unit)
    }

    fn offset(&self, amount: u32, unit: Unit) -> Option<DatePart> {
        let amount_i64 = i64::from(amount);
        let instant = match unit {
            Unit::Minute => self.now.checked_add_signed(Duration::minutes(amount_i64))?,
            Unit::Hour => self.now.checked_add_signed(Duration::hours(amount_i64))?,
            Unit::Day => self.now.checked_add_signed(Duration::days(amount_i64))?,
            Unit::Week => self.now.checked_add_signed(Duration::weeks(amount_i64))?,
            Unit::Month => self.now.checked_add_months(Months::new(amount))?,
            Unit::Year => self
                .now
                .checked_add_months(Months::new(amount.checked_mul(12)?))?,
        };
        Some(DatePart::Instant(instant))
    }

    /// `month day [year]`; without a year, a date already past rolls over.
    fn month_day(&mut self, month: u32, day: u32) -> Option<DatePart> {
        let today = self.today();
        if let Some(Tok::Number {
            value,
            digits: 4,
            suffix: None,
        }) = self.peek()
        {
            self.pos += 1;
            let year = i32::try_from(*value).ok()?;
            return Some(DatePart::Day(NaiveDate::from_ymd_opt(year, month, day)?));
        }
        let date = match NaiveDate::from_ymd_opt(today.year(), month, day) {
            Some(date) if date >= today => date,
            _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day)?,
        };
        Some(DatePart::Day(date))
    }

    /// A day of the current month, or of the next one if already past.
    fn day_of_month(&self, day: u32) -> Option<DatePart> {
        let today = self.today();
        let date = match today.with_day(day) {
            Some(date) if date >= today => date,
            _ => NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?
                .checked_add_months(Months::new(1))?
                .with_day(day)?,
        };
        Some(DatePart::Day(date))
    }
}

fn clock(hour: u32, minute: u32, second: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn end_of_day() -> Option<NaiveTime> {
    clock(23, 59, 59)
}

fn with_meridiem(
    hour: u32,
    minute: u32,
    second: u32,
    meridiem: Option<Meridiem>,
) -> Option<NaiveTime> {
    let hour = match meridiem {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(Meridiem::Am) => hour % 12,
        Some(Meridiem::Pm) => hour % 12 + 12,
    };
    clock(hour, minute, second)
}

/// Next date falling on `weekday`; today counts unless `strictly_after`.
fn upcoming(today: NaiveDate, weekday: Weekday, strictly_after: bool) -> Option<NaiveDate> {
    let diff = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let diff = if diff == 0 && strictly_after { 7 } else { diff };
    today.checked_add_days(Days::new(u64::from(diff)))
}

fn weekday(word: &str) -> Option<Weekday> {
    Some(match word {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tues" | "tuesday" => Weekday::Tue,
        "wed" | "weds" | "wednesday" => Weekday::Wed,
        "thu" | "thur" | "thurs" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return None,
    })
}

fn month(word: &str) -> Option<u32> {
    Some(match word {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    })
}
