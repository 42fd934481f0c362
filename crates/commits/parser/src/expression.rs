//! Splitting an expression into action text and deadline.

use chrono::{DateTime, Utc};
use commits_types::{CommitmentDraft, CommitmentKind, UserHandle};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    decode_strict, NaturalDateResolver, ParseError, ParserConfig, ParserConfigError,
    PhraseResolver, Resolution,
};

/// Trailing instruction carried by the expression itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// `.../done` and friends: the commitment is already kept.
    Completed,
}

/// Parser output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommitment {
    pub draft: CommitmentDraft,
    pub modifier: Option<Modifier>,
}

/// Turns raw expressions into [`CommitmentDraft`]s.
///
/// Holds no mutable state; share one instance across tasks.
pub struct PromiseParser {
    keyword: Option<Regex>,
    markers: Vec<String>,
    resolver: Arc<dyn PhraseResolver>,
}

impl fmt::Debug for PromiseParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseParser")
            .field("keyword", &self.keyword.as_ref().map(Regex::as_str))
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

impl PromiseParser {
    pub fn new(
        config: &ParserConfig,
        resolver: Arc<dyn PhraseResolver>,
    ) -> Result<Self, ParserConfigError> {
        config.validate()?;

        let keyword = if config.deadline_keywords.is_empty() {
            None
        } else {
            let alternatives = config
                .deadline_keywords
                .iter()
                .map(|k| regex::escape(k.trim()))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(
                r"(?i)(?:^|[\s_/\-])({alternatives})(?:[\s_/\-]|$)"
            ))?)
        };

        Ok(Self {
            keyword,
            markers: config
                .completion_markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .collect(),
            resolver,
        })
    }

    /// A parser backed by [`NaturalDateResolver`] in the configured offset.
    pub fn natural(config: &ParserConfig) -> Result<Self, ParserConfigError> {
        let resolver = NaturalDateResolver::from_config(config)?;
        Self::new(config, Arc::new(resolver))
    }

    /// Parse one expression.
    ///
    /// `raw_expression` is the undecoded path text and is stored verbatim.
    /// Resolver failures never fail the parse: the draft simply has no
    /// deadline.
    pub fn parse(
        &self,
        user: &str,
        kind: CommitmentKind,
        raw_expression: &str,
        reference_now: DateTime<Utc>,
    ) -> Result<ParsedCommitment, ParseError> {
        let user = UserHandle::parse(user)?;
        let decoded = decode_strict(raw_expression)?;
        let (text, modifier) = match self.strip_modifier(raw_expression) {
            Some(head) => (decode_strict(head)?, Some(Modifier::Completed)),
            None => (decoded, None),
        };
        let (action, due_at) = self.split_deadline(&text, reference_now);

        let draft = CommitmentDraft {
            user,
            kind,
            raw_expression: raw_expression.to_owned(),
            action_text: normalize_separators(&action),
            due_at,
        };
        debug!(
            user = %draft.user,
            kind = %draft.kind,
            due_at = ?draft.due_at,
            completed = modifier.is_some(),
            "parsed commitment expression"
        );
        Ok(ParsedCommitment { draft, modifier })
    }

    /// The raw text before a trailing `/<marker>` segment. Only a literal
    /// `/` separates the marker; an escaped `%2F` is part of the text.
    fn strip_modifier<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let (head, last) = raw.rsplit_once('/')?;
        let marker = decode_strict(last).ok()?;
        self.markers
            .contains(&marker.trim().to_lowercase())
            .then_some(head)
    }

    fn split_deadline(
        &self,
        text: &str,
        reference_now: DateTime<Utc>,
    ) -> (String, Option<DateTime<Utc>>) {
        let unresolved = || (text.to_owned(), None);

        let Some(keyword) = self
            .keyword
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
        else {
            return unresolved();
        };
        let action = &text[..keyword.start()];
        let candidate = &text[keyword.end()..];
        if candidate.trim_matches(is_separator).is_empty() {
            return unresolved();
        }

        match self.resolver.resolve(candidate, reference_now) {
            Ok(Some(Resolution { at, span })) => {
                let pieces = (span.start <= span.end)
                    .then(|| candidate.get(..span.start).zip(candidate.get(span.end..)))
                    .flatten();
                match pieces {
                    Some((before, after)) => (format!("{action} {before} {after}"), Some(at)),
                    None => {
                        warn!(
                            ?span,
                            phrase_len = candidate.len(),
                            "resolver span does not fit the phrase, ignoring deadline"
                        );
                        unresolved()
                    }
                }
            }
            Ok(None) => unresolved(),
            Err(error) => {
                warn!(%error, "date resolver degraded, commitment kept without deadline");
                unresolved()
            }
        }
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '_' | '/')
}

/// Collapse `-`, `_`, `/` and whitespace runs to single spaces.
fn normalize_separators(text: &str) -> String {
    text.split(is_separator)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IsoDateResolver, ResolverError};
    use chrono::TimeZone;
    use proptest::prelude::*;

    struct Greedy;

    impl PhraseResolver for Greedy {
        fn resolve(
            &self,
            phrase: &str,
            reference_now: DateTime<Utc>,
        ) -> Result<Option<Resolution>, ResolverError> {
            Ok(Some(Resolution {
                at: reference_now,
                span: 0..phrase.len(),
            }))
        }
    }

    struct Offline;

    impl PhraseResolver for Offline {
        fn resolve(&self, _: &str, _: DateTime<Utc>) -> Result<Option<Resolution>, ResolverError> {
            Err(ResolverError::Unavailable("offline".into()))
        }
    }

    struct Overshoot;

    impl PhraseResolver for Overshoot {
        fn resolve(
            &self,
            phrase: &str,
            reference_now: DateTime<Utc>,
        ) -> Result<Option<Resolution>, ResolverError> {
            Ok(Some(Resolution {
                at: reference_now,
                span: 0..phrase.len() + 10,
            }))
        }
    }

    fn parser_with(resolver: impl PhraseResolver + 'static) -> PromiseParser {
        PromiseParser::new(&ParserConfig::default(), Arc::new(resolver)).unwrap()
    }

    fn iso() -> PromiseParser {
        parser_with(IsoDateResolver)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap()
    }

    fn parse(parser: &PromiseParser, raw: &str) -> ParsedCommitment {
        parser
            .parse("bob", CommitmentKind::Promise, raw, now())
            .unwrap()
    }

    #[test]
    fn quit_smoking_example() {
        let parsed = parse(&iso(), "quit-smoking-by-2030-01-01");
        let draft = parsed.draft;
        assert_eq!(draft.action_text, "quit smoking");
        assert_eq!(draft.due_at, Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(draft.raw_expression, "quit-smoking-by-2030-01-01");
        assert_eq!(draft.user.as_str(), "bob");
        assert_eq!(draft.kind, CommitmentKind::Promise);
        assert_eq!(parsed.modifier, None);
    }

    #[test]
    fn parsing_is_idempotent() {
        let parser = iso();
        let raw = "send-the-report_before_2030-06-01T09:00";
        assert_eq!(parse(&parser, raw), parse(&parser, raw));
    }

    #[test]
    fn empty_expression_is_valid() {
        let parsed = parse(&iso(), "");
        assert_eq!(parsed.draft.action_text, "");
        assert_eq!(parsed.draft.due_at, None);
        assert_eq!(parsed.modifier, None);
    }

    #[test]
    fn only_first_keyword_introduces_deadline() {
        let parsed = parse(&iso(), "pay-rent-by-2030-01-01-not-by-2031-01-01");
        assert_eq!(
            parsed.draft.due_at,
            Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parsed.draft.action_text, "pay rent not by 2031 01 01");
    }

    #[test]
    fn past_deadline_is_accepted() {
        let parsed = parse(&iso(), "file-taxes-by-2001-04-15");
        assert_eq!(
            parsed.draft.due_at,
            Some(Utc.with_ymd_and_hms(2001, 4, 15, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn keyword_is_case_insensitive() {
        let parsed = parse(&iso(), "Quit-Smoking-BY-2030-01-01");
        assert_eq!(parsed.draft.action_text, "Quit Smoking");
        assert!(parsed.draft.due_at.is_some());
    }

    #[test]
    fn keyword_inside_word_does_not_split() {
        let parsed = parse(&iso(), "learn-ruby-2030-01-01");
        assert_eq!(parsed.draft.due_at, None);
        assert_eq!(parsed.draft.action_text, "learn ruby 2030 01 01");
    }

    #[test]
    fn unresolved_phrase_keeps_full_text() {
        let parsed = parse(&iso(), "be-nice-by-nature");
        assert_eq!(parsed.draft.due_at, None);
        assert_eq!(parsed.draft.action_text, "be nice by nature");

        let parsed = parse(&iso(), "stand-by");
        assert_eq!(parsed.draft.due_at, None);
        assert_eq!(parsed.draft.action_text, "stand by");
    }

    #[test]
    fn malformed_escape_rejects() {
        let result = iso().parse("bob", CommitmentKind::Promise, "foo%zz-by-2030-01-01", now());
        assert!(matches!(result, Err(ParseError::MalformedEncoding { .. })));
    }

    #[test]
    fn invalid_user_rejects() {
        let result = iso().parse("bob smith", CommitmentKind::Commit, "call-mom", now());
        assert!(matches!(
            result,
            Err(ParseError::Field(commits_types::FieldError::InvalidUser(_)))
        ));
    }

    #[test]
    fn escapes_are_decoded_but_raw_is_verbatim() {
        let parsed = parse(&iso(), "finish%20report%2Fslides-by-2030-01-01");
        assert_eq!(parsed.draft.action_text, "finish report slides");
        assert_eq!(parsed.draft.raw_expression, "finish%20report%2Fslides-by-2030-01-01");
    }

    #[test]
    fn completion_marker_becomes_modifier() {
        let parsed = parse(&iso(), "call-mom-by-2030-01-01/done");
        assert_eq!(parsed.modifier, Some(Modifier::Completed));
        assert_eq!(parsed.draft.action_text, "call mom");
        assert!(parsed.draft.due_at.is_some());
        assert_eq!(parsed.draft.raw_expression, "call-mom-by-2030-01-01/done");

        let parsed = parse(&iso(), "call-mom/KEPT");
        assert_eq!(parsed.modifier, Some(Modifier::Completed));
        assert_eq!(parsed.draft.action_text, "call mom");
    }

    #[test]
    fn non_marker_last_segment_is_text() {
        let parsed = parse(&iso(), "call-mom/soon");
        assert_eq!(parsed.modifier, None);
        assert_eq!(parsed.draft.action_text, "call mom soon");
    }

    #[test]
    fn escaped_slash_never_introduces_marker() {
        let parsed = parse(&iso(), "call-mom%2Fdone");
        assert_eq!(parsed.modifier, None);
        assert_eq!(parsed.draft.action_text, "call mom done");
        assert_eq!(parsed.draft.raw_expression, "call-mom%2Fdone");
    }

    #[test]
    fn escaped_marker_after_literal_slash_counts() {
        let parsed = parse(&iso(), "call-mom/D%6Fne");
        assert_eq!(parsed.modifier, Some(Modifier::Completed));
        assert_eq!(parsed.draft.action_text, "call mom");
    }

    #[test]
    fn degraded_resolver_falls_back() {
        let parsed = parse(&parser_with(Offline), "quit-smoking-by-2030-01-01");
        assert_eq!(parsed.draft.due_at, None);
        assert_eq!(parsed.draft.action_text, "quit smoking by 2030 01 01");
    }

    #[test]
    fn out_of_range_span_is_ignored() {
        let parsed = parse(&parser_with(Overshoot), "quit-smoking-by-friday");
        assert_eq!(parsed.draft.due_at, None);
        assert_eq!(parsed.draft.action_text, "quit smoking by friday");
    }

    #[test]
    fn leftover_words_fold_into_action() {
        let parser = PromiseParser::natural(&ParserConfig::default()).unwrap();
        let parsed = parse(&parser, "call-mom-by-friday-evening-sharp");
        assert_eq!(parsed.draft.action_text, "call mom sharp");
        assert_eq!(
            parsed.draft.due_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 15, 19, 0, 0).unwrap())
        );
    }

    #[test]
    fn configured_keywords_replace_defaults() {
        let config = ParserConfig {
            deadline_keywords: vec!["due".into()],
            ..Default::default()
        };
        let parser = PromiseParser::new(&config, Arc::new(IsoDateResolver)).unwrap();
        let parsed = parse(&parser, "ship-it-due-2030-01-01");
        assert_eq!(parsed.draft.action_text, "ship it");
        assert!(parsed.draft.due_at.is_some());

        let parsed = parse(&parser, "ship-it-by-2030-01-01");
        assert_eq!(parsed.draft.due_at, None);
    }

    #[test]
    fn no_keywords_means_no_deadlines() {
        let config = ParserConfig {
            deadline_keywords: Vec::new(),
            ..Default::default()
        };
        let parser = PromiseParser::new(&config, Arc::new(Greedy)).unwrap();
        assert_eq!(parse(&parser, "ship-by-friday").draft.due_at, None);
    }

    fn keyword_free_expression() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9]{1,8}", 1..8)
            .prop_filter("no deadline keyword", |words| {
                !words.iter().any(|w| {
                    let w = w.to_lowercase();
                    ["by", "before", "until", "till"].contains(&w.as_str())
                })
            })
            .prop_flat_map(|words| {
                let n = words.len();
                (Just(words), prop::collection::vec(prop::sample::select(vec!["-", "_", "%20"]), n))
            })
            .prop_map(|(words, seps)| {
                words
                    .iter()
                    .zip(seps)
                    .map(|(w, s)| format!("{w}{s}"))
                    .collect::<String>()
            })
    }

    proptest! {
        #[test]
        fn without_keyword_due_at_is_never_set(raw in keyword_free_expression()) {
            let parsed = parse(&parser_with(Greedy), &raw);
            prop_assert_eq!(parsed.draft.due_at, None);
            prop_assert_eq!(parsed.draft.raw_expression, raw);
        }

        #[test]
        fn action_text_has_no_separators(raw in keyword_free_expression()) {
            let action = parse(&iso(), &raw).draft.action_text;
            prop_assert!(!action.contains(['-', '_', '/']));
            prop_assert!(!action.contains("  "));
            prop_assert_eq!(action.trim(), action.as_str());
        }
    }
}
