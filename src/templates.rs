//! Recognized timestamp styles and the first-match lookup over a line.
//!
//! The table is ordered: a template must come before any more general one
//! that could match part of its text and then misparse it.

use std::ops::Range;

use regex::bytes::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid pattern for template {description:?}: {source}")]
    Pattern {
        description: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Finds the first sub-span of a line that looks like a timestamp.
pub trait SpanDetector: Send + Sync {
    fn find_span(&self, haystack: &[u8]) -> Option<Range<usize>>;
}

impl SpanDetector for Regex {
    fn find_span(&self, haystack: &[u8]) -> Option<Range<usize>> {
        self.find(haystack).map(|found| found.range())
    }
}

pub struct TimestampTemplate {
    detector: Box<dyn SpanDetector>,
    description: &'static str,
    parse_format: &'static str,
}

impl TimestampTemplate {
    pub fn new(detector: Box<dyn SpanDetector>, description: &'static str, parse_format: &'static str) -> Self {
        Self {
            detector,
            description,
            parse_format,
        }
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn parse_format(&self) -> &'static str {
        self.parse_format
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimestampMatch {
    pub span: Range<usize>,
    pub parse_format: &'static str,
    pub description: &'static str,
}

struct BuiltinTemplate {
    pattern: &'static str,
    description: &'static str,
    parse_format: &'static str,
}

// Order is significant, see the module docs.
const BUILTIN_TEMPLATES: &[BuiltinTemplate] = &[
    BuiltinTemplate {
        pattern: r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{9}Z",
        description: "Kubernetes pod log entry with nanosecond timestamp",
        parse_format: "%Y-%m-%dT%H:%M:%S",
    },
    BuiltinTemplate {
        pattern: r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+",
        description: "ISO-8601 with fractional seconds",
        parse_format: "%Y-%m-%dT%H:%M:%S",
    },
    BuiltinTemplate {
        pattern: r"\d{4} \d{2}:\d{2}:\d{2}\.\d{6}",
        description: "Kubernetes client-go log with microseconds",
        parse_format: "%m%d %H:%M:%S",
    },
    BuiltinTemplate {
        pattern: r"\d+\s+\w{3}\s+\d{2,}\s+\d{2}:\d{2}:\d{2}\s+[+-]\d{4}",
        description: "16 Jun 94 07:29:35 +0000",
        parse_format: "%d %b %y %H:%M:%S %z",
    },
    BuiltinTemplate {
        pattern: r"\d{2}[-\s/]\w{3}/\d{2,}\s+\d{2}:\d{2}:\d{2}\s+[+-]\d{4}",
        description: "21 dec/93 17:05:30 +0000",
        parse_format: "%d %b/%y %H:%M:%S %z",
    },
    BuiltinTemplate {
        pattern: r"\d{2}[-\s/]\w{3}\s+\d{2}:\d{2}:\d{2}\s+[+-]\d{4}",
        description: "21 dec 17:05:30 +0000",
        parse_format: "%d %b %H:%M:%S %z",
    },
    BuiltinTemplate {
        pattern: r"\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+[+-]\d{4}",
        description: "Jan 21 17:05:30 +0000",
        parse_format: "%b %d %H:%M:%S %z",
    },
    BuiltinTemplate {
        pattern: r"\d{2}[-\s/]\w{3}/\d{2,}\s+\d{2}:\d{2}",
        description: "21 dec/93 17:05 without seconds and timezone",
        parse_format: "%d %b/%y %H:%M",
    },
    BuiltinTemplate {
        pattern: r"\d{2}[-\s/]\w{3}\s+\d{2}:\d{2}",
        description: "21 dec 17:05 without seconds and timezone",
        parse_format: "%d %b %H:%M",
    },
    BuiltinTemplate {
        pattern: r"\d{4}[-:]\d{2}[-:]\d{2}T\d{2}:\d{2}:\d{2}",
        description: "ISO-8601",
        parse_format: "%Y-%m-%dT%H:%M:%S",
    },
    BuiltinTemplate {
        pattern: r"\w{3}\s+\w{3}\s+\d{2}\s+\d{2}:\d{2}",
        description: "lastlog",
        parse_format: "%a %b %d %H:%M",
    },
    BuiltinTemplate {
        pattern: r"\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}",
        description: "syslog",
        parse_format: "%b %d %H:%M:%S",
    },
];

pub struct TemplateSet {
    templates: Vec<TimestampTemplate>,
}

impl TemplateSet {
    pub fn new(templates: Vec<TimestampTemplate>) -> Self {
        Self { templates }
    }

    /// Compile the built-in table.
    pub fn builtin() -> Result<Self, TemplateError> {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|template| {
                let regex = Regex::new(template.pattern).map_err(|source| TemplateError::Pattern {
                    description: template.description,
                    source,
                })?;
                Ok(TimestampTemplate::new(
                    Box::new(regex),
                    template.description,
                    template.parse_format,
                ))
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;
        Ok(Self::new(templates))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimestampTemplate> {
        self.templates.iter()
    }

    /// Try each template in order against the whole line; the first one that
    /// matches anywhere wins.
    pub fn match_timestamp(&self, line: &[u8]) -> Option<TimestampMatch> {
        self.templates.iter().find_map(|template| {
            template.detector.find_span(line).map(|span| TimestampMatch {
                span,
                parse_format: template.parse_format,
                description: template.description,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> TemplateSet {
        TemplateSet::builtin().expect("builtin templates compile")
    }

    fn matched_text<'a>(line: &'a str, found: &TimestampMatch) -> &'a str {
        &line[found.span.clone()]
    }

    // One sample per built-in template, in table order. Each must be claimed
    // by its own template rather than an earlier, more general entry.
    const SAMPLES: &[(&str, &str)] = &[
        ("2024-01-21T17:05:30.123456789Z stdout F hello", "2024-01-21T17:05:30.123456789Z"),
        ("2024-01-21T17:05:30.123 level=info", "2024-01-21T17:05:30.123"),
        ("I0121 17:05:30.123456    1 controller.go:42] synced", "0121 17:05:30.123456"),
        ("16 Jun 94 07:29:35 +0000 message", "16 Jun 94 07:29:35 +0000"),
        ("21 dec/93 17:05:30 +0000 message", "21 dec/93 17:05:30 +0000"),
        ("21 dec 17:05:30 +0000 message", "21 dec 17:05:30 +0000"),
        ("Jan 21 17:05:30 +0000 host app: msg", "Jan 21 17:05:30 +0000"),
        ("21 dec/93 17:05 message", "21 dec/93 17:05"),
        ("21-dec 17:05 message", "21-dec 17:05"),
        ("2024-01-21T17:05:30 message", "2024-01-21T17:05:30"),
        ("root pts/0 Mon Jan 21 17:05 still logged in", "Mon Jan 21 17:05"),
        ("Jan 21 17:05:30 host sshd[42]: accepted", "Jan 21 17:05:30"),
    ];

    #[test]
    fn each_template_claims_its_own_sample() {
        let templates = builtin();
        assert_eq!(templates.len(), SAMPLES.len());

        for (template, (line, expected)) in templates.iter().zip(SAMPLES) {
            let found = templates.match_timestamp(line.as_bytes()).expect("sample matches");
            assert_eq!(
                found.description,
                template.description(),
                "{line:?} was shadowed by {:?}",
                found.description
            );
            assert_eq!(found.parse_format, template.parse_format());
            assert_eq!(matched_text(line, &found), *expected);
        }
    }

    #[test]
    fn timezone_bearing_syslog_is_not_preempted() {
        let templates = builtin();
        let line = "Jan 21 17:05:30 +0000 host app: msg";
        let found = templates.match_timestamp(line.as_bytes()).expect("match");
        assert_eq!(found.parse_format, "%b %d %H:%M:%S %z");
        assert_eq!(found.span, 0..21);
    }

    #[test]
    fn match_anywhere_in_line() {
        let templates = builtin();
        let line = "[worker-3] Jan  5 09:00:01 started";
        let found = templates.match_timestamp(line.as_bytes()).expect("match");
        assert_eq!(matched_text(line, &found), "Jan  5 09:00:01");
        assert_eq!(found.description, "syslog");
    }

    #[test]
    fn only_first_timestamp_is_reported() {
        let templates = builtin();
        let line = "2024-01-21T17:05:30 retried at 2024-01-21T17:06:30";
        let found = templates.match_timestamp(line.as_bytes()).expect("match");
        assert_eq!(found.span, 0..19);
    }

    #[test]
    fn lines_without_timestamps_do_not_match() {
        let templates = builtin();
        assert!(templates.match_timestamp(b"plain text line\n").is_none());
        assert!(templates.match_timestamp(b"").is_none());
        assert!(templates.match_timestamp(&[0xff, 0xfe, b'\n']).is_none());
    }

    struct Fixed(Range<usize>);

    impl SpanDetector for Fixed {
        fn find_span(&self, _haystack: &[u8]) -> Option<Range<usize>> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn custom_detectors_can_replace_regex() {
        let templates = TemplateSet::new(vec![TimestampTemplate::new(
            Box::new(Fixed(2..4)),
            "fixed",
            "%H",
        )]);
        let found = templates.match_timestamp(b"ab12cd").expect("match");
        assert_eq!(found.span, 2..4);
        assert_eq!(found.parse_format, "%H");
    }
}
