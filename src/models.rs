use chrono::{DateTime, FixedOffset};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContestError {
    #[error("contest title is empty")]
    EmptyTitle,
    #[error("contest {title:?} ends at {end} which is not after its start {start}")]
    EndNotAfterStart {
        title: String,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

/// One scheduled contest as normalized from a listing page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contest {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub url: String,
}

impl Contest {
    pub fn new(
        title: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        url: impl Into<String>,
    ) -> Result<Self, ContestError> {
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() {
            return Err(ContestError::EmptyTitle);
        }
        if end <= start {
            return Err(ContestError::EndNotAfterStart { title, start, end });
        }
        Ok(Self {
            title,
            start,
            end,
            url: url.into(),
        })
    }

    /// Last non-empty path segment of the contest URL.
    pub fn slug(&self) -> String {
        match reqwest::Url::parse(&self.url) {
            Ok(url) => url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .unwrap_or_default()
                .to_string(),
            Err(_) => self
                .url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .split('/')
                .filter(|s| !s.is_empty())
                .last()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn jst(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .expect("offset")
            .with_ymd_and_hms(2025, 11, 22, hour, 0, 0)
            .single()
            .expect("valid datetime")
    }

    #[test]
    fn normalizes_title_whitespace() {
        let contest = Contest::new(
            "  ABC   300\n",
            jst(18),
            jst(20),
            "https://atcoder.jp/contests/abc300",
        )
        .expect("valid contest");
        assert_eq!(contest.title, "ABC 300");
    }

    #[test]
    fn rejects_empty_title_and_inverted_range() {
        assert_eq!(
            Contest::new("   ", jst(18), jst(20), "https://atcoder.jp/contests/x"),
            Err(ContestError::EmptyTitle)
        );
        let err = Contest::new("ABC", jst(18), jst(18), "https://atcoder.jp/contests/x")
            .expect_err("zero length contest");
        assert!(matches!(err, ContestError::EndNotAfterStart { .. }));
        assert!(Contest::new("ABC", jst(18), jst(18) - Duration::hours(1), "u").is_err());
    }

    #[test]
    fn slug_is_last_path_segment() {
        let make = |url: &str| Contest::new("t", jst(1), jst(2), url).expect("valid contest");
        assert_eq!(make("https://atcoder.jp/contests/abc300").slug(), "abc300");
        assert_eq!(
            make("https://onlinemathcontest.com/contests/omc250/").slug(),
            "omc250"
        );
        assert_eq!(make("https://atcoder.jp/contests/arc190?lang=en").slug(), "arc190");
        assert_eq!(make("https://example.com").slug(), "");
    }
}
