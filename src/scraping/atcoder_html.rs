use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::warn;

use super::base::{self, RecoverWithDefault};
use super::ContestSource;
use crate::models::Contest;

const SOURCE_ID: &str = "atcoder";
const SOURCE_NAME: &str = "AtCoder";
const LINK_BASE: &str = "https://atcoder.jp";
const TIMEZONE: Tz = chrono_tz::Asia::Tokyo;
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const FULL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";
const DURATION_FALLBACK: RecoverWithDefault<(i64, i64)> = RecoverWithDefault((2, 0));

static CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div#contest-table-upcoming").expect("atcoder container selector")
});
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("atcoder row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("atcoder cell selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("atcoder link selector"));
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,6}):(\d{1,4})$").expect("valid duration regex"));

#[derive(Debug, Error)]
pub enum RowError {
    #[error("row {row}: title cell has no link")]
    MissingLink { row: usize },
    #[error("row {row}: unrecognized start time {text:?}")]
    BadDate { row: usize, text: String },
}

pub struct AtCoder {
    url: String,
}

impl AtCoder {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

impl ContestSource for AtCoder {
    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    fn fetch(&self, client: &Client) -> Result<Vec<Contest>> {
        let html = base::fetch_html(client, &self.url)?;
        self.parse_document(&html)
    }
}

impl AtCoder {
    /// Reads the upcoming-contest table. A page without the table yields no
    /// contests; a row without a link or with an unreadable start is an error.
    pub(crate) fn parse_document(&self, html: &str) -> Result<Vec<Contest>> {
        let document = Html::parse_document(html);
        let container = match document.select(&CONTAINER_SELECTOR).next() {
            Some(container) => container,
            None => return Ok(Vec::new()),
        };

        let mut contests = Vec::new();
        for (index, row) in container.select(&ROW_SELECTOR).skip(1).enumerate() {
            let row_number = index + 1;
            let cells = row.select(&CELL_SELECTOR).collect::<Vec<_>>();
            if cells.len() < 3 {
                continue;
            }

            let date_text = base::inner_text(cells[0]);
            let start = parse_start(&date_text).ok_or_else(|| RowError::BadDate {
                row: row_number,
                text: date_text.clone(),
            })?;

            let anchor = cells[1]
                .select(&LINK_SELECTOR)
                .next()
                .ok_or(RowError::MissingLink { row: row_number })?;
            let title = match base::inner_text(anchor) {
                text if text.is_empty() => base::inner_text(cells[1]),
                text => text,
            };
            let url = base::absolute_url(LINK_BASE, anchor.value().attr("href").map(str::to_string))
                .ok_or(RowError::MissingLink { row: row_number })?;

            let (hours, minutes) =
                DURATION_FALLBACK.apply(parse_duration(&base::inner_text(cells[2])));
            let end = start + Duration::hours(hours) + Duration::minutes(minutes);

            match Contest::new(&title, start, end, url) {
                Ok(contest) => contests.push(contest),
                Err(err) => warn!(source = SOURCE_ID, row = row_number, "dropping row: {err}"),
            }
        }

        Ok(contests)
    }
}

fn parse_start(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, DATE_FORMAT) {
        return TIMEZONE
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.fixed_offset());
    }
    DateTime::parse_from_str(text, FULL_DATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&TIMEZONE).fixed_offset())
}

/// `H:M` with a non-zero total.
fn parse_duration(text: &str) -> Option<(i64, i64)> {
    let caps = DURATION_RE.captures(text.trim())?;
    let hours = caps.get(1)?.as_str().parse::<i64>().ok()?;
    let minutes = caps.get(2)?.as_str().parse::<i64>().ok()?;
    if hours == 0 && minutes == 0 {
        return None;
    }
    Some((hours, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
    <html><body>
    <div id="contest-table-upcoming">
        <h3>Upcoming Contests</h3>
        <div class="table-responsive">
            <table class="table table-default table-striped table-hover table-condensed table-bordered small">
                <thead>
                    <tr><th>Start Time</th><th>Contest Name</th><th>Duration</th><th>Rated Range</th></tr>
                </thead>
                <tbody>
                    <tr>
                        <td class="text-center">2025-11-22 18:00</td>
                        <td><span title="Algorithm">Ⓐ</span> <a href="/contests/abc300">ABC 300</a></td>
                        <td class="text-center">02:00</td>
                        <td class="text-center"> - 1999</td>
                    </tr>
                    <tr>
                        <td class="text-center"><a href="http://www.timeanddate.com/worldclock/fixedtime.html?iso=20251123T2100&amp;p1=248" target="blank"><time class="fixtime fixtime-full">2025-11-23 21:00:00+0900</time></a></td>
                        <td><a href="/contests/arc190">AtCoder Regular Contest 190</a></td>
                        <td class="text-center">01:40</td>
                        <td class="text-center">1200 - 2799</td>
                    </tr>
                    <tr>
                        <td class="text-center">2025-11-29 12:00</td>
                        <td><a href="/contests/ahc060">AtCoder Heuristic Contest 060</a></td>
                        <td class="text-center">about a week</td>
                        <td class="text-center">All</td>
                    </tr>
                    <tr><td colspan="2">No more contests</td></tr>
                </tbody>
            </table>
        </div>
    </div>
    <div id="contest-table-recent">
        <table><tbody>
            <tr><th>Start Time</th><th>Contest Name</th><th>Duration</th></tr>
            <tr>
                <td>2025-11-01 21:00</td>
                <td><a href="/contests/abc299">ABC 299</a></td>
                <td>01:40</td>
            </tr>
        </tbody></table>
    </div>
    </body></html>
    "#;

    fn jst(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .expect("offset")
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("valid datetime")
    }

    #[test]
    fn parses_upcoming_table() {
        let scraper = AtCoder::new(crate::config::DEFAULT_ATCODER_URL);
        let contests = scraper.parse_document(SAMPLE_HTML).expect("parse atcoder html");
        assert_eq!(contests.len(), 3, "recent table rows must not be read");

        let first = &contests[0];
        assert_eq!(first.title, "ABC 300");
        assert_eq!(first.url, "https://atcoder.jp/contests/abc300");
        assert_eq!(first.start, jst(2025, 11, 22, 18, 0));
        assert_eq!(first.end, jst(2025, 11, 22, 20, 0));
        assert_eq!(first.start.to_rfc3339(), "2025-11-22T18:00:00+09:00");

        let second = &contests[1];
        assert_eq!(second.start, jst(2025, 11, 23, 21, 0));
        assert_eq!(second.end, jst(2025, 11, 23, 22, 40));
        assert_eq!(second.start.offset().local_minus_utc(), 9 * 3600);

        let third = &contests[2];
        assert_eq!(third.url, "https://atcoder.jp/contests/ahc060");
        assert_eq!(third.end - third.start, Duration::hours(2));
    }

    #[test]
    fn missing_container_yields_nothing() {
        let scraper = AtCoder::new(crate::config::DEFAULT_ATCODER_URL);
        let contests = scraper
            .parse_document("<html><body><table><tr><td>a</td></tr></table></body></html>")
            .expect("parse");
        assert!(contests.is_empty());
    }

    #[test]
    fn missing_link_is_an_error() {
        let html = r#"
        <div id="contest-table-upcoming"><table>
            <tr><th>Start</th><th>Name</th><th>Duration</th></tr>
            <tr><td>2025-11-22 18:00</td><td>ABC 300</td><td>02:00</td></tr>
        </table></div>"#;
        let err = AtCoder::new(crate::config::DEFAULT_ATCODER_URL)
            .parse_document(html)
            .expect_err("row without anchor");
        assert!(matches!(
            err.downcast_ref::<RowError>(),
            Some(RowError::MissingLink { row: 1 })
        ));
    }

    #[test]
    fn unreadable_start_is_an_error() {
        let html = r#"
        <div id="contest-table-upcoming"><table>
            <tr><th>Start</th><th>Name</th><th>Duration</th></tr>
            <tr><td>soon</td><td><a href="/contests/abc300">ABC 300</a></td><td>02:00</td></tr>
        </table></div>"#;
        let err = AtCoder::new(crate::config::DEFAULT_ATCODER_URL)
            .parse_document(html)
            .expect_err("bad date");
        assert!(matches!(
            err.downcast_ref::<RowError>(),
            Some(RowError::BadDate { .. })
        ));
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("02:00"), Some((2, 0)));
        assert_eq!(parse_duration(" 240:00 "), Some((240, 0)));
        assert_eq!(parse_duration("1:40"), Some((1, 40)));
        assert_eq!(parse_duration("00:00"), None);
        assert_eq!(parse_duration("-1:00"), None);
        assert_eq!(parse_duration("1:2:3"), None);
        assert_eq!(parse_duration(""), None);
    }
}
