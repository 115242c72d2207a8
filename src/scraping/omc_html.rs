use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::base::{self, RecoverWithDefault, SkipItem};
use super::ContestSource;
use crate::models::Contest;

const SOURCE_ID: &str = "omc";
const SOURCE_NAME: &str = "OnlineMathContest";
const DATE_FORMAT: &str = "%b %d, %Y %H:%M";
const UTC_MARKERS: [&str; 2] = ["UTC", "GMT"];
const DATE_FALLBACK: SkipItem = SkipItem;
const DURATION_FALLBACK: RecoverWithDefault<i64> = RecoverWithDefault(2);

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.contest-item").expect("omc item selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3").expect("omc title selector"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.contest-date").expect("omc date selector"));
static DURATION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.contest-duration").expect("omc duration selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("omc link selector"));

pub struct OnlineMathContest {
    url: String,
}

impl OnlineMathContest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

impl ContestSource for OnlineMathContest {
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

impl OnlineMathContest {
    /// Items without a title or a readable date are left out.
    pub(crate) fn parse_document(&self, html: &str) -> Result<Vec<Contest>> {
        let document = Html::parse_document(html);
        let mut contests = Vec::new();

        for item in document.select(&ITEM_SELECTOR) {
            let title = match base::first_text(&item, &TITLE_SELECTOR) {
                Some(text) => text,
                None => continue,
            };
            let date_text = match base::first_text(&item, &DATE_SELECTOR) {
                Some(text) => text,
                None => continue,
            };
            let start = match DATE_FALLBACK.apply(parse_start(&date_text)) {
                Some(start) => start,
                None => {
                    debug!(source = SOURCE_ID, %title, date = %date_text, "skipping item with unreadable date");
                    continue;
                }
            };

            let hours = DURATION_FALLBACK.apply(
                base::first_text(&item, &DURATION_SELECTOR)
                    .as_deref()
                    .and_then(parse_duration_hours),
            );
            let end = start + Duration::hours(hours);

            let url = base::absolute_url(&self.url, base::first_attr(&item, &LINK_SELECTOR, "href"))
                .unwrap_or_else(|| self.url.clone());

            match Contest::new(&title, start, end, url) {
                Ok(contest) => contests.push(contest),
                Err(err) => warn!(source = SOURCE_ID, "dropping item: {err}"),
            }
        }

        Ok(contests)
    }
}

/// `Nov 22, 2025 18:00 UTC`, read as UTC.
fn parse_start(text: &str) -> Option<DateTime<FixedOffset>> {
    let (stamp, marker) = text.trim().rsplit_once(' ')?;
    if !UTC_MARKERS
        .iter()
        .any(|utc| marker.eq_ignore_ascii_case(utc))
    {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(stamp.trim(), DATE_FORMAT).ok()?;
    Some(naive.and_utc().fixed_offset())
}

/// Second token of `Duration: 2 hours`.
fn parse_duration_hours(text: &str) -> Option<i64> {
    let hours = text.split_whitespace().nth(1)?.parse::<u16>().ok()?;
    if hours == 0 {
        return None;
    }
    Some(i64::from(hours))
}
