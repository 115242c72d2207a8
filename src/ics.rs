//! iCalendar output.
//!
//! The rendered calendar carries no generation timestamp, so the same contests
//! always produce the same bytes.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use sha2::{Digest, Sha256};

use crate::config::{AppConfig, ClockMode, DEFAULT_PROD_ID, DEFAULT_UID_DOMAIN};
use crate::models::Contest;
use crate::utils;

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const MAX_LINE_OCTETS: usize = 75;
const EMPTY_SLUG: &str = "contest";

#[derive(Debug, Clone)]
pub struct CalendarOptions {
    pub prod_id: String,
    pub uid_domain: String,
    pub clock_mode: ClockMode,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            prod_id: DEFAULT_PROD_ID.to_string(),
            uid_domain: DEFAULT_UID_DOMAIN.to_string(),
            clock_mode: ClockMode::default(),
        }
    }
}

impl From<&AppConfig> for CalendarOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            prod_id: config.prod_id.clone(),
            uid_domain: config.uid_domain.clone(),
            clock_mode: config.clock_mode,
        }
    }
}

pub fn render_calendar(contests: &[Contest], options: &CalendarOptions) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{}", escape_text(&options.prod_id)));

    let uids = event_uids(contests, &options.uid_domain);
    for (contest, uid) in contests.iter().zip(uids) {
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}", escape_text(&uid)));
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&contest.title)));
        push_line(
            &mut out,
            &format!("DTSTART:{}", format_stamp(&contest.start, options.clock_mode)),
        );
        push_line(
            &mut out,
            &format!("DTEND:{}", format_stamp(&contest.end, options.clock_mode)),
        );
        push_line(&mut out, &format!("DESCRIPTION:{}", escape_text(&contest.url)));
        push_line(&mut out, &format!("URL:{}", contest.url));
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

/// Renders the calendar and replaces `path` with it. The content goes to a
/// sibling temp file first so a failed write leaves the old file intact.
pub fn write_calendar(path: &Path, contests: &[Contest], options: &CalendarOptions) -> Result<()> {
    let rendered = render_calendar(contests, options);
    utils::ensure_parent(path)
        .with_context(|| format!("unable to create directory for {}", path.display()))?;

    let tmp = temp_path(path);
    fs::write(&tmp, rendered.as_bytes())
        .with_context(|| format!("unable to write {}", tmp.display()))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err).with_context(|| format!("unable to replace {}", path.display()));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// `<slug>@<domain>` per contest. A repeated UID gets a short hash of the full
/// URL, then a counter if the URL itself repeats.
fn event_uids(contests: &[Contest], domain: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    contests
        .iter()
        .map(|contest| {
            let slug = match contest.slug() {
                slug if slug.is_empty() => EMPTY_SLUG.to_string(),
                slug => slug,
            };
            let mut uid = format!("{slug}@{domain}");
            if seen.contains(&uid) {
                let digest = format!("{:x}", Sha256::digest(contest.url.as_bytes()));
                let hashed = format!("{slug}-{}", &digest[..8]);
                uid = format!("{hashed}@{domain}");
                let mut counter = 2;
                while seen.contains(&uid) {
                    uid = format!("{hashed}-{counter}@{domain}");
                    counter += 1;
                }
            }
            seen.insert(uid.clone());
            uid
        })
        .collect()
}

fn format_stamp(value: &DateTime<FixedOffset>, mode: ClockMode) -> String {
    match mode {
        ClockMode::Utc => value.with_timezone(&Utc).format(STAMP_FORMAT).to_string(),
        ClockMode::SourceLocal => value.format(STAMP_FORMAT).to_string(),
    }
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("\\n");
            }
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Appends `line` folded to 75 octets per physical line, CRLF terminated.
fn push_line(out: &mut String, line: &str) {
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > budget {
            out.push_str("\r\n ");
            // the leading space counts against the continuation line
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        out.push(ch);
        used += width;
    }
    out.push_str("\r\n");
}
