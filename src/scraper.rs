//! Riot ID handles scraped from public leaderboard pages.

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// Brazilian solo queue leaderboard, first two pages.
pub const LEADERBOARD_URLS: [&str; 2] = [
    "https://www.leagueofgraphs.com/pt/rankings/summoners/br",
    "https://www.leagueofgraphs.com/pt/rankings/summoners/br?page=2",
];

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

pub struct LeaderboardScraper {
    http: reqwest::Client,
}

impl LeaderboardScraper {
    pub fn new() -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { http })
    }

    /// Player names listed on one leaderboard page. A page that cannot be
    /// fetched yields no names.
    pub async fn extract_handles(&self, url: &str) -> Vec<String> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "🔎 ⚠️ Leaderboard request failed");
                return Vec::new();
            }
        };

        if response.status() != StatusCode::OK {
            warn!(url, status = response.status().as_u16(), "🔎 ⚠️ Leaderboard page unavailable");
            return Vec::new();
        }

        match response.text().await {
            Ok(body) => {
                let handles = parse_handles(&body);
                debug!(url, count = handles.len(), "🔎 Leaderboard page parsed");
                handles
            }
            Err(e) => {
                warn!(url, error = %e, "🔎 ⚠️ Leaderboard body unreadable");
                Vec::new()
            }
        }
    }

    /// Names from every page, in page order.
    pub async fn load_handles(&self, urls: &[&str]) -> Vec<String> {
        let mut handles = Vec::new();
        for url in urls {
            handles.extend(self.extract_handles(url).await);
        }
        info!(count = handles.len(), "🔎 Found {} player(s) on the leaderboard", handles.len());
        handles
    }
}

/// Text of every `<span class="name">` found inside a table cell.
pub fn parse_handles(html: &str) -> Vec<String> {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let mut handles = Vec::new();
    let mut cursor = 0;

    while let Some((start, end)) = next_block(&lower, "<td", "</td>", cursor) {
        collect_names(&html[start..end], &lower[start..end], &mut handles);
        cursor = end;
    }

    handles
}

fn collect_names(cell: &str, lower: &str, out: &mut Vec<String>) {
    let mut cursor = 0;

    while let Some(rel) = lower.get(cursor..).and_then(|s| s.find("<span")) {
        let start = cursor + rel;
        let Some(open_end) = lower[start..].find('>').map(|i| start + i) else {
            return;
        };
        let Some(close) = lower[open_end..].find("</span>").map(|i| open_end + i) else {
            return;
        };

        if has_class(&lower[start..open_end], "name") {
            let text = normalize_ws(&decode_entities(&strip_tags(&cell[open_end + 1..close])));
            if !text.is_empty() {
                out.push(text);
            }
        }
        cursor = open_end + 1;
    }
}

fn next_block(lower: &str, open: &str, close: &str, from: usize) -> Option<(usize, usize)> {
    let start = lower.get(from..)?.find(open)? + from;
    let end = lower[start..].find(close)? + start + close.len();
    Some((start, end))
}

/// Whether the opening tag `tag` (lowercased, without `>`) carries `class`.
fn has_class(tag: &str, class: &str) -> bool {
    let Some(idx) = tag.find("class=") else {
        return false;
    };
    let value = &tag[idx + "class=".len()..];
    let value = match value.chars().next() {
        Some(quote @ ('"' | '\'')) => value[1..].split(quote).next().unwrap_or(""),
        _ => value.split_whitespace().next().unwrap_or(""),
    };
    value.split_whitespace().any(|c| c == class)
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
