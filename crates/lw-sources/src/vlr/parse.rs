//! HTML extraction for VLR.gg pages.
//!
//! Every function takes page text and returns plain data; no IO. Selectors
//! follow the site's current markup and degrade to empty results when the
//! markup changes.

use chrono::{NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};

use crate::normalize::{names_overlap, normalize_name};
use lw_schemas::AgentStats;

use crate::{MapRow, MatchRoster, ProfilePage, RosterPlayer, SearchHit};

pub const UNKNOWN_MATCH: &str = "<Unknown Match>";
pub const UNKNOWN_DATE: &str = "<Unknown Date>";
pub const UNKNOWN_AGENT: &str = "<Unknown Agent>";

/// Rows per side when a map section has a single combined table.
const ROWS_PER_SIDE: usize = 5;

/// Cells in a complete agent-table row, agent image through first deaths.
const AGENT_ROW_CELLS: usize = 17;

fn sel(css: &'static str) -> Selector {
    // Selectors are literals in this module; a parse failure is a programming error.
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

fn text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(scope: ElementRef<'_>, css: &'static str) -> Option<String> {
    scope
        .select(&sel(css))
        .map(text)
        .find(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

pub fn absolute_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else if href.starts_with('/') {
        Some(format!("{}{}", base.trim_end_matches('/'), href))
    } else {
        None
    }
}

/// Match pages live at `/<numeric id>/<slug>`; ids have at least 4 digits.
fn is_match_path(path: &str) -> bool {
    let first = path.trim_matches('/').split('/').next().unwrap_or("");
    first.len() >= 4 && first.chars().all(|c| c.is_ascii_digit())
}

pub fn match_url_from_href(base: &str, href: &str) -> Option<String> {
    let base = base.trim_end_matches('/');
    let href = href.trim();
    if href.starts_with('/') {
        is_match_path(href).then(|| format!("{base}{href}"))
    } else if let Some(rest) = href.strip_prefix(base) {
        is_match_path(rest).then(|| href.to_string())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Search / profile
// ---------------------------------------------------------------------------

pub fn parse_search_results(html: &str, base: &str) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let base = base.trim_end_matches('/');
    let mut hits = Vec::new();

    for a in doc.select(&sel("a.wf-module-item.search-item")) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        // Search results sometimes wrap the profile path; keep only the player part.
        let url = match href.find("/player/") {
            Some(idx) => format!("{base}{}", &href[idx..]),
            None => match absolute_url(base, href) {
                Some(u) => u,
                None => continue,
            },
        };
        let display_name = first_text(a, "div.search-item-title").unwrap_or_default();
        hits.push(SearchHit { display_name, url });
    }
    hits
}

pub fn parse_profile(html: &str, base: &str) -> ProfilePage {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let name = first_text(root, "h1.wf-title").or_else(|| first_text(root, "h1"));

    let team_link = doc
        .select(&sel("h2"))
        .find(|h| text(*h).contains("Current Teams"))
        .and_then(|h| {
            h.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "div" && e.value().classes().any(|c| c == "wf-card"))
        })
        .and_then(|card| card.select(&sel("a.wf-module-item")).next());

    let Some(link) = team_link else {
        return ProfilePage {
            name,
            ..ProfilePage::default()
        };
    };

    let team = link
        .select(&sel("div"))
        .find(|d| {
            d.value()
                .attr("style")
                .is_some_and(|s| s.contains("font-weight: 500;"))
        })
        .map(text)
        .filter(|t| !t.is_empty());

    let team_url = link
        .value()
        .attr("href")
        .filter(|h| h.contains("/team/") || h.starts_with("http"))
        .and_then(|h| absolute_url(base, h));

    ProfilePage {
        name,
        team,
        team_url,
    }
}

/// Match URLs in page order, de-duplicated.
pub fn parse_match_links(html: &str, base: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut out: Vec<String> = Vec::new();
    for a in doc.select(&sel("a[href]")) {
        let Some(url) = a.value().attr("href").and_then(|h| match_url_from_href(base, h)) else {
            continue;
        };
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Agent table
// ---------------------------------------------------------------------------

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Empty cells read as zero; anything else must parse.
fn num<T: std::str::FromStr + Default>(cell: &str) -> Option<T> {
    let raw = cell.trim().replace(',', "");
    if raw.is_empty() {
        return Some(T::default());
    }
    raw.parse().ok()
}

fn agent_row(cells: &[ElementRef<'_>]) -> Option<AgentStats> {
    if cells.len() < AGENT_ROW_CELLS {
        return None;
    }
    let agent = cells[0]
        .select(&sel("img[alt]"))
        .find_map(|img| img.value().attr("alt"))
        .map(|a| capitalize(a.trim()))
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let t: Vec<String> = cells.iter().map(|c| text(*c)).collect();

    Some(AgentStats {
        agent,
        rounds: num(&t[2])?,
        rating: num(&t[3])?,
        acs: num(&t[4])?,
        kd: num(&t[5])?,
        adr: num(&t[6])?,
        kast: t[7].trim().to_string(),
        kpr: num(&t[8])?,
        apr: num(&t[9])?,
        fkpr: num(&t[10])?,
        fdpr: num(&t[11])?,
        kills: num(&t[12])?,
        deaths: num(&t[13])?,
        assists: num(&t[14])?,
        fk: num(&t[15])?,
        fd: num(&t[16])?,
    })
}

/// Rows of the per-agent stats table on a profile page. Short or
/// unreadable rows are skipped.
pub fn parse_agent_table(html: &str) -> Vec<AgentStats> {
    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&sel("table.wf-table")).next() else {
        return Vec::new();
    };
    let cell_sel = sel("td");
    table
        .select(&sel("tbody tr"))
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            agent_row(&cells)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Match pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchHeader {
    pub teams: Vec<String>,
    pub title: String,
    pub date: String,
}

impl MatchHeader {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

pub fn parse_match_header(html: &str) -> MatchHeader {
    header_of(&Html::parse_document(html))
}

fn header_of(doc: &Html) -> MatchHeader {
    let teams: Vec<String> = doc
        .select(&sel("div.match-header-link-name .wf-title-med"))
        .map(text)
        .take(2)
        .collect();

    let title = if teams.len() >= 2 {
        format!("{} vs {}", teams[0], teams[1])
    } else {
        UNKNOWN_MATCH.to_string()
    };

    MatchHeader {
        teams,
        title,
        date: match_date(doc).unwrap_or_else(|| UNKNOWN_DATE.to_string()),
    }
}

fn match_date(doc: &Html) -> Option<String> {
    let selectors = [
        sel(".match-header-date .moment-tz-convert"),
        sel(".match-header-date"),
        sel(".moment-tz-convert"),
    ];
    for s in &selectors {
        let Some(tag) = doc.select(s).next() else {
            continue;
        };
        let raw = tag
            .value()
            .attr("data-utc-ts")
            .or_else(|| tag.value().attr("data-timestamp"));
        if let Some(raw) = raw {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S") {
                return Some(dt.date().format("%Y-%m-%d").to_string());
            }
            if let Ok(d) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                return Some(d.format("%Y-%m-%d").to_string());
            }
        }
        let t = text(tag);
        if let Some(first) = t.split_whitespace().next() {
            return Some(first.to_string());
        }
    }
    None
}

fn player_cell_name(cell: ElementRef<'_>) -> String {
    first_text(cell, "div.text-of")
        .or_else(|| cell.value().attr("title").map(str::to_string))
        .unwrap_or_else(|| text(cell))
}

/// The given player's row on every map of a match page, in map order.
pub fn parse_player_maps(html: &str, match_url: &str, player: &str) -> Vec<MapRow> {
    let doc = Html::parse_document(html);
    let header = header_of(&doc);
    let map_label = [sel(".vm-stats-game-header .map span"), sel(".map span")];
    let row_sel = sel("tbody tr");
    let cell_sel = sel("td.mod-player");
    let agent_sel = sel("img[alt]");
    let kills_sel = sel("td.mod-stat.mod-vlr-kills");
    let both_sel = sel(".mod-both");

    let mut out = Vec::new();
    for section in doc.select(&sel("div.vm-stats-game")) {
        let Some(label) = map_label.iter().find_map(|s| section.select(s).next()) else {
            continue;
        };
        let map = text(label).replace("PICK", "");
        let map = map.split_whitespace().collect::<Vec<_>>().join(" ");
        if map.is_empty() || map.eq_ignore_ascii_case("all maps") {
            continue;
        }

        for row in section.select(&row_sel) {
            let Some(cell) = row.select(&cell_sel).next() else {
                continue;
            };
            if !names_overlap(&player_cell_name(cell), player) {
                continue;
            }

            let agent = row
                .select(&agent_sel)
                .find_map(|img| img.value().attr("alt"))
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| UNKNOWN_AGENT.to_string());

            let kills = row
                .select(&kills_sel)
                .next()
                .and_then(|c| {
                    let raw = c.select(&both_sel).next().map(text).unwrap_or_else(|| text(c));
                    raw.trim().parse::<u32>().ok()
                })
                .unwrap_or(0);

            out.push(MapRow {
                map: map.clone(),
                agent,
                kills,
                match_url: match_url.to_string(),
                match_title: header.title.clone(),
                match_date: header.date.clone(),
            });
            // one row per map for the player
            break;
        }
    }
    out
}

/// Teams and player links of a match page. Players are attributed to the
/// first team when they appear in the first stats table of a map section,
/// to the second team otherwise.
pub fn parse_match_roster(html: &str, match_url: &str, base: &str) -> MatchRoster {
    let doc = Html::parse_document(html);
    let header = header_of(&doc);
    let table_sel = sel("table.wf-table-inset");
    let row_sel = sel("tbody tr");
    let cell_sel = sel("td.mod-player");
    let link_sel = sel("a[href*='/player/']");

    let mut seen: Vec<String> = Vec::new();
    let mut players: Vec<RosterPlayer> = Vec::new();

    let mut take_row = |row: ElementRef<'_>, side: usize| {
        let Some(cell) = row.select(&cell_sel).next() else {
            return;
        };
        let Some(link) = cell.select(&link_sel).next() else {
            return;
        };
        let Some(url) = link.value().attr("href").and_then(|h| absolute_url(base, h)) else {
            return;
        };
        let display_name = player_cell_name(cell);
        let key = normalize_name(&display_name);
        if key.is_empty() || seen.contains(&key) {
            return;
        }
        seen.push(key);
        players.push(RosterPlayer {
            display_name,
            url,
            team: header.teams.get(side).cloned(),
        });
    };

    for section in doc.select(&sel("div.vm-stats-game")) {
        let tables: Vec<ElementRef<'_>> = section.select(&table_sel).collect();
        if tables.len() >= 2 {
            for (side, table) in tables.iter().take(2).enumerate() {
                for row in table.select(&row_sel) {
                    take_row(row, side);
                }
            }
        } else {
            for (i, row) in section.select(&row_sel).enumerate() {
                take_row(row, usize::from(i >= ROWS_PER_SIDE));
            }
        }
    }

    MatchRoster {
        match_url: match_url.to_string(),
        teams: header.teams,
        players,
    }
}
