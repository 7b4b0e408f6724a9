//! Both adapters against a local mock server: request shape, parsing,
//! and error classification.

use std::time::Duration;

use httpmock::prelude::*;
use lw_sources::{SlateSource, SourceError, StatsSource, UnderdogSlateSource, VlrClient};
use serde_json::json;

const SUFFIX: &str = " Kills on Maps 1+2 O/U";
const UA: &str = "linewatch-tests";

fn slate_source(server: &MockServer, timeout: Duration) -> UnderdogSlateSource {
    UnderdogSlateSource::new(server.url("/v1/over_under_lines"), SUFFIX, timeout, UA).unwrap()
}

fn vlr(server: &MockServer) -> VlrClient {
    VlrClient::new(&server.base_url(), Duration::from_secs(5), UA).unwrap()
}

#[tokio::test]
async fn slate_fetch_parses_tracked_lines() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/over_under_lines");
            then.status(200).json_body(json!({
                "over_under_lines": [
                    {
                        "over_under": { "title": "TenZ Kills on Maps 1+2 O/U" },
                        "stat_value": "32.5",
                        "options": [ { "american_price": "-120" }, { "american_price": "+100" } ]
                    },
                    { "over_under": { "title": "TenZ Fantasy Points" }, "stat_value": "50" }
                ]
            }));
        })
        .await;

    let slate = slate_source(&server, Duration::from_secs(5)).fetch_slate().await.unwrap();
    mock.assert_async().await;

    assert_eq!(slate.listed_lines, 2);
    assert_eq!(slate.entries.len(), 1);
    assert_eq!(slate.entries[0].player, "TenZ");
    assert_eq!(slate.entries[0].line, Some(32.5));
}

#[tokio::test]
async fn slate_status_error_is_classified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/over_under_lines");
            then.status(503);
        })
        .await;

    let err = slate_source(&server, Duration::from_secs(5)).fetch_slate().await.unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 503, .. }), "got {err:?}");
}

#[tokio::test]
async fn slate_timeout_is_classified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/over_under_lines");
            then.status(200).json_body(json!([])).delay(Duration::from_millis(800));
        })
        .await;

    let err = slate_source(&server, Duration::from_millis(100)).fetch_slate().await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
}

#[tokio::test]
async fn slate_non_json_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/over_under_lines");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = slate_source(&server, Duration::from_secs(5)).fetch_slate().await.unwrap_err();
    assert!(matches!(err, SourceError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn vlr_search_sends_player_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/search/")
                .query_param("q", "tenz")
                .query_param("type", "players");
            then.status(200).body(
                r#"<a class="wf-module-item search-item" href="/player/9/tenz">
                     <div class="search-item-title">TenZ</div></a>"#,
            );
        })
        .await;

    let hits = vlr(&server).search_players("tenz").await.unwrap();
    mock.assert_async().await;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display_name, "TenZ");
    assert_eq!(hits[0].url, server.url("/player/9/tenz"));
}

#[tokio::test]
async fn vlr_history_and_player_maps() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/player/matches/9/tenz");
            then.status(200)
                .body(r#"<a href="/40001/sen-vs-nrg">m1</a><a href="/40000/sen-vs-g2">m0</a>"#);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/40001/sen-vs-nrg");
            then.status(200).body(
                r#"
                <div class="match-header-link-name"><div class="wf-title-med">Sentinels</div></div>
                <div class="match-header-link-name"><div class="wf-title-med">NRG</div></div>
                <div class="match-header-date"><div class="moment-tz-convert" data-utc-ts="2025-04-02 20:00:00">x</div></div>
                <div class="vm-stats-game">
                  <div class="vm-stats-game-header"><div class="map"><span>Ascent PICK</span></div></div>
                  <table><tbody>
                    <tr><td class="mod-player"><div class="text-of">TenZ</div></td>
                        <td><img alt="jett"></td>
                        <td class="mod-stat mod-vlr-kills"><span class="mod-both">21</span><span class="mod-t">12</span></td></tr>
                  </tbody></table>
                </div>
                <div class="vm-stats-game">
                  <div class="vm-stats-game-header"><div class="map"><span>Bind</span></div></div>
                  <table><tbody>
                    <tr><td class="mod-player"><div class="text-of">Zekken</div></td>
                        <td><img alt="raze"></td>
                        <td class="mod-stat mod-vlr-kills"><span class="mod-both">30</span></td></tr>
                    <tr><td class="mod-player"><div class="text-of">TenZ</div></td>
                        <td><img alt="omen"></td>
                        <td class="mod-stat mod-vlr-kills"><span class="mod-both">14</span></td></tr>
                  </tbody></table>
                </div>"#,
            );
        })
        .await;

    let client = vlr(&server);
    let profile_url = server.url("/player/9/tenz");

    let links = client.fetch_match_links(&profile_url).await.unwrap();
    assert_eq!(links, vec![server.url("/40001/sen-vs-nrg"), server.url("/40000/sen-vs-g2")]);

    let rows = client.fetch_player_maps(&links[0], "TenZ").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].map.as_str(), rows[0].agent.as_str(), rows[0].kills), ("Ascent", "jett", 21));
    assert_eq!((rows[1].map.as_str(), rows[1].agent.as_str(), rows[1].kills), ("Bind", "omen", 14));
    assert_eq!(rows[0].match_title, "Sentinels vs NRG");
    assert_eq!(rows[0].match_date, "2025-04-02");
}

#[tokio::test]
async fn vlr_agent_stats_for_timespan() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/player/9/tenz")
                .query_param("timespan", "all");
            then.status(200).body(
                r#"<table class="wf-table"><thead><tr><th>Agent</th></tr></thead><tbody>
                  <tr><td><img alt="jett"></td><td>(52)</td><td>1,204</td><td>1.12</td><td>241.3</td>
                      <td>1.21</td><td>152.0</td><td>71%</td><td>0.85</td><td>0.21</td><td>0.16</td>
                      <td>0.12</td><td>1,023</td><td>845</td><td>252</td><td>193</td><td>144</td></tr>
                  <tr><td><img alt="omen"></td><td>(4)</td><td>88</td><td>0.95</td><td>190.0</td>
                      <td>0.90</td><td>120.5</td><td>74%</td><td>0.66</td><td>0.40</td><td>0.05</td>
                      <td>0.07</td><td>58</td><td>64</td><td>35</td><td>4</td><td>6</td></tr>
                </tbody></table>"#,
            );
        })
        .await;

    let agents = vlr(&server)
        .fetch_agent_stats(&server.url("/player/9/tenz"), "all")
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0].agent, "Jett");
    assert_eq!(agents[0].rounds, 1204);
    assert_eq!(agents[0].kills, 1023);
    assert_eq!(agents[0].kast, "71%");
    assert_eq!(agents[1].agent, "Omen");
    assert_eq!(agents[1].fd, 6);
}

#[tokio::test]
async fn vlr_agent_stats_status_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/player/9/tenz");
            then.status(500);
        })
        .await;

    let err = vlr(&server)
        .fetch_agent_stats(&server.url("/player/9/tenz"), "30d")
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 500, .. }), "got {err:?}");
}

#[tokio::test]
async fn vlr_missing_page_is_status_404() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/player/404/ghost");
            then.status(404);
        })
        .await;

    let err = vlr(&server)
        .fetch_profile(&server.url("/player/404/ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 404, .. }), "got {err:?}");
}

#[tokio::test]
async fn vlr_roster_splits_tables_by_team() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/50000/prx-vs-drx");
            then.status(200).body(
                r#"
                <div class="match-header-link-name"><div class="wf-title-med">Paper Rex</div></div>
                <div class="match-header-link-name"><div class="wf-title-med">DRX</div></div>
                <div class="vm-stats-game">
                  <table class="wf-table-inset"><tbody>
                    <tr><td class="mod-player"><a href="/player/1/something"><div class="text-of">something</div></a></td></tr>
                  </tbody></table>
                  <table class="wf-table-inset"><tbody>
                    <tr><td class="mod-player"><a href="/player/2/mako"><div class="text-of">MaKo</div></a></td></tr>
                  </tbody></table>
                </div>"#,
            );
        })
        .await;

    let url = server.url("/50000/prx-vs-drx");
    let roster = vlr(&server).fetch_match_roster(&url).await.unwrap();
    assert_eq!(roster.teams, vec!["Paper Rex".to_string(), "DRX".to_string()]);
    assert_eq!(roster.players.len(), 2);
    assert_eq!(roster.players[0].team.as_deref(), Some("Paper Rex"));
    assert_eq!(roster.players[1].display_name, "MaKo");
    assert_eq!(roster.players[1].team.as_deref(), Some("DRX"));
    assert_eq!(roster.players[1].url, server.url("/player/2/mako"));
}
