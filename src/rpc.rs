use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError, RwLock,
    },
    time::Duration,
};

use anyhow::Result;
use log::debug;
use reqwest::{blocking::Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::{
    config::RpcConfig,
    model::{announce_domain, PeerSummary, Snapshot, TorrentSummary, TrackerSummary},
};

#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed")]
    Authentication,
    #[error("session negotiation failed")]
    Session,
    #[error("unexpected http status {0}")]
    HttpStatus(StatusCode),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("daemon did not report {0}")]
    MissingField(String),
    #[error("cannot send {0} to the daemon")]
    Encode(String),
    #[error("request was cancelled")]
    Cancelled,
}

pub type RpcResult<T> = std::result::Result<T, TransmissionError>;

const TORRENT_FIELDS: &[&str] = &[
    "id",
    "name",
    "status",
    "errorString",
    "downloadDir",
    "uploadedEver",
    "downloadedEver",
    "percentDone",
    "metadataPercentComplete",
    "recheckProgress",
    "sizeWhenDone",
    "leftUntilDone",
    "peersConnected",
    "uploadRatio",
    "rateDownload",
    "rateUpload",
    "uploadLimit",
    "uploadLimited",
    "downloadLimit",
    "downloadLimited",
    "eta",
    "dateCreated",
    "addedDate",
    "startDate",
    "activityDate",
    "doneDate",
    "peers",
    "trackerStats",
];

pub struct TransmissionClient {
    http: Client,
    endpoint: String,
    auth: Option<(String, Option<String>)>,
    session_id: Mutex<Option<String>>,
    timeout: RwLock<Duration>,
    counter: AtomicU64,
}

impl TransmissionClient {
    pub fn new(config: RpcConfig) -> Result<Self> {
        let endpoint = config.endpoint();
        let RpcConfig {
            username,
            password,
            timeout,
            verify_ssl,
            user_agent,
            ..
        } = config;
        let mut builder = Client::builder().user_agent(user_agent);
        if !verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;
        let auth = username.map(|user| (user, password));
        Ok(Self {
            http,
            endpoint,
            auth,
            session_id: Mutex::new(None),
            timeout: RwLock::new(timeout),
            counter: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        *self.timeout.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies to every request sent from now on.
    pub fn set_timeout(&self, timeout: Duration) {
        *self.timeout.write().unwrap_or_else(PoisonError::into_inner) = timeout;
    }

    pub fn fetch_snapshot(&self) -> RpcResult<Snapshot> {
        let torrents: TorrentGetResponse = self.call(
            "torrent-get",
            Some(json!({ "fields": TORRENT_FIELDS })),
        )?;
        let stats: SessionStats = self.call("session-stats", None)?;
        let session: SessionInfo = self.call("session-get", Some(json!({"fields": ["version"]})))?;
        Ok(Snapshot {
            version: session.version.unwrap_or_else(|| "unknown".to_string()),
            download_speed: stats.download_speed,
            upload_speed: stats.upload_speed,
            active_torrents: stats.active_torrent_count,
            paused_torrents: stats.paused_torrent_count,
            total_torrents: stats.torrent_count,
            torrents: torrents
                .torrents
                .into_iter()
                .map(TorrentSummary::from)
                .collect(),
        })
    }

    /// Raw `session-get` arguments; every field when `fields` is empty.
    pub fn session_get_raw(&self, fields: &[&str]) -> RpcResult<Map<String, Value>> {
        let args = if fields.is_empty() {
            None
        } else {
            Some(json!({ "fields": fields }))
        };
        self.call("session-get", args)
    }

    pub fn session_set(&self, arguments: Map<String, Value>) -> RpcResult<()> {
        debug!("session-set {}", Value::Object(arguments.clone()));
        self.call_raw("session-set", Some(Value::Object(arguments)))?;
        Ok(())
    }

    fn call<T>(&self, method: &str, arguments: Option<Value>) -> RpcResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self.call_raw(method, arguments)?;
        serde_json::from_value(value).map_err(TransmissionError::from)
    }

    fn call_raw(&self, method: &str, arguments: Option<Value>) -> RpcResult<Value> {
        let payload = RpcRequest {
            method,
            arguments,
            tag: Some(self.counter.fetch_add(1, Ordering::Relaxed)),
        };
        loop {
            let mut request = self
                .http
                .post(&self.endpoint)
                .timeout(self.timeout())
                .header("Content-Type", "application/json")
                .json(&payload);
            if let Some((user, pass)) = &self.auth {
                request = request.basic_auth(user, pass.as_ref());
            }
            let session_header = self
                .session_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(session) = session_header {
                request = request.header("X-Transmission-Session-Id", session);
            }
            let response = request.send()?;
            match response.status() {
                StatusCode::CONFLICT => {
                    if let Some(id) = response.headers().get("X-Transmission-Session-Id") {
                        let value = id
                            .to_str()
                            .map_err(|_| TransmissionError::Session)?
                            .to_string();
                        debug!("New session id: {value}");
                        *self.session_id.lock().unwrap_or_else(PoisonError::into_inner) =
                            Some(value);
                        continue;
                    }
                    return Err(TransmissionError::Session);
                }
                StatusCode::UNAUTHORIZED => return Err(TransmissionError::Authentication),
                status if !status.is_success() => {
                    return Err(TransmissionError::HttpStatus(status));
                }
                _ => {
                    let body: RpcResponse = response.json()?;
                    if body.result != "success" {
                        return Err(TransmissionError::Rpc(body.result));
                    }
                    return Ok(body.arguments.unwrap_or(Value::Null));
                }
            }
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    arguments: Option<Value>,
    tag: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    arguments: Option<Value>,
    result: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionStats {
    #[serde(default)]
    active_torrent_count: i64,
    #[serde(default)]
    paused_torrent_count: i64,
    #[serde(default)]
    torrent_count: i64,
    #[serde(default)]
    download_speed: i64,
    #[serde(default)]
    upload_speed: i64,
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TorrentGetResponse {
    #[serde(default)]
    torrents: Vec<TorrentWire>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TorrentWire {
    id: i64,
    name: String,
    status: i64,
    error_string: String,
    download_dir: String,
    uploaded_ever: i64,
    downloaded_ever: i64,
    percent_done: f64,
    metadata_percent_complete: f64,
    recheck_progress: f64,
    size_when_done: i64,
    left_until_done: i64,
    peers_connected: i64,
    upload_ratio: f64,
    rate_download: i64,
    rate_upload: i64,
    /// Kilobytes per second.
    upload_limit: i64,
    upload_limited: bool,
    download_limit: i64,
    download_limited: bool,
    eta: i64,
    date_created: i64,
    added_date: i64,
    start_date: i64,
    activity_date: i64,
    done_date: i64,
    peers: Vec<PeerWire>,
    tracker_stats: Vec<TrackerWire>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PeerWire {
    address: String,
    port: i64,
    client_name: String,
    progress: f64,
    rate_to_client: i64,
    rate_to_peer: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TrackerWire {
    announce: String,
    tier: i64,
    announce_state: i64,
    last_announce_succeeded: bool,
    last_announce_result: String,
    last_announce_time: i64,
    next_announce_time: i64,
    last_scrape_time: i64,
    next_scrape_time: i64,
    download_count: i64,
    leecher_count: i64,
    seeder_count: i64,
}

fn torrent_status(code: i64) -> String {
    match code {
        0 => "stopped".to_string(),
        1 => "check-wait".to_string(),
        2 => "checking".to_string(),
        3 => "download-wait".to_string(),
        4 => "downloading".to_string(),
        5 => "seed-wait".to_string(),
        6 => "seeding".to_string(),
        other => format!("status-{other}"),
    }
}

fn tracker_status(code: i64) -> &'static str {
    match code {
        1 => "idle",
        2 => "queued",
        3 => "announcing",
        _ => "inactive",
    }
}

fn limit(limited: bool, kilobytes: i64) -> Option<i64> {
    limited.then_some(kilobytes.max(0) * 1000)
}

impl From<TorrentWire> for TorrentSummary {
    fn from(wire: TorrentWire) -> Self {
        let peers = wire
            .peers
            .into_iter()
            .map(|peer| PeerSummary {
                torrent_id: wire.id,
                torrent_name: wire.name.clone(),
                address: peer.address,
                port: peer.port,
                client: peer.client_name,
                progress: peer.progress,
                rate_down: peer.rate_to_client,
                rate_up: peer.rate_to_peer,
                rate_est: None,
                eta: None,
            })
            .collect();
        let trackers = wire
            .tracker_stats
            .into_iter()
            .map(|tracker| TrackerSummary {
                torrent_id: wire.id,
                torrent_name: wire.name.clone(),
                tier: tracker.tier,
                domain: announce_domain(&tracker.announce),
                announce: tracker.announce,
                status: tracker_status(tracker.announce_state).to_string(),
                error: (!tracker.last_announce_succeeded && !tracker.last_announce_result.is_empty())
                    .then_some(tracker.last_announce_result),
                downloads: tracker.download_count,
                leeches: tracker.leecher_count,
                seeds: tracker.seeder_count,
                last_announce: tracker.last_announce_time,
                next_announce: tracker.next_announce_time,
                last_scrape: tracker.last_scrape_time,
                next_scrape: tracker.next_scrape_time,
            })
            .collect();
        TorrentSummary {
            torrent_id: wire.id,
            status: torrent_status(wire.status),
            error: (!wire.error_string.is_empty()).then_some(wire.error_string),
            download_dir: wire.download_dir,
            uploaded: wire.uploaded_ever,
            downloaded: wire.downloaded_ever,
            percent_done: wire.percent_done,
            percent_metadata: wire.metadata_percent_complete,
            percent_verified: wire.recheck_progress,
            size_when_done: wire.size_when_done,
            left_until_done: wire.left_until_done,
            peers_connected: wire.peers_connected,
            upload_ratio: wire.upload_ratio,
            rate_download: wire.rate_download,
            rate_upload: wire.rate_upload,
            limit_rate_up: limit(wire.upload_limited, wire.upload_limit),
            limit_rate_down: limit(wire.download_limited, wire.download_limit),
            eta: (wire.eta >= 0).then_some(wire.eta),
            time_created: wire.date_created,
            time_added: wire.added_date,
            time_started: wire.start_date,
            time_activity: wire.activity_date,
            time_completed: wire.done_date,
            name: wire.name,
            peers,
            trackers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torrent_wire_to_summary() {
        let wire: TorrentWire = serde_json::from_value(json!({
            "id": 7,
            "name": "debian.iso",
            "status": 4,
            "eta": -1,
            "uploadLimit": 250,
            "uploadLimited": true,
            "downloadLimit": 100,
            "downloadLimited": false,
            "peers": [{"address": "10.0.0.2", "port": 51413, "clientName": "Deluge",
                       "progress": 0.5, "rateToClient": 1000, "rateToPeer": 20}],
            "trackerStats": [{"announce": "udp://tracker.debian.org:6969/announce",
                              "tier": 0, "announceState": 1, "seederCount": 12,
                              "lastAnnounceSucceeded": false,
                              "lastAnnounceResult": "Connection refused"}]
        }))
        .unwrap();
        let torrent = TorrentSummary::from(wire);
        assert_eq!(torrent.status, "downloading");
        assert_eq!(torrent.eta, None);
        assert_eq!(torrent.limit_rate_up, Some(250_000));
        assert_eq!(torrent.limit_rate_down, None);
        assert_eq!(torrent.peers[0].torrent_name, "debian.iso");
        assert_eq!(torrent.peers[0].rate_down, 1000);
        assert_eq!(torrent.tracker_domain(), "debian.org");
        assert_eq!(torrent.seeds(), 12);
        assert_eq!(torrent.trackers[0].status, "idle");
        assert_eq!(torrent.trackers[0].error.as_deref(), Some("Connection refused"));
    }

    #[test]
    fn request_omits_missing_arguments() {
        let request = RpcRequest {
            method: "session-stats",
            arguments: None,
            tag: Some(3),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"method": "session-stats", "tag": 3})
        );
    }

    #[test]
    fn unknown_status_codes_are_kept() {
        assert_eq!(torrent_status(6), "seeding");
        assert_eq!(torrent_status(9), "status-9");
    }
}
