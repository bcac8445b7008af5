use std::time::Duration;

use reqwest::Url;

use crate::usertypes::{Converters, SharedConverter};

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: String,
    pub download_speed: i64,
    pub upload_speed: i64,
    pub active_torrents: i64,
    pub paused_torrents: i64,
    pub total_torrents: i64,
    pub torrents: Vec<TorrentSummary>,
}

impl Snapshot {
    pub fn peers(&self) -> Vec<PeerSummary> {
        self.torrents
            .iter()
            .flat_map(|torrent| torrent.peers.iter().cloned())
            .collect()
    }

    pub fn trackers(&self) -> Vec<TrackerSummary> {
        self.torrents
            .iter()
            .flat_map(|torrent| torrent.trackers.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TorrentSummary {
    pub torrent_id: i64,
    pub name: String,
    pub status: String,
    pub error: Option<String>,
    pub download_dir: String,
    pub uploaded: i64,
    pub downloaded: i64,
    pub percent_done: f64,
    pub percent_metadata: f64,
    pub percent_verified: f64,
    pub size_when_done: i64,
    pub left_until_done: i64,
    pub peers_connected: i64,
    pub upload_ratio: f64,
    pub rate_download: i64,
    pub rate_upload: i64,
    /// Bytes per second, `None` when unlimited.
    pub limit_rate_up: Option<i64>,
    pub limit_rate_down: Option<i64>,
    pub eta: Option<i64>,
    pub time_created: i64,
    pub time_added: i64,
    pub time_started: i64,
    pub time_activity: i64,
    pub time_completed: i64,
    pub peers: Vec<PeerSummary>,
    pub trackers: Vec<TrackerSummary>,
}

impl TorrentSummary {
    /// Highest seed count any tracker reported.
    pub fn seeds(&self) -> i64 {
        self.trackers
            .iter()
            .map(|tracker| tracker.seeds)
            .max()
            .unwrap_or(0)
    }

    /// Domain of the first tracker, empty without trackers.
    pub fn tracker_domain(&self) -> &str {
        self.trackers
            .first()
            .map_or("", |tracker| tracker.domain.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeerSummary {
    pub torrent_id: i64,
    pub torrent_name: String,
    pub address: String,
    pub port: i64,
    pub client: String,
    pub progress: f64,
    pub rate_down: i64,
    pub rate_up: i64,
    /// Estimated download rate of the peer itself, if known.
    pub rate_est: Option<f64>,
    pub eta: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackerSummary {
    pub torrent_id: i64,
    pub torrent_name: String,
    pub tier: i64,
    pub announce: String,
    pub domain: String,
    pub status: String,
    pub error: Option<String>,
    pub downloads: i64,
    pub leeches: i64,
    pub seeds: i64,
    pub last_announce: i64,
    pub next_announce: i64,
    pub last_scrape: i64,
    pub next_scrape: i64,
}

/// One row of the settings listing, already rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingSummary {
    pub name: String,
    pub value: String,
    pub default: String,
    pub description: String,
    pub syntax: String,
}

/// Registered domain of an announce URL: `udp://tracker.example.org:80/announce`
/// gives `example.org`. Addresses and unparsable URLs come back unchanged.
pub fn announce_domain(announce: &str) -> String {
    let Some(host) = Url::parse(announce)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
    else {
        return announce.to_string();
    };
    let is_address = host.starts_with('[') || host.parse::<std::net::Ipv4Addr>().is_ok();
    if is_address {
        return host;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        host
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

pub fn format_rate(converter: &SharedConverter, bytes_per_second: i64) -> String {
    let shown = converter
        .convert_f64(bytes_per_second.max(0) as f64, Some("B"))
        .map_or_else(|_| bytes_per_second.to_string(), |number| number.with_unit());
    format!("{shown}/s")
}

pub fn format_size(converter: &SharedConverter, bytes: i64) -> String {
    converter
        .convert_f64(bytes.max(0) as f64, Some("B"))
        .map_or_else(|_| bytes.to_string(), |number| number.with_unit())
}

pub fn format_limit(converter: &SharedConverter, limit: Option<i64>) -> String {
    match limit {
        Some(limit) => format_rate(converter, limit),
        None => "unlimited".to_string(),
    }
}

pub fn format_progress(value: f64) -> String {
    format!("{:5.1}%", value * 100.0)
}

pub fn format_eta(seconds: Option<i64>) -> String {
    match seconds {
        None => "∞".to_string(),
        Some(raw) if raw < 0 => "∞".to_string(),
        Some(raw) => {
            let duration = Duration::from_secs(raw as u64);
            let days = duration.as_secs() / 86_400;
            let hours = (duration.as_secs() % 86_400) / 3_600;
            let minutes = (duration.as_secs() % 3_600) / 60;
            let seconds = duration.as_secs() % 60;
            if days > 0 {
                format!("{}d{}h", days, hours)
            } else if hours > 0 {
                format!("{}h{}m", hours, minutes)
            } else if minutes > 0 {
                format!("{}m", minutes)
            } else {
                format!("{}s", seconds)
            }
        }
    }
}

/// A torrent as one line of the `list` output.
pub fn torrent_line(torrent: &TorrentSummary, converters: &Converters) -> String {
    format!(
        "{:>4} {} {:>8} {:>10} {:>12} {:>12} {:<14} {}",
        torrent.torrent_id,
        format_progress(torrent.percent_done),
        format_eta(torrent.eta),
        format_size(&converters.size, torrent.size_when_done),
        format_rate(&converters.bandwidth, torrent.rate_download),
        format_rate(&converters.bandwidth, torrent.rate_upload),
        torrent.status,
        torrent.name
    )
}

pub fn peer_line(peer: &PeerSummary, converters: &Converters) -> String {
    format!(
        "{:<40} {:>5} {} {:>12} {:>12} {:<20} {}",
        peer.address,
        peer.port,
        format_progress(peer.progress),
        format_rate(&converters.bandwidth, peer.rate_down),
        format_rate(&converters.bandwidth, peer.rate_up),
        peer.client,
        peer.torrent_name
    )
}

pub fn tracker_line(tracker: &TrackerSummary) -> String {
    format!(
        "{:>2} {:<24} {:<10} {:>6} {:>6} {:>6} {}{}",
        tracker.tier,
        tracker.domain,
        tracker.status,
        tracker.seeds,
        tracker.leeches,
        tracker.downloads,
        tracker.torrent_name,
        tracker
            .error
            .as_deref()
            .map(|error| format!(" ({error})"))
            .unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usertypes::{DataUnit, Prefix, UnitConverter};

    #[test]
    fn rates_follow_the_converter() {
        let converter = SharedConverter::default();
        assert_eq!(format_rate(&converter, 1_500_000), "1.50MB/s");
        converter.set_unit("bit").unwrap();
        assert_eq!(format_rate(&converter, 1_500_000), "12Mb/s");
        let binary = SharedConverter::new(UnitConverter::new(DataUnit::Byte, Prefix::Binary));
        assert_eq!(format_size(&binary, 2048), "2KiB");
        assert_eq!(format_limit(&binary, None), "unlimited");
    }

    #[test]
    fn eta_rendering() {
        assert_eq!(format_eta(None), "∞");
        assert_eq!(format_eta(Some(-1)), "∞");
        assert_eq!(format_eta(Some(42)), "42s");
        assert_eq!(format_eta(Some(3_720)), "1h2m");
        assert_eq!(format_eta(Some(90_000)), "1d1h");
    }

    #[test]
    fn announce_domains() {
        assert_eq!(announce_domain("udp://tracker.example.org:80/announce"), "example.org");
        assert_eq!(announce_domain("https://example.org/announce"), "example.org");
        assert_eq!(announce_domain("http://10.0.0.1:6969/announce"), "10.0.0.1");
        assert_eq!(announce_domain("not a url"), "not a url");
    }

    #[test]
    fn seeds_take_the_best_tracker() {
        let torrent = TorrentSummary {
            trackers: vec![
                TrackerSummary {
                    seeds: 3,
                    domain: "a.org".into(),
                    ..Default::default()
                },
                TrackerSummary {
                    seeds: 9,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(torrent.seeds(), 9);
        assert_eq!(torrent.tracker_domain(), "a.org");
        assert_eq!(TorrentSummary::default().tracker_domain(), "");
    }
}
