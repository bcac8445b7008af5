use once_cell::sync::Lazy;

use super::{KeyFn, SortOrders, SortSpec, SortTable};
use crate::model::TorrentSummary;

fn spec(key: KeyFn<TorrentSummary>, what: &str) -> SortSpec<TorrentSummary> {
    SortSpec::new(key, format!("Sort torrents by {what}"))
}

fn limit(limit: Option<i64>) -> f64 {
    limit.map_or(f64::INFINITY, |limit| limit as f64)
}

static TABLE: Lazy<SortTable<TorrentSummary>> = Lazy::new(|| {
    SortTable::new(vec![
        ("id", spec(|t| t.torrent_id.into(), "ID")),
        (
            "name",
            spec(|t| t.name.to_lowercase().into(), "name").aliases(&["n"]),
        ),
        (
            "path",
            spec(|t| t.download_dir.as_str().into(), "download location").aliases(&["dir"]),
        ),
        (
            "status",
            spec(
                |t| t.status.as_str().into(),
                "current status (idle, uploading, verifying, etc.)",
            )
            .aliases(&["st"]),
        ),
        (
            "error",
            spec(|t| t.error.clone().unwrap_or_default().into(), "error message")
                .aliases(&["err"]),
        ),
        (
            "uploaded",
            spec(|t| t.uploaded.into(), "number of uploaded bytes").aliases(&["up"]),
        ),
        (
            "downloaded",
            spec(|t| t.downloaded.into(), "number of downloaded bytes").aliases(&["dn"]),
        ),
        (
            "%downloaded",
            spec(
                |t| t.percent_done.into(),
                "downloading or verifying progress",
            )
            .then(|t| t.percent_metadata.into())
            .then(|t| t.percent_verified.into())
            .aliases(&["%dn"]),
        ),
        (
            "size",
            spec(|t| t.size_when_done.into(), "number of bytes of all wanted files")
                .aliases(&["sz"]),
        ),
        (
            "peers",
            spec(|t| t.peers_connected.into(), "connected peers").aliases(&["prs"]),
        ),
        (
            "seeds",
            spec(
                |t| t.seeds().into(),
                "highest number of seeds reported by any tracker",
            )
            .aliases(&["sds"]),
        ),
        (
            "ratio",
            spec(|t| t.upload_ratio.into(), "upload/download ratio").aliases(&["rto"]),
        ),
        (
            "rate-up",
            spec(|t| t.rate_upload.into(), "upload rate").aliases(&["rup"]),
        ),
        (
            "rate-down",
            spec(|t| t.rate_download.into(), "download rate").aliases(&["rdn"]),
        ),
        (
            "rate",
            spec(
                |t| (t.rate_upload + t.rate_download).into(),
                "combined download and upload rate",
            )
            .aliases(&["r"]),
        ),
        (
            "limit-rate-up",
            spec(|t| limit(t.limit_rate_up).into(), "upload rate limit").aliases(&["lrup"]),
        ),
        (
            "limit-rate-down",
            spec(|t| limit(t.limit_rate_down).into(), "download rate limit")
                .aliases(&["lrdn"]),
        ),
        (
            "limit-rate",
            spec(
                |t| (limit(t.limit_rate_up) + limit(t.limit_rate_down)).into(),
                "combined download and upload rate limit",
            )
            .aliases(&["lr"]),
        ),
        (
            "tracker",
            spec(|t| t.tracker_domain().into(), "domain of first tracker").aliases(&["trk"]),
        ),
        (
            "eta",
            spec(
                |t| t.eta.map_or(f64::INFINITY, |eta| eta as f64).into(),
                "estimated time to finish downloading",
            ),
        ),
        (
            "created",
            spec(|t| t.time_created.into(), "creation time").aliases(&["tcrt"]),
        ),
        (
            "added",
            spec(|t| t.time_added.into(), "time of addition").aliases(&["tadd"]),
        ),
        (
            "started",
            spec(|t| t.time_started.into(), "start time").aliases(&["tsta"]),
        ),
        (
            "activity",
            spec(
                |t| t.time_activity.into(),
                "time of latest upload/download activity",
            )
            .aliases(&["tact"]),
        ),
        (
            "completed",
            spec(|t| t.time_completed.into(), "time of completion").aliases(&["tcmp"]),
        ),
    ])
});

/// Sort orders for the torrent list.
pub struct TorrentSorting;

impl SortOrders for TorrentSorting {
    type Item = TorrentSummary;
    const DEFAULT_SORT: Option<&'static str> = Some("name");

    fn table() -> &'static SortTable<TorrentSummary> {
        &TABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::TrackerSummary, sorters::Sorter};

    fn torrent(id: i64, name: &str, rate_down: i64, rate_up: i64) -> TorrentSummary {
        TorrentSummary {
            torrent_id: id,
            name: name.to_string(),
            rate_download: rate_down,
            rate_upload: rate_up,
            ..Default::default()
        }
    }

    fn ids(sorter: &Sorter<TorrentSorting>, torrents: Vec<TorrentSummary>) -> Vec<i64> {
        sorter.apply(torrents).iter().map(|t| t.torrent_id).collect()
    }

    #[test]
    fn default_sort_is_name() {
        let torrents = vec![
            torrent(1, "Zebra", 0, 0),
            torrent(2, "apple", 0, 0),
            torrent(3, "Mango", 0, 0),
        ];
        let explicit = Sorter::<TorrentSorting>::new(["name"]).unwrap();
        let implicit = Sorter::<TorrentSorting>::default();
        assert_eq!(ids(&implicit, torrents.clone()), vec![2, 3, 1]);
        assert_eq!(ids(&explicit, torrents), vec![2, 3, 1]);
        assert_eq!(implicit.to_string(), "");
    }

    #[test]
    fn combined_rate_breaks_ties_by_name() {
        let torrents = vec![
            torrent(1, "b", 10, 5),
            torrent(2, "a", 15, 0),
            torrent(3, "c", 100, 0),
        ];
        let sorter = Sorter::<TorrentSorting>::new(["!rate"]).unwrap();
        assert_eq!(ids(&sorter, torrents), vec![3, 2, 1]);
    }

    #[test]
    fn unlimited_limits_sort_last() {
        let mut limited = torrent(1, "a", 0, 0);
        limited.limit_rate_down = Some(100_000);
        let unlimited = torrent(2, "b", 0, 0);
        let sorter = Sorter::<TorrentSorting>::new(["lrdn"]).unwrap();
        assert_eq!(ids(&sorter, vec![unlimited, limited]), vec![1, 2]);
    }

    #[test]
    fn tracker_sort_uses_first_domain() {
        let mut with_tracker = torrent(1, "a", 0, 0);
        with_tracker.trackers.push(TrackerSummary {
            domain: "example.org".into(),
            ..Default::default()
        });
        let without = torrent(2, "b", 0, 0);
        let sorter = Sorter::<TorrentSorting>::new(["trk"]).unwrap();
        assert_eq!(ids(&sorter, vec![with_tracker, without]), vec![2, 1]);
        assert_eq!(sorter.strings(), vec!["tracker".to_string()]);
    }

    #[test]
    fn every_order_has_a_description() {
        for (name, spec) in TorrentSorting::table().iter() {
            assert!(
                spec.description().starts_with("Sort torrents by "),
                "{name}"
            );
        }
        assert_eq!(TorrentSorting::table().iter().count(), 25);
    }
}
