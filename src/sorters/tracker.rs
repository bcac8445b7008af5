use once_cell::sync::Lazy;

use super::{KeyFn, SortOrders, SortSpec, SortTable};
use crate::model::TrackerSummary;

fn spec(key: KeyFn<TrackerSummary>, what: &str) -> SortSpec<TrackerSummary> {
    SortSpec::new(key, format!("Sort trackers by {what}"))
}

static TABLE: Lazy<SortTable<TrackerSummary>> = Lazy::new(|| {
    SortTable::new(vec![
        ("torrent", spec(|t| t.torrent_name.to_lowercase().into(), "torrent name")),
        ("tier", spec(|t| t.tier.into(), "tier number")),
        (
            "domain",
            spec(|t| t.domain.as_str().into(), "domain from announce URL").aliases(&["dom"]),
        ),
        (
            "status",
            spec(|t| t.status.as_str().into(), "tracker status").aliases(&["st"]),
        ),
        (
            "error",
            spec(|t| t.error.clone().unwrap_or_default().into(), "error message")
                .aliases(&["err"]),
        ),
        (
            "downloads",
            spec(|t| t.downloads.into(), "number of known downloads").aliases(&["dns"]),
        ),
        (
            "leeches",
            spec(|t| t.leeches.into(), "number of known downloading peers").aliases(&["lcs"]),
        ),
        (
            "seeds",
            spec(|t| t.seeds.into(), "number of known seeding peers").aliases(&["sds"]),
        ),
        (
            "last-announce",
            spec(
                |t| t.last_announce.into(),
                "last time the torrent was successfully announced",
            )
            .aliases(&["lan"]),
        ),
        (
            "next-announce",
            spec(|t| t.next_announce.into(), "next time the torrent is announced")
                .aliases(&["nan"]),
        ),
        (
            "last-scrape",
            spec(
                |t| t.last_scrape.into(),
                "last time the torrent was successfully scraped",
            )
            .aliases(&["lsc"]),
        ),
        (
            "next-scrape",
            spec(|t| t.next_scrape.into(), "next time the torrent is scraped").aliases(&["nsc"]),
        ),
    ])
});

/// Sort orders for tracker lists.
pub struct TrackerSorting;

impl SortOrders for TrackerSorting {
    type Item = TrackerSummary;
    const DEFAULT_SORT: Option<&'static str> = Some("domain");

    fn table() -> &'static SortTable<TrackerSummary> {
        &TABLE
    }
}
