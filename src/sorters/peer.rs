use once_cell::sync::Lazy;

use super::{KeyFn, SortOrders, SortSpec, SortTable};
use crate::model::PeerSummary;

fn spec(key: KeyFn<PeerSummary>, what: &str) -> SortSpec<PeerSummary> {
    SortSpec::new(key, format!("Sort peers by {what}"))
}

static TABLE: Lazy<SortTable<PeerSummary>> = Lazy::new(|| {
    SortTable::new(vec![
        ("torrent", spec(|p| p.torrent_name.to_lowercase().into(), "torrent name")),
        (
            "%downloaded",
            spec(|p| p.progress.into(), "download progress").aliases(&["%dn"]),
        ),
        (
            "rate-up",
            spec(|p| p.rate_up.into(), "upload rate (from our perspective)").aliases(&["rup"]),
        ),
        (
            "rate-down",
            spec(|p| p.rate_down.into(), "download rate (from our perspective)")
                .aliases(&["rdn"]),
        ),
        (
            "rate-est",
            spec(
                |p| p.rate_est.unwrap_or(0.0).into(),
                "estimated overall download rate",
            )
            .aliases(&["re"]),
        ),
        (
            "rate",
            spec(
                |p| (p.rate_up + p.rate_down).into(),
                "combined download and upload rate",
            )
            .aliases(&["r"]),
        ),
        (
            "eta",
            spec(
                |p| p.eta.map_or(f64::INFINITY, |eta| eta as f64).into(),
                "estimated remaining download time",
            ),
        ),
        (
            "client",
            spec(|p| p.client.to_lowercase().into(), "client name").aliases(&["cl"]),
        ),
        ("host", spec(|p| p.address.as_str().into(), "IP address")),
        ("port", spec(|p| p.port.into(), "port number")),
    ])
});

/// Sort orders for peer lists.
pub struct PeerSorting;

impl SortOrders for PeerSorting {
    type Item = PeerSummary;
    const DEFAULT_SORT: Option<&'static str> = Some("torrent");

    fn table() -> &'static SortTable<PeerSummary> {
        &TABLE
    }
}
