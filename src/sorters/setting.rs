use once_cell::sync::Lazy;

use super::{KeyFn, SortOrders, SortSpec, SortTable};
use crate::model::SettingSummary;

fn spec(key: KeyFn<SettingSummary>, what: &str) -> SortSpec<SettingSummary> {
    SortSpec::new(key, format!("Sort settings by {what}"))
}

// values are compared as rendered, their types differ
static TABLE: Lazy<SortTable<SettingSummary>> = Lazy::new(|| {
    SortTable::new(vec![
        ("name", spec(|s| s.name.as_str().into(), "name")),
        ("value", spec(|s| s.value.as_str().into(), "value")),
        ("default", spec(|s| s.default.as_str().into(), "default")),
        ("description", spec(|s| s.description.as_str().into(), "description")),
    ])
});

/// Sort orders for the settings listing.
pub struct SettingSorting;

impl SortOrders for SettingSorting {
    type Item = SettingSummary;
    const DEFAULT_SORT: Option<&'static str> = Some("name");

    fn table() -> &'static SortTable<SettingSummary> {
        &TABLE
    }
}
