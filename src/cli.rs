use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    config::{AppConfig, Command, SortedList},
    model::{peer_line, torrent_line, tracker_line, Snapshot},
    preferences::session_values,
    rpc::TransmissionClient,
    settings::{defaults, rcfile, Settings},
    sorters::{
        PeerSorting, SettingSorting, SortOrders, Sorter, TorrentSorting, TrackerSorting,
    },
    usertypes::{Converters, Value, ValueError},
};

/// Local settings plus the daemon's, wired to `client` and `converters`.
pub fn build_settings(
    converters: &Converters,
    config: &AppConfig,
    client: Arc<TransmissionClient>,
) -> Result<Settings> {
    let mut settings = defaults::local_registry(converters, config.rpc.timeout)
        .context("failed to set up local settings")?;
    let timeout_client = client.clone();
    settings
        .local_mut("connect.timeout")?
        .on_change(move |value| {
            let Some(seconds) = value.get().and_then(Value::as_number) else {
                return Ok(());
            };
            let timeout = Duration::try_from_secs_f64(seconds.value())
                .map_err(|err| ValueError::invalid(err.to_string()))?;
            timeout_client.set_timeout(timeout);
            Ok(())
        });
    for remote in session_values(client, converters).context("failed to set up daemon settings")? {
        settings.add_remote(remote);
    }
    Ok(settings)
}

/// Sorter from `--sort`, or from the `sort.*` setting when none was given.
fn pick_sorter<S: SortOrders>(settings: &Settings, setting: &str, sort: &[String]) -> Result<Sorter<S>> {
    if sort.is_empty() {
        Ok(defaults::sorter(settings, setting)?)
    } else {
        Ok(Sorter::new(sort)?)
    }
}

/// One line per sort order: name, aliases and description.
pub fn describe_sort_orders<S: SortOrders>() -> Vec<String> {
    S::table()
        .iter()
        .map(|(name, spec)| {
            format!(
                "{name:<16} {:<10} {}",
                spec.alias_names().join(","),
                spec.description()
            )
        })
        .collect()
}

async fn fetch_snapshot(client: &Arc<TransmissionClient>) -> Result<Snapshot> {
    let client = client.clone();
    let snapshot = tokio::task::spawn_blocking(move || client.fetch_snapshot())
        .await?
        .context("failed to fetch torrents")?;
    debug!(
        "Transmission {} reports {} torrents",
        snapshot.version, snapshot.total_torrents
    );
    Ok(snapshot)
}

pub async fn run(command: Command, config: &AppConfig, client: Arc<TransmissionClient>) -> Result<()> {
    let converters = Converters::global();
    let mut settings = build_settings(&converters, config, client.clone())?;
    let applied = rcfile::load(
        &mut settings,
        config.rcfile.as_deref(),
        config.default_rcfile.clone(),
    )
    .await?;
    if applied > 0 {
        info!("Applied {applied} rc file commands");
    }

    match command {
        Command::List { sort } => {
            let sorter = pick_sorter::<TorrentSorting>(&settings, "sort.torrents", &sort)?;
            let snapshot = fetch_snapshot(&client).await?;
            for torrent in sorter.apply(snapshot.torrents) {
                println!("{}", torrent_line(&torrent, &converters));
            }
        }
        Command::Peers { sort } => {
            let sorter = pick_sorter::<PeerSorting>(&settings, "sort.peers", &sort)?;
            let snapshot = fetch_snapshot(&client).await?;
            for peer in sorter.apply(snapshot.peers()) {
                println!("{}", peer_line(&peer, &converters));
            }
        }
        Command::Trackers { sort } => {
            let sorter = pick_sorter::<TrackerSorting>(&settings, "sort.trackers", &sort)?;
            let snapshot = fetch_snapshot(&client).await?;
            for tracker in sorter.apply(snapshot.trackers()) {
                println!("{}", tracker_line(&tracker));
            }
        }
        Command::Settings { sort } => {
            let sorter = pick_sorter::<SettingSorting>(&settings, "sort.settings", &sort)?;
            let failed = settings.refresh_remote().await;
            if failed > 0 {
                info!("{failed} daemon settings are unavailable");
            }
            for summary in sorter.apply(settings.summaries()) {
                println!(
                    "{:<24} {:<24} {:<16} {}",
                    summary.name, summary.value, summary.default, summary.description
                );
            }
        }
        Command::Get { name } => {
            println!("{}", settings.fetch(&name).await?);
        }
        Command::Set { name, value } => {
            let raw = value.join(" ");
            settings.set(&name, &raw).await?;
            println!("{name} = {}", settings.get(&name)?.string());
        }
        Command::SortOrders { list } => {
            let lines = match list {
                SortedList::Torrents => describe_sort_orders::<TorrentSorting>(),
                SortedList::Peers => describe_sort_orders::<PeerSorting>(),
                SortedList::Trackers => describe_sort_orders::<TrackerSorting>(),
                SortedList::Settings => describe_sort_orders::<SettingSorting>(),
            };
            for line in lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}
