//! # Remote Collection Module
//!
//! Enumerazione dello stato remoto e join con gli asset locali.
//!
//! ## Responsabilità:
//! - Percorre localization → device set → asset per un kind
//! - Fetch concorrente su al massimo N localization alla volta
//! - Associa gli asset locali (per lingua) ai device set remoti,
//!   creando i set mancanti
//!
//! ## Ordine:
//! - All'interno di una localization l'ordine remoto è preservato
//! - Tra localization diverse l'ordine non è garantito
//!
//! ## Esempio:
//! ```ignore
//! let collection = RemoteCollection::new(store, AssetKind::Screenshot, localizations, 4);
//! let mut assets = collection.assets();
//! while let Some((localization, set, asset)) = assets.try_next().await? {
//!     debug!("{} {} {}", localization.locale, set.display_type, asset.state);
//! }
//! ```

use crate::device::AssetKind;
use crate::media::LocalAsset;
use crate::remote::{AssetStore, DeviceSet, Localization, RemoteAsset, RemoteDeviceSet};
use anyhow::Result;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A local asset assigned to its remote device set
#[derive(Debug, Clone)]
pub struct Placement {
    pub localization: Localization,
    pub set: RemoteDeviceSet,
    pub asset: LocalAsset,
    /// Position in file-name order within the device set
    pub index: usize,
}

/// Remote device sets and assets of one kind, over a group of localizations
pub struct RemoteCollection<S> {
    store: Arc<S>,
    kind: AssetKind,
    localizations: Vec<Localization>,
    concurrency: usize,
}

impl<S> RemoteCollection<S>
where
    S: AssetStore + 'static,
{
    pub fn new(store: Arc<S>, kind: AssetKind, localizations: Vec<Localization>, concurrency: usize) -> Self {
        Self {
            store,
            kind,
            localizations,
            concurrency: concurrency.max(1),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Device set con i loro asset, per tutte le localization
    pub fn device_sets(&self) -> impl Stream<Item = Result<(Localization, RemoteDeviceSet)>> + '_ {
        stream::iter(self.localizations.iter().cloned())
            .map(move |localization| async move {
                let sets = self.fetch_sets_for(&localization).await?;
                Ok::<_, anyhow::Error>(
                    sets.into_iter()
                        .map(|set| (localization.clone(), set))
                        .collect::<Vec<_>>(),
                )
            })
            .buffer_unordered(self.concurrency)
            .map_ok(|pairs| stream::iter(pairs.into_iter().map(Ok::<_, anyhow::Error>)))
            .try_flatten()
    }

    /// Ogni asset remoto con la sua localization e il suo device set
    pub fn assets(&self) -> impl Stream<Item = Result<(Localization, DeviceSet, RemoteAsset)>> + '_ {
        self.device_sets()
            .map_ok(|(localization, remote_set)| {
                let RemoteDeviceSet { set, assets } = remote_set;
                stream::iter(
                    assets
                        .into_iter()
                        .map(move |asset| Ok::<_, anyhow::Error>((localization.clone(), set.clone(), asset))),
                )
            })
            .try_flatten()
    }

    pub async fn collect_device_sets(&self) -> Result<Vec<(Localization, RemoteDeviceSet)>> {
        self.device_sets().try_collect().await
    }

    pub async fn collect_assets(&self) -> Result<Vec<(Localization, DeviceSet, RemoteAsset)>> {
        self.assets().try_collect().await
    }

    /// Associa gli asset locali ai device set remoti.
    ///
    /// Lingue senza localization remota vengono ignorate; i device set
    /// mancanti vengono creati. Dentro ogni gruppo l'ordine è per nome file.
    pub async fn local_placements(
        &self,
        assets_by_language: &BTreeMap<String, Vec<LocalAsset>>,
    ) -> Result<Vec<Placement>> {
        let mut placements = Vec::new();

        for (language, assets) in assets_by_language {
            let Some(localization) = self.localizations.iter().find(|l| &l.locale == language) else {
                debug!("No remote localization for {}, skipping", language);
                continue;
            };

            let mut existing: HashMap<String, RemoteDeviceSet> = self
                .fetch_sets_for(localization)
                .await?
                .into_iter()
                .map(|remote_set| (remote_set.set.display_type.clone(), remote_set))
                .collect();

            let mut groups: BTreeMap<&'static str, Vec<&LocalAsset>> = BTreeMap::new();
            for asset in assets.iter().filter(|asset| asset.kind == self.kind) {
                if let Some(display_type) = asset.display_type() {
                    groups.entry(display_type).or_default().push(asset);
                }
            }

            for (display_type, mut group) in groups {
                group.sort_by_key(|asset| asset.file_name());

                let remote_set = match existing.remove(display_type) {
                    Some(remote_set) => remote_set,
                    None => {
                        let set = self
                            .store
                            .create_device_set(localization, self.kind, display_type)
                            .await?;
                        RemoteDeviceSet { set, assets: Vec::new() }
                    }
                };

                for (index, asset) in group.into_iter().enumerate() {
                    placements.push(Placement {
                        localization: localization.clone(),
                        set: remote_set.clone(),
                        asset: asset.clone(),
                        index,
                    });
                }
            }
        }

        Ok(placements)
    }

    async fn fetch_sets_for(&self, localization: &Localization) -> Result<Vec<RemoteDeviceSet>> {
        let sets = self.store.fetch_device_sets(localization, self.kind).await?;
        let mut remote_sets = Vec::with_capacity(sets.len());
        for set in sets {
            let assets = self.store.fetch_assets(&set).await?;
            remote_sets.push(RemoteDeviceSet { set, assets });
        }
        Ok(remote_sets)
    }
}
