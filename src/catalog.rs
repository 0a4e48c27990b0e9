// Static commodity catalog and the canonical artifact key scheme.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a catalog entry, e.g. `ble-tendre`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommodityId(String);

impl CommodityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommodityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommodityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    pub id: CommodityId,
    pub name: String,
    pub emoji: String,
}

impl Commodity {
    pub fn new(id: &str, name: &str, emoji: &str) -> Self {
        Self {
            id: CommodityId::new(id),
            name: name.to_string(),
            emoji: emoji.to_string(),
        }
    }
}

/// Canonical URL of one commodity's podcast.
///
/// The same key identifies the artifact in the local store, on the network
/// and in the session audio map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// `{base_url}/podcast_{id}.mp3`. Trailing slashes on `base_url` are ignored.
    pub fn for_commodity(base_url: &str, id: &CommodityId) -> Self {
        Self(format!(
            "{}/podcast_{}.mp3",
            base_url.trim_end_matches('/'),
            id.as_str()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable, ordered list of commodities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<Commodity>,
}

impl Catalog {
    pub fn new(items: Vec<Commodity>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Commodity> {
        self.items.iter()
    }

    pub fn get(&self, id: &CommodityId) -> Option<&Commodity> {
        self.items.iter().find(|c| &c.id == id)
    }

    pub fn ids(&self) -> Vec<CommodityId> {
        self.items.iter().map(|c| c.id.clone()).collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            Commodity::new("ble-tendre", "Blé Tendre", "🌾"),
            Commodity::new("sucre", "Sucre", "🍭"),
            Commodity::new("cacao", "Cacao", "🍫"),
            Commodity::new("beurre", "Beurre", "🧈"),
            Commodity::new("lait", "Lait", "🥛"),
            Commodity::new("oeufs", "Œufs", "🥚"),
            Commodity::new("huile-tournesol", "Huile de Tournesol", "🌻"),
            Commodity::new("huile-colza", "Huile de Colza", "🌱"),
            Commodity::new("huile-palme", "Huile de Palme", "🌴"),
            Commodity::new("amandes", "Amandes", "🌰"),
            Commodity::new("noisettes", "Noisettes", "🌰"),
            Commodity::new("noix", "Noix", "🌰"),
            Commodity::new("raisins-secs", "Raisins Secs", "🍇"),
            Commodity::new("vanille", "Vanille", "🍦"),
            Commodity::new("cafe", "Café", "☕"),
            Commodity::new("miel", "Miel", "🍯"),
            Commodity::new("seigle", "Seigle", "🌾"),
            Commodity::new("avoine", "Avoine", "🥣"),
            Commodity::new("mais", "Maïs (Amidon)", "🌽"),
            Commodity::new("graines-sesame", "Graines de Sésame", "🌱"),
        ])
    }
}
