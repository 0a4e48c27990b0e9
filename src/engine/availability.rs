// Per-commodity availability states and their allowed transitions.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, CommodityId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum AvailabilityState {
    /// Not examined yet.
    #[default]
    Unknown,
    /// Neither in the store nor reachable remotely.
    Absent,
    /// Not in the store, but the remote probe succeeded.
    RemoteAvailable,
    /// Present in the local store.
    Cached,
    /// Produced by a generation run in this session.
    SessionGenerated,
}

impl AvailabilityState {
    /// Whether the commodity counts towards completion progress.
    pub fn is_available(self) -> bool {
        matches!(
            self,
            Self::RemoteAvailable | Self::Cached | Self::SessionGenerated
        )
    }

    /// `Cached` and `SessionGenerated` never change again within a session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cached | Self::SessionGenerated)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Unknown, Self::Unknown) => false,
            (Self::Unknown, _) => true,
            (Self::Absent | Self::RemoteAvailable, Self::SessionGenerated) => true,
            _ => false,
        }
    }
}

/// `round(done / total * 100)`, 0 for an empty total.
pub fn completion_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = done.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

#[derive(Debug, Clone, Default)]
pub struct AvailabilityTable {
    order: Vec<CommodityId>,
    states: HashMap<CommodityId, AvailabilityState>,
}

impl AvailabilityTable {
    /// Every catalog entry starts `Unknown`.
    pub fn new(catalog: &Catalog) -> Self {
        let order = catalog.ids();
        let states = order
            .iter()
            .map(|id| (id.clone(), AvailabilityState::Unknown))
            .collect();
        Self { order, states }
    }

    pub fn get(&self, id: &CommodityId) -> AvailabilityState {
        self.states.get(id).copied().unwrap_or_default()
    }

    /// Apply `next` if the transition is allowed. Returns whether the state changed.
    pub fn transition(&mut self, id: &CommodityId, next: AvailabilityState) -> bool {
        let Some(current) = self.states.get_mut(id) else {
            debug!("availability update for unknown commodity {}", id);
            return false;
        };
        if !current.can_transition_to(next) {
            debug!(
                "availability transition rejected id={} from={:?} to={:?}",
                id, current, next
            );
            return false;
        }
        *current = next;
        true
    }

    pub fn available_count(&self) -> usize {
        self.states.values().filter(|s| s.is_available()).count()
    }

    pub fn progress(&self) -> u8 {
        completion_percent(self.available_count(), self.order.len())
    }

    /// States in catalog order.
    pub fn entries(&self) -> Vec<(CommodityId, AvailabilityState)> {
        self.order
            .iter()
            .map(|id| (id.clone(), self.get(id)))
            .collect()
    }
}
