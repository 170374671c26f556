//! Holder of the latest chart snapshot.
//!
//! Fetches run outside this crate. Each one takes a [`FetchTicket`] before it
//! starts; when it completes, its result is applied only if no newer fetch
//! for the same resource has been started since.

use crate::state::ChartState;
use hydro_model::SeriesKind;
use std::collections::HashMap;

/// A logical resource that can be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Parameter,
    /// Parameters the site offers.
    Parameters,
    Series(SeriesKind),
    Statistics,
    GroundwaterLevels,
    FloodLevels,
    /// Inundation stages and the latest gage height.
    FloodStages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub resource: Resource,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct ChartStore {
    state: ChartState,
    latest: HashMap<Resource, u64>,
    applied: HashMap<Resource, u64>,
    next_generation: u64,
}

impl ChartStore {
    pub fn new(state: ChartState) -> Self {
        ChartStore {
            state,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    /// Record the start of a fetch, superseding any in flight for `resource`.
    pub fn begin(&mut self, resource: Resource) -> FetchTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.latest.insert(resource, generation);
        log::debug!("fetch {:?} started as generation {}", resource, generation);
        FetchTicket {
            resource,
            generation,
        }
    }

    /// True while `ticket` is the newest fetch for its resource and has not been applied.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.latest.get(&ticket.resource) == Some(&ticket.generation)
            && self.applied.get(&ticket.resource) != Some(&ticket.generation)
    }

    /// Apply a finished fetch. Stale results are dropped and `false` is returned.
    pub fn complete<F>(&mut self, ticket: FetchTicket, apply: F) -> bool
    where
        F: FnOnce(&ChartState) -> ChartState,
    {
        if !self.is_current(&ticket) {
            log::info!(
                "discarding stale {:?} fetch (generation {})",
                ticket.resource,
                ticket.generation
            );
            return false;
        }
        self.state = apply(&self.state);
        self.applied.insert(ticket.resource, ticket.generation);
        true
    }

    /// Apply a UI change.
    pub fn update<F>(&mut self, apply: F)
    where
        F: FnOnce(&ChartState) -> ChartState,
    {
        self.state = apply(&self.state);
    }
}
