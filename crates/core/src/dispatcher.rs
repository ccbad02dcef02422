//! Central dispatcher
//!
//! Aggregates fire sightings reported by scouts, ages them out, hands the
//! nearest unclaimed burning target to each firefighter that asks, and
//! scales the firefighter pool with the size of the fire.
//!
//! The dispatcher itself is single-threaded state; the simulation keeps it
//! behind one mutex so that reports and assignment requests from different
//! agents are serialized and an assignment decision is recorded atomically
//! with the choice that produced it.

use crate::config::SimulationConfig;
use crate::core_types::{AgentId, GridPos, SimMillis};
use crate::grid::IntensityGrid;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A scout's observation of a burning cell
///
/// Never mutated after creation; two sightings of the same cell are the same
/// target regardless of when or by whom they were made.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireSighting {
    pub pos: GridPos,
    pub intensity: f32,
    pub discovered_at: SimMillis,
}

impl FireSighting {
    pub fn new(pos: GridPos, intensity: f32, discovered_at: SimMillis) -> Self {
        Self {
            pos,
            intensity,
            discovered_at,
        }
    }
}

/// Sightings per reporting agent plus the last time each cell was confirmed
#[derive(Debug, Default)]
pub struct ReportLedger {
    reports: FxHashMap<AgentId, Vec<FireSighting>>,
    confirmed: FxHashMap<GridPos, SimMillis>,
}

impl ReportLedger {
    /// Replace `agent`'s sightings and stamp each cell as confirmed at `now`
    pub fn replace(&mut self, agent: AgentId, sightings: Vec<FireSighting>, now: SimMillis) {
        for sighting in &sightings {
            self.confirmed.insert(sighting.pos, now);
        }
        self.reports.insert(agent, sightings);
    }

    /// Drop confirmations at least `window` old and sightings that are
    /// unconfirmed or no longer burning; returns the purged cells
    pub fn purge(
        &mut self,
        now: SimMillis,
        window: SimMillis,
        grid: &IntensityGrid,
        threshold: f32,
    ) -> Vec<GridPos> {
        let mut purged: Vec<GridPos> = Vec::new();
        self.confirmed.retain(|pos, confirmed_at| {
            let fresh = now.saturating_sub(*confirmed_at) < window && grid.intensity(*pos) > threshold;
            if !fresh {
                purged.push(*pos);
            }
            fresh
        });
        let confirmed = &self.confirmed;
        for sightings in self.reports.values_mut() {
            sightings.retain(|s| confirmed.contains_key(&s.pos));
        }
        self.reports.retain(|_, sightings| !sightings.is_empty());
        purged.sort();
        purged
    }

    /// Whether `pos` has an unexpired confirmation
    pub fn is_confirmed(&self, pos: GridPos) -> bool {
        self.confirmed.contains_key(&pos)
    }

    /// Time `pos` was last confirmed
    pub fn confirmed_at(&self, pos: GridPos) -> Option<SimMillis> {
        self.confirmed.get(&pos).copied()
    }

    /// Sightings currently held for `agent`
    pub fn reports_from(&self, agent: AgentId) -> &[FireSighting] {
        self.reports.get(&agent).map_or(&[], Vec::as_slice)
    }

    /// Aggregated view: one sighting per cell (the most intense), in scan order
    pub fn aggregate(&self) -> BTreeMap<GridPos, FireSighting> {
        let mut known: BTreeMap<GridPos, FireSighting> = BTreeMap::new();
        for sighting in self.reports.values().flatten() {
            known
                .entry(sighting.pos)
                .and_modify(|existing| {
                    if sighting.intensity > existing.intensity {
                        *existing = *sighting;
                    }
                })
                .or_insert(*sighting);
        }
        known
    }

    /// Number of distinct confirmed cells
    pub fn len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty()
    }

    pub fn clear(&mut self) {
        self.reports.clear();
        self.confirmed.clear();
    }
}

/// Report aggregation, target assignment and pool scaling
#[derive(Debug)]
pub struct Dispatcher {
    threshold: f32,
    report_expiration_ms: SimMillis,
    burning_cells_per_firefighter: usize,
    max_firefighters: usize,
    ledger: ReportLedger,
    known: BTreeMap<GridPos, FireSighting>,
    assignments: BTreeMap<GridPos, AgentId>,
    global_map: IntensityGrid,
    next_agent_id: AgentId,
}

impl Dispatcher {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            threshold: config.scenario.intensity_threshold,
            report_expiration_ms: config.timers.report_expiration_ms,
            burning_cells_per_firefighter: config.pool.burning_cells_per_firefighter.max(1),
            max_firefighters: config.max_firefighters(),
            ledger: ReportLedger::default(),
            known: BTreeMap::new(),
            assignments: BTreeMap::new(),
            global_map: IntensityGrid::new(config.width, config.height),
            next_agent_id: config.pool.initial_scouts as AgentId,
        }
    }

    /// Accept a batch of sightings from `agent`, replacing its previous batch
    pub fn receive_report(
        &mut self,
        agent: AgentId,
        sightings: Vec<FireSighting>,
        now: SimMillis,
        grid: &IntensityGrid,
    ) {
        debug!(
            "Agent {} reported {} sightings at t={}ms",
            agent,
            sightings.len(),
            now
        );
        for sighting in &sightings {
            self.global_map.set(sighting.pos, sighting.intensity);
        }
        self.ledger.replace(agent, sightings, now);
        self.known = self.ledger.aggregate();
        self.cleanup(now, grid);
    }

    /// Purge expired or extinguished sightings and revoke their assignments
    pub fn cleanup(&mut self, now: SimMillis, grid: &IntensityGrid) {
        let purged = self
            .ledger
            .purge(now, self.report_expiration_ms, grid, self.threshold);
        if !purged.is_empty() {
            for pos in &purged {
                self.global_map.set(*pos, 0.0);
            }
            self.known = self.ledger.aggregate();
            debug!("Purged {} stale sightings", purged.len());
        }

        let ledger = &self.ledger;
        let threshold = self.threshold;
        self.assignments.retain(|pos, firefighter| {
            let keep = ledger.is_confirmed(*pos) && grid.intensity(*pos) > threshold;
            if !keep {
                debug!("Revoked assignment of {} from firefighter {}", pos, firefighter);
            }
            keep
        });
    }

    /// Assign the nearest unclaimed burning sighting to `firefighter`
    ///
    /// Any target the firefighter already held is released first. Ties go to
    /// the first candidate in scan order. Returns `None` when nothing is left.
    pub fn request_assignment(
        &mut self,
        firefighter: AgentId,
        from: GridPos,
        now: SimMillis,
        grid: &IntensityGrid,
    ) -> Option<GridPos> {
        self.cleanup(now, grid);
        self.release_assignment(firefighter);

        let mut best: Option<(GridPos, f32)> = None;
        for pos in self.known.keys() {
            if self.assignments.contains_key(pos) || grid.intensity(*pos) <= self.threshold {
                continue;
            }
            let distance = from.distance(*pos);
            if best.is_some_and(|(_, d)| distance >= d) {
                continue;
            }
            best = Some((*pos, distance));
        }

        let (target, distance) = best?;
        self.assignments.insert(target, firefighter);
        debug!(
            "Assigned {} to firefighter {} (distance {:.1})",
            target, firefighter, distance
        );
        Some(target)
    }

    /// Drop whatever target `firefighter` holds
    pub fn release_assignment(&mut self, firefighter: AgentId) {
        self.assignments.retain(|_, id| *id != firefighter);
    }

    /// Target currently held by `firefighter`
    pub fn assignment_of(&self, firefighter: AgentId) -> Option<GridPos> {
        self.assignments
            .iter()
            .find_map(|(pos, id)| (*id == firefighter).then_some(*pos))
    }

    /// All current assignments, in scan order
    pub fn assignments(&self) -> impl Iterator<Item = (GridPos, AgentId)> + '_ {
        self.assignments.iter().map(|(pos, id)| (*pos, *id))
    }

    /// Firefighters needed for `burning_cells`: `ceil(burning / K)`, capped by the pool
    pub fn required_firefighters(&self, burning_cells: usize) -> usize {
        burning_cells
            .div_ceil(self.burning_cells_per_firefighter)
            .min(self.max_firefighters)
    }

    /// Allocate the id of one new firefighter if the pool is below target
    ///
    /// At most one firefighter is added per call, however large the deficit.
    pub fn maybe_spawn_firefighter(
        &mut self,
        burning_cells: usize,
        live_firefighters: usize,
    ) -> Option<AgentId> {
        let required = self.required_firefighters(burning_cells);
        if live_firefighters >= required {
            return None;
        }
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        info!(
            "Spawning firefighter {} ({} burning cells, {}/{} firefighters)",
            id,
            burning_cells,
            live_firefighters + 1,
            required
        );
        Some(id)
    }

    /// Aggregated known burning cells, in scan order
    pub fn known_sightings(&self) -> Vec<FireSighting> {
        self.known.values().copied().collect()
    }

    /// Whether `pos` is currently known to be burning
    pub fn is_known(&self, pos: GridPos) -> bool {
        self.known.contains_key(&pos)
    }

    /// Intensities from received reports, shared with agents at headquarters
    pub fn global_map(&self) -> &IntensityGrid {
        &self.global_map
    }

    pub fn ledger(&self) -> &ReportLedger {
        &self.ledger
    }
}
