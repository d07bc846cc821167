use gwplan_core::lineup::Lineup;
use gwplan_core::model::{Chip, Price, Squad, SquadFingerprint};
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::context::PlanningContext;
use crate::error::SolveError;

/// Lineups keyed by gameweek index and squad fingerprint, scoped to one solve.
///
/// Lineups are stored under normal scoring; chip totals come from
/// [`Lineup::rescored`].
#[derive(Debug, Default)]
pub struct LineupMemo {
    lineups: HashMap<(usize, SquadFingerprint), Lineup>,
    rebuilds: HashMap<RebuildKey, Option<(Squad, Price)>>,
    hits: usize,
    misses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RebuildKey {
    pub idx: usize,
    pub chip: Chip,
    pub fingerprint: SquadFingerprint,
    pub bank: Price,
}

impl LineupMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, idx: usize, fingerprint: SquadFingerprint) -> Option<&Lineup> {
        self.lineups.get(&(idx, fingerprint))
    }

    /// Compute lineups for every squad not already cached. Squads are scored
    /// across the rayon pool when `parallel` is set; the cache itself is only
    /// written from the calling thread.
    pub fn fill<'s, I>(
        &mut self,
        ctx: &PlanningContext<'_>,
        idx: usize,
        squads: I,
        parallel: bool,
    ) -> Result<(), SolveError>
    where
        I: IntoIterator<Item = &'s Squad>,
    {
        let mut seen = HashSet::new();
        let mut missing: Vec<&Squad> = Vec::new();
        for squad in squads {
            let fingerprint = squad.fingerprint();
            if self.lineups.contains_key(&(idx, fingerprint)) {
                self.hits += 1;
            } else if seen.insert(fingerprint) {
                self.misses += 1;
                missing.push(squad);
            } else {
                self.hits += 1;
            }
        }

        let computed: Vec<(SquadFingerprint, Lineup)> = if parallel && missing.len() > 1 {
            missing
                .par_iter()
                .map(|squad| Ok((squad.fingerprint(), ctx.lineup(idx, squad)?)))
                .collect::<Result<_, SolveError>>()?
        } else {
            missing
                .iter()
                .map(|squad| Ok((squad.fingerprint(), ctx.lineup(idx, squad)?)))
                .collect::<Result<_, SolveError>>()?
        };
        for (fingerprint, lineup) in computed {
            self.lineups.insert((idx, fingerprint), lineup);
        }
        Ok(())
    }

    /// Cached lineup, computing it on a miss.
    pub fn lineup(
        &mut self,
        ctx: &PlanningContext<'_>,
        idx: usize,
        squad: &Squad,
    ) -> Result<&Lineup, SolveError> {
        match self.lineups.entry((idx, squad.fingerprint())) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                Ok(entry.insert(ctx.lineup(idx, squad)?))
            }
        }
    }

    pub fn rebuild<F>(&mut self, key: RebuildKey, build: F) -> Option<(Squad, Price)>
    where
        F: FnOnce() -> Option<(Squad, Price)>,
    {
        if let Some(cached) = self.rebuilds.get(&key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        let rebuilt = build();
        self.rebuilds.insert(key, rebuilt.clone());
        rebuilt
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.lineups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lineups.is_empty()
    }
}
