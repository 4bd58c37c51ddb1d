//! Persistence: the `MatchStore` trait the engine writes through, and an
//! in-memory implementation.

use crate::models::{GameMatch, MatchGraph, MatchPatch, Tournament, TournamentError, TournamentId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Change applied to a tournament under the store's write lock. It sees the
/// match graph with the batch already applied and may return further patches,
/// which are committed with the batch.
pub type TournamentUpdate<'a> =
    dyn FnMut(&mut Tournament, &MatchGraph) -> Result<Vec<MatchPatch>, TournamentError> + 'a;

/// Storage for tournaments and their matches, keyed by tournament id + match id.
///
/// `commit` must be atomic: either every patch's guards hold, the update
/// succeeds and everything is written, or nothing is written. Tournament
/// metadata is only ever changed through it, so concurrent writers never
/// overwrite each other's fields.
pub trait MatchStore: Send + Sync {
    fn create_tournament(&self, tournament: Tournament, matches: Vec<GameMatch>) -> Result<(), TournamentError>;

    fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, TournamentError>;

    fn get_matches(&self, id: TournamentId) -> Result<Vec<GameMatch>, TournamentError>;

    fn get_match(&self, id: TournamentId, match_id: &str) -> Result<Option<GameMatch>, TournamentError>;

    /// Apply `patches`, then `update`, as one write. Returns the stored tournament.
    fn commit(
        &self,
        id: TournamentId,
        patches: &[MatchPatch],
        update: &mut TournamentUpdate<'_>,
    ) -> Result<Tournament, TournamentError>;

    fn update_tournament(
        &self,
        id: TournamentId,
        update: &mut dyn FnMut(&mut Tournament) -> Result<(), TournamentError>,
    ) -> Result<Tournament, TournamentError> {
        self.commit(id, &[], &mut |t, _| update(t).map(|()| Vec::new()))
    }

    fn update_match(&self, id: TournamentId, patch: MatchPatch) -> Result<(), TournamentError> {
        self.batch_update(id, &[patch])
    }

    fn batch_update(&self, id: TournamentId, patches: &[MatchPatch]) -> Result<(), TournamentError> {
        self.commit(id, patches, &mut |_, _| Ok(Vec::new())).map(|_| ())
    }
}

/// Per-tournament entry: metadata + match graph.
struct TournamentEntry {
    tournament: Tournament,
    graph: MatchGraph,
}

/// Process-local store. Guards are checked and patches applied under one write lock.
#[derive(Default)]
pub struct InMemoryStore {
    tournaments: RwLock<HashMap<TournamentId, TournamentEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<TournamentId, TournamentEntry>>, TournamentError> {
        self.tournaments
            .read()
            .map_err(|_| TournamentError::Storage("lock error".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<TournamentId, TournamentEntry>>, TournamentError> {
        self.tournaments
            .write()
            .map_err(|_| TournamentError::Storage("lock error".to_string()))
    }

    /// Ids of every stored tournament, oldest first.
    pub fn tournament_ids(&self) -> Result<Vec<TournamentId>, TournamentError> {
        let g = self.read()?;
        let mut entries: Vec<_> = g.values().map(|e| (e.tournament.created_at, e.tournament.id)).collect();
        entries.sort();
        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }
}

impl MatchStore for InMemoryStore {
    fn create_tournament(&self, tournament: Tournament, matches: Vec<GameMatch>) -> Result<(), TournamentError> {
        let mut g = self.write()?;
        if g.contains_key(&tournament.id) {
            return Err(TournamentError::InvalidState);
        }
        g.insert(
            tournament.id,
            TournamentEntry {
                tournament,
                graph: MatchGraph::new(matches),
            },
        );
        Ok(())
    }

    fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, TournamentError> {
        Ok(self.read()?.get(&id).map(|e| e.tournament.clone()))
    }

    fn get_matches(&self, id: TournamentId) -> Result<Vec<GameMatch>, TournamentError> {
        let g = self.read()?;
        let entry = g.get(&id).ok_or(TournamentError::TournamentNotFound(id))?;
        Ok(entry.graph.matches().to_vec())
    }

    fn get_match(&self, id: TournamentId, match_id: &str) -> Result<Option<GameMatch>, TournamentError> {
        let g = self.read()?;
        let entry = g.get(&id).ok_or(TournamentError::TournamentNotFound(id))?;
        Ok(entry.graph.get(match_id).cloned())
    }

    fn commit(
        &self,
        id: TournamentId,
        patches: &[MatchPatch],
        update: &mut TournamentUpdate<'_>,
    ) -> Result<Tournament, TournamentError> {
        let mut g = self.write()?;
        let entry = g.get_mut(&id).ok_or(TournamentError::TournamentNotFound(id))?;

        let mut graph = entry.graph.clone();
        graph.apply_all(patches)?;
        let mut tournament = entry.tournament.clone();
        let follow_up = update(&mut tournament, &graph)?;
        graph.apply_all(&follow_up)?;

        entry.graph = graph;
        entry.tournament = tournament.clone();
        Ok(tournament)
    }
}
