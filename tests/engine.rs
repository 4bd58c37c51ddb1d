//! Integration tests for the store-backed engine: lifecycle, guarded writes,
//! concurrent submissions and team edits.

use esports_bracket_web::{
    engine, shuffle_teams, standings_csv, submit_result, BracketConfig, Entrant, GameMatch,
    InMemoryStore, MatchPatch, MatchStore, PatchGuard, ResultSubmission, Slot, Team, TeamEntry,
    Tournament, TournamentError, TournamentId, TournamentStatus, TournamentUpdate,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Mutex;
use uuid::Uuid;

type Interleaved = Box<dyn FnOnce(&InMemoryStore) + Send>;

/// Runs one extra operation against the inner store right before the next commit,
/// as if another request got there between our read and our write.
#[derive(Default)]
struct InterleavingStore {
    inner: InMemoryStore,
    before_commit: Mutex<Option<Interleaved>>,
}

impl InterleavingStore {
    fn before_next_commit(&self, op: impl FnOnce(&InMemoryStore) + Send + 'static) {
        *self.before_commit.lock().unwrap() = Some(Box::new(op));
    }
}

impl MatchStore for InterleavingStore {
    fn create_tournament(&self, tournament: Tournament, matches: Vec<GameMatch>) -> Result<(), TournamentError> {
        self.inner.create_tournament(tournament, matches)
    }

    fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, TournamentError> {
        self.inner.get_tournament(id)
    }

    fn get_matches(&self, id: TournamentId) -> Result<Vec<GameMatch>, TournamentError> {
        self.inner.get_matches(id)
    }

    fn get_match(&self, id: TournamentId, match_id: &str) -> Result<Option<GameMatch>, TournamentError> {
        self.inner.get_match(id, match_id)
    }

    fn commit(
        &self,
        id: TournamentId,
        patches: &[MatchPatch],
        update: &mut TournamentUpdate<'_>,
    ) -> Result<Tournament, TournamentError> {
        let op = self.before_commit.lock().unwrap().take();
        if let Some(op) = op {
            op(&self.inner);
        }
        self.inner.commit(id, patches, update)
    }
}

fn teams(n: usize) -> Vec<Team> {
    (1..=n)
        .map(|i| Team::new(format!("team-{i}"), format!("Team {i}")))
        .collect()
}

fn approved<S: MatchStore>(store: &S, n: usize, config: BracketConfig) -> TournamentId {
    let t = engine::create_tournament(store, "Spring Cup", teams(n), config).unwrap();
    engine::submit_for_approval(store, t.id).unwrap();
    engine::approve(store, t.id).unwrap();
    t.id
}

fn status<S: MatchStore>(store: &S, id: TournamentId) -> TournamentStatus {
    engine::load_tournament(store, id).unwrap().status
}

fn slot_id<S: MatchStore>(store: &S, id: TournamentId, match_id: &str, slot: Slot) -> Option<String> {
    store
        .get_match(id, match_id)
        .unwrap()
        .unwrap()
        .slot(slot)
        .map(|e| e.id().to_string())
}

#[test]
fn lifecycle_gates_result_submission() {
    let store = InMemoryStore::new();
    let t = engine::create_tournament(&store, "Spring Cup", teams(4), BracketConfig::single_elimination()).unwrap();
    assert_eq!(t.status, TournamentStatus::Draft);
    assert_eq!(store.get_matches(t.id).unwrap().len(), 3);

    let score = ResultSubmission::score(2, 0);
    assert_eq!(
        engine::submit_result(&store, t.id, "match-1", &score).unwrap_err(),
        TournamentError::InvalidState
    );
    assert_eq!(engine::approve(&store, t.id).unwrap_err(), TournamentError::InvalidState);

    engine::submit_for_approval(&store, t.id).unwrap();
    assert_eq!(status(&store, t.id), TournamentStatus::PendingApproval);
    assert_eq!(
        engine::submit_result(&store, t.id, "match-1", &score).unwrap_err(),
        TournamentError::InvalidState
    );

    engine::approve(&store, t.id).unwrap();
    assert_eq!(status(&store, t.id), TournamentStatus::Approved);
    assert_eq!(engine::reject(&store, t.id).unwrap_err(), TournamentError::InvalidState);

    engine::submit_result(&store, t.id, "match-1", &score).unwrap();
    assert_eq!(status(&store, t.id), TournamentStatus::Ongoing);
}

#[test]
fn rejected_tournament_accepts_no_results() {
    let store = InMemoryStore::new();
    let t = engine::create_tournament(&store, "Cup", teams(2), BracketConfig::single_elimination()).unwrap();
    engine::submit_for_approval(&store, t.id).unwrap();
    engine::reject(&store, t.id).unwrap();
    assert_eq!(status(&store, t.id), TournamentStatus::Rejected);
    assert_eq!(
        engine::submit_result(&store, t.id, "match-1", &ResultSubmission::score(2, 0)).unwrap_err(),
        TournamentError::InvalidState
    );
}

#[test]
fn deciding_the_final_completes_the_tournament() {
    let store = InMemoryStore::new();
    let id = approved(&store, 4, BracketConfig::single_elimination());

    engine::submit_result(&store, id, "match-1", &ResultSubmission::score(2, 1)).unwrap();
    engine::submit_result(&store, id, "match-2", &ResultSubmission::score(1, 2)).unwrap();
    assert_eq!(status(&store, id), TournamentStatus::Ongoing);
    assert_eq!(slot_id(&store, id, "match-3", Slot::Team1).as_deref(), Some("team-1"));
    assert_eq!(slot_id(&store, id, "match-3", Slot::Team2).as_deref(), Some("team-4"));

    engine::submit_result(&store, id, "match-3", &ResultSubmission::score(3, 2)).unwrap();
    assert_eq!(status(&store, id), TournamentStatus::Completed);
    assert!(engine::load_graph(&store, id).unwrap().is_decided());
    assert_eq!(
        engine::submit_result(&store, id, "match-3", &ResultSubmission::score(3, 0)).unwrap_err(),
        TournamentError::InvalidState
    );
}

#[test]
fn schedule_only_submission_keeps_the_status() {
    let store = InMemoryStore::new();
    let id = approved(&store, 4, BracketConfig::single_elimination());
    let start = chrono::Utc::now();

    let adv = engine::submit_result(&store, id, "match-2", &ResultSubmission::schedule(start)).unwrap();
    assert!(adv.is_schedule_only());
    assert_eq!(status(&store, id), TournamentStatus::Approved);
    let m = store.get_match(id, "match-2").unwrap().unwrap();
    assert_eq!(m.start_time, Some(start));
    assert!(m.winner_id.is_none());
}

#[test]
fn stale_result_is_a_conflict_and_writes_nothing() {
    let store = InMemoryStore::new();
    let id = approved(&store, 4, BracketConfig::single_elimination());
    let before = engine::load_graph(&store, id).unwrap();

    engine::submit_result(&store, id, "match-1", &ResultSubmission::score(2, 0)).unwrap();

    // A second organizer computed the opposite result from the old graph.
    let stale = submit_result(&before, "match-1", &ResultSubmission::score(0, 2)).unwrap();
    assert_eq!(
        store.batch_update(id, &stale.patches()),
        Err(TournamentError::PersistenceConflict("match-1".to_string()))
    );

    let m = store.get_match(id, "match-1").unwrap().unwrap();
    assert_eq!(m.winner_id.as_deref(), Some("team-1"));
    assert_eq!(slot_id(&store, id, "match-3", Slot::Team1).as_deref(), Some("team-1"));
    assert_eq!(slot_id(&store, id, "match-3", Slot::Team2), None);

    assert_eq!(
        engine::submit_result(&store, id, "match-1", &ResultSubmission::score(0, 2)).unwrap_err(),
        TournamentError::MatchNotPlayable("match-1".to_string())
    );
}

#[test]
fn batch_update_is_all_or_nothing() {
    let store = InMemoryStore::new();
    let id = approved(&store, 4, BracketConfig::single_elimination());
    engine::submit_result(&store, id, "match-1", &ResultSubmission::score(2, 0)).unwrap();

    let batch = [
        MatchPatch::new("match-3")
            .guard(PatchGuard::SlotEmpty(Slot::Team2))
            .place(Slot::Team2, Team::new("team-3", "Team 3")),
        MatchPatch::new("match-1")
            .guard(PatchGuard::WinnerUnset)
            .result(0, 2, "team-2"),
    ];
    assert_eq!(
        store.batch_update(id, &batch),
        Err(TournamentError::PersistenceConflict("match-1".to_string()))
    );
    assert_eq!(slot_id(&store, id, "match-3", Slot::Team2), None);
}

#[test]
fn concurrent_final_group_results_seed_the_playoffs_once() {
    for _ in 0..25 {
        let store = InMemoryStore::new();
        let id = approved(&store, 8, BracketConfig::single_elimination().with_group_stage());
        for i in 1..=10 {
            engine::submit_result(&store, id, &format!("match-{i}"), &ResultSubmission::score(1, 0)).unwrap();
        }

        let (a, b) = std::thread::scope(|s| {
            let a = s.spawn(|| engine::submit_result(&store, id, "match-11", &ResultSubmission::score(1, 0)));
            let b = s.spawn(|| engine::submit_result(&store, id, "match-12", &ResultSubmission::score(1, 0)));
            (a.join().unwrap(), b.join().unwrap())
        });
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(
            [a.playoffs_seeded, b.playoffs_seeded].iter().filter(|&&s| s).count(),
            1
        );

        let graph = engine::load_graph(&store, id).unwrap();
        assert!(graph
            .iter()
            .flat_map(|m| [&m.team1, &m.team2])
            .flatten()
            .all(|e| !e.is_seed()));
        assert_eq!(slot_id(&store, id, "match-13", Slot::Team1).as_deref(), Some("team-1"));
        assert_eq!(slot_id(&store, id, "match-13", Slot::Team2).as_deref(), Some("team-6"));
        assert_eq!(slot_id(&store, id, "match-14", Slot::Team1).as_deref(), Some("team-5"));
        assert_eq!(slot_id(&store, id, "match-14", Slot::Team2).as_deref(), Some("team-2"));
        assert_eq!(engine::seed_playoffs(&store, id).unwrap(), 0);
    }
}

#[test]
fn renamed_team_is_updated_everywhere() {
    let store = InMemoryStore::new();
    let id = approved(&store, 4, BracketConfig::single_elimination());
    engine::submit_result(&store, id, "match-1", &ResultSubmission::score(2, 0)).unwrap();

    let t = engine::update_team(
        &store,
        id,
        "team-1",
        Some("  Alpha Squad ".to_string()),
        Some("https://cdn.example/alpha.png".to_string()),
    )
    .unwrap();
    let renamed = t.get_team("team-1").unwrap().clone();
    assert_eq!(renamed.name, "Alpha Squad");
    assert_eq!(renamed.logo_url.as_deref(), Some("https://cdn.example/alpha.png"));

    for match_id in ["match-1", "match-3"] {
        let m = store.get_match(id, match_id).unwrap().unwrap();
        assert_eq!(m.team1, Some(Entrant::Team(renamed.clone())), "{match_id}");
    }
    assert_eq!(engine::load_tournament(&store, id).unwrap().get_team("team-1"), Some(&renamed));

    assert_eq!(
        engine::update_team(&store, id, "team-9", Some("Ghost".to_string()), None).unwrap_err(),
        TournamentError::TeamNotFound("team-9".to_string())
    );
    assert_eq!(
        engine::update_team(&store, id, "team-2", Some("   ".to_string()), None).unwrap_err(),
        TournamentError::InvalidState
    );
    assert_eq!(
        engine::update_team(&store, id, "team-2", Some("alpha squad".to_string()), None).unwrap_err(),
        TournamentError::InvalidState
    );
    assert_eq!(engine::load_tournament(&store, id).unwrap().get_team("team-2").unwrap().name, "Team 2");
}

#[test]
fn team_edit_racing_the_final_keeps_the_completed_status() {
    let store = InterleavingStore::default();
    let id = approved(&store, 2, BracketConfig::single_elimination());
    store.before_next_commit(move |inner| {
        engine::submit_result(inner, id, "match-1", &ResultSubmission::score(2, 0)).unwrap();
    });

    let t = engine::update_team(&store, id, "team-1", Some("Alpha".to_string()), None).unwrap();
    assert_eq!(t.status, TournamentStatus::Completed);
    assert_eq!(status(&store, id), TournamentStatus::Completed);

    let m = store.get_match(id, "match-1").unwrap().unwrap();
    assert_eq!(m.winner_id.as_deref(), Some("team-1"));
    assert_eq!(m.team1.as_ref().unwrap().name(), "Alpha");
    assert_eq!(
        engine::submit_result(&store, id, "match-1", &ResultSubmission::score(0, 2)).unwrap_err(),
        TournamentError::InvalidState
    );
}

#[test]
fn result_racing_a_team_edit_advances_the_renamed_team() {
    let store = InterleavingStore::default();
    let id = approved(&store, 4, BracketConfig::single_elimination());
    store.before_next_commit(move |inner| {
        engine::update_team(inner, id, "team-1", Some("Alpha Squad".to_string()), None).unwrap();
    });

    engine::submit_result(&store, id, "match-1", &ResultSubmission::score(2, 0)).unwrap();

    let t = engine::load_tournament(&store, id).unwrap();
    assert_eq!(t.status, TournamentStatus::Ongoing);
    let renamed = t.get_team("team-1").unwrap().clone();
    assert_eq!(renamed.name, "Alpha Squad");
    for match_id in ["match-1", "match-3"] {
        let m = store.get_match(id, match_id).unwrap().unwrap();
        assert_eq!(m.team1, Some(Entrant::Team(renamed.clone())), "{match_id}");
    }
}

#[test]
fn result_is_not_written_when_the_tournament_closes_first() {
    let store = InterleavingStore::default();
    let id = approved(&store, 4, BracketConfig::single_elimination());
    store.before_next_commit(move |inner| {
        inner
            .update_tournament(id, &mut |t| {
                t.status = TournamentStatus::Rejected;
                Ok(())
            })
            .unwrap();
    });

    assert_eq!(
        engine::submit_result(&store, id, "match-1", &ResultSubmission::score(2, 0)).unwrap_err(),
        TournamentError::InvalidState
    );
    assert_eq!(status(&store, id), TournamentStatus::Rejected);
    assert!(store.get_match(id, "match-1").unwrap().unwrap().winner_id.is_none());
    assert_eq!(slot_id(&store, id, "match-3", Slot::Team1), None);
}

#[test]
fn invalid_rosters_are_not_stored() {
    let store = InMemoryStore::new();
    let mut roster = teams(4);
    roster[3].name = "team 1".to_string();
    roster[0].name = "Team 1".to_string();
    assert_eq!(
        engine::create_tournament(&store, "Cup", roster, BracketConfig::single_elimination()).unwrap_err(),
        TournamentError::InvalidState
    );
    let shared_id = vec![Team::new("team-1", "Alpha"), Team::new("team-1", "Bravo")];
    assert_eq!(
        engine::create_tournament(&store, "Cup", shared_id, BracketConfig::single_elimination()).unwrap_err(),
        TournamentError::InvalidState
    );
    let seed_like = vec![Team::new("seed-0", "Alpha"), Team::new("team-2", "Bravo")];
    assert_eq!(
        engine::create_tournament(&store, "Cup", seed_like, BracketConfig::single_elimination()).unwrap_err(),
        TournamentError::InvalidState
    );
    assert_eq!(
        engine::create_tournament(&store, "Cup", teams(6), BracketConfig::single_elimination()).unwrap_err(),
        TournamentError::UnsupportedTeamCount { count: 6, has_group_stage: false }
    );
    assert!(store.tournament_ids().unwrap().is_empty());
}

#[test]
fn unknown_tournament_is_not_found() {
    let store = InMemoryStore::new();
    let id = Uuid::new_v4();
    assert_eq!(engine::load_tournament(&store, id).unwrap_err(), TournamentError::TournamentNotFound(id));
    assert_eq!(store.get_match(id, "match-1").unwrap_err(), TournamentError::TournamentNotFound(id));
    assert_eq!(
        engine::submit_result(&store, id, "match-1", &ResultSubmission::score(1, 0)).unwrap_err(),
        TournamentError::TournamentNotFound(id)
    );
}

#[test]
fn standings_through_the_store() {
    let store = InMemoryStore::new();
    let id = approved(&store, 8, BracketConfig::double_elimination().with_group_stage());
    engine::submit_result(&store, id, "match-1", &ResultSubmission::score(0, 1)).unwrap();

    let standings = engine::standings(&store, id).unwrap();
    assert_eq!(standings.len(), 2);
    assert_eq!(standings[&'A'][0].team.id, "team-2");

    let csv = standings_csv(&standings).unwrap();
    assert_eq!(csv.lines().count(), 1 + 8);
}

#[test]
fn shuffle_is_reproducible_with_a_seeded_rng() {
    let entries: Vec<TeamEntry> = ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel"]
        .into_iter()
        .map(TeamEntry::new)
        .collect();

    let first = shuffle_teams(&entries, &mut StdRng::seed_from_u64(7));
    let second = shuffle_teams(&entries, &mut StdRng::seed_from_u64(7));
    assert_eq!(first, second);

    let ids: Vec<&str> = first.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["team-1", "team-2", "team-3", "team-4", "team-5", "team-6", "team-7", "team-8"]);

    let mut names: Vec<&str> = first.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel"]);
}
