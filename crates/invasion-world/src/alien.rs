//! Invading aliens and their wandering behaviour.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use invasion_core::{AlienId, Error, Result};

use crate::city::City;
use crate::world::World;

/// An alien that lands in an empty city and then wanders the road network
/// until it is trapped, destroyed or out of moves.
///
/// Each alien carries its own seeded RNG stream, so simulations with the
/// same seed make the same choices regardless of how the aliens are
/// scheduled across threads.
pub struct Alien {
    id: AlienId,
    max_moves: u32,
    location: Mutex<Option<Arc<City>>>,
    moves: AtomicU32,
    trapped: AtomicBool,
    rng: Mutex<ChaCha8Rng>,
}

impl Alien {
    pub fn new(id: AlienId, max_moves: u32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(u64::from(id.0));
        Self {
            id,
            max_moves,
            location: Mutex::new(None),
            moves: AtomicU32::new(0),
            trapped: AtomicBool::new(false),
            rng: Mutex::new(rng),
        }
    }

    pub fn id(&self) -> AlienId {
        self.id
    }

    /// The city the alien is standing in, if it has landed anywhere.
    pub fn location(&self) -> Option<Arc<City>> {
        self.location.lock().clone()
    }

    pub fn moves(&self) -> u32 {
        self.moves.load(Ordering::SeqCst)
    }

    pub fn is_trapped(&self) -> bool {
        self.trapped.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_trapped(&self) {
        self.trapped.store(true, Ordering::SeqCst);
    }

    /// Lands the alien in a random city that no other alien occupies.
    ///
    /// Candidate cities are tried in a shuffled order until one of them is
    /// claimed. Fails with [`Error::NoVacantCity`] once every city is
    /// occupied.
    pub fn invade_random_empty_city(self: &Arc<Self>, world: &World) -> Result<Arc<City>> {
        let mut cities = world.snapshot();
        cities.shuffle(&mut *self.rng.lock());
        for city in cities {
            if city.try_claim(self) {
                *self.location.lock() = Some(city.clone());
                return Ok(city);
            }
        }
        Err(Error::NoVacantCity)
    }

    /// Moves the alien along one randomly chosen road out of its current
    /// city.
    ///
    /// An alien with no intact outgoing road is trapped where it stands and
    /// [`Error::NoReachableCity`] is returned. A successful move that
    /// reaches the move limit also traps the alien, but still succeeds.
    pub fn step(self: &Arc<Self>) -> Result<Arc<City>> {
        let location = self.location.lock().clone();
        let current = match location {
            Some(city) => city,
            None => {
                self.mark_trapped();
                return Err(Error::NoReachableCity(self.id));
            }
        };

        let candidates: Vec<Arc<City>> = current
            .neighbors()
            .into_iter()
            .map(|(_, city)| city)
            .collect();
        if candidates.is_empty() {
            self.mark_trapped();
            return Err(Error::NoReachableCity(self.id));
        }

        let destination = {
            let mut rng = self.rng.lock();
            candidates[rng.gen_range(0..candidates.len())].clone()
        };

        current.evict(self.id);
        destination.admit(self);
        *self.location.lock() = Some(destination.clone());

        let moves = self.moves.fetch_add(1, Ordering::SeqCst) + 1;
        if moves >= self.max_moves {
            self.mark_trapped();
            debug!(alien = %self.id, moves, "alien has run out of moves");
        }

        Ok(destination)
    }
}

impl std::fmt::Debug for Alien {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alien")
            .field("id", &self.id)
            .field("moves", &self.moves())
            .field("trapped", &self.is_trapped())
            .finish()
    }
}
