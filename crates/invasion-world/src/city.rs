//! Cities and the roads between them.
//!
//! A city owns nothing but its name: roads are weak references into the
//! world registry and residents are weak references to the aliens standing
//! in it, so destroying a city never keeps its neighbours alive and an
//! alien may outlive the rubble it is trapped in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use invasion_core::{AlienId, Direction};

use crate::alien::Alien;
use crate::world::World;

/// A named city with up to one outgoing road per compass direction.
pub struct City {
    name: String,
    /// Outgoing roads, indexed by [`Direction::index`].
    neighbors: RwLock<[Option<Weak<City>>; 4]>,
    /// Aliens currently standing in the city.
    residents: Mutex<Vec<Weak<Alien>>>,
    destroyed: AtomicBool,
}

impl City {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            neighbors: RwLock::new([None, None, None, None]),
            residents: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the neighbouring city in `direction`, if a road leads there
    /// and the destination still exists.
    pub fn neighbor(&self, direction: Direction) -> Option<Arc<City>> {
        self.neighbors.read()[direction.index()]
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Returns all intact outgoing roads in north, south, east, west order.
    pub fn neighbors(&self) -> Vec<(Direction, Arc<City>)> {
        let slots = self.neighbors.read();
        Direction::all()
            .into_iter()
            .filter_map(|direction| {
                slots[direction.index()]
                    .as_ref()
                    .and_then(Weak::upgrade)
                    .map(|city| (direction, city))
            })
            .collect()
    }

    pub(crate) fn set_neighbor(&self, direction: Direction, destination: &Arc<City>) {
        self.neighbors.write()[direction.index()] = Some(Arc::downgrade(destination));
    }

    /// Clears the road in `direction` if it points at `name`.
    fn clear_neighbor_to(&self, direction: Direction, name: &str) {
        let mut slots = self.neighbors.write();
        let points_there = slots[direction.index()]
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|city| city.name == name);
        if points_there {
            slots[direction.index()] = None;
        }
    }

    pub fn resident_count(&self) -> usize {
        self.residents
            .lock()
            .iter()
            .filter(|alien| alien.strong_count() > 0)
            .count()
    }

    pub fn resident_ids(&self) -> Vec<AlienId> {
        self.residents
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|alien| alien.id())
            .collect()
    }

    /// Admits `alien` only if the city is currently empty.
    ///
    /// The emptiness check and the insertion happen under a single lock
    /// acquisition, so two aliens racing for the same city cannot both win.
    pub(crate) fn try_claim(&self, alien: &Arc<Alien>) -> bool {
        let mut residents = self.residents.lock();
        if residents.iter().any(|resident| resident.strong_count() > 0) {
            return false;
        }
        residents.push(Arc::downgrade(alien));
        true
    }

    /// Admits `alien` unconditionally. Used when moving along a road, where
    /// sharing a city is allowed (and fatal).
    pub(crate) fn admit(&self, alien: &Arc<Alien>) {
        self.residents.lock().push(Arc::downgrade(alien));
    }

    /// Removes the alien with `id` from the resident list, if present.
    /// Entries whose alien no longer exists are dropped as well.
    pub fn evict(&self, id: AlienId) {
        self.residents
            .lock()
            .retain(|resident| resident.upgrade().is_some_and(|alien| alien.id() != id));
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Destroys the city: traps every resident where it stands, severs the
    /// inbound road from each neighbour and removes the city from `world`.
    ///
    /// Returns the ids of the trapped residents. Only the first caller does
    /// any work; later calls return an empty list. At most one neighbour's
    /// road table is locked at a time, so adjacent cities may be destroyed
    /// concurrently without deadlocking.
    pub fn destroy(self: &Arc<Self>, world: &World) -> Vec<AlienId> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }

        let trapped: Vec<AlienId> = {
            let residents = self.residents.lock();
            residents
                .iter()
                .filter_map(Weak::upgrade)
                .map(|alien| {
                    alien.mark_trapped();
                    alien.id()
                })
                .collect()
        };

        for (direction, neighbor) in self.neighbors() {
            neighbor.clear_neighbor_to(direction.opposite(), &self.name);
        }

        world.remove(&self.name);
        trapped
    }

    /// Renders the city in map-file form, roads in compass order, e.g.
    /// `Foo north=Bar west=Baz`.
    pub fn route_line(&self) -> String {
        let mut line = self.name.clone();
        for (direction, neighbor) in self.neighbors() {
            line.push(' ');
            line.push_str(direction.as_str());
            line.push('=');
            line.push_str(neighbor.name());
        }
        line
    }
}

impl std::fmt::Debug for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("City")
            .field("name", &self.name)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resident(id: u32) -> Arc<Alien> {
        Arc::new(Alien::new(AlienId(id), 10_000, 0))
    }

    #[test]
    fn test_new_city_is_empty() {
        let city = City::new("Quiet");
        assert_eq!(city.name(), "Quiet");
        assert_eq!(city.resident_count(), 0);
        assert!(city.neighbors().is_empty());
        assert!(!city.is_destroyed());
        assert_eq!(city.route_line(), "Quiet");
    }

    #[test]
    fn test_evict_removes_only_the_target() {
        let city = City::new("Crowded");
        let first = resident(0);
        let second = resident(1);
        let third = resident(2);
        city.admit(&first);
        city.admit(&second);
        city.admit(&third);

        city.evict(AlienId(1));

        assert_eq!(city.resident_ids(), vec![AlienId(0), AlienId(2)]);
    }

    #[test]
    fn test_destroy_traps_residents() {
        let world = World::new();
        let jail = world.establish_city("Jail").unwrap();
        let first = resident(0);
        let second = resident(1);
        jail.admit(&first);
        jail.admit(&second);

        let trapped = jail.destroy(&world);

        assert_eq!(trapped, vec![AlienId(0), AlienId(1)]);
        assert!(jail.is_destroyed());
        assert!(first.is_trapped());
        assert!(second.is_trapped());
        assert!(world.lookup("Jail").is_none());
    }

    #[test]
    fn test_destroy_severs_inbound_roads() {
        let world = World::new();
        world.establish_city("Vanish north=North east=East").unwrap();
        let vanish = world.lookup("Vanish").unwrap();
        let north = world.lookup("North").unwrap();
        let east = world.lookup("East").unwrap();

        vanish.destroy(&world);

        assert!(world.lookup("Vanish").is_none());
        assert!(north.neighbors().is_empty());
        assert!(east.neighbors().is_empty());
        assert!(world.lookup("North").is_some());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let world = World::new();
        let city = world.establish_city("Once").unwrap();
        let alien = resident(0);
        city.admit(&alien);

        assert_eq!(city.destroy(&world), vec![AlienId(0)]);
        assert!(city.destroy(&world).is_empty());
    }

    #[test]
    fn test_route_line_uses_compass_order() {
        let world = World::new();
        world
            .establish_city("Hub west=Lodge north=Peak")
            .unwrap();
        let hub = world.lookup("Hub").unwrap();

        assert_eq!(hub.route_line(), "Hub north=Peak west=Lodge");
    }

    #[test]
    fn test_claim_admits_exactly_one_contender() {
        let city = City::new("Prize");
        let contenders: Vec<Arc<Alien>> = (0..16).map(resident).collect();

        let wins: usize = std::thread::scope(|scope| {
            let city = &city;
            contenders
                .iter()
                .map(|alien| scope.spawn(move || usize::from(city.try_claim(alien))))
                .collect::<Vec<_>>()
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .sum()
        });

        assert_eq!(wins, 1);
        assert_eq!(city.resident_count(), 1);
    }
}
