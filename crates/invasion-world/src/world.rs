//! The world registry: every city that still exists, keyed by name.
//!
//! Map files declare one city per line as `Name direction=Destination ...`.
//! Declaring a road also records the reverse road on the destination, so
//! the graph is symmetric by construction and any declaration that would
//! break that symmetry is rejected.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use invasion_core::{Direction, Error, Result};

use crate::city::City;

#[derive(Debug, Default)]
pub struct World {
    cities: RwLock<HashMap<String, Arc<City>>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.read().is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<City>> {
        self.cities.read().get(name).cloned()
    }

    /// Returns the city named `name`, creating it first if the world does
    /// not know it yet. The flag reports whether the city already existed,
    /// which lets a declaration merge roads into an earlier stub.
    pub fn lookup_or_insert(&self, name: &str) -> (Arc<City>, bool) {
        if let Some(city) = self.lookup(name) {
            return (city, true);
        }
        match self.cities.write().entry(name.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), true),
            Entry::Vacant(entry) => {
                let city = Arc::new(City::new(name));
                entry.insert(city.clone());
                (city, false)
            }
        }
    }

    /// Removes the city named `name` from the registry.
    pub fn remove(&self, name: &str) -> Option<Arc<City>> {
        self.cities.write().remove(name)
    }

    /// Clones the current city list out of the registry. Iteration then
    /// happens without holding the registry lock, so cities may be removed
    /// while a snapshot is being walked.
    pub fn snapshot(&self) -> Vec<Arc<City>> {
        self.cities.read().values().cloned().collect()
    }

    /// Visits every city until `visit` returns `false`.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&Arc<City>) -> bool,
    {
        for city in self.snapshot() {
            if !visit(&city) {
                break;
            }
        }
    }

    /// Renders the surviving cities in map-file form, sorted by name.
    pub fn render_map(&self) -> String {
        let mut cities = self.snapshot();
        cities.sort_by(|a, b| a.name().cmp(b.name()));
        cities
            .iter()
            .map(|city| city.route_line())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Establishes a city from one map line, `Name direction=Destination`
    /// pairs separated by single spaces. Destinations that have not been
    /// declared yet are created as road-less stubs and filled in when their
    /// own line arrives.
    pub fn establish_city(&self, line: &str) -> Result<Arc<City>> {
        let mut tokens = line.split(' ');
        let name = tokens.next().unwrap_or_default();
        if name.trim().is_empty() {
            return Err(Error::EmptyCityDeclaration);
        }

        let (city, _) = self.lookup_or_insert(name);
        for pair in tokens {
            let parts: Vec<&str> = pair.split('=').collect();
            if parts.len() != 2 || parts[1].is_empty() {
                return Err(Error::MalformedRoute {
                    city: name.to_string(),
                    pair: pair.to_string(),
                });
            }
            let direction = Direction::from_key(parts[0]).ok_or_else(|| Error::InvalidDirection {
                city: name.to_string(),
                direction: parts[0].to_string(),
            })?;
            let (destination, _) = self.lookup_or_insert(parts[1]);
            self.link(&city, direction, &destination)?;
        }
        Ok(city)
    }

    /// Records the two-way road `origin -(direction)-> destination`.
    ///
    /// The road occupies one slot on each end. A slot that already points
    /// at a different city is a conflict and leaves both ends untouched.
    fn link(&self, origin: &Arc<City>, direction: Direction, destination: &Arc<City>) -> Result<()> {
        let reverse = direction.opposite();
        if let Some(existing) = destination.neighbor(reverse) {
            if existing.name() != origin.name() {
                return Err(Error::RouteConflict {
                    origin: origin.name().to_string(),
                    direction,
                    destination: destination.name().to_string(),
                    conflicting: existing.name().to_string(),
                });
            }
        }
        if let Some(existing) = origin.neighbor(direction) {
            if existing.name() != destination.name() {
                return Err(Error::RouteConflict {
                    origin: origin.name().to_string(),
                    direction,
                    destination: destination.name().to_string(),
                    conflicting: existing.name().to_string(),
                });
            }
        }
        origin.set_neighbor(direction, destination);
        destination.set_neighbor(reverse, origin);
        Ok(())
    }
}
