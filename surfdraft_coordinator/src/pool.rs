// The map pool a draft selects from.
//
// Pool order matters: it is the tiebreak priority. When the turn sequence
// exhausts without a naturally picked winner, the first pool entry that no
// ban or pick referenced becomes the tie-breaker map.

/// The competitive pool, in tiebreak priority order.
pub const DEFAULT_MAPS: [&str; 16] = [
    "surf_nyx",
    "surf_tuxedo",
    "surf_utopia_njv",
    "surf_slob",
    "surf_reytx",
    "surf_grassland",
    "surf_facility",
    "surf_kloakk",
    "surf_cannonball",
    "surf_placid",
    "surf_andromeda",
    "surf_physics",
    "surf_inferno",
    "surf_cyberwave",
    "surf_olympics",
    "surf_quilavar",
];

/// Ordered set of candidate map names.
#[derive(Clone, Debug)]
pub struct MapPool {
    names: Vec<String>,
}

impl MapPool {
    /// Build a pool from an ordered list of names. A repeated name keeps its
    /// first position; later occurrences are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    /// Whether `name` is a pool member. Exact match, no normalization.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// All names, in priority order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The first pool entry not present in `used`, if any. This is the
    /// tiebreak rule.
    pub fn first_unreferenced(&self, used: &[&str]) -> Option<&str> {
        self.names.iter().map(String::as_str).find(|name| !used.contains(name))
    }
}

impl Default for MapPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAPS)
    }
}
