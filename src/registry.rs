// 🐄 Animal Registry - in-memory livestock records
//
// One flat, insertion-ordered sequence of AnimalRecord:
// - Identity (UUID) is assigned at creation and never changes
// - Category is fixed at creation; tag and treatment flags are mutable
// - Mutations referencing an unknown id are silent no-ops

use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY
// ============================================================================

/// The six livestock categories, in the canonical order used by the summary
/// cards and every report render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Breeding cow
    Vaca,
    /// Bull
    Toro,
    /// Young bull / steer
    Novillo,
    /// Young female calf
    Ternera,
    /// Heifer
    Vaquillona,
    /// Young male calf
    Ternero,
}

impl Category {
    /// Canonical display/report order
    pub const ALL: [Category; 6] = [
        Category::Vaca,
        Category::Toro,
        Category::Novillo,
        Category::Ternera,
        Category::Vaquillona,
        Category::Ternero,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vaca => "Vaca",
            Category::Toro => "Toro",
            Category::Novillo => "Novillo",
            Category::Ternera => "Ternera",
            Category::Vaquillona => "Vaquillona",
            Category::Ternero => "Ternero",
        }
    }

    /// Fixed chart color (RGB), one per category, stable across renders
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Category::Vaca => (0x84, 0xcc, 0x16),
            Category::Toro => (0x10, 0xb9, 0x81),
            Category::Novillo => (0x3b, 0x82, 0xf6),
            Category::Ternera => (0xf5, 0x9e, 0x0b),
            Category::Vaquillona => (0xef, 0x44, 0x44),
            Category::Ternero => (0x8b, 0x5c, 0xf6),
        }
    }
}

/// The two per-animal health treatments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    Vaccinated,
    Dewormed,
}

// ============================================================================
// ANIMAL RECORD
// ============================================================================

/// One tracked animal.
///
/// `id` is the sole lookup/removal key. `tag` is the physical ear-tag number
/// ("caravana"): free text, may stay empty, no uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalRecord {
    /// Stable identity (UUID) - never changes, never reused
    pub id: String,

    /// Fixed at creation
    pub category: Category,

    /// Ear-tag number, mutable, may be empty
    #[serde(default)]
    pub tag: String,

    #[serde(default)]
    pub vaccinated: bool,

    #[serde(default)]
    pub dewormed: bool,
}

impl AnimalRecord {
    fn new(category: Category) -> Self {
        AnimalRecord {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            tag: String::new(),
            vaccinated: false,
            dewormed: false,
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// The in-memory animal registry: single instance for the application's
/// lifetime, mutated exclusively through its own operations.
///
/// Insertion order is display/report order. Persistence is the caller's
/// concern (see `store`): the registry itself never touches disk.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    animals: Vec<AnimalRecord>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Registry { animals: Vec::new() }
    }

    /// Rebuild a registry from a restored record sequence
    pub fn from_records(animals: Vec<AnimalRecord>) -> Self {
        Registry { animals }
    }

    /// Full sequence, insertion order
    pub fn records(&self) -> &[AnimalRecord] {
        &self.animals
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    /// Records of one category, preserving insertion order
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &AnimalRecord> {
        self.animals.iter().filter(move |a| a.category == category)
    }

    pub fn count(&self, category: Category) -> usize {
        self.by_category(category).count()
    }

    /// Register a new animal: fresh UUID, empty tag, both flags false,
    /// appended at the end of the sequence. Always succeeds.
    pub fn add(&mut self, category: Category) -> &AnimalRecord {
        self.animals.push(AnimalRecord::new(category));
        self.animals.last().expect("just pushed")
    }

    /// Delete the record with matching id. Returns false (and leaves the
    /// registry untouched) when the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.animals.len();
        self.animals.retain(|a| a.id != id);
        self.animals.len() != before
    }

    /// Replace the ear-tag of the matching record. No-op on unknown id.
    pub fn set_tag(&mut self, id: &str, tag: &str) -> bool {
        match self.find_mut(id) {
            Some(animal) => {
                animal.tag = tag.to_string();
                true
            }
            None => false,
        }
    }

    /// Flip one treatment flag of the matching record. No-op on unknown id.
    pub fn toggle(&mut self, id: &str, treatment: Treatment) -> bool {
        match self.find_mut(id) {
            Some(animal) => {
                match treatment {
                    Treatment::Vaccinated => animal.vaccinated = !animal.vaccinated,
                    Treatment::Dewormed => animal.dewormed = !animal.dewormed,
                }
                true
            }
            None => false,
        }
    }

    /// Empty the sequence unconditionally. Irreversible: the explicit user
    /// confirmation lives at the presentation boundary, not here.
    pub fn clear(&mut self) {
        self.animals.clear();
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut AnimalRecord> {
        self.animals.iter_mut().find(|a| a.id == id)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_add_defaults() {
        let mut registry = Registry::new();
        let animal = registry.add(Category::Vaca);

        assert!(!animal.id.is_empty());
        assert_eq!(animal.category, Category::Vaca);
        assert_eq!(animal.tag, "");
        assert!(!animal.vaccinated);
        assert!(!animal.dewormed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_unique_across_operations() {
        let mut registry = Registry::new();

        for category in Category::ALL {
            for _ in 0..10 {
                registry.add(category);
            }
        }

        // Interleave removals and more adds
        let doomed: Vec<String> = registry
            .records()
            .iter()
            .step_by(7)
            .map(|a| a.id.clone())
            .collect();
        for id in &doomed {
            assert!(registry.remove(id));
        }
        for _ in 0..10 {
            registry.add(Category::Ternero);
        }

        let ids: HashSet<&str> = registry.records().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), registry.len(), "duplicate id in registry");
    }

    #[test]
    fn test_category_never_changes() {
        let mut registry = Registry::new();
        let id = registry.add(Category::Toro).id.clone();

        registry.set_tag(&id, "A-17");
        registry.toggle(&id, Treatment::Vaccinated);
        registry.toggle(&id, Treatment::Dewormed);
        registry.toggle(&id, Treatment::Vaccinated);

        assert_eq!(registry.records()[0].category, Category::Toro);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut registry = Registry::new();
        registry.add(Category::Vaca);
        registry.add(Category::Ternero);
        registry.add(Category::Vaca);

        let order: Vec<Category> = registry.records().iter().map(|a| a.category).collect();
        assert_eq!(
            order,
            vec![Category::Vaca, Category::Ternero, Category::Vaca]
        );

        let vacas: Vec<&AnimalRecord> = registry.by_category(Category::Vaca).collect();
        assert_eq!(vacas.len(), 2);
        assert_eq!(registry.count(Category::Ternero), 1);
        assert_eq!(registry.count(Category::Toro), 0);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut registry = Registry::new();
        let id = registry.add(Category::Vaquillona).id.clone();
        registry.set_tag(&id, "99");

        let before = registry.clone();
        assert!(!registry.remove("no-such-id"));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_set_tag_and_toggle_unknown_id_are_noops() {
        let mut registry = Registry::new();
        registry.add(Category::Novillo);

        let before = registry.clone();
        assert!(!registry.set_tag("no-such-id", "123"));
        assert!(!registry.toggle("no-such-id", Treatment::Dewormed));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_toggle_flips_back_and_forth() {
        let mut registry = Registry::new();
        let id = registry.add(Category::Ternera).id.clone();

        registry.toggle(&id, Treatment::Vaccinated);
        assert!(registry.records()[0].vaccinated);
        assert!(!registry.records()[0].dewormed);

        registry.toggle(&id, Treatment::Vaccinated);
        assert!(!registry.records()[0].vaccinated);

        registry.toggle(&id, Treatment::Dewormed);
        assert!(registry.records()[0].dewormed);
    }

    #[test]
    fn test_clear_empties_regardless_of_prior_state() {
        let mut registry = Registry::new();
        for category in Category::ALL {
            registry.add(category);
        }
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.records(), &[]);

        // Clearing an already-empty registry stays empty
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_count_one_calf_scenario() {
        let mut registry = Registry::new();

        let id = registry.add(Category::Ternero).id.clone();
        registry.set_tag(&id, "123");
        registry.toggle(&id, Treatment::Vaccinated);

        let animal = &registry.records()[0];
        assert_eq!(animal.category, Category::Ternero);
        assert_eq!(animal.tag, "123");
        assert!(animal.vaccinated);
        assert!(!animal.dewormed);

        assert!(registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_record_serde_round_trip() {
        let mut registry = Registry::new();
        let id = registry.add(Category::Vaca).id.clone();
        registry.set_tag(&id, "");
        registry.toggle(&id, Treatment::Dewormed);

        let json = serde_json::to_string(registry.records()).unwrap();
        let restored: Vec<AnimalRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, registry.records());
    }
}
