//! Generational arena holding every live entity and its components.

use crate::ComponentSet;

/// Stable handle naming one entity.
///
/// Handles carry the generation of the slot they were issued for. Once the
/// entity is despawned the slot's generation moves on and the handle stops
/// resolving, so stale handles are rejected instead of aliasing a newcomer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Slot index of the entity inside the arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the handle was issued for.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Debug)]
struct Slot<C> {
    generation: u32,
    dense: usize,
    components: Option<C>,
}

/// Arena of entities with a dense list of live slots.
///
/// Despawning swaps the last live entry into the vacated position of the
/// dense list, so iteration order changes exactly like a swap-remove.
#[derive(Clone, Debug)]
pub struct Entities<C> {
    slots: Vec<Slot<C>>,
    live: Vec<u32>,
    free: Vec<u32>,
}

impl<C> Default for Entities<C> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<C: ComponentSet> Entities<C> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity carrying exactly `components`.
    pub fn spawn(&mut self, components: C) -> EntityId {
        let dense = self.live.len();
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.dense = dense;
                slot.components = Some(components);
                index
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    dense,
                    components: Some(components),
                });
                index
            }
        };
        self.live.push(index);

        EntityId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Removes an entity, returning its components. Stale handles yield `None`.
    pub fn despawn(&mut self, id: EntityId) -> Option<C> {
        let slot = self.live_slot_mut(id)?;
        let components = slot.components.take()?;
        let dense = slot.dense;
        slot.generation = slot.generation.wrapping_add(1);

        let _ = self.live.swap_remove(dense);
        if let Some(&moved) = self.live.get(dense) {
            self.slots[moved as usize].dense = dense;
        }
        self.free.push(id.index);

        tracing::debug!(index = id.index, generation = id.generation, "despawned entity");
        Some(components)
    }

    /// Components of a live entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&C> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.components.as_ref()
    }

    /// Mutable components of a live entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        self.live_slot_mut(id)?.components.as_mut()
    }

    /// Reports whether the handle names a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Reports whether no entity is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Snapshot of live handles in dense order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Live entities with their components, in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> + '_ {
        self.live.iter().filter_map(move |&index| {
            let slot = self.slots.get(index as usize)?;
            let components = slot.components.as_ref()?;
            Some((
                EntityId {
                    index,
                    generation: slot.generation,
                },
                components,
            ))
        })
    }

    fn live_slot_mut(&mut self, id: EntityId) -> Option<&mut Slot<C>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        (slot.generation == id.generation && slot.components.is_some()).then_some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Tag(Option<u32>);

    impl ComponentSet for Tag {
        type Kind = ();

        fn contains(&self, _kind: ()) -> bool {
            self.0.is_some()
        }

        fn remove(&mut self, _kind: ()) -> bool {
            self.0.take().is_some()
        }

        fn absorb(&mut self, other: Self) {
            if other.0.is_some() {
                self.0 = other.0;
            }
        }
    }

    #[test]
    fn despawn_swaps_last_entity_into_the_gap() {
        let mut entities = Entities::new();
        let first = entities.spawn(Tag(Some(1)));
        let second = entities.spawn(Tag(Some(2)));
        let third = entities.spawn(Tag(Some(3)));

        assert_eq!(entities.despawn(first), Some(Tag(Some(1))));
        assert_eq!(entities.ids(), vec![third, second]);
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn recycled_slots_reject_stale_handles() {
        let mut entities = Entities::new();
        let stale = entities.spawn(Tag(Some(1)));
        assert!(entities.despawn(stale).is_some());

        let fresh = entities.spawn(Tag(Some(2)));
        assert_eq!(fresh.index(), stale.index());
        assert_ne!(fresh.generation(), stale.generation());

        assert!(!entities.contains(stale));
        assert!(entities.get_mut(stale).is_none());
        assert!(entities.despawn(stale).is_none());
        assert_eq!(entities.get(fresh), Some(&Tag(Some(2))));
    }

    #[test]
    fn despawning_the_last_live_entity_leaves_an_empty_arena() {
        let mut entities = Entities::new();
        let only = entities.spawn(Tag::default());
        assert!(entities.despawn(only).is_some());
        assert!(entities.is_empty());
        assert_eq!(entities.iter().count(), 0);
    }
}
