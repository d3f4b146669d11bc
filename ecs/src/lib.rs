#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Entity/component store and tick scheduler for Maze Quest.
//!
//! Entities are bags of optional components described by a [`ComponentSet`]
//! implementation. Systems declare the component kinds they operate on and
//! run once per [`Ecs::tick`], strictly in registration order, receiving an
//! explicit mutable context shared by every system of the tick.

mod entities;

use std::time::Duration;

pub use entities::{Entities, EntityId};

/// Optional-component storage for a single entity.
///
/// Implementors are plain structs of `Option` fields. A component is present
/// when its field is `Some`; adding a component sets the field and removing it
/// clears the field.
pub trait ComponentSet: Clone + Default {
    /// Tag naming one component field.
    type Kind: Copy + Eq + std::fmt::Debug;

    /// Reports whether the component is present.
    fn contains(&self, kind: Self::Kind) -> bool;

    /// Clears the component, returning whether it was present.
    fn remove(&mut self, kind: Self::Kind) -> bool;

    /// Installs every component present in `other`, replacing existing ones.
    fn absorb(&mut self, other: Self);
}

/// Per-entity system callback.
pub type EntitySystem<C, Ctx> = Box<dyn FnMut(&mut EntityMut<'_, C>, &mut Ctx, Duration)>;

/// System callback that sees every entity at once.
pub type CrossEntitySystem<C, Ctx> = Box<dyn FnMut(&mut Entities<C>, &mut Ctx, Duration)>;

/// Mutable access to one entity while a system runs.
///
/// The entity may be despawned through the handle; every accessor reports
/// absence afterwards instead of panicking.
#[derive(Debug)]
pub struct EntityMut<'a, C: ComponentSet> {
    id: EntityId,
    entities: &'a mut Entities<C>,
    prototypes: &'a [(C::Kind, C)],
}

impl<'a, C: ComponentSet> EntityMut<'a, C> {
    /// Handle of the entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Components of the entity, `None` once despawned.
    #[must_use]
    pub fn components(&self) -> Option<&C> {
        self.entities.get(self.id)
    }

    /// Mutable components of the entity, `None` once despawned.
    pub fn components_mut(&mut self) -> Option<&mut C> {
        self.entities.get_mut(self.id)
    }

    /// Reports whether the entity currently carries `kind`.
    #[must_use]
    pub fn has(&self, kind: C::Kind) -> bool {
        self.components()
            .is_some_and(|components| components.contains(kind))
    }

    /// Installs every component present in `bundle`.
    pub fn insert(&mut self, bundle: C) -> bool {
        match self.components_mut() {
            Some(components) => {
                components.absorb(bundle);
                true
            }
            None => false,
        }
    }

    /// Installs a copy of the registered prototype for `kind`.
    ///
    /// Returns `false` when the kind was never registered or the entity is gone.
    pub fn insert_default(&mut self, kind: C::Kind) -> bool {
        let Some((_, prototype)) = self
            .prototypes
            .iter()
            .find(|(registered, _)| *registered == kind)
        else {
            tracing::warn!(?kind, "component kind has no registered prototype");
            return false;
        };
        let bundle = prototype.clone();
        self.insert(bundle)
    }

    /// Removes one component, returning whether it was present.
    pub fn remove_component(&mut self, kind: C::Kind) -> bool {
        self.components_mut()
            .is_some_and(|components| components.remove(kind))
    }

    /// Despawns the entity, returning its last components.
    pub fn despawn(&mut self) -> Option<C> {
        self.entities.despawn(self.id)
    }

    /// Reports whether the entity no longer exists.
    #[must_use]
    pub fn is_despawned(&self) -> bool {
        !self.entities.contains(self.id)
    }
}

enum Runner<C: ComponentSet, Ctx> {
    PerEntity {
        required: Vec<C::Kind>,
        run: EntitySystem<C, Ctx>,
    },
    CrossEntity(CrossEntitySystem<C, Ctx>),
}

struct System<C: ComponentSet, Ctx> {
    name: &'static str,
    runner: Runner<C, Ctx>,
}

/// Entity store plus the ordered list of systems run on every tick.
pub struct Ecs<C: ComponentSet, Ctx> {
    entities: Entities<C>,
    prototypes: Vec<(C::Kind, C)>,
    systems: Vec<System<C, Ctx>>,
}

impl<C: ComponentSet, Ctx> Default for Ecs<C, Ctx> {
    fn default() -> Self {
        Self {
            entities: Entities::default(),
            prototypes: Vec::new(),
            systems: Vec::new(),
        }
    }
}

impl<C: ComponentSet, Ctx> std::fmt::Debug for Ecs<C, Ctx>
where
    C: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ecs")
            .field("entities", &self.entities)
            .field(
                "systems",
                &self.systems.iter().map(|system| system.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<C: ComponentSet, Ctx> Ecs<C, Ctx> {
    /// Creates an empty store without systems.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the prototype installed by [`EntityMut::insert_default`].
    ///
    /// Registering a kind twice replaces the earlier prototype.
    pub fn register_component(&mut self, kind: C::Kind, defaults: C) {
        debug_assert!(
            defaults.contains(kind),
            "prototype must carry the component it is registered for"
        );
        match self
            .prototypes
            .iter_mut()
            .find(|(registered, _)| *registered == kind)
        {
            Some((_, prototype)) => *prototype = defaults,
            None => self.prototypes.push((kind, defaults)),
        }
        tracing::debug!(?kind, "registered component");
    }

    /// Adds an entity carrying exactly `components`. It is visited by systems
    /// from the next tick on.
    pub fn spawn(&mut self, components: C) -> EntityId {
        self.entities.spawn(components)
    }

    /// Mutable handle to a live entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_, C>> {
        if !self.entities.contains(id) {
            return None;
        }
        Some(EntityMut {
            id,
            entities: &mut self.entities,
            prototypes: &self.prototypes,
        })
    }

    /// Read access to every entity.
    #[must_use]
    pub fn entities(&self) -> &Entities<C> {
        &self.entities
    }

    /// Write access to every entity.
    pub fn entities_mut(&mut self) -> &mut Entities<C> {
        &mut self.entities
    }

    /// Names of the registered systems in run order.
    pub fn system_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.iter().map(|system| system.name)
    }

    /// Appends a system run once per entity carrying every `required` kind.
    pub fn add_system<F>(&mut self, name: &'static str, required: &[C::Kind], run: F)
    where
        F: FnMut(&mut EntityMut<'_, C>, &mut Ctx, Duration) + 'static,
    {
        tracing::debug!(system = name, ?required, "registered system");
        self.systems.push(System {
            name,
            runner: Runner::PerEntity {
                required: required.to_vec(),
                run: Box::new(run),
            },
        });
    }

    /// Appends a system run once per tick with the whole entity collection.
    pub fn add_cross_entity_system<F>(&mut self, name: &'static str, run: F)
    where
        F: FnMut(&mut Entities<C>, &mut Ctx, Duration) + 'static,
    {
        tracing::debug!(system = name, "registered cross-entity system");
        self.systems.push(System {
            name,
            runner: Runner::CrossEntity(Box::new(run)),
        });
    }

    /// Runs every system once, in registration order.
    ///
    /// The live entity list is captured before the first system runs. An
    /// entity of that snapshot is visited by a per-entity system only while it
    /// is still alive and carries every required kind at the moment the
    /// system reaches it.
    pub fn tick(&mut self, timestamp: Duration, ctx: &mut Ctx) {
        let snapshot = self.entities.ids();
        let Self {
            entities,
            prototypes,
            systems,
        } = self;

        for system in systems.iter_mut() {
            match &mut system.runner {
                Runner::PerEntity { required, run } => {
                    for &id in &snapshot {
                        let Some(components) = entities.get(id) else {
                            continue;
                        };
                        if !required.iter().all(|kind| components.contains(*kind)) {
                            continue;
                        }
                        let mut entity = EntityMut {
                            id,
                            entities: &mut *entities,
                            prototypes: prototypes.as_slice(),
                        };
                        run(&mut entity, ctx, timestamp);
                    }
                }
                Runner::CrossEntity(run) => run(&mut *entities, ctx, timestamp),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Parts {
        health: Option<u32>,
        poison: Option<u32>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Part {
        Health,
        Poison,
    }

    impl ComponentSet for Parts {
        type Kind = Part;

        fn contains(&self, kind: Part) -> bool {
            match kind {
                Part::Health => self.health.is_some(),
                Part::Poison => self.poison.is_some(),
            }
        }

        fn remove(&mut self, kind: Part) -> bool {
            match kind {
                Part::Health => self.health.take().is_some(),
                Part::Poison => self.poison.take().is_some(),
            }
        }

        fn absorb(&mut self, other: Self) {
            if other.health.is_some() {
                self.health = other.health;
            }
            if other.poison.is_some() {
                self.poison = other.poison;
            }
        }
    }

    #[test]
    fn insert_default_clones_the_registered_prototype() {
        let mut ecs: Ecs<Parts, ()> = Ecs::new();
        ecs.register_component(
            Part::Poison,
            Parts {
                poison: Some(3),
                ..Parts::default()
            },
        );
        let id = ecs.spawn(Parts {
            health: Some(10),
            ..Parts::default()
        });

        let mut entity = ecs.entity_mut(id).expect("entity is alive");
        assert!(entity.insert_default(Part::Poison));
        assert_eq!(
            entity.components(),
            Some(&Parts {
                health: Some(10),
                poison: Some(3),
            })
        );
    }

    #[test]
    fn insert_default_refuses_unregistered_kinds() {
        let mut ecs: Ecs<Parts, ()> = Ecs::new();
        let id = ecs.spawn(Parts::default());
        let mut entity = ecs.entity_mut(id).expect("entity is alive");
        assert!(!entity.insert_default(Part::Health));
        assert!(!entity.has(Part::Health));
    }

    #[test]
    fn despawned_handle_reports_absence() {
        let mut ecs: Ecs<Parts, ()> = Ecs::new();
        let id = ecs.spawn(Parts {
            health: Some(1),
            ..Parts::default()
        });
        let mut entity = ecs.entity_mut(id).expect("entity is alive");
        assert!(entity.despawn().is_some());
        assert!(entity.is_despawned());
        assert!(!entity.insert(Parts::default()));
        assert!(!entity.remove_component(Part::Health));
        assert!(ecs.entity_mut(id).is_none());
    }

    #[test]
    fn systems_only_visit_entities_with_every_required_kind() {
        let mut ecs: Ecs<Parts, Vec<EntityId>> = Ecs::new();
        ecs.add_system("poisoned", &[Part::Health, Part::Poison], |entity, seen, _| {
            seen.push(entity.id());
        });
        let healthy = ecs.spawn(Parts {
            health: Some(5),
            ..Parts::default()
        });
        let poisoned = ecs.spawn(Parts {
            health: Some(5),
            poison: Some(1),
        });

        let mut seen = Vec::new();
        ecs.tick(Duration::ZERO, &mut seen);
        assert_eq!(seen, vec![poisoned]);
        assert!(!seen.contains(&healthy));
    }
}
