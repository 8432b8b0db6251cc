use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::define_component;
use crate::ecs::*;
use crate::spawn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Default, Clone, PartialEq)]
struct A(u32);
#[derive(Debug, Default, Clone, PartialEq)]
struct B(u32);
#[derive(Debug, Default, Clone, PartialEq)]
struct C(u32);
#[derive(Debug, Default, Clone, PartialEq)]
struct D;

define_component!(A);
define_component!(B);
define_component!(C);
define_component!(D);

fn ecs() -> Ecs {
    Ecs::with_config(EcsConfig {
        initial_capacity: 4,
        max_pool_size: 10,
        prefill_entity_pool: false,
        decay_interval_secs: 1.0,
        ..EcsConfig::default()
    })
}

/// Records every hook call.
#[derive(Debug, Default)]
struct Recorder<const N: usize> {
    added: Vec<Entity>,
    removed: Vec<Entity>,
    visited: Vec<Entity>,
    begins: u32,
    ends: u32,
}

impl<const N: usize> System for Recorder<N> {
    fn begin(&mut self, _ecs: &mut Ecs) -> EcsResult<()> {
        self.begins += 1;
        Ok(())
    }

    fn end(&mut self, _ecs: &mut Ecs) -> EcsResult<()> {
        self.ends += 1;
        Ok(())
    }

    fn entity_added(&mut self, _ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        self.added.push(entity);
        Ok(())
    }

    fn entity_removed(&mut self, _ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        self.removed.push(entity);
        Ok(())
    }

    fn process_entity(&mut self, _ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        self.visited.push(entity);
        Ok(())
    }
}

fn sorted(mut entities: Vec<Entity>) -> Vec<Entity> {
    entities.sort();
    entities
}

#[test]
fn membership_follows_clean_passes() {
    let mut ecs = ecs();
    let entities: Vec<Entity> = (0..5).map(|_| ecs.create().unwrap()).collect();
    for &entity in &entities {
        assert!(ecs.add_component(entity, A(1)).unwrap());
    }
    let system = ecs.register_system_with::<(A,), _>(Recorder::<0>::default()).unwrap();
    ecs.initialize().unwrap();

    assert!(ecs.members(system).is_empty());

    ecs.clean().unwrap();
    assert_eq!(sorted(ecs.members(system).to_vec()), entities);

    assert!(ecs.remove_component::<A>(entities[1]).unwrap());
    assert!(ecs.remove_component::<A>(entities[3]).unwrap());
    assert_eq!(ecs.members(system).len(), 5);

    ecs.clean().unwrap();
    assert_eq!(
        sorted(ecs.members(system).to_vec()),
        vec![entities[0], entities[2], entities[4]]
    );
    assert!(!ecs.is_alive(entities[1]));
    assert!(!ecs.is_alive(entities[3]));
    assert_eq!(ecs.entity_count(), 3);
    assert_eq!(ecs.entity_manager().pool().len(), 2);

    let recorder = ecs.get_system::<Recorder<0>>().unwrap();
    assert_eq!(recorder.added.len(), 5);
    assert_eq!(sorted(recorder.removed.clone()), vec![entities[1], entities[3]]);
}

#[test]
fn systems_track_their_own_groups() {
    let mut ecs = ecs();
    let s1 = ecs.register_system_with::<(A,), _>(Recorder::<1>::default()).unwrap();
    let s2 = ecs.register_system_with::<(A, B), _>(Recorder::<2>::default()).unwrap();
    ecs.initialize().unwrap();

    let e = spawn!(ecs, A(1)).unwrap();
    ecs.clean().unwrap();
    assert_eq!(ecs.members(s1), &[e]);
    assert!(ecs.members(s2).is_empty());
    assert_eq!(ecs.system_mask(e), Some(s1.bit()));

    ecs.add_component(e, B(2)).unwrap();
    ecs.clean().unwrap();
    assert_eq!(ecs.members(s1), &[e]);
    assert_eq!(ecs.members(s2), &[e]);
    assert_eq!(ecs.system_count(e), 2);
}

#[test]
fn freed_id_is_reused_exactly_once() {
    let mut ecs = ecs();
    ecs.get_type::<A>().unwrap();
    ecs.initialize().unwrap();
    let doomed = ecs.create().unwrap();
    let keeper = ecs.create().unwrap();
    ecs.add_component(keeper, A(0)).unwrap();

    ecs.remove(doomed).unwrap();
    assert!(ecs.is_alive(doomed));
    ecs.clean().unwrap();
    assert!(!ecs.is_alive(doomed));

    let reused = ecs.create().unwrap();
    let fresh = ecs.create().unwrap();
    assert_eq!(reused.id(), doomed.id());
    assert_ne!(fresh.id(), doomed.id());
    assert_ne!(fresh.id(), keeper.id());
}

#[test]
fn revalidation_is_idempotent() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Recorder::<0>::default()).unwrap();
    ecs.get_type::<B>().unwrap();
    ecs.initialize().unwrap();
    let e = spawn!(ecs, A(1), B(1)).unwrap();

    ecs.clean().unwrap();
    ecs.clean().unwrap();
    assert!(!ecs.enable(e).unwrap());
    ecs.clean().unwrap();

    assert_eq!(ecs.members(system), &[e]);
    let recorder = ecs.get_system::<Recorder<0>>().unwrap();
    assert_eq!(recorder.added, vec![e]);
    assert!(recorder.removed.is_empty());
}

#[test]
fn replacing_a_component_keeps_membership() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Recorder::<0>::default()).unwrap();
    ecs.initialize().unwrap();
    let e = spawn!(ecs, A(1)).unwrap();
    ecs.clean().unwrap();

    assert!(!ecs.add_component(e, A(2)).unwrap());
    assert!(!ecs.is_dirty(e));
    ecs.clean().unwrap();

    assert_eq!(ecs.get::<A>(e), Some(&A(2)));
    assert_eq!(ecs.members(system), &[e]);
    let stats = ecs.statistics();
    assert_eq!(stats.components_active, 1);
    assert_eq!(stats.components_lost, 1);
    assert_eq!(ecs.get_system::<Recorder<0>>().unwrap().added.len(), 1);
}

#[test]
fn replaced_component_is_pooled_when_a_pool_exists() {
    let mut ecs = ecs();
    ecs.register_component_pool(ComponentPool::<A>::with_default(4, 4).with_reset(|a| a.0 = 0))
        .unwrap();
    ecs.initialize().unwrap();
    let e = spawn!(ecs, A(1)).unwrap();
    ecs.add_component(e, A(2)).unwrap();

    let stats = ecs.statistics();
    assert_eq!(stats.components_lost, 0);
    assert_eq!(stats.components_pooled, 1);
    assert_eq!(ecs.obtain::<A>().unwrap(), A(0));
}

#[test]
fn pool_round_trip_through_the_ecs() {
    let mut ecs = ecs();
    ecs.register_component_pool(ComponentPool::new(2, 2, || B(7))).unwrap();
    ecs.initialize().unwrap();

    let e = ecs.create().unwrap();
    let b = ecs.obtain::<B>().unwrap();
    assert_eq!(b, B(7));
    ecs.add_component(e, B(99)).unwrap();
    ecs.remove_component::<B>(e).unwrap();

    assert_eq!(ecs.obtain::<B>().unwrap(), B(99));
    assert!(matches!(
        ecs.obtain::<A>(),
        Err(EcsError::IllegalLifecycleState { .. })
    ));
}

#[test]
fn idle_container_is_refitted_exactly_once() {
    let mut ecs = ecs();
    ecs.get_type::<C>().unwrap();
    ecs.initialize().unwrap();
    let entities: Vec<Entity> = (0..12)
        .map(|n| spawn!(ecs, C(n)).unwrap())
        .collect();
    for &entity in &entities {
        ecs.remove(entity).unwrap();
    }
    ecs.clean().unwrap();
    assert_eq!(ecs.entity_count(), 0);

    for _ in 0..14 {
        ecs.update(1.5).unwrap();
    }
    let stats = ecs.statistics();
    assert_eq!(stats.container_refits, 1);
    assert_eq!(stats.types[0].container_capacity, 4);

    for _ in 0..30 {
        ecs.update(1.5).unwrap();
    }
    assert_eq!(ecs.statistics().container_refits, 1);

    // already at its resting size, so a second firing refits nothing
    spawn!(ecs, C(0)).unwrap();
    for _ in 0..14 {
        ecs.update(1.5).unwrap();
    }
    assert_eq!(ecs.statistics().container_refits, 1);
}

/// Strips `A` from every entity it visits and forces a clean mid-pass.
#[derive(Default)]
struct Stripper {
    visited: Vec<Entity>,
    members_seen: Vec<usize>,
    removed: Vec<Entity>,
}

impl System for Stripper {
    fn process_entity(&mut self, ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        self.visited.push(entity);
        ecs.remove_component::<A>(entity)?;
        ecs.clean()?;
        if let Some(handle) = ecs.system_handle::<Stripper>() {
            self.members_seen.push(ecs.members(handle).len());
        }
        Ok(())
    }

    fn entity_removed(&mut self, _ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        self.removed.push(entity);
        Ok(())
    }
}

#[test]
fn removals_during_a_pass_are_staged() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Stripper::default()).unwrap();
    ecs.initialize().unwrap();
    let entities: Vec<Entity> = (0..5).map(|n| spawn!(ecs, A(n)).unwrap()).collect();

    ecs.process(system).unwrap();

    let stripper = ecs.get_system::<Stripper>().unwrap();
    assert_eq!(sorted(stripper.visited.clone()), entities);
    assert_eq!(stripper.members_seen, vec![5; 5]);
    assert_eq!(sorted(stripper.removed.clone()), entities);
    assert!(ecs.members(system).is_empty());
    assert!(!ecs.is_processing(system));

    // entities stayed alive while listed, and go on the next clean
    assert_eq!(ecs.entity_count(), 5);
    ecs.clean().unwrap();
    assert_eq!(ecs.entity_count(), 0);
}

/// Adds `B` to every visited entity, which makes it eligible for `Recorder<3>`.
#[derive(Default)]
struct Tagger;

impl System for Tagger {
    fn process_entity(&mut self, ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        ecs.add_component(entity, B(0))?;
        if let Some(recorder) = ecs.system_handle::<Recorder<3>>() {
            // other systems are processed normally from inside a pass
            ecs.process(recorder)?;
        }
        if let Some(me) = ecs.system_handle::<Tagger>() {
            // re-entering the running system is ignored
            ecs.process(me)?;
        }
        Ok(())
    }
}

#[test]
fn nested_processing() {
    let mut ecs = ecs();
    let tagger = ecs.register_system_with::<(A,), _>(Tagger).unwrap();
    let recorder = ecs.register_system_with::<(B,), _>(Recorder::<3>::default()).unwrap();
    ecs.initialize().unwrap();
    let first = spawn!(ecs, A(0)).unwrap();
    let second = spawn!(ecs, A(1)).unwrap();

    ecs.process(tagger).unwrap();

    let recorder_state = ecs.get_system::<Recorder<3>>().unwrap();
    assert_eq!(recorder_state.begins, 2);
    assert_eq!(recorder_state.ends, 2);
    // the first nested pass sees the first entity, the second sees both
    assert_eq!(recorder_state.visited, vec![first, first, second]);
    assert_eq!(sorted(ecs.members(recorder).to_vec()), vec![first, second]);
    assert_eq!(sorted(ecs.members(tagger).to_vec()), vec![first, second]);
}

#[test]
fn process_variants_and_activation() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Recorder::<0>::default()).unwrap();
    ecs.initialize().unwrap();
    let e = spawn!(ecs, A(0)).unwrap();

    let mut seen = Vec::new();
    ecs.process_with(system, |ecs, entity| {
        seen.push((entity, ecs.get::<A>(entity).cloned()));
        Ok(())
    })
    .unwrap();
    assert_eq!(seen, vec![(e, Some(A(0)))]);

    ecs.deactivate(system);
    ecs.process(system).unwrap();
    ecs.process_with_delta(system, 0.5).unwrap();
    assert_eq!(ecs.get_system::<Recorder<0>>().unwrap().begins, 1);

    ecs.activate(system);
    ecs.process(system).unwrap();
    let recorder = ecs.get_system::<Recorder<0>>().unwrap();
    assert_eq!(recorder.begins, 2);
    assert_eq!(recorder.visited, vec![e]);
}

#[test]
fn disabled_entities_leave_systems() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Recorder::<0>::default()).unwrap();
    ecs.initialize().unwrap();
    let e = spawn!(ecs, A(0)).unwrap();
    ecs.clean().unwrap();

    assert!(ecs.disable(e).unwrap());
    assert!(!ecs.disable(e).unwrap());
    ecs.clean().unwrap();
    assert!(ecs.members(system).is_empty());
    assert!(ecs.is_alive(e));
    assert!(!ecs.is_enabled(e));

    assert!(ecs.enable(e).unwrap());
    ecs.clean().unwrap();
    assert_eq!(ecs.members(system), &[e]);
}

#[test]
fn component_mask_matches_storage() {
    let mut ecs = ecs();
    ecs.register_system_with::<(A, C), _>(Recorder::<0>::default()).unwrap();
    let a = ecs.getter::<A>().unwrap();
    let b = ecs.getter::<B>().unwrap();
    let c = ecs.getter::<C>().unwrap();
    ecs.initialize().unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(0x2545_f491);
    let mut entities: Vec<Entity> = Vec::new();
    for step in 0..400 {
        if entities.is_empty() || rng.gen_ratio(1, 7) {
            entities.push(ecs.create().unwrap());
            continue;
        }
        let entity = entities[rng.gen_range(0..entities.len())];
        if !ecs.is_alive(entity) {
            entities.retain(|&e| e != entity);
            continue;
        }
        match rng.gen_range(0..11) {
            0 | 1 => assert!(ecs.add_component(entity, A(step)).is_ok()),
            2 | 3 => assert!(ecs.add_component(entity, B(step)).is_ok()),
            4 => assert!(ecs.add_components(entity, (C(step), A(step))).is_ok()),
            5 => assert!(ecs.remove_component::<A>(entity).is_ok()),
            6 => assert!(ecs.remove_component::<C>(entity).is_ok()),
            7 => assert!(ecs.remove(entity).is_ok()),
            8 => assert!(ecs.disable(entity).is_ok()),
            9 => assert!(ecs.enable(entity).is_ok()),
            _ => ecs.clean().unwrap(),
        }

        for &entity in &entities {
            let Some(mask) = ecs.component_mask(entity) else {
                continue;
            };
            assert_eq!(a.has(&ecs, entity), a.get(&ecs, entity).is_some());
            assert_eq!(b.has(&ecs, entity), b.get(&ecs, entity).is_some());
            assert_eq!(c.has(&ecs, entity), c.get(&ecs, entity).is_some());
            assert_eq!(mask.count_ones(), ecs.component_count(entity));
        }
    }
    assert_eq!(
        ecs.statistics().components_active as usize,
        ecs.entity_manager()
            .iter()
            .map(|record| record.component_count() as usize)
            .sum::<usize>()
    );
}

#[test]
fn bundle_with_an_unknown_type_attaches_nothing() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Recorder::<0>::default()).unwrap();
    ecs.initialize().unwrap();
    let e = ecs.create().unwrap();

    assert!(matches!(
        ecs.add_components(e, (A(1), D)),
        Err(EcsError::IllegalLifecycleState { .. })
    ));
    assert_eq!(ecs.get::<A>(e), None);
    assert_eq!(ecs.component_mask(e), Some(0));
    assert_eq!(ecs.statistics().components_active, 0);

    // the entity is still usable and joins once it really carries A
    assert!(ecs.add_components(e, (A(2),)).unwrap());
    assert!(ecs.is_dirty(e));
    ecs.clean().unwrap();
    assert_eq!(ecs.members(system), &[e]);
}

/// Spawns a fresh `A` entity from inside its own pass, once.
#[derive(Default)]
struct Breeder {
    visited: Vec<Entity>,
    offspring: Option<Entity>,
}

impl System for Breeder {
    fn process_entity(&mut self, ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        self.visited.push(entity);
        if self.offspring.is_none() {
            self.offspring = Some(spawn!(*ecs, A(99))?);
            ecs.clean()?;
        }
        Ok(())
    }
}

#[test]
fn additions_during_a_pass_are_staged() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Breeder::default()).unwrap();
    ecs.initialize().unwrap();
    let first = spawn!(ecs, A(0)).unwrap();
    let second = spawn!(ecs, A(1)).unwrap();

    ecs.process(system).unwrap();

    let breeder = ecs.get_system::<Breeder>().unwrap();
    let offspring = breeder.offspring.unwrap();
    assert_eq!(sorted(breeder.visited.clone()), vec![first, second]);
    assert_eq!(sorted(ecs.members(system).to_vec()), vec![first, second, offspring]);
    assert_eq!(ecs.system_mask(offspring), Some(system.bit()));

    ecs.process(system).unwrap();
    let breeder = ecs.get_system::<Breeder>().unwrap();
    assert_eq!(breeder.visited.len(), 5);
    assert!(breeder.visited[2..].contains(&offspring));
}

#[test]
fn staged_change_is_rechecked_when_applied() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(B,), _>(Recorder::<4>::default()).unwrap();
    ecs.get_type::<A>().unwrap();
    ecs.initialize().unwrap();
    let host = spawn!(ecs, B(1)).unwrap();
    let guest = spawn!(ecs, A(1)).unwrap();
    ecs.clean().unwrap();

    // the guest qualifies and stops qualifying while the pass runs
    ecs.process_with(system, |ecs, entity| {
        if entity == host {
            ecs.add_component(guest, B(0))?;
            ecs.clean()?;
            ecs.remove_component::<B>(guest)?;
            ecs.clean()?;
        }
        Ok(())
    })
    .unwrap();

    assert_eq!(ecs.members(system), &[host]);
    assert_eq!(ecs.system_mask(guest), Some(0));
    let recorder = ecs.get_system::<Recorder<4>>().unwrap();
    assert_eq!(recorder.added, vec![host]);
    assert!(recorder.removed.is_empty());
}

/// Removes `A` from its entity, then fails.
#[derive(Default)]
struct Faulty;

impl System for Faulty {
    fn process_entity(&mut self, ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        ecs.remove_component::<A>(entity)?;
        ecs.clean()?;
        Err(EcsError::EntityNotAlive { id: entity.id() })
    }
}

#[test]
fn failed_pass_still_settles_staged_changes() {
    let mut ecs = ecs();
    let system = ecs.register_system_with::<(A,), _>(Faulty).unwrap();
    ecs.get_type::<B>().unwrap();
    ecs.initialize().unwrap();
    let e = spawn!(ecs, A(0), B(0)).unwrap();

    assert!(ecs.process(system).is_err());
    assert!(!ecs.is_processing(system));
    assert!(ecs.members(system).is_empty());
    assert_eq!(ecs.system_mask(e), Some(0));

    // nothing stale is left behind for the next pass
    ecs.process(system).unwrap();
    assert!(ecs.is_alive(e));
}

#[test]
fn registration_closes_at_initialize() {
    let mut ecs = ecs();
    let group = ecs.group_of::<(A,)>().unwrap();
    ecs.initialize().unwrap();
    ecs.initialize().unwrap();

    assert!(matches!(
        ecs.register_system(Recorder::<0>::default(), group),
        Err(EcsError::IllegalLifecycleState { phase: Phase::Initialized, .. })
    ));
    assert!(matches!(
        ecs.register_component_pool(ComponentPool::<A>::with_default(1, 1)),
        Err(EcsError::IllegalLifecycleState { .. })
    ));

    let e = ecs.create().unwrap();
    assert!(ecs.add_component(e, A(1)).unwrap());
    assert!(matches!(
        ecs.add_component(e, D),
        Err(EcsError::IllegalLifecycleState { .. })
    ));
    assert_eq!(ecs.group_of::<(A,)>().unwrap(), group);
    assert!(ecs.group_of::<(A, B)>().is_err());
}

#[test]
fn duplicate_pool_is_rejected() {
    let mut ecs = ecs();
    ecs.register_component_pool(ComponentPool::<A>::with_default(1, 1)).unwrap();
    assert_eq!(
        ecs.register_component_pool(ComponentPool::<A>::with_default(1, 1)),
        Err(EcsError::DuplicatePoolRegistration { type_name: "A" })
    );
}

#[test]
fn dead_entities_are_rejected() {
    let mut ecs = ecs();
    let e = ecs.create().unwrap();
    ecs.remove(e).unwrap();
    ecs.clean().unwrap();
    assert_eq!(
        ecs.add_component(e, A(0)),
        Err(EcsError::EntityNotAlive { id: e.id() })
    );
    assert!(ecs.remove(e).is_err());
    assert!(ecs.enable(e).is_err());
}

struct Sys<const N: usize>;
impl<const N: usize> System for Sys<N> {}

#[test]
fn sixty_fifth_system_is_rejected() {
    let mut ecs = ecs();
    let group = ecs.group_of::<(A,)>().unwrap();
    macro_rules! register_all {
        ($($n:literal)*) => {
            $( ecs.register_system(Sys::<$n>, group).unwrap(); )*
        };
    }
    register_all!(
        0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
        32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59 60
        61 62 63
    );
    assert_eq!(ecs.systems().len(), MAX_SYSTEMS);
    assert_eq!(
        ecs.register_system(Sys::<64>, group),
        Err(EcsError::CapacityExceeded { resource: "system", limit: 64 })
    );
    // an already registered type still resolves
    assert!(ecs.register_system(Sys::<5>, group).is_ok());
}

struct Watch {
    removed: Rc<Cell<u32>>,
    terminated: Rc<Cell<bool>>,
}

impl System for Watch {
    fn entity_removed(&mut self, _ecs: &mut Ecs, _entity: Entity) -> EcsResult<()> {
        self.removed.set(self.removed.get() + 1);
        Ok(())
    }

    fn terminate(&mut self, _ecs: &mut Ecs) -> EcsResult<()> {
        self.terminated.set(true);
        Ok(())
    }
}

#[test]
fn terminate_tears_everything_down() {
    let removed = Rc::new(Cell::new(0));
    let terminated = Rc::new(Cell::new(false));
    let mut ecs = ecs();
    ecs.register_component_pool(ComponentPool::<A>::with_default(4, 8)).unwrap();
    ecs.register_system_with::<(A,), _>(Watch {
        removed: Rc::clone(&removed),
        terminated: Rc::clone(&terminated),
    })
    .unwrap();
    ecs.get_type::<B>().unwrap();
    ecs.initialize().unwrap();
    for n in 0..3 {
        spawn!(ecs, A(n), B(n)).unwrap();
    }
    ecs.clean().unwrap();

    ecs.terminate().unwrap();
    assert_eq!(ecs.phase(), Phase::Terminated);
    assert_eq!(removed.get(), 3);
    assert!(terminated.get());
    assert_eq!(ecs.entity_count(), 0);
    assert!(ecs.systems().is_empty());

    let stats = ecs.statistics();
    assert_eq!(stats.components_active, 0);
    assert_eq!(stats.entities_pooled, 0);
    assert_eq!(stats.components_pooled, 0);

    assert!(matches!(
        ecs.terminate(),
        Err(EcsError::IllegalLifecycleState { phase: Phase::Terminated, .. })
    ));
    assert!(ecs.create().is_err());
    assert!(ecs.initialize().is_err());
}

#[test]
fn statistics_are_readable_from_another_thread() {
    let mut ecs = ecs();
    ecs.get_type::<A>().unwrap();
    ecs.initialize().unwrap();
    for n in 0..3 {
        spawn!(ecs, A(n)).unwrap();
    }
    let handle = ecs.statistics_handle();
    ecs.update(0.25).unwrap();

    let snapshot = std::thread::spawn(move || handle.snapshot())
        .join()
        .unwrap();
    assert_eq!(snapshot.entities_active, 3);
    assert_eq!(snapshot.entities_dirty, 3);
    assert_eq!(snapshot.components_active, 3);
    assert_eq!(snapshot.updates, 1);
    assert!(snapshot.simulated_secs > 0.2);
    assert_eq!(snapshot.types[0].name, "A");
}

#[test]
fn getter_reads_through_cached_type() {
    let mut ecs = ecs();
    let velocity = ecs.getter::<B>().unwrap();
    ecs.get_type::<A>().unwrap();
    ecs.initialize().unwrap();
    let e = spawn!(ecs, A(1), B(2)).unwrap();

    assert_eq!(velocity.get(&ecs, e), Some(&B(2)));
    assert_eq!(velocity.get_unchecked(&ecs, e), Some(&B(2)));
    if let Some(b) = velocity.get_mut(&mut ecs, e) {
        b.0 = 5;
    }
    assert_eq!(ecs.get::<B>(e), Some(&B(5)));
    assert_eq!(velocity.component_type().name(), "B");
}

#[test]
fn decay_interval_comes_from_config() {
    let ecs = ecs();
    assert_eq!(
        ecs.components().control().timer().interval(),
        Duration::from_secs(1)
    );
}
