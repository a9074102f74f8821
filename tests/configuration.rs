//! Integration tests for per-type configuration.
//!
//! Covers configured arguments, configured allocators, forced plain
//! construction and the rule that a type is held under one configuration only.

use allocator_api2::alloc::Global;
use allocator_api2::vec::Vec;
use reside_singleton::resource::{
    new_delete_resource, LoggingResource, MemoryResource, MonotonicBufferResource,
    PolymorphicAllocator,
};
use reside_singleton::{
    Capabilities, Configure, Construct, ConstructError, DeclaredShape, DefaultConfig, Plain,
    ShapeKind, SingletonError, SingletonEvent, SingletonRegistry,
};
use serial_test::serial;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

#[derive(Debug)]
struct Pair {
    i: i32,
    d: f64,
}

impl Capabilities for Pair {
    type Shape = Plain;
}

impl Construct<(i32, f64)> for Pair {
    fn construct((i, d): (i32, f64)) -> Result<Self, ConstructError> {
        Ok(Pair { i, d })
    }
}

static ARENA: LazyLock<MonotonicBufferResource<'static>> =
    LazyLock::new(|| MonotonicBufferResource::new(1024 * 1024));

static ARENA_LOG: LazyLock<LoggingResource<'static>> =
    LazyLock::new(|| LoggingResource::new(&*ARENA));

struct ArenaPair;

impl Configure<Pair> for ArenaPair {
    type Alloc = PolymorphicAllocator<'static>;
    type Args = (i32, f64);
    type Shape = DeclaredShape;

    fn allocator() -> Self::Alloc {
        PolymorphicAllocator::new(&*ARENA_LOG)
    }

    fn base_arguments(_: &Self::Alloc) -> (i32, f64) {
        (3, 4.2)
    }
}

#[test]
fn test_pair_lives_in_the_configured_arena() {
    let mut registry = SingletonRegistry::new();

    let pair = registry.instance::<Pair, ArenaPair>().unwrap();
    assert_eq!(pair.i, 3);
    assert_eq!(pair.d, 4.2);

    let size = std::mem::size_of::<Pair>();
    assert_eq!(ARENA_LOG.bytes_allocated(), size);
    assert!(ARENA.owns(std::ptr::NonNull::from(pair).cast()));
    assert_eq!(ARENA.remaining(), ARENA.capacity() - size);

    assert_eq!(registry.shutdown(), 1);
    assert_eq!(ARENA_LOG.bytes_allocated(), 0);
    // Arena storage is never reused.
    assert_eq!(ARENA.remaining(), ARENA.capacity() - size);
}

struct Seeded {
    value: i32,
}

impl Capabilities for Seeded {
    type Shape = Plain;
}

impl Construct<(i32,)> for Seeded {
    fn construct((value,): (i32,)) -> Result<Self, ConstructError> {
        Ok(Seeded { value })
    }
}

static SEED: AtomicI32 = AtomicI32::new(0);

struct SeedConfig;

impl Configure<Seeded> for SeedConfig {
    type Alloc = allocator_api2::alloc::Global;
    type Args = (i32,);
    type Shape = DeclaredShape;

    fn allocator() -> Self::Alloc {
        allocator_api2::alloc::Global
    }

    fn base_arguments(_: &Self::Alloc) -> (i32,) {
        (SEED.load(Ordering::SeqCst),)
    }
}

#[test]
#[serial]
fn test_arguments_are_resolved_at_first_access() {
    let registry = SingletonRegistry::new();

    SEED.store(7, Ordering::SeqCst);
    let seeded = registry.instance::<Seeded, SeedConfig>().unwrap();
    assert_eq!(seeded.value, 7);

    // Later changes do not reach an instance that already exists.
    SEED.store(9, Ordering::SeqCst);
    let again = registry.instance::<Seeded, SeedConfig>().unwrap();
    assert_eq!(again.value, 7);
}

#[test]
#[serial]
fn test_seed_stored_before_first_access_is_used() {
    let first = SingletonRegistry::new();
    let second = SingletonRegistry::new();

    SEED.store(11, Ordering::SeqCst);
    let a = first.instance::<Seeded, SeedConfig>().unwrap().value;

    SEED.store(23, Ordering::SeqCst);
    let b = second.instance::<Seeded, SeedConfig>().unwrap().value;

    assert_eq!(a, 11);
    assert_eq!(b, 23);
    assert_ne!(a, b);
}

#[derive(Debug)]
struct Counter(u32);

impl Default for Counter {
    fn default() -> Self {
        Counter(1)
    }
}

impl Capabilities for Counter {
    type Shape = Plain;
}

impl Construct<(u32,)> for Counter {
    fn construct((start,): (u32,)) -> Result<Self, ConstructError> {
        Ok(Counter(start))
    }
}

struct StartAtHundred;

impl Configure<Counter> for StartAtHundred {
    type Alloc = allocator_api2::alloc::Global;
    type Args = (u32,);
    type Shape = DeclaredShape;

    fn allocator() -> Self::Alloc {
        allocator_api2::alloc::Global
    }

    fn base_arguments(_: &Self::Alloc) -> (u32,) {
        (100,)
    }
}

#[test]
fn test_override_replaces_default_arguments() {
    let defaulted = SingletonRegistry::new();
    let overridden = SingletonRegistry::new();

    assert_eq!(defaulted.instance::<Counter, DefaultConfig>().unwrap().0, 1);
    assert_eq!(overridden.instance::<Counter, StartAtHundred>().unwrap().0, 100);
}

#[test]
fn test_second_configuration_is_rejected() {
    let registry = SingletonRegistry::new();
    registry.instance::<Counter, StartAtHundred>().unwrap();

    let err = registry.instance::<Counter, DefaultConfig>().unwrap_err();
    assert!(matches!(err, SingletonError::ConfigurationMismatch { .. }));
    assert!(err.type_name().ends_with("Counter"));

    // The held instance is untouched.
    assert_eq!(registry.instance::<Counter, StartAtHundred>().unwrap().0, 100);
}

#[test]
fn test_allocator_is_resolved_once_per_construction() {
    static CALLS: AtomicI32 = AtomicI32::new(0);
    static LOG: LazyLock<LoggingResource<'static>> =
        LazyLock::new(|| LoggingResource::new(reside_singleton::resource::new_delete_resource()));

    struct Counted;

    impl Default for Counted {
        fn default() -> Self {
            Counted
        }
    }

    impl Capabilities for Counted {
        type Shape = Plain;
    }

    struct CountingConfig;

    impl Configure<Counted> for CountingConfig {
        type Alloc = PolymorphicAllocator<'static>;
        type Args = ();
        type Shape = DeclaredShape;

        fn allocator() -> Self::Alloc {
            CALLS.fetch_add(1, Ordering::SeqCst);
            PolymorphicAllocator::new(&*LOG as &dyn MemoryResource)
        }

        fn base_arguments(_: &Self::Alloc) {}
    }

    let registry = SingletonRegistry::new();
    for _ in 0..5 {
        registry.instance::<Counted, CountingConfig>().unwrap();
    }
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

static PLAIN_VEC_LOG: LazyLock<LoggingResource<'static>> =
    LazyLock::new(|| LoggingResource::new(new_delete_resource()));

type GlobalBytes = Vec<u8, Global>;

/// Storage from the logging resource; the vector keeps its own global allocator.
struct PolymorphicStorage;

impl Configure<GlobalBytes> for PolymorphicStorage {
    type Alloc = PolymorphicAllocator<'static>;
    type Args = ();
    type Shape = Plain;

    fn allocator() -> Self::Alloc {
        PolymorphicAllocator::new(&*PLAIN_VEC_LOG as &dyn MemoryResource)
    }

    fn base_arguments(_: &Self::Alloc) {}
}

#[test]
fn test_incompatible_allocator_constructs_plain() {
    let mut registry = SingletonRegistry::new();

    let strategies = Arc::new(Mutex::new(std::vec::Vec::new()));
    let strategies_clone = strategies.clone();
    registry.set_trace_callback(move |event| {
        if let SingletonEvent::Construct { strategy, .. } = event {
            strategies_clone.lock().unwrap().push(*strategy);
        }
    });

    let bytes = registry.instance::<GlobalBytes, PolymorphicStorage>().unwrap();
    assert!(bytes.is_empty());
    assert_eq!(bytes.capacity(), 0);
    let _: &Global = bytes.allocator();

    assert_eq!(*strategies.lock().unwrap(), vec![ShapeKind::Plain]);
    // Only the held object comes from the configured resource.
    assert_eq!(PLAIN_VEC_LOG.bytes_allocated(), std::mem::size_of::<GlobalBytes>());

    assert_eq!(registry.shutdown(), 1);
    assert_eq!(PLAIN_VEC_LOG.bytes_allocated(), 0);
}
