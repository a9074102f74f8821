//! The one true Foo: a singleton living in a preallocated arena.
//!
//! Demonstrates:
//! - Configuring a held type's allocator and constructor arguments
//! - A logging resource tracing every allocation over a 1 MiB monotonic buffer
//! - An allocator-aware vector receiving the configured allocator
//! - A type with no configuration at all
//! - Explicit teardown of the process-wide registry
//!
//! Run with: `cargo run --example one_true_foo`

use allocator_api2::vec::Vec;
use reside_singleton::resource::{
    new_delete_resource, set_default_resource, LoggingResource, MemoryResource,
    MonotonicBufferResource, PolymorphicAllocator,
};
use reside_singleton::{
    Capabilities, Configure, Construct, ConstructError, DeclaredShape, Plain, Singleton,
    SingletonError,
};
use std::sync::LazyLock;

// Memory set aside up front. Requests beyond it go to the heap.
static BUFFER: LazyLock<MonotonicBufferResource<'static>> =
    LazyLock::new(|| MonotonicBufferResource::new(1024 * 1024));

static FOO_RESOURCE: LazyLock<LoggingResource<'static>> = LazyLock::new(|| {
    let resource = LoggingResource::new(&*BUFFER);
    resource.set_trace_callback(|event| println!("{event}"));
    resource
});

fn foo_allocator() -> PolymorphicAllocator<'static> {
    PolymorphicAllocator::new(&*FOO_RESOURCE as &dyn MemoryResource)
}

// -------------------------------------------------------------------------
// The one true Foo
// -------------------------------------------------------------------------

struct TheOneTrueFoo {
    d: f64,
    i: i32,
    _scratch: [u8; 1024],
}

impl TheOneTrueFoo {
    fn boop(&self) {
        println!("Booping a foo [i={}, d={}].", self.i, self.d);
    }
}

impl Capabilities for TheOneTrueFoo {
    type Shape = Plain;
}

impl Construct<(i32, f64)> for TheOneTrueFoo {
    fn construct((i, d): (i32, f64)) -> Result<Self, ConstructError> {
        println!("Foo constructor.");
        Ok(TheOneTrueFoo {
            d,
            i,
            _scratch: [0; 1024],
        })
    }
}

impl Drop for TheOneTrueFoo {
    fn drop(&mut self) {
        println!("Foo destructor.");
    }
}

struct FooConfig;

impl Configure<TheOneTrueFoo> for FooConfig {
    type Alloc = PolymorphicAllocator<'static>;
    type Args = (i32, f64);
    type Shape = DeclaredShape;

    // Called lazily, so the allocator could just as well be chosen at runtime.
    fn allocator() -> Self::Alloc {
        foo_allocator()
    }

    fn base_arguments(_: &Self::Alloc) -> Self::Args {
        (3, 4.2)
    }
}

// -------------------------------------------------------------------------
// An allocator-aware vector
// -------------------------------------------------------------------------

type ResourceVec = Vec<i32, PolymorphicAllocator<'static>>;

struct ResourceVecConfig;

impl Configure<ResourceVec> for ResourceVecConfig {
    type Alloc = PolymorphicAllocator<'static>;
    type Args = ();
    type Shape = DeclaredShape;

    fn allocator() -> Self::Alloc {
        foo_allocator()
    }

    fn base_arguments(_: &Self::Alloc) {}
}

#[derive(Default)]
struct SomeType;

impl Capabilities for SomeType {
    type Shape = Plain;
}

fn main() -> Result<(), SingletonError> {
    println!("=== reside-singleton: The One True Foo ===\n");

    set_default_resource(new_delete_resource());
    reside_singleton::set_trace_callback(|event| println!("[singleton] {event}"));

    let foo = Singleton::<TheOneTrueFoo, FooConfig>::instance()?;
    foo.boop();

    // The vector's storage and the allocator it keeps both come from FOO_RESOURCE.
    let numbers = Singleton::<ResourceVec, ResourceVecConfig>::instance()?;
    println!("Vector holds {} numbers.", numbers.len());

    // A type that needs nothing special needs no configuration either.
    let _some = Singleton::<SomeType>::instance()?;

    println!("\nBytes held by the arena resource: {}", FOO_RESOURCE.bytes_allocated());
    println!("Arena bytes remaining: {}\n", BUFFER.remaining());

    // SAFETY: `foo`, `numbers` and `_some` are not used past this point.
    let released = unsafe { reside_singleton::shutdown() };
    println!("\nReleased {released} singletons.");
    println!("Bytes held by the arena resource: {}", FOO_RESOURCE.bytes_allocated());

    println!("Main exiting.");
    Ok(())
}
