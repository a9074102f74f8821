//! Integration tests for argument shaping.
//!
//! Each widget records which constructor built it, so the tests can check
//! that the declared strategy picked the matching one.

use allocator_api2::vec::Vec;
use reside_singleton::resource::{
    new_delete_resource, same_resource, LoggingResource, MemoryResource, PolymorphicAllocator,
};
use reside_singleton::{
    shape_of, AllocatorArg, AllocatorAware, Capabilities, Configure, Construct, ConstructError,
    DeclaredShape, LeadingTaggedAllocator, Plain, ShapeKind, SingletonRegistry, TrailingAllocator,
};
use std::sync::LazyLock;

static WIDGET_LOG: LazyLock<LoggingResource<'static>> =
    LazyLock::new(|| LoggingResource::new(new_delete_resource()));

fn widget_allocator() -> PolymorphicAllocator<'static> {
    PolymorphicAllocator::new(&*WIDGET_LOG as &dyn MemoryResource)
}

/// Allocator from the widget log, base arguments `(42,)`.
struct WidgetConfig;

struct PlainWidget {
    built_by: ShapeKind,
    n: i32,
}

impl Capabilities for PlainWidget {
    type Shape = Plain;
}

impl Construct<(i32,)> for PlainWidget {
    fn construct((n,): (i32,)) -> Result<Self, ConstructError> {
        Ok(PlainWidget {
            built_by: ShapeKind::Plain,
            n,
        })
    }
}

struct TrailingWidget {
    built_by: ShapeKind,
    n: i32,
    alloc: PolymorphicAllocator<'static>,
}

impl AllocatorAware for TrailingWidget {
    type AllocatorType = PolymorphicAllocator<'static>;
}

impl Capabilities for TrailingWidget {
    type Shape = TrailingAllocator;
}

impl Construct<(i32, PolymorphicAllocator<'static>)> for TrailingWidget {
    fn construct((n, alloc): (i32, PolymorphicAllocator<'static>)) -> Result<Self, ConstructError> {
        Ok(TrailingWidget {
            built_by: ShapeKind::TrailingAllocator,
            n,
            alloc,
        })
    }
}

struct TaggedWidget {
    built_by: ShapeKind,
    n: i32,
    alloc: PolymorphicAllocator<'static>,
}

impl AllocatorAware for TaggedWidget {
    type AllocatorType = PolymorphicAllocator<'static>;
}

impl Capabilities for TaggedWidget {
    type Shape = LeadingTaggedAllocator;
}

impl Construct<(AllocatorArg, PolymorphicAllocator<'static>, i32)> for TaggedWidget {
    fn construct(
        (_, alloc, n): (AllocatorArg, PolymorphicAllocator<'static>, i32),
    ) -> Result<Self, ConstructError> {
        Ok(TaggedWidget {
            built_by: ShapeKind::LeadingTaggedAllocator,
            n,
            alloc,
        })
    }
}

macro_rules! widget_config {
    ($($widget:ty),*) => {
        $(
            impl Configure<$widget> for WidgetConfig {
                type Alloc = PolymorphicAllocator<'static>;
                type Args = (i32,);
                type Shape = DeclaredShape;

                fn allocator() -> Self::Alloc {
                    widget_allocator()
                }

                fn base_arguments(_: &Self::Alloc) -> (i32,) {
                    (42,)
                }
            }
        )*
    };
}

widget_config!(PlainWidget, TrailingWidget, TaggedWidget);

#[test]
fn test_plain_widget_gets_base_arguments_only() {
    let registry = SingletonRegistry::new();
    let widget = registry.instance::<PlainWidget, WidgetConfig>().unwrap();

    assert_eq!(widget.built_by, ShapeKind::Plain);
    assert_eq!(widget.n, 42);
}

#[test]
fn test_trailing_widget_gets_allocator_last() {
    let registry = SingletonRegistry::new();
    let widget = registry.instance::<TrailingWidget, WidgetConfig>().unwrap();

    assert_eq!(widget.built_by, ShapeKind::TrailingAllocator);
    assert_eq!(widget.n, 42);
    assert!(same_resource(widget.alloc.resource(), &*WIDGET_LOG));
}

#[test]
fn test_tagged_widget_gets_tag_and_allocator_first() {
    let registry = SingletonRegistry::new();
    let widget = registry.instance::<TaggedWidget, WidgetConfig>().unwrap();

    assert_eq!(widget.built_by, ShapeKind::LeadingTaggedAllocator);
    assert_eq!(widget.n, 42);
    assert!(same_resource(widget.alloc.resource(), &*WIDGET_LOG));
}

#[test]
fn test_declared_strategy_is_observable() {
    assert_eq!(shape_of::<PlainWidget>(), ShapeKind::Plain);
    assert_eq!(shape_of::<TrailingWidget>(), ShapeKind::TrailingAllocator);
    assert_eq!(shape_of::<TaggedWidget>(), ShapeKind::LeadingTaggedAllocator);
    assert_eq!(shape_of::<String>(), ShapeKind::Plain);
}

type LoggedVec = Vec<u32, PolymorphicAllocator<'static>>;

static VEC_LOG: LazyLock<LoggingResource<'static>> =
    LazyLock::new(|| LoggingResource::new(new_delete_resource()));

/// A vector with room for sixteen elements, all storage from the vector log.
struct SixteenSlots;

impl Configure<LoggedVec> for SixteenSlots {
    type Alloc = PolymorphicAllocator<'static>;
    type Args = (usize,);
    type Shape = DeclaredShape;

    fn allocator() -> Self::Alloc {
        PolymorphicAllocator::new(&*VEC_LOG as &dyn MemoryResource)
    }

    fn base_arguments(_: &Self::Alloc) -> (usize,) {
        (16,)
    }
}

#[test]
fn test_vector_storage_and_buffer_share_the_allocator() {
    let mut registry = SingletonRegistry::new();

    let v = registry.instance::<LoggedVec, SixteenSlots>().unwrap();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), 16);
    assert!(same_resource(v.allocator().resource(), &*VEC_LOG));

    let expected = std::mem::size_of::<LoggedVec>() + 16 * std::mem::size_of::<u32>();
    assert_eq!(VEC_LOG.bytes_allocated(), expected);

    registry.shutdown();
    assert_eq!(VEC_LOG.bytes_allocated(), 0);
}
