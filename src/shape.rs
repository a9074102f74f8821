//! Argument shaping.
//!
//! A held type declares one of three construction strategies through
//! [`Capabilities::Shape`](crate::Capabilities::Shape). The strategy decides, at
//! compile time, how the configured allocator is merged into the base
//! constructor arguments:
//!
//! | strategy | constructor receives |
//! |---|---|
//! | [`Plain`] | `(args...)` |
//! | [`TrailingAllocator`] | `(args..., allocator)` |
//! | [`LeadingTaggedAllocator`] | `(AllocatorArg, allocator, args...)` |
//!
//! The configuration has the last word: its
//! [`Configure::Shape`](crate::Configure::Shape) is either [`DeclaredShape`],
//! which follows the type's declaration, or one of the strategies above. A
//! configuration whose allocator the type cannot rebind to selects [`Plain`],
//! and the base arguments reach the constructor unchanged.
//!
//! Only the argument values are produced at construction time; the strategy
//! never changes for a given type and configuration. Selecting an allocator
//! strategy for a type that lacks the matching constructor is a compile error.

use std::fmt;

use crate::capability::{
    AllocatorArg, Capabilities, CompatibleAllocator, Construct, ConstructError,
    HasTaggedAllocatorConstructor, HasTrailingAllocatorConstructor,
};

/// The closed set of construction strategies, as a runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Plain,
    TrailingAllocator,
    LeadingTaggedAllocator,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Plain => write!(f, "plain"),
            ShapeKind::TrailingAllocator => write!(f, "trailing-allocator"),
            ShapeKind::LeadingTaggedAllocator => write!(f, "leading-tagged-allocator"),
        }
    }
}

/// Base arguments are forwarded unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

/// The rebound allocator is appended after the base arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingAllocator;

/// [`AllocatorArg`] and the rebound allocator are prepended to the base arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadingTaggedAllocator;

/// Follow the strategy the held type declared in [`Capabilities::Shape`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredShape;

/// Implemented by the strategies a type can declare.
pub trait ConstructionShape {
    const KIND: ShapeKind;
}

impl ConstructionShape for Plain {
    const KIND: ShapeKind = ShapeKind::Plain;
}

impl ConstructionShape for TrailingAllocator {
    const KIND: ShapeKind = ShapeKind::TrailingAllocator;
}

impl ConstructionShape for LeadingTaggedAllocator {
    const KIND: ShapeKind = ShapeKind::LeadingTaggedAllocator;
}

/// Produces the final argument tuple for `T` from allocator `A` and base arguments `Args`.
pub trait ShapeArguments<T: ?Sized, A, Args> {
    type Output;

    /// The strategy that actually runs.
    const KIND: ShapeKind;

    fn shape(alloc: &A, args: Args) -> Self::Output;
}

impl<T: ?Sized, A, Args> ShapeArguments<T, A, Args> for Plain {
    type Output = Args;

    const KIND: ShapeKind = ShapeKind::Plain;

    fn shape(_alloc: &A, args: Args) -> Args {
        args
    }
}

impl<T, A, Args> ShapeArguments<T, A, Args> for TrailingAllocator
where
    T: HasTrailingAllocatorConstructor<A, Args>,
    Args: Append<T::AllocatorType>,
{
    type Output = <Args as Append<T::AllocatorType>>::Output;

    const KIND: ShapeKind = ShapeKind::TrailingAllocator;

    fn shape(alloc: &A, args: Args) -> Self::Output {
        args.append(<T as CompatibleAllocator<A>>::rebind(alloc))
    }
}

impl<T, A, Args> ShapeArguments<T, A, Args> for LeadingTaggedAllocator
where
    T: HasTaggedAllocatorConstructor<A, Args>,
    Args: Prepend<T::AllocatorType>,
    <Args as Prepend<T::AllocatorType>>::Output: Prepend<AllocatorArg>,
{
    type Output = <<Args as Prepend<T::AllocatorType>>::Output as Prepend<AllocatorArg>>::Output;

    const KIND: ShapeKind = ShapeKind::LeadingTaggedAllocator;

    fn shape(alloc: &A, args: Args) -> Self::Output {
        args.prepend(<T as CompatibleAllocator<A>>::rebind(alloc))
            .prepend(AllocatorArg)
    }
}

impl<T, A, Args> ShapeArguments<T, A, Args> for DeclaredShape
where
    T: Capabilities,
    T::Shape: ShapeArguments<T, A, Args>,
{
    type Output = <T::Shape as ShapeArguments<T, A, Args>>::Output;

    const KIND: ShapeKind = <T::Shape as ShapeArguments<T, A, Args>>::KIND;

    fn shape(alloc: &A, args: Args) -> Self::Output {
        <T::Shape as ShapeArguments<T, A, Args>>::shape(alloc, args)
    }
}

/// Bridges a held type, the selected strategy `S` and the type's constructor.
///
/// Blanket-implemented for every `T` that `S` can shape `(A, Args)` for and
/// which has a constructor for the shaped tuple. This is the single bound the
/// provider places on held types.
pub trait Assemble<A, Args, S>: Sized {
    type Shaped;

    const STRATEGY: ShapeKind;

    fn shape(alloc: &A, args: Args) -> Self::Shaped;

    fn construct_shaped(shaped: Self::Shaped) -> Result<Self, ConstructError>;
}

impl<T, A, Args, S> Assemble<A, Args, S> for T
where
    S: ShapeArguments<T, A, Args>,
    T: Construct<S::Output>,
{
    type Shaped = S::Output;

    const STRATEGY: ShapeKind = S::KIND;

    fn shape(alloc: &A, args: Args) -> Self::Shaped {
        S::shape(alloc, args)
    }

    fn construct_shaped(shaped: Self::Shaped) -> Result<Self, ConstructError> {
        T::construct(shaped)
    }
}

/// The strategy `T` declared, as a runtime value.
pub const fn shape_of<T: Capabilities>() -> ShapeKind {
    <T::Shape as ConstructionShape>::KIND
}

// -------------------------------------------------------------------------------------------------
// Tuple surgery
// -------------------------------------------------------------------------------------------------

/// Appends one element to a tuple.
pub trait Append<E> {
    type Output;

    fn append(self, item: E) -> Self::Output;
}

/// Prepends one element to a tuple.
pub trait Prepend<E> {
    type Output;

    fn prepend(self, item: E) -> Self::Output;
}

macro_rules! tuple_impls {
    ($($name:ident)*) => {
        impl<E, $($name,)*> Append<E> for ($($name,)*) {
            type Output = ($($name,)* E,);

            #[allow(non_snake_case)]
            fn append(self, item: E) -> Self::Output {
                let ($($name,)*) = self;
                ($($name,)* item,)
            }
        }

        impl<E, $($name,)*> Prepend<E> for ($($name,)*) {
            type Output = (E, $($name,)*);

            #[allow(non_snake_case)]
            fn prepend(self, item: E) -> Self::Output {
                let ($($name,)*) = self;
                (item, $($name,)*)
            }
        }
    };
}

tuple_impls!();
tuple_impls!(A0);
tuple_impls!(A0 A1);
tuple_impls!(A0 A1 A2);
tuple_impls!(A0 A1 A2 A3);
tuple_impls!(A0 A1 A2 A3 A4);
tuple_impls!(A0 A1 A2 A3 A4 A5);
tuple_impls!(A0 A1 A2 A3 A4 A5 A6);
tuple_impls!(A0 A1 A2 A3 A4 A5 A6 A7);
