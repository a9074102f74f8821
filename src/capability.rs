//! Capability traits for held types.
//!
//! A held type tells the provider how it wants to be built:
//!
//! - [`Capabilities`] names the construction strategy (see [`crate::shape`]).
//! - [`Construct`] is a constructor for one argument tuple shape.
//! - [`AllocatorAware`] declares the allocator type the value stores.
//!
//! The remaining traits are predicates derived from those declarations by
//! blanket impls. They cost nothing at runtime; a missing capability shows up
//! as an unsatisfied bound at the `instance()` call site.

use allocator_api2::alloc::Allocator;
use allocator_api2::vec::Vec;

use crate::shape::{Append, Plain, Prepend, TrailingAllocator};

/// Error type returned by constructors of held types.
pub type ConstructError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Marker passed first to constructors of the leading-tagged shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AllocatorArg;

/// A constructor of `Self` taking the argument tuple `Args`.
///
/// Every `T: Default` can be constructed from the empty tuple.
///
/// # Examples
///
/// ```rust
/// use reside_singleton::{Construct, ConstructError};
///
/// struct Pair {
///     i: i32,
///     d: f64,
/// }
///
/// impl Construct<(i32, f64)> for Pair {
///     fn construct((i, d): (i32, f64)) -> Result<Self, ConstructError> {
///         Ok(Pair { i, d })
///     }
/// }
///
/// let pair = Pair::construct((3, 4.2)).unwrap();
/// assert_eq!(pair.i, 3);
/// assert_eq!(pair.d, 4.2);
/// ```
pub trait Construct<Args>: Sized {
    fn construct(args: Args) -> Result<Self, ConstructError>;
}

impl<T: Default> Construct<()> for T {
    fn construct((): ()) -> Result<Self, ConstructError> {
        Ok(T::default())
    }
}

/// The construction strategy a held type declares.
///
/// Use [`Plain`] unless the type stores an allocator, in which case declare
/// [`AllocatorAware`] as well and pick [`TrailingAllocator`] or
/// [`LeadingTaggedAllocator`](crate::LeadingTaggedAllocator).
pub trait Capabilities {
    type Shape: crate::shape::ConstructionShape;
}

/// The type stores an allocator of type `AllocatorType`.
pub trait AllocatorAware {
    type AllocatorType;
}

/// The declared allocator type can be built from a configured allocator `A`.
pub trait CompatibleAllocator<A>: AllocatorAware {
    fn rebind(alloc: &A) -> Self::AllocatorType;
}

impl<T, A> CompatibleAllocator<A> for T
where
    T: AllocatorAware + ?Sized,
    T::AllocatorType: From<A>,
    A: Clone,
{
    fn rebind(alloc: &A) -> T::AllocatorType {
        T::AllocatorType::from(alloc.clone())
    }
}

/// `T` can be constructed from `(args..., allocator)`.
pub trait HasTrailingAllocatorConstructor<A, Args>: CompatibleAllocator<A> {}

impl<T, A, Args> HasTrailingAllocatorConstructor<A, Args> for T
where
    T: CompatibleAllocator<A>,
    Args: Append<T::AllocatorType>,
    T: Construct<<Args as Append<T::AllocatorType>>::Output>,
{
}

/// `T` can be constructed from `(AllocatorArg, allocator, args...)`.
pub trait HasTaggedAllocatorConstructor<A, Args>: CompatibleAllocator<A> {}

impl<T, A, Args> HasTaggedAllocatorConstructor<A, Args> for T
where
    T: CompatibleAllocator<A>,
    Args: Prepend<T::AllocatorType>,
    <Args as Prepend<T::AllocatorType>>::Output: Prepend<AllocatorArg>,
    T: Construct<
        <<Args as Prepend<T::AllocatorType>>::Output as Prepend<AllocatorArg>>::Output,
    >,
{
}

macro_rules! plain_capabilities {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Capabilities for $ty {
                type Shape = Plain;
            }
        )*
    };
}

plain_capabilities!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
);

impl<T, A: Allocator> AllocatorAware for Vec<T, A> {
    type AllocatorType = A;
}

impl<T, A: Allocator> Capabilities for Vec<T, A> {
    type Shape = TrailingAllocator;
}

impl<T, A: Allocator> Construct<(A,)> for Vec<T, A> {
    fn construct((alloc,): (A,)) -> Result<Self, ConstructError> {
        Ok(Vec::new_in(alloc))
    }
}

impl<T, A: Allocator> Construct<(usize, A)> for Vec<T, A> {
    fn construct((capacity, alloc): (usize, A)) -> Result<Self, ConstructError> {
        Ok(Vec::with_capacity_in(capacity, alloc))
    }
}
