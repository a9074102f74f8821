//! The singleton provider.
//!
//! A [`SingletonRegistry`] holds at most one instance per held type. The
//! instance is built on the first [`instance`](SingletonRegistry::instance)
//! call and released when the registry shuts down or is dropped.
//!
//! # Examples
//!
//! ```
//! use reside_singleton::{DefaultConfig, SingletonRegistry};
//!
//! let registry = SingletonRegistry::new();
//! let first: &String = registry.instance::<String, DefaultConfig>().unwrap();
//! let again: &String = registry.instance::<String, DefaultConfig>().unwrap();
//! assert!(std::ptr::eq(first, again));
//! ```

use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError, RwLock},
    thread::{self, ThreadId},
};

use allocator_api2::alloc::Allocator;

use crate::{
    config::Configure,
    handle::{InstanceHandle, Storage},
    shape::Assemble,
    SingletonError, SingletonEvent,
};

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `SingletonEvent` every time an instance
/// is constructed or released. It must be thread-safe because registries are shared.
pub type TraceCallback = dyn Fn(&SingletonEvent) + Send + Sync + 'static;

// -------------------------------------------------------------------------------------------------
// Slots
// -------------------------------------------------------------------------------------------------

/// Per-type state: the construction gate and the instance handle.
struct Slot<T, A: Allocator> {
    config: TypeId,
    gate: Mutex<()>,
    builder: Mutex<Option<ThreadId>>,
    handle: OnceLock<InstanceHandle<T, A>>,
}

impl<T, A: Allocator> Slot<T, A> {
    fn new(config: TypeId) -> Self {
        Slot {
            config,
            gate: Mutex::new(()),
            builder: Mutex::new(None),
            handle: OnceLock::new(),
        }
    }

    fn get(&self) -> Option<&T> {
        self.handle.get().map(InstanceHandle::get)
    }

    fn built_by_current_thread(&self) -> bool {
        let builder = self.builder.lock().unwrap_or_else(PoisonError::into_inner);
        *builder == Some(thread::current().id())
    }
}

/// Records the constructing thread for as long as it is alive, including
/// unwinding out of a panicking constructor.
struct BuilderGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> BuilderGuard<'a> {
    fn enter(builder: &'a Mutex<Option<ThreadId>>) -> Self {
        *builder.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        BuilderGuard(builder)
    }
}

impl Drop for BuilderGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Type-erased view of a slot, so slots of all held types share one map.
trait ErasedSlot: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;

    fn is_constructed(&self) -> bool;
}

impl<T, A> ErasedSlot for Slot<T, A>
where
    T: Send + Sync + 'static,
    A: Allocator + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn is_constructed(&self) -> bool {
        self.handle.get().is_some()
    }
}

// -------------------------------------------------------------------------------------------------
// Registry
// -------------------------------------------------------------------------------------------------

/// Holds one lazily constructed instance per held type.
///
/// Instances live until [`shutdown`](Self::shutdown) or until the registry is
/// dropped; references returned by [`instance`](Self::instance) borrow the
/// registry, so neither can happen while they are in use.
pub struct SingletonRegistry {
    slots: RwLock<HashMap<TypeId, Box<dyn ErasedSlot>>>,
    trace: Mutex<Option<Arc<TraceCallback>>>,
}

impl SingletonRegistry {
    pub fn new() -> Self {
        SingletonRegistry {
            slots: RwLock::new(HashMap::new()),
            trace: Mutex::new(None),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Tracing
    // ---------------------------------------------------------------------------------------------

    /// Sets a tracing callback for construction and teardown events.
    ///
    /// The callback runs while the trace lock is held; it must not set or
    /// clear the callback of the same registry.
    pub fn set_trace_callback(&self, callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
        let mut guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(callback));
    }

    /// Clears the tracing callback.
    pub fn clear_trace_callback(&self) {
        let mut guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    fn emit_event(&self, event: &SingletonEvent) {
        let guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = guard.as_ref() {
            callback(event);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Access
    // ---------------------------------------------------------------------------------------------

    /// Returns the instance of `T`, constructing it with configuration `C` on first use.
    ///
    /// Concurrent first calls construct `T` once; the others wait for it and
    /// receive the same reference. After construction the call takes no gate.
    ///
    /// # Errors
    ///
    /// - [`SingletonError::AllocationFailed`] if `C`'s allocator has no storage for `T`
    /// - [`SingletonError::ConstructionFailed`] if `T`'s constructor fails
    /// - [`SingletonError::ConfigurationMismatch`] if `T` is held with another configuration
    /// - [`SingletonError::Reentrant`] if `T`'s constructor asks for `T`
    ///
    /// A failed call leaves `T` unconstructed; the next call retries.
    pub fn instance<T, C>(&self) -> Result<&T, SingletonError>
    where
        C: Configure<T> + 'static,
        T: Assemble<C::Alloc, C::Args, C::Shape> + Send + Sync + 'static,
    {
        let slot = self.slot::<T, C>()?;
        match slot.get() {
            Some(value) => Ok(value),
            None => self.construct::<T, C>(slot),
        }
    }

    /// Whether an instance of `T` is live.
    pub fn is_constructed<T: 'static>(&self) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .is_some_and(|slot| slot.is_constructed())
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.is_constructed())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds or inserts the slot of `T`.
    fn slot<T, C>(&self) -> Result<&Slot<T, C::Alloc>, SingletonError>
    where
        C: Configure<T> + 'static,
        T: Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();
        let existing = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .map(|slot| &**slot as *const dyn ErasedSlot);

        let erased = match existing {
            Some(erased) => erased,
            None => {
                let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
                let slot = slots.entry(key).or_insert_with(|| {
                    Box::new(Slot::<T, C::Alloc>::new(TypeId::of::<C>())) as Box<dyn ErasedSlot>
                });
                &**slot as *const dyn ErasedSlot
            }
        };

        // SAFETY: slots are boxed, so the pointee does not move when the map
        // grows, and boxes are only removed by `release_all`, which requires that
        // no reference into the registry is alive.
        let erased = unsafe { &*erased };

        match erased.as_any().downcast_ref::<Slot<T, C::Alloc>>() {
            Some(slot) if slot.config == TypeId::of::<C>() => Ok(slot),
            _ => Err(SingletonError::ConfigurationMismatch {
                type_name: any::type_name::<T>(),
            }),
        }
    }

    /// Runs the construction sequence of `T` behind the slot's gate.
    fn construct<'s, T, C>(&self, slot: &'s Slot<T, C::Alloc>) -> Result<&'s T, SingletonError>
    where
        C: Configure<T>,
        T: Assemble<C::Alloc, C::Args, C::Shape> + Send + Sync + 'static,
    {
        let type_name = any::type_name::<T>();

        if slot.built_by_current_thread() {
            return Err(SingletonError::Reentrant { type_name });
        }

        // A constructor that panicked poisons the gate; the slot is still
        // unconstructed, so the next caller simply tries again.
        let _gate = slot.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = slot.get() {
            return Ok(value);
        }

        let built = {
            let _builder = BuilderGuard::enter(&slot.builder);
            Self::build::<T, C>()
        };

        match built {
            Ok(handle) => {
                let value = slot.handle.get_or_init(move || handle).get();
                self.emit_event(&SingletonEvent::Construct {
                    type_name,
                    strategy: T::STRATEGY,
                });
                Ok(value)
            }
            Err(err) => {
                self.emit_event(&SingletonEvent::ConstructFailed { type_name });
                Err(err)
            }
        }
    }

    /// Allocator, base arguments, shaping, storage, constructor, in that order.
    fn build<T, C>() -> Result<InstanceHandle<T, C::Alloc>, SingletonError>
    where
        C: Configure<T>,
        T: Assemble<C::Alloc, C::Args, C::Shape>,
    {
        let type_name = any::type_name::<T>();

        let alloc = C::allocator();
        let args = C::base_arguments(&alloc);
        let shaped = T::shape(&alloc, args);

        let storage = Storage::<T, C::Alloc>::allocate(alloc).map_err(|_| {
            SingletonError::AllocationFailed {
                type_name,
                size: std::mem::size_of::<T>(),
                align: std::mem::align_of::<T>(),
            }
        })?;

        // On failure `storage` is dropped here and its bytes go back to the allocator.
        let value = T::construct_shaped(shaped)
            .map_err(|source| SingletonError::ConstructionFailed { type_name, source })?;

        Ok(storage.init(value))
    }

    // ---------------------------------------------------------------------------------------------
    // Teardown
    // ---------------------------------------------------------------------------------------------

    /// Destroys every live instance and returns its storage to its allocator.
    ///
    /// Returns the number of instances released. The registry is empty
    /// afterwards and can construct again. Release order across types is
    /// unspecified.
    pub fn shutdown(&mut self) -> usize {
        // SAFETY: `&mut self` proves no reference into the registry is alive.
        unsafe { self.release_all() }
    }

    /// Shared-reference form of [`shutdown`](Self::shutdown), for registries in statics.
    ///
    /// # Safety
    ///
    /// No reference returned by [`instance`](Self::instance) may be used after
    /// this call, and no other thread may access the registry during it.
    pub unsafe fn release_all(&self) -> usize {
        let drained: Vec<Box<dyn ErasedSlot>> = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, slot)| slot)
            .collect();

        let mut released = 0;
        for slot in drained {
            let type_name = slot.type_name();
            let was_constructed = slot.is_constructed();
            drop(slot);
            if was_constructed {
                released += 1;
                self.emit_event(&SingletonEvent::Release { type_name });
            }
        }

        self.emit_event(&SingletonEvent::Shutdown { released });
        released
    }
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        SingletonRegistry::new()
    }
}

impl Drop for SingletonRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("live", &self.len())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
