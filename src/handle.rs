//! Owning handle of a constructed singleton and the storage it lives in.

use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator, Layout};

/// Uninitialized storage for one `T`, obtained from `A`.
///
/// Dropping it returns the bytes to the allocator, so a constructor that fails
/// or panics after the allocation cannot leak them.
pub(crate) struct Storage<T, A: Allocator> {
    ptr: NonNull<T>,
    alloc: A,
}

impl<T, A: Allocator> Storage<T, A> {
    pub(crate) fn allocate(alloc: A) -> Result<Self, AllocError> {
        let raw = alloc.allocate(Layout::new::<T>())?;
        Ok(Storage {
            ptr: raw.cast::<T>(),
            alloc,
        })
    }

    /// Moves `value` into the storage and hands ownership to an [`InstanceHandle`].
    pub(crate) fn init(self, value: T) -> InstanceHandle<T, A> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `ptr` was allocated for `Layout::new::<T>()` and is uninitialized.
        unsafe { this.ptr.as_ptr().write(value) };
        // SAFETY: `this` is never dropped, so the allocator is moved out exactly once.
        let alloc = unsafe { ptr::read(&this.alloc) };
        InstanceHandle {
            ptr: this.ptr,
            alloc,
        }
    }
}

impl<T, A: Allocator> Drop for Storage<T, A> {
    fn drop(&mut self) {
        // SAFETY: the storage came from `self.alloc` with this layout and holds no value.
        unsafe { self.alloc.deallocate(self.ptr.cast::<u8>(), Layout::new::<T>()) };
    }
}

/// Owns exactly one `T` living in storage provided by `A`.
///
/// Dropping the handle is the release routine: the value is destroyed in place
/// and its storage is returned to the same allocator, with the same layout.
pub(crate) struct InstanceHandle<T, A: Allocator> {
    ptr: NonNull<T>,
    alloc: A,
}

// SAFETY: the handle owns the `T` and the allocator; sharing it shares `&T` and `&A`.
unsafe impl<T: Send, A: Allocator + Send> Send for InstanceHandle<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for InstanceHandle<T, A> {}

impl<T, A: Allocator> InstanceHandle<T, A> {
    pub(crate) fn get(&self) -> &T {
        // SAFETY: `ptr` holds an initialized `T` for as long as the handle lives.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T, A: Allocator> Drop for InstanceHandle<T, A> {
    fn drop(&mut self) {
        // SAFETY: the value is initialized and dropped exactly once, then its
        // storage is returned to the allocator that produced it.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            self.alloc.deallocate(self.ptr.cast::<u8>(), Layout::new::<T>());
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for InstanceHandle<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InstanceHandle").field(self.get()).finish()
    }
}
