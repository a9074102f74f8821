//! Macros for creating isolated singleton registries.

/// Creates a module holding its own static [`SingletonRegistry`](crate::SingletonRegistry).
///
/// The generated module exposes the same free functions as the crate root
/// (`instance`, `instance_with`, `is_constructed`, the trace callback pair
/// and `shutdown`), but instances held by one module are invisible to every
/// other registry.
///
/// # Examples
///
/// ```rust
/// use reside_singleton::define_singletons;
///
/// define_singletons!(plugins);
/// define_singletons!(services);
///
/// let a: &'static String = plugins::instance().unwrap();
/// assert!(plugins::is_constructed::<String>());
/// assert!(!services::is_constructed::<String>());
/// # let _ = a;
/// ```
#[macro_export]
macro_rules! define_singletons {
    ($name:ident) => {
        pub mod $name {
            use std::sync::LazyLock;

            static REGISTRY: LazyLock<$crate::SingletonRegistry> =
                LazyLock::new($crate::SingletonRegistry::new);

            /// The registry behind this module.
            pub fn registry() -> &'static $crate::SingletonRegistry {
                &REGISTRY
            }

            /// The instance of `T` with the default configuration.
            pub fn instance<T>() -> Result<&'static T, $crate::SingletonError>
            where
                T: $crate::Assemble<
                        $crate::ConfigAlloc<T, $crate::DefaultConfig>,
                        (),
                        $crate::DeclaredShape,
                    > + Send
                    + Sync
                    + 'static,
            {
                REGISTRY.instance::<T, $crate::DefaultConfig>()
            }

            /// The instance of `T` with configuration `C`.
            pub fn instance_with<T, C>() -> Result<&'static T, $crate::SingletonError>
            where
                C: $crate::Configure<T> + 'static,
                T: $crate::Assemble<
                        $crate::ConfigAlloc<T, C>,
                        $crate::ConfigArgs<T, C>,
                        $crate::ConfigShape<T, C>,
                    > + Send
                    + Sync
                    + 'static,
            {
                REGISTRY.instance::<T, C>()
            }

            pub fn is_constructed<T: 'static>() -> bool {
                REGISTRY.is_constructed::<T>()
            }

            /// Set a tracing callback for this registry.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::SingletonEvent) + Send + Sync + 'static,
            ) {
                REGISTRY.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                REGISTRY.clear_trace_callback()
            }

            /// Destroys every instance held by this registry.
            ///
            /// # Safety
            ///
            /// No reference obtained from this module may be used afterwards,
            /// and no other thread may access the registry while this runs.
            pub unsafe fn shutdown() -> usize {
                unsafe { REGISTRY.release_all() }
            }
        }
    };
}
