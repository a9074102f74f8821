use crate::shape::ShapeKind;

/// Events emitted by a singleton registry during construction and teardown.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// Plain accesses to an already constructed instance emit nothing.
///
/// # Examples
///
/// ```rust
/// use reside_singleton::{ShapeKind, SingletonEvent};
///
/// let event = SingletonEvent::Construct {
///     type_name: "i32",
///     strategy: ShapeKind::Plain,
/// };
/// assert_eq!(event.to_string(), "construct { type_name: i32, strategy: plain }");
/// ```
#[derive(Debug, Clone)]
pub enum SingletonEvent {
    /// An instance was constructed and is now live.
    Construct {
        /// The type name of the held value (e.g., "i32", "alloc::string::String")
        type_name: &'static str,
        /// How the allocator was merged into the constructor arguments
        strategy: ShapeKind,
    },

    /// A construction attempt failed; the slot stays unconstructed.
    ConstructFailed { type_name: &'static str },

    /// A live instance was destroyed and its storage returned.
    Release { type_name: &'static str },

    /// The registry was shut down.
    Shutdown {
        /// Number of live instances that were released
        released: usize,
    },
}

impl std::fmt::Display for SingletonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SingletonEvent::Construct {
                type_name,
                strategy,
            } => {
                write!(
                    f,
                    "construct {{ type_name: {}, strategy: {} }}",
                    type_name, strategy
                )
            }
            SingletonEvent::ConstructFailed { type_name } => {
                write!(f, "construct failed {{ type_name: {} }}", type_name)
            }
            SingletonEvent::Release { type_name } => {
                write!(f, "release {{ type_name: {} }}", type_name)
            }
            SingletonEvent::Shutdown { released } => {
                write!(f, "shutdown {{ released: {} }}", released)
            }
        }
    }
}
