/// Defines an actor's state type together with its wrapper type.
///
/// The `#[wrapper_type(Name)]` attribute names the wrapper and must come
/// after the doc comments, which are moved onto the wrapper. Remaining
/// attributes stay on the state type. The wrapper gets a private `spawn`
/// constructor and a `handle` accessor, and later `impl` blocks can add
/// convenient methods to interact with the actor.
///
/// ```ignore
/// define_actor! {
///     /// A counter.
///     #[wrapper_type(Counter)]
///     #[derive(Default)]
///     pub struct CounterState {
///         value: u32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_actor {
    {
        $(#[doc = $doc:expr])*
        #[wrapper_type($wrapper_type:ident)]
        $(#[$state_attr:meta])*
        $v:vis struct $state_type:ident {
            $($state_items:tt)*
        }
    } => {
        $(#[$state_attr])*
        struct $state_type {
            $($state_items)*
        }

        $(#[doc = $doc])*
        $v struct $wrapper_type {
            handle: $crate::Actor<$state_type>,
        }

        impl $wrapper_type {
            #[inline]
            fn spawn(state: $state_type, label: Option<&str>) -> Self {
                Self {
                    handle: $crate::Actor::spawn(state, label),
                }
            }

            #[inline]
            fn handle(&self) -> &$crate::Actor<$state_type> {
                &self.handle
            }
        }

        impl Clone for $wrapper_type {
            #[inline]
            fn clone(&self) -> Self {
                Self {
                    handle: self.handle.clone(),
                }
            }
        }

        impl ::std::fmt::Debug for $wrapper_type {
            fn fmt(
                &self,
                f: &mut ::std::fmt::Formatter<'_>,
            ) -> ::std::fmt::Result {
                f.debug_struct(stringify!($wrapper_type))
                    .finish_non_exhaustive()
            }
        }
    };
}
