use super::module::Ports;
use super::signals::SignalDescriptor;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Position of a module in its [System](super::System), assigned on registration.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct ModuleIndex(pub(super) usize);
impl ModuleIndex {
    /// Returns the inner [usize].
    pub fn get(self) -> usize {
        self.0
    }
}
impl Display for ModuleIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of one module output in the flat net table of a [System](super::System).
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct NetIndex(pub(super) usize);
impl Display for NetIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The derives would require M: Clone, M: Debug... even though only PhantomData depends on M.
macro_rules! typed_handle_impls {
    ($handle:ident, $($field:ident),*) => {
        impl<M> Clone for $handle<M> {
            fn clone(&self) -> Self {
                *self
            }
        }
        impl<M> Copy for $handle<M> {}
        impl<M> PartialEq for $handle<M> {
            fn eq(&self, other: &Self) -> bool {
                $(self.$field == other.$field)&&*
            }
        }
        impl<M> Eq for $handle<M> {}
        impl<M> Hash for $handle<M> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                $(self.$field.hash(state);)*
            }
        }
        impl<M> Debug for $handle<M> {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle))
                    $(.field(stringify!($field), &self.$field))*
                    .field("module", &std::any::type_name::<M>())
                    .finish()
            }
        }
    };
}

/// Typed handle to a module of type `M` owned by a [System](super::System).
///
/// Returned by [System::add_module](super::System::add_module).
pub struct ModuleId<M> {
    pub(super) index: ModuleIndex,
    _module: PhantomData<fn() -> M>,
}
typed_handle_impls!(ModuleId, index);
impl<M> ModuleId<M> {
    pub(super) fn new(index: ModuleIndex) -> Self {
        Self {
            index,
            _module: PhantomData,
        }
    }

    pub fn index(self) -> ModuleIndex {
        self.index
    }
}

/// Typed handle to input number `index` of module type `M`.
///
/// Created by the [ports!](crate::ports) macro, the module type parameter makes it impossible
/// to read or connect an input on a module of a different type.
pub struct Input<M> {
    index: usize,
    _module: PhantomData<fn() -> M>,
}
typed_handle_impls!(Input, index);
impl<M> Input<M> {
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _module: PhantomData,
        }
    }

    pub const fn index(self) -> usize {
        self.index
    }
}
impl<M: Ports> Input<M> {
    /// Returns the descriptor of the input.
    ///
    /// # Panics
    ///
    /// Will panic if the handle wasn't created by [ports!](crate::ports) for `M`.
    pub fn descriptor(self) -> &'static SignalDescriptor {
        match M::INPUTS.get(self.index) {
            Some(descriptor) => descriptor,
            None => panic!(
                "Input {} is not declared by {}",
                self.index,
                std::any::type_name::<M>()
            ),
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

/// Typed handle to output number `index` of module type `M`.
///
/// [Output::not] returns the same output with inverted polarity, connecting it to an input
/// makes the input read the bitwise negation of the output.
pub struct Output<M> {
    index: usize,
    active_low: bool,
    _module: PhantomData<fn() -> M>,
}
typed_handle_impls!(Output, index, active_low);
impl<M> Output<M> {
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            active_low: false,
            _module: PhantomData,
        }
    }

    /// Returns the same output with inverted polarity.
    pub const fn not(self) -> Self {
        Self {
            active_low: !self.active_low,
            ..self
        }
    }

    pub const fn index(self) -> usize {
        self.index
    }

    pub const fn is_active_low(self) -> bool {
        self.active_low
    }
}
impl<M: Ports> Output<M> {
    /// Returns the descriptor of the output.
    ///
    /// # Panics
    ///
    /// Will panic if the handle wasn't created by [ports!](crate::ports) for `M`.
    pub fn descriptor(self) -> &'static SignalDescriptor {
        match M::OUTPUTS.get(self.index) {
            Some(descriptor) => descriptor,
            None => panic!(
                "Output {} is not declared by {}",
                self.index,
                std::any::type_name::<M>()
            ),
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}
