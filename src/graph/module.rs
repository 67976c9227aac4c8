use super::connection::{read_drivers, Drivers};
use super::error::{Error, Result};
use super::handles::{Input, Output};
use super::signals::{Direction, Signal, SignalList};
use std::any::Any;
use std::marker::PhantomData;

/// Port declaration of a module type, normally implemented with the [ports!](crate::ports) macro.
pub trait Ports {
    const INPUTS: SignalList;
    const OUTPUTS: SignalList;
}

/// A simulable unit with input and output ports and optional internal state.
///
/// All methods have empty default implementations.
///
/// * [Module::update] is the combinational logic, it reads inputs and writes outputs through
///   [UpdateContext]. It can be called any number of times per half cycle, so it must produce
///   the same outputs when called again with unchanged inputs.
/// * [Module::clock_rising] and [Module::clock_falling] are called exactly once per clock edge
///   and are the only place where synchronous state should change. They receive a
///   [ClockContext] which can read but not write outputs.
/// * [Module::reset] restores the internal state, it's called by [System::init](super::System::init)
///   and [System::reset](super::System::reset).
///
/// # Example
/// ```
/// use synclogic::{ports, ClockContext, Module, System, UpdateContext};
///
/// #[derive(Default)]
/// struct Toggle {
///     state: bool,
/// }
/// ports! {
///     Toggle {
///         inputs { T_EN: 1 }
///         outputs { T_OUT: 1 }
///     }
/// }
/// impl Module for Toggle {
///     fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
///         ctx.set_output(Self::T_OUT, self.state as u64);
///     }
///     fn clock_rising(&mut self, ctx: &ClockContext<'_, Self>) {
///         if ctx.input(Self::T_EN) == 1 {
///             self.state = !self.state;
///         }
///     }
///     fn reset(&mut self) {
///         self.state = false;
///     }
/// }
///
/// let mut system = System::new();
/// let toggle = system.add_module(Toggle::default()).unwrap();
/// system.connect_const(toggle, Toggle::T_EN, 1).unwrap();
/// system.init().unwrap();
///
/// system.step(true).unwrap();
/// assert_eq!(system.output(toggle, Toggle::T_OUT), 1);
/// system.step(true).unwrap();
/// assert_eq!(system.output(toggle, Toggle::T_OUT), 0);
/// ```
///
/// Clock handlers can't write outputs:
/// ```compile_fail
/// use synclogic::{ports, ClockContext, Module};
///
/// struct Latch;
/// ports! {
///     Latch {
///         inputs {}
///         outputs { Q: 1 }
///     }
/// }
/// impl Module for Latch {
///     fn clock_rising(&mut self, ctx: &ClockContext<'_, Self>) {
///         ctx.set_output(Self::Q, 1);
///     }
/// }
/// ```
pub trait Module: Ports + Sized + 'static {
    fn update(&mut self, _ctx: &mut UpdateContext<'_, Self>) {}
    fn clock_rising(&mut self, _ctx: &ClockContext<'_, Self>) {}
    fn clock_falling(&mut self, _ctx: &ClockContext<'_, Self>) {}
    fn reset(&mut self) {}
}

/// Declares the ports of a module type.
///
/// Generates one typed constant per signal on the type (`Input<T>` for inputs, `Output<T>` for
/// outputs) and implements [Ports] for it. Widths must be in 1..=64 and names unique per
/// direction, otherwise the module type fails to compile once it's registered in a
/// [System](crate::System).
///
/// # Example
/// ```
/// use synclogic::{ports, Ports, Direction};
///
/// struct Alu;
/// ports! {
///     Alu {
///         inputs { ALU_A: 8, ALU_B: 8, ALU_SUB: 1 }
///         outputs { ALU_OUT: 8, ALU_CARRY: 1 }
///     }
/// }
///
/// assert_eq!(Alu::ALU_SUB.index(), 2);
/// assert_eq!(Alu::ALU_CARRY.name(), "ALU_CARRY");
/// assert_eq!(Alu::INPUTS.len(), 3);
/// assert_eq!(Alu::OUTPUTS.direction(), Some(Direction::Output));
/// ```
#[macro_export]
macro_rules! ports {
    ($module:ident {
        inputs { $($input:ident : $input_width:expr),* $(,)? }
        outputs { $($output:ident : $output_width:expr),* $(,)? }
    }) => {
        impl $module {
            $crate::__port_handles!(Input; 0usize; $($input),*);
            $crate::__port_handles!(Output; 0usize; $($output),*);
        }
        impl $crate::Ports for $module {
            const INPUTS: $crate::SignalList = $crate::SignalList::inputs({
                const SIGNALS: &[$crate::SignalDescriptor] = &[
                    $($crate::SignalDescriptor::input(stringify!($input), $input_width)),*
                ];
                SIGNALS
            });
            const OUTPUTS: $crate::SignalList = $crate::SignalList::outputs({
                const SIGNALS: &[$crate::SignalDescriptor] = &[
                    $($crate::SignalDescriptor::output(stringify!($output), $output_width)),*
                ];
                SIGNALS
            });
        }
    };
}

/// Emits one typed port constant per identifier, numbering them from `$index`.
#[doc(hidden)]
#[macro_export]
macro_rules! __port_handles {
    ($kind:ident; $index:expr; ) => {};
    ($kind:ident; $index:expr; $name:ident $(, $rest:ident)*) => {
        #[allow(dead_code, non_upper_case_globals)]
        pub const $name: $crate::$kind<Self> = $crate::$kind::new($index);
        $crate::__port_handles!($kind; $index + 1usize; $($rest),*);
    };
}

/// Read access to the inputs of one module, shared by both contexts.
#[derive(Clone, Copy)]
pub(super) struct InputReader<'a> {
    pub module: &'a str,
    pub nets: &'a [Signal],
    pub drivers: &'a [Drivers],
    pub inputs: SignalList,
    pub outputs: SignalList,
}

impl<'a> InputReader<'a> {
    #[inline(always)]
    fn read(&self, index: usize) -> Signal {
        read_drivers(&self.drivers[index], self.nets) & self.inputs.as_slice()[index].mask()
    }

    fn read_at(&self, index: usize) -> Result<Signal> {
        if index >= self.inputs.len() {
            return Err(Error::IndexOutOfBounds {
                direction: Direction::Input,
                module: self.module.to_string(),
                index,
                count: self.inputs.len(),
            });
        }
        Ok(self.read(index))
    }

    fn input_index(&self, name: &str) -> Result<usize> {
        self.inputs
            .index_of(name)
            .ok_or_else(|| Error::InvalidSignalName {
                module: self.module.to_string(),
                signal: name.to_string(),
            })
    }

    fn output_index(&self, name: &str) -> Result<usize> {
        self.outputs
            .index_of(name)
            .ok_or_else(|| Error::InvalidSignalName {
                module: self.module.to_string(),
                signal: name.to_string(),
            })
    }

    fn check_output(&self, index: usize) -> Result<()> {
        if index >= self.outputs.len() {
            return Err(Error::IndexOutOfBounds {
                direction: Direction::Output,
                module: self.module.to_string(),
                index,
                count: self.outputs.len(),
            });
        }
        Ok(())
    }
}

/// Capability handed to [Module::update], the only way to write the outputs of a module.
pub struct UpdateContext<'a, M> {
    reader: InputReader<'a>,
    outputs: &'a mut [Signal],
    guaranteed: &'a mut bool,
    _module: PhantomData<fn() -> M>,
}

impl<'a, M: Module> UpdateContext<'a, M> {
    /// Name of the module being updated.
    pub fn name(&self) -> &str {
        self.reader.module
    }

    /// Returns the bitwise or of every source connected to `input`, masked to its width.
    ///
    /// Inputs without sources read as 0.
    #[inline(always)]
    pub fn input(&self, input: Input<M>) -> Signal {
        self.reader.read(input.index())
    }

    /// Returns the value of the output as written so far in this update.
    #[inline(always)]
    pub fn output(&self, output: Output<M>) -> Signal {
        self.outputs[output.index()]
    }

    /// Sets `output` to `value`, masked to the width of the output.
    #[inline(always)]
    pub fn set_output(&mut self, output: Output<M>, value: Signal) {
        let index = output.index();
        self.outputs[index] = value & M::OUTPUTS.as_slice()[index].mask();
    }

    pub fn input_at(&self, index: usize) -> Result<Signal> {
        self.reader.read_at(index)
    }

    pub fn input_by_name(&self, name: &str) -> Result<Signal> {
        let index = self.reader.input_index(name)?;
        Ok(self.reader.read(index))
    }

    pub fn output_at(&self, index: usize) -> Result<Signal> {
        self.reader.check_output(index)?;
        Ok(self.outputs[index])
    }

    pub fn set_output_at(&mut self, index: usize, value: Signal) -> Result<()> {
        self.reader.check_output(index)?;
        self.outputs[index] = value & M::OUTPUTS.as_slice()[index].mask();
        Ok(())
    }

    pub fn set_output_by_name(&mut self, name: &str, value: Signal) -> Result<()> {
        let index = self.reader.output_index(name)?;
        self.set_output_at(index, value)
    }

    /// Promises that the outputs of this module don't depend on its inputs until the next clock
    /// edge, further updates in the current half cycle are skipped.
    pub fn guarantee_no_input(&mut self) {
        *self.guaranteed = true;
    }
}

/// Read only view handed to [Module::clock_rising] and [Module::clock_falling].
pub struct ClockContext<'a, M> {
    reader: InputReader<'a>,
    outputs: &'a [Signal],
    _module: PhantomData<fn() -> M>,
}

impl<'a, M: Module> ClockContext<'a, M> {
    pub fn name(&self) -> &str {
        self.reader.module
    }

    /// Returns the bitwise or of every source connected to `input`, masked to its width.
    #[inline(always)]
    pub fn input(&self, input: Input<M>) -> Signal {
        self.reader.read(input.index())
    }

    /// Returns the settled value of `output`.
    #[inline(always)]
    pub fn output(&self, output: Output<M>) -> Signal {
        self.outputs[output.index()]
    }

    pub fn input_at(&self, index: usize) -> Result<Signal> {
        self.reader.read_at(index)
    }

    pub fn input_by_name(&self, name: &str) -> Result<Signal> {
        let index = self.reader.input_index(name)?;
        Ok(self.reader.read(index))
    }

    pub fn output_at(&self, index: usize) -> Result<Signal> {
        self.reader.check_output(index)?;
        Ok(self.outputs[index])
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(super) enum Edge {
    Rising,
    Falling,
}

/// Object safe face of [Module] used by the [System](super::System) to store modules of
/// different types side by side.
pub(super) trait Behavior: Any {
    fn evaluate(&mut self, reader: InputReader<'_>, outputs: &mut [Signal], guaranteed: &mut bool);
    fn edge(&mut self, edge: Edge, reader: InputReader<'_>, outputs: &[Signal]);
    fn reset_state(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<M: Module> Behavior for M {
    fn evaluate(&mut self, reader: InputReader<'_>, outputs: &mut [Signal], guaranteed: &mut bool) {
        let mut ctx = UpdateContext::<M> {
            reader,
            outputs,
            guaranteed,
            _module: PhantomData,
        };
        self.update(&mut ctx);
    }

    fn edge(&mut self, edge: Edge, reader: InputReader<'_>, outputs: &[Signal]) {
        let ctx = ClockContext::<M> {
            reader,
            outputs,
            _module: PhantomData,
        };
        match edge {
            Edge::Rising => self.clock_rising(&ctx),
            Edge::Falling => self.clock_falling(&ctx),
        }
    }

    fn reset_state(&mut self) {
        Module::reset(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<M>()
    }
}
