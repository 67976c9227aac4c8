use super::config::SystemConfig;
use super::connection::{add_driver, read_drivers, Connection, Driver, Drivers};
use super::error::{Error, Result};
use super::handles::{Input, ModuleId, ModuleIndex, NetIndex, Output};
use super::module::{Behavior, Module};
use super::scope::{render_vcd, ProbeSource, VcdScope};
use super::signals::{Direction, Signal, SignalDescriptor, SignalList};
use crate::data_structures::WorkQueue;
use indexmap::{IndexMap, IndexSet};
use num_enum::IntoPrimitive;
use std::ops::Range;
use strum::IntoEnumIterator;
use strum_macros::{Display as StrumDisplay, EnumIter};
use tracing::{debug, trace};

const SYSTEM_SIGNALS: &[SignalDescriptor] = &[
    SignalDescriptor::input("HALT", 1),
    SignalDescriptor::input("ERROR", 1),
    SignalDescriptor::input("EXIT", 1),
    SignalDescriptor::input("EXIT_CODE", 8),
];

/// Inputs of the [System] itself, in [SystemInput] order.
pub const SYSTEM_INPUTS: SignalList = SignalList::inputs(SYSTEM_SIGNALS);

/// Name used for the system in VCD identifiers and graph exports.
pub const SYSTEM_NAME: &str = "System";

/// Prefix of the placeholder names given to anonymous modules.
const ANONYMOUS_PREFIX: &str = "anonymous_";

/// The always present inputs of a [System], polled on every rising edge.
#[repr(usize)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, IntoPrimitive, StrumDisplay, EnumIter)]
pub enum SystemInput {
    /// Pauses the simulation, see [System::on_halt].
    #[strum(serialize = "HALT")]
    Halt,
    /// Stops the simulation, reporting EXIT_CODE as an error code.
    #[strum(serialize = "ERROR")]
    Error,
    /// Stops the simulation normally.
    #[strum(serialize = "EXIT")]
    Exit,
    /// 8 bit code returned by [System::run].
    #[strum(serialize = "EXIT_CODE")]
    ExitCode,
}

impl SystemInput {
    pub fn descriptor(self) -> &'static SignalDescriptor {
        &SYSTEM_SIGNALS[usize::from(self)]
    }
}

/// Why the last half step returned false.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StopReason {
    /// EXIT was asserted, carries the value of EXIT_CODE.
    Exit(Signal),
    /// ERROR was asserted, carries the value of EXIT_CODE.
    Error(Signal),
}

/// Bookkeeping of one registered module.
pub(super) struct ModuleEntry {
    pub name: String,
    pub behavior: Box<dyn Behavior>,
    pub inputs: SignalList,
    pub outputs: SignalList,
    pub drivers: Vec<Drivers>,
    pub output_base: usize,
    pub guaranteed: bool,
    pub update_enabled: bool,
}

impl ModuleEntry {
    /// Range of the net table owned by the outputs of this module.
    pub fn nets(&self) -> Range<usize> {
        self.output_base..self.output_base + self.outputs.len()
    }

    fn input_index(&self, name: &str) -> Result<usize> {
        self.inputs
            .index_of(name)
            .ok_or_else(|| Error::InvalidSignalName {
                module: self.name.clone(),
                signal: name.to_string(),
            })
    }

    fn output_index(&self, name: &str) -> Result<usize> {
        self.outputs
            .index_of(name)
            .ok_or_else(|| Error::InvalidSignalName {
                module: self.name.clone(),
                signal: name.to_string(),
            })
    }

    fn check_index(&self, direction: Direction, index: usize) -> Result<()> {
        let count = match direction {
            Direction::Input => self.inputs.len(),
            Direction::Output => self.outputs.len(),
        };
        if index >= count {
            return Err(Error::IndexOutOfBounds {
                direction,
                module: self.name.clone(),
                index,
                count,
            });
        }
        Ok(())
    }
}

/// A synchronous digital system: modules, their connections and a two phase clock.
///
/// Modules are registered and wired while the system is unlocked, [System::init] locks the
/// structure and resets every module. After that the system is simulated one half clock
/// cycle at a time with [System::half_step], [System::step] or [System::run].
///
/// All module outputs are stored in a single net table owned by the system, an input holds
/// the indexes of the nets (or constants) driving it. When more than one source drives an
/// input it reads the bitwise or of all of them.
///
/// # Example
/// ```
/// use synclogic::{ports, Module, System, UpdateContext};
///
/// struct Inverter;
/// ports! {
///     Inverter {
///         inputs { INV_IN: 1 }
///         outputs { INV_OUT: 1 }
///     }
/// }
/// impl Module for Inverter {
///     fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
///         ctx.set_output(Self::INV_OUT, !ctx.input(Self::INV_IN));
///     }
/// }
///
/// let mut system = System::new();
/// let a = system.add_named_module("a", Inverter).unwrap();
/// let b = system.add_named_module("b", Inverter).unwrap();
/// system.connect_const(a, Inverter::INV_IN, 1).unwrap();
/// system.connect(b, Inverter::INV_IN, a, Inverter::INV_OUT).unwrap();
/// system.init().unwrap();
///
/// assert_eq!(system.output(a, Inverter::INV_OUT), 0);
/// assert_eq!(system.get_output("b", "INV_OUT").unwrap(), 1);
/// ```
pub struct System {
    pub(super) config: SystemConfig,
    pub(super) modules: Vec<ModuleEntry>,
    pub(super) names: IndexMap<String, ModuleIndex>,
    /// Value of every module output.
    pub(super) nets: Vec<Signal>,
    /// Modules reading each net.
    pub(super) outgoing: Vec<IndexSet<ModuleIndex>>,
    pub(super) system_inputs: Vec<Drivers>,
    pub(super) scopes: IndexMap<String, VcdScope>,
    pub(super) initialized: bool,
    pub(super) tick_count: u64,
    pub(super) clock_value: Signal,
    pub(super) stop_reason: Option<StopReason>,
    pub(super) halt_handler: Option<Box<dyn FnMut(u64)>>,
    /// Modules poked since the last step.
    pub(super) poked: Vec<ModuleIndex>,
    // Scratch space reused by propagation.
    pub(super) queue: WorkQueue,
    pub(super) snapshot: Vec<Signal>,
    pub(super) changed: Vec<NetIndex>,
}

impl Default for System {
    fn default() -> Self {
        Self::from_valid_config(SystemConfig::default())
    }
}

impl System {
    /// Returns an empty system with the default configuration.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns an empty system, fails if the configured frequency is out of range.
    pub fn with_config(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SystemConfig) -> Self {
        Self {
            config,
            modules: Vec::new(),
            names: IndexMap::new(),
            nets: Vec::new(),
            outgoing: Vec::new(),
            system_inputs: vec![Drivers::new(); SYSTEM_INPUTS.len()],
            scopes: IndexMap::new(),
            initialized: false,
            tick_count: 0,
            clock_value: 0,
            stop_reason: None,
            halt_handler: None,
            poked: Vec::new(),
            queue: WorkQueue::new(),
            snapshot: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Returns true once [System::init] has been called, the structure can't change anymore.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    #[track_caller]
    fn check_unlocked(&self, action: &str) -> Result<()> {
        if self.initialized {
            return Err(Error::locked(action));
        }
        Ok(())
    }

    pub(super) fn check_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(Error::SystemNotInitialized);
        }
        Ok(())
    }

    /// Registers an anonymous module.
    ///
    /// Anonymous modules can't be looked up by name, they show up as `anonymous_<index>`
    /// in errors, VCD dumps and graph exports.
    #[track_caller]
    pub fn add_module<M: Module>(&mut self, module: M) -> Result<ModuleId<M>> {
        self.check_unlocked("add a module")?;
        let name = format!("{}{}", ANONYMOUS_PREFIX, self.modules.len());
        Ok(self.register(name, module))
    }

    /// Registers a module under a unique `name`.
    ///
    /// Names starting with `anonymous_` are reserved for anonymous modules and fail with
    /// [Error::ReservedModuleName].
    #[track_caller]
    pub fn add_named_module<M: Module, S: Into<String>>(
        &mut self,
        name: S,
        module: M,
    ) -> Result<ModuleId<M>> {
        self.check_unlocked("add a module")?;
        let name = name.into();
        if name.starts_with(ANONYMOUS_PREFIX) {
            return Err(Error::ReservedModuleName { name });
        }
        if self.names.contains_key(&name) {
            return Err(Error::DuplicateModuleNames { name });
        }
        let id = self.register(name.clone(), module);
        self.names.insert(name, id.index());
        Ok(id)
    }

    fn register<M: Module>(&mut self, name: String, module: M) -> ModuleId<M> {
        let index = ModuleIndex(self.modules.len());
        let output_base = self.nets.len();
        let outputs = M::OUTPUTS.len();

        self.nets.resize(output_base + outputs, 0);
        self.outgoing.resize(output_base + outputs, IndexSet::new());
        debug!(
            "Registered module {} \"{}\" of type {}",
            index,
            name,
            std::any::type_name::<M>()
        );
        self.modules.push(ModuleEntry {
            name,
            behavior: Box::new(module),
            inputs: M::INPUTS,
            outputs: M::OUTPUTS,
            drivers: vec![Drivers::new(); M::INPUTS.len()],
            output_base,
            guaranteed: false,
            update_enabled: true,
        });
        ModuleId::new(index)
    }

    #[track_caller]
    pub(super) fn entry(&self, index: ModuleIndex) -> &ModuleEntry {
        match self.modules.get(index.0) {
            Some(entry) => entry,
            None => panic!(
                "Module {} doesn't exist, the system has {} modules",
                index,
                self.modules.len()
            ),
        }
    }

    /// Returns the entry of the module with handle `id`, checking that it is an `M`.
    #[track_caller]
    fn typed_entry<M: Module>(&self, id: ModuleId<M>) -> &ModuleEntry {
        let entry = self.entry(id.index());
        if !entry.behavior.as_any().is::<M>() {
            panic!(
                "Module {} is a {}, the id is for a {}",
                id.index(),
                entry.behavior.type_name(),
                std::any::type_name::<M>()
            );
        }
        entry
    }

    /// Returns the index of the module called `name`.
    pub fn module_index(&self, name: &str) -> Result<ModuleIndex> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidModuleName {
                name: name.to_string(),
            })
    }

    #[track_caller]
    fn net<S: Module>(&self, src: ModuleId<S>, output: Output<S>) -> NetIndex {
        // Validates the handle.
        output.descriptor();
        NetIndex(self.typed_entry(src).output_base + output.index())
    }

    #[track_caller]
    fn add_input_driver(
        &mut self,
        dst: ModuleIndex,
        input: usize,
        connection: Connection,
    ) -> Result<()> {
        self.check_unlocked("connect an input")?;
        let entry = &mut self.modules[dst.0];
        if add_driver(&mut entry.drivers[input], connection) {
            trace!(
                "Connected {} to input {} of \"{}\"",
                connection,
                entry.inputs.as_slice()[input].name,
                entry.name
            );
            if let Driver::Net(net) = connection.driver {
                self.outgoing[net.0].insert(dst);
            }
        }
        Ok(())
    }

    /// Connects `output` of `src` to `input` of `dst`.
    ///
    /// If `output` is [Output::not], `input` reads the negated output. Connecting the same
    /// pair twice has no effect.
    ///
    /// # Panics
    ///
    /// Will panic if either id belongs to another system.
    #[track_caller]
    pub fn connect<D: Module, S: Module>(
        &mut self,
        dst: ModuleId<D>,
        input: Input<D>,
        src: ModuleId<S>,
        output: Output<S>,
    ) -> Result<()> {
        self.check_unlocked("connect an input")?;
        input.descriptor();
        self.typed_entry(dst);
        let net = self.net(src, output);
        self.add_input_driver(
            dst.index(),
            input.index(),
            Connection::new(net, output.is_active_low()),
        )
    }

    /// Drives `input` of `dst` with a constant value.
    ///
    /// Fails with [Error::ConstantOutOfRange] if `value` doesn't fit in the input.
    #[track_caller]
    pub fn connect_const<D: Module>(
        &mut self,
        dst: ModuleId<D>,
        input: Input<D>,
        value: Signal,
    ) -> Result<()> {
        self.check_unlocked("connect an input")?;
        let descriptor = input.descriptor();
        let entry = self.typed_entry(dst);
        if value & !descriptor.mask() != 0 {
            return Err(Error::ConstantOutOfRange {
                module: entry.name.clone(),
                signal: descriptor.name,
                width: descriptor.width,
                value,
            });
        }
        self.add_input_driver(dst.index(), input.index(), Connection::new(value, false))
    }

    /// Connects two named modules by signal names, for tooling that doesn't know the module types.
    #[track_caller]
    pub fn connect_named(
        &mut self,
        dst: &str,
        input: &str,
        src: &str,
        output: &str,
        active_low: bool,
    ) -> Result<()> {
        self.check_unlocked("connect an input")?;
        let dst = self.module_index(dst)?;
        let src = self.module_index(src)?;
        let input = self.entry(dst).input_index(input)?;
        let source = self.entry(src);
        let net = NetIndex(source.output_base + source.output_index(output)?);
        self.add_input_driver(dst, input, Connection::new(net, active_low))
    }

    #[track_caller]
    fn connect_system<S: Module>(
        &mut self,
        input: SystemInput,
        src: ModuleId<S>,
        output: Output<S>,
    ) -> Result<()> {
        self.check_unlocked("connect a system input")?;
        let net = self.net(src, output);
        let connection = Connection::new(net, output.is_active_low());
        if add_driver(&mut self.system_inputs[usize::from(input)], connection) {
            trace!("Connected {} to system input {}", connection, input);
        }
        Ok(())
    }

    /// Drives the HALT input of the system with `output` of `src`.
    #[track_caller]
    pub fn connect_halt<S: Module>(&mut self, src: ModuleId<S>, output: Output<S>) -> Result<()> {
        self.connect_system(SystemInput::Halt, src, output)
    }

    /// Drives the ERROR input of the system with `output` of `src`.
    #[track_caller]
    pub fn connect_error<S: Module>(&mut self, src: ModuleId<S>, output: Output<S>) -> Result<()> {
        self.connect_system(SystemInput::Error, src, output)
    }

    /// Drives the EXIT input of the system with `output` of `src`.
    #[track_caller]
    pub fn connect_exit<S: Module>(&mut self, src: ModuleId<S>, output: Output<S>) -> Result<()> {
        self.connect_system(SystemInput::Exit, src, output)
    }

    /// Drives the 8 bit EXIT_CODE input of the system with `output` of `src`.
    #[track_caller]
    pub fn connect_exit_code<S: Module>(
        &mut self,
        src: ModuleId<S>,
        output: Output<S>,
    ) -> Result<()> {
        self.connect_system(SystemInput::ExitCode, src, output)
    }

    /// Returns the current value of a system input.
    pub fn system_input(&self, input: SystemInput) -> Signal {
        read_drivers(&self.system_inputs[usize::from(input)], &self.nets) & input.descriptor().mask()
    }

    /// Returns the current value of system input number `index`.
    pub fn system_input_at(&self, index: usize) -> Result<Signal> {
        let input = SystemInput::iter()
            .nth(index)
            .ok_or_else(|| Error::IndexOutOfBounds {
                direction: Direction::Input,
                module: SYSTEM_NAME.to_string(),
                index,
                count: SYSTEM_INPUTS.len(),
            })?;
        Ok(self.system_input(input))
    }

    /// Returns a reference to the module with handle `id`.
    ///
    /// # Panics
    ///
    /// Will panic if `id` belongs to another system.
    #[track_caller]
    pub fn module<M: Module>(&self, id: ModuleId<M>) -> &M {
        let entry = self.entry(id.index());
        match entry.behavior.as_any().downcast_ref::<M>() {
            Some(module) => module,
            None => panic!(
                "Module {} is a {}, the id is for a {}",
                id.index(),
                entry.behavior.type_name(),
                std::any::type_name::<M>()
            ),
        }
    }

    /// Returns a mutable reference to the module with handle `id`.
    ///
    /// Changes to the module state are only visible in its outputs after the next settle.
    ///
    /// # Panics
    ///
    /// Will panic if `id` belongs to another system.
    pub fn module_mut<M: Module>(&mut self, id: ModuleId<M>) -> &mut M {
        let count = self.modules.len();
        let entry = match self.modules.get_mut(id.index().0) {
            Some(entry) => entry,
            None => panic!(
                "Module {} doesn't exist, the system has {} modules",
                id.index(),
                count
            ),
        };
        let actual = entry.behavior.type_name();
        match entry.behavior.as_any_mut().downcast_mut::<M>() {
            Some(module) => module,
            None => panic!(
                "Module {} is a {}, the id is for a {}",
                id.index(),
                actual,
                std::any::type_name::<M>()
            ),
        }
    }

    fn typed_module_index<M: Module>(&self, name: &str) -> Result<ModuleIndex> {
        let index = self.module_index(name)?;
        let behavior = &self.entry(index).behavior;
        if !behavior.as_any().is::<M>() {
            return Err(Error::InvalidModuleType {
                name: name.to_string(),
                expected: std::any::type_name::<M>(),
                actual: behavior.type_name(),
            });
        }
        Ok(index)
    }

    /// Returns the typed handle of the module called `name`.
    pub fn module_id<M: Module>(&self, name: &str) -> Result<ModuleId<M>> {
        self.typed_module_index::<M>(name).map(ModuleId::new)
    }

    /// Looks up a module by name and downcasts it to `M`.
    ///
    /// Fails with [Error::InvalidModuleName] if there is no such module and with
    /// [Error::InvalidModuleType] if it isn't an `M`.
    pub fn get_module<M: Module>(&self, name: &str) -> Result<&M> {
        let id = self.module_id::<M>(name)?;
        Ok(self.module(id))
    }

    pub fn get_module_mut<M: Module>(&mut self, name: &str) -> Result<&mut M> {
        let id = self.module_id::<M>(name)?;
        Ok(self.module_mut(id))
    }

    /// Names of the named modules in registration order.
    pub fn named_modules(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(|name| name.as_str())
    }

    /// Returns a view for name and index based access to the ports of module `name`.
    pub fn module_ref(&self, name: &str) -> Result<ModuleRef<'_>> {
        let index = self.module_index(name)?;
        Ok(ModuleRef {
            system: self,
            index,
        })
    }

    /// Returns a view of the module at `index`, named or not.
    pub fn module_at(&self, index: ModuleIndex) -> Option<ModuleRef<'_>> {
        if index.0 < self.modules.len() {
            Some(ModuleRef {
                system: self,
                index,
            })
        } else {
            None
        }
    }

    /// Returns the current value of `input` of module `id`.
    ///
    /// # Panics
    ///
    /// Will panic if `id` belongs to another system.
    #[track_caller]
    pub fn input<M: Module>(&self, id: ModuleId<M>, input: Input<M>) -> Signal {
        let entry = self.typed_entry(id);
        read_drivers(&entry.drivers[input.index()], &self.nets) & input.descriptor().mask()
    }

    /// Returns the current value of `output` of module `id`, negated if `output` is active low.
    #[track_caller]
    pub fn output<M: Module>(&self, id: ModuleId<M>, output: Output<M>) -> Signal {
        let descriptor = output.descriptor();
        let value = self.nets[self.net(id, output).0];
        if output.is_active_low() {
            !value & descriptor.mask()
        } else {
            value
        }
    }

    /// Returns the current value of input `signal` of module `module`.
    pub fn get_input(&self, module: &str, signal: &str) -> Result<Signal> {
        self.module_ref(module)?.input(signal)
    }

    /// Returns the current value of output `signal` of module `module`.
    pub fn get_output(&self, module: &str, signal: &str) -> Result<Signal> {
        self.module_ref(module)?.output(signal)
    }

    /// Overwrites output `signal` of module `module`, masked to its width.
    ///
    /// The value stays until the module updates again, see [System::poke] to keep it for a step.
    pub fn set_output(&mut self, module: &str, signal: &str, value: Signal) -> Result<()> {
        let index = self.module_index(module)?;
        let entry = self.entry(index);
        let output = entry.output_index(signal)?;
        let net = entry.output_base + output;
        self.nets[net] = value & entry.outputs.as_slice()[output].mask();
        Ok(())
    }

    /// Enables or disables the update of module `module`, a disabled module keeps its outputs.
    pub fn enable_update(&mut self, module: &str, enabled: bool) -> Result<()> {
        let index = self.module_index(module)?;
        self.modules[index.0].update_enabled = enabled;
        Ok(())
    }

    /// Forces output `signal` of module `module` to `value` and settles the system.
    ///
    /// The update of the module is disabled until the end of the next [System::step] so the
    /// poked value survives the following clock cycle.
    pub fn poke(&mut self, module: &str, signal: &str, value: Signal) -> Result<()> {
        self.check_initialized()?;
        self.set_output(module, signal, value)?;
        let index = self.module_index(module)?;
        self.modules[index.0].update_enabled = false;
        if !self.poked.contains(&index) {
            self.poked.push(index);
        }
        debug!("Poked {}.{} = {:#x}", module, signal, value);
        self.update_all()
    }

    /// Value of the clock, 1 between a rising and a falling edge.
    pub fn clock_value(&self) -> Signal {
        self.clock_value
    }

    /// Number of half steps since the last reset.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of full clock cycles since the last reset.
    pub fn cycle(&self) -> u64 {
        self.tick_count / 2
    }

    /// Why the simulation stopped, [None] while it can continue.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Sets the handler called with the current cycle when HALT is asserted on a rising edge
    /// and the step isn't resuming.
    ///
    /// The simulation continues when the handler returns, a debugger can block in it until
    /// the user acknowledges the halt.
    pub fn on_halt<F: FnMut(u64) + 'static>(&mut self, handler: F) {
        self.halt_handler = Some(Box::new(handler));
    }

    /// Locks the structure of the system and resets it.
    #[track_caller]
    pub fn init(&mut self) -> Result<()> {
        self.check_unlocked("initialize the system")?;
        debug!(
            "Initializing system with {} modules and {} nets",
            self.modules.len(),
            self.nets.len()
        );
        self.initialized = true;
        self.reset()
    }

    /// Resets every module and the clock, then settles the system.
    pub fn reset(&mut self) -> Result<()> {
        debug!("Resetting system");
        self.tick_count = 0;
        self.clock_value = 0;
        self.stop_reason = None;
        for entry in &mut self.modules {
            entry.behavior.reset_state();
            entry.guaranteed = false;
        }
        for scope in self.scopes.values_mut() {
            scope.clear_history();
        }
        self.update_all()
    }

    /// Adds an empty scope called `name`.
    pub fn add_scope<S: Into<String>>(&mut self, name: S) -> Result<()> {
        let name = name.into();
        if self.scopes.contains_key(&name) {
            return Err(Error::DuplicateScopeNames { name });
        }
        self.scopes.insert(name.clone(), VcdScope::new(name));
        Ok(())
    }

    pub fn scope(&self, name: &str) -> Result<&VcdScope> {
        self.scopes.get(name).ok_or_else(|| Error::InvalidScopeName {
            name: name.to_string(),
        })
    }

    #[track_caller]
    fn scope_mut(&mut self, name: &str) -> Result<&mut VcdScope> {
        self.check_unlocked("monitor a signal")?;
        self.scopes
            .get_mut(name)
            .ok_or_else(|| Error::InvalidScopeName {
                name: name.to_string(),
            })
    }

    /// Records the changes of `output` of module `id` in scope `scope`.
    #[track_caller]
    pub fn monitor<M: Module>(
        &mut self,
        scope: &str,
        id: ModuleId<M>,
        output: Output<M>,
    ) -> Result<()> {
        self.scope_mut(scope)?;
        let net = self.net(id, output);
        let descriptor = output.descriptor();
        let module = self.typed_entry(id).name.clone();
        self.scope_mut(scope)?.monitor(
            ProbeSource::Net(net),
            descriptor.width,
            &module,
            descriptor.name,
        );
        Ok(())
    }

    /// Records the changes of every output of module `id` in scope `scope`.
    #[track_caller]
    pub fn monitor_module<M: Module>(&mut self, scope: &str, id: ModuleId<M>) -> Result<()> {
        for index in 0..M::OUTPUTS.len() {
            self.monitor(scope, id, Output::new(index))?;
        }
        Ok(())
    }

    /// Records the changes of the system clock in scope `scope`.
    #[track_caller]
    pub fn monitor_clock(&mut self, scope: &str) -> Result<()> {
        self.scope_mut(scope)?
            .monitor(ProbeSource::Clock, 1, SYSTEM_NAME, "CLK");
        Ok(())
    }

    /// Renders the recorded history of `scopes` as a value change dump, all scopes if empty.
    pub fn vcd(&self, scopes: &[&str]) -> Result<String> {
        let selected = if scopes.is_empty() {
            self.scopes.values().collect::<Vec<_>>()
        } else {
            scopes
                .iter()
                .map(|name| self.scope(name))
                .collect::<Result<Vec<_>>>()?
        };
        let date = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        Ok(render_vcd(&selected, self.config.frequency, &date))
    }
}

/// Name and index based view of one module of a [System], used by tooling like debuggers.
///
/// # Example
/// ```
/// use synclogic::{Bus, System};
///
/// let mut system = System::new();
/// let bus = system.add_named_module("bus", Bus).unwrap();
/// system.connect_const(bus, Bus::BUS_DATA_IN, 0xab).unwrap();
/// system.init().unwrap();
///
/// let bus = system.module_ref("bus").unwrap();
/// assert_eq!(bus.input_names().collect::<Vec<_>>(), vec!["BUS_DATA_IN"]);
/// assert_eq!(bus.output("BUS_DATA_OUT").unwrap(), 0xab);
/// assert_eq!(bus.output_at(0).unwrap(), 0xab);
/// assert!(bus.output_at(1).is_err());
/// ```
#[derive(Clone, Copy)]
pub struct ModuleRef<'a> {
    system: &'a System,
    index: ModuleIndex,
}

impl<'a> ModuleRef<'a> {
    fn entry(&self) -> &'a ModuleEntry {
        self.system.entry(self.index)
    }

    pub fn index(&self) -> ModuleIndex {
        self.index
    }

    pub fn name(&self) -> &'a str {
        &self.entry().name
    }

    /// Rust type name of the module.
    pub fn type_name(&self) -> &'static str {
        self.entry().behavior.type_name()
    }

    pub fn inputs(&self) -> SignalList {
        self.entry().inputs
    }

    pub fn outputs(&self) -> SignalList {
        self.entry().outputs
    }

    pub fn input_names(&self) -> impl Iterator<Item = &'static str> {
        self.entry().inputs.names()
    }

    pub fn output_names(&self) -> impl Iterator<Item = &'static str> {
        self.entry().outputs.names()
    }

    pub fn input_at(&self, index: usize) -> Result<Signal> {
        let entry = self.entry();
        entry.check_index(Direction::Input, index)?;
        Ok(read_drivers(&entry.drivers[index], &self.system.nets)
            & entry.inputs.as_slice()[index].mask())
    }

    pub fn input(&self, name: &str) -> Result<Signal> {
        self.input_at(self.entry().input_index(name)?)
    }

    pub fn output_at(&self, index: usize) -> Result<Signal> {
        let entry = self.entry();
        entry.check_index(Direction::Output, index)?;
        Ok(self.system.nets[entry.output_base + index])
    }

    pub fn output(&self, name: &str) -> Result<Signal> {
        self.output_at(self.entry().output_index(name)?)
    }

    /// Sources of input `name`.
    pub fn drivers(&self, name: &str) -> Result<&'a [Connection]> {
        let entry = self.entry();
        Ok(entry.drivers[entry.input_index(name)?].as_slice())
    }

    pub fn is_update_enabled(&self) -> bool {
        self.entry().update_enabled
    }

    /// True if the module promised its outputs don't depend on its inputs this half cycle.
    pub fn is_guaranteed(&self) -> bool {
        self.entry().guaranteed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::{Bus, Not, Switch};
    use crate::graph::module::UpdateContext;

    #[derive(Default)]
    struct Wide;
    ports! {
        Wide {
            inputs { W_IN: 4 }
            outputs { W_OUT: 4 }
        }
    }
    impl Module for Wide {
        fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
            ctx.set_output(Self::W_OUT, 0xfff3);
        }
    }

    #[test]
    fn test_output_masking() {
        let mut system = System::new();
        let w = system.add_named_module("w", Wide).unwrap();
        system.init().unwrap();

        assert_eq!(system.output(w, Wide::W_OUT), 0x3);
        assert_eq!(system.output(w, Wide::W_OUT.not()), 0xc);
        system.set_output("w", "W_OUT", 0xff).unwrap();
        assert_eq!(system.get_output("w", "W_OUT").unwrap(), 0xf);
    }

    #[test]
    fn test_wired_or_with_active_low() {
        let mut system = System::new();
        let a = system.add_module(Switch::new(0b0101)).unwrap();
        let b = system.add_module(Switch::new(0b0011)).unwrap();
        let w = system.add_named_module("w", Wide).unwrap();
        system.connect(w, Wide::W_IN, a, Switch::SWITCH_OUT).unwrap();
        system
            .connect(w, Wide::W_IN, b, Switch::SWITCH_OUT.not())
            .unwrap();
        system.init().unwrap();

        let switch_width = Switch::SWITCH_OUT.descriptor().mask();
        let expected = (0b0101 | (!0b0011 & switch_width)) & 0xf;
        assert_eq!(system.input(w, Wide::W_IN), expected);
        assert_eq!(system.get_input("w", "W_IN").unwrap(), expected);
    }

    #[test]
    fn test_unconnected_input_reads_zero() {
        let mut system = System::new();
        let w = system.add_module(Wide).unwrap();
        system.init().unwrap();
        assert_eq!(system.input(w, Wide::W_IN), 0);
        assert_eq!(system.system_input(SystemInput::ExitCode), 0);
    }

    #[test]
    fn test_duplicate_connection() {
        let mut system = System::new();
        let s = system.add_module(Switch::new(1)).unwrap();
        let bus = system.add_named_module("bus", Bus).unwrap();
        system.connect(bus, Bus::BUS_DATA_IN, s, Switch::SWITCH_OUT).unwrap();
        system.connect(bus, Bus::BUS_DATA_IN, s, Switch::SWITCH_OUT).unwrap();
        system.connect_const(bus, Bus::BUS_DATA_IN, 4).unwrap();
        system.connect_const(bus, Bus::BUS_DATA_IN, 4).unwrap();

        let bus = system.module_ref("bus").unwrap();
        assert_eq!(bus.drivers("BUS_DATA_IN").unwrap().len(), 2);
        assert_eq!(system.outgoing[0].len(), 1);
    }

    #[test]
    fn test_locked_after_init() {
        let mut system = System::new();
        let bus = system.add_named_module("bus", Bus).unwrap();
        let not = system.add_named_module("not", Not).unwrap();
        system.add_scope("main").unwrap();
        system.init().unwrap();

        assert!(matches!(
            system.add_module(Bus),
            Err(Error::SystemLocked { .. })
        ));
        assert!(matches!(
            system.add_named_module("other", Bus),
            Err(Error::SystemLocked { .. })
        ));
        assert!(matches!(
            system.connect(bus, Bus::BUS_DATA_IN, not, Not::NOT_OUT),
            Err(Error::SystemLocked { .. })
        ));
        assert!(matches!(
            system.connect_const(not, Not::NOT_IN, 1),
            Err(Error::SystemLocked { .. })
        ));
        assert!(matches!(
            system.connect_named("bus", "BUS_DATA_IN", "not", "NOT_OUT", false),
            Err(Error::SystemLocked { .. })
        ));
        assert!(matches!(
            system.connect_exit(not, Not::NOT_OUT),
            Err(Error::SystemLocked { .. })
        ));
        assert!(matches!(
            system.monitor("main", bus, Bus::BUS_DATA_OUT),
            Err(Error::SystemLocked { .. })
        ));
        assert!(matches!(system.init(), Err(Error::SystemLocked { .. })));
    }

    #[test]
    fn test_locked_reports_caller() {
        let mut system = System::new();
        system.init().unwrap();
        let line = line!() + 1;
        match system.add_module(Bus) {
            Err(Error::SystemLocked { location, action }) => {
                assert_eq!(location.line(), line);
                assert_eq!(action, "add a module");
            }
            _ => panic!("expected SystemLocked"),
        }
    }

    #[test]
    fn test_names() {
        let mut system = System::new();
        system.add_named_module("b", Bus).unwrap();
        let anonymous = system.add_module(Not).unwrap();
        system.add_named_module("a", Not).unwrap();

        assert_eq!(
            system.add_named_module("b", Not).err(),
            Some(Error::DuplicateModuleNames {
                name: "b".to_string()
            })
        );
        assert_eq!(system.named_modules().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(
            system.module_at(anonymous.index()).unwrap().name(),
            "anonymous_1"
        );
        assert!(system.get_module::<Bus>("b").is_ok());
        assert!(matches!(
            system.get_module::<Not>("b"),
            Err(Error::InvalidModuleType { .. })
        ));
        assert!(matches!(
            system.get_module_mut::<Bus>("nope"),
            Err(Error::InvalidModuleName { .. })
        ));
        assert!(matches!(
            system.get_output("a", "NOPE"),
            Err(Error::InvalidSignalName { .. })
        ));
    }

    #[test]
    fn test_constant_out_of_range() {
        let mut system = System::new();
        let not = system.add_named_module("not", Not).unwrap();
        assert!(matches!(
            system.connect_const(not, Not::NOT_IN, 2),
            Err(Error::ConstantOutOfRange { width: 1, value: 2, .. })
        ));
    }

    #[test]
    fn test_connect_named() {
        let mut system = System::new();
        system.add_named_module("switch", Switch::new(7)).unwrap();
        system.add_named_module("bus", Bus).unwrap();
        system
            .connect_named("bus", "BUS_DATA_IN", "switch", "SWITCH_OUT", false)
            .unwrap();
        assert!(matches!(
            system.connect_named("bus", "BUS_DATA_OUT", "switch", "SWITCH_OUT", false),
            Err(Error::InvalidSignalName { .. })
        ));
        system.init().unwrap();
        assert_eq!(system.get_output("bus", "BUS_DATA_OUT").unwrap(), 7);
    }

    #[test]
    fn test_system_input_at() {
        let system = System::new();
        assert_eq!(system.system_input_at(3), Ok(0));
        assert!(matches!(
            system.system_input_at(4),
            Err(Error::IndexOutOfBounds { count: 4, .. })
        ));
        assert_eq!(SystemInput::ExitCode.to_string(), "EXIT_CODE");
        assert_eq!(SystemInput::ExitCode.descriptor().width, 8);
    }

    #[test]
    fn test_scopes() {
        let mut system = System::new();
        let bus = system.add_named_module("bus", Bus).unwrap();
        system.add_scope("main").unwrap();
        assert!(matches!(
            system.add_scope("main"),
            Err(Error::DuplicateScopeNames { .. })
        ));
        assert!(matches!(
            system.monitor("nope", bus, Bus::BUS_DATA_OUT),
            Err(Error::InvalidScopeName { .. })
        ));
        system.monitor("main", bus, Bus::BUS_DATA_OUT).unwrap();
        system.monitor_module("main", bus).unwrap();
        system.monitor_clock("main").unwrap();

        let scope = system.scope("main").unwrap();
        assert_eq!(
            scope.ids().collect::<Vec<_>>(),
            vec!["bus_bus_data_out", "system_clk"]
        );
        assert!(system.vcd(&["nope"]).is_err());
    }

    #[test]
    #[should_panic(expected = "Module 5 doesn't exist")]
    fn test_foreign_id() {
        let foreign = ModuleId::<Bus>::new(ModuleIndex(5));
        System::new().module(foreign);
    }

    fn two_nots() -> System {
        let mut system = System::new();
        system.add_module(Not).unwrap();
        system.add_module(Not).unwrap();
        system
    }

    #[test]
    #[should_panic(expected = "Module 0 is a")]
    fn test_connect_foreign_id_of_other_type() {
        let mut other = System::new();
        let bus = other.add_module(Bus).unwrap();
        let switch = other.add_module(Switch::new(0)).unwrap();

        let mut system = two_nots();
        let _ = system.connect(bus, Bus::BUS_DATA_IN, switch, Switch::SWITCH_OUT);
    }

    #[test]
    #[should_panic(expected = "the id is for a")]
    fn test_output_foreign_id_of_other_type() {
        let mut other = System::new();
        let bus = other.add_module(Bus).unwrap();
        two_nots().output(bus, Bus::BUS_DATA_OUT);
    }

    #[test]
    #[should_panic(expected = "Module 1 is a")]
    fn test_connect_const_foreign_id_of_other_type() {
        let mut other = System::new();
        other.add_module(Not).unwrap();
        let bus = other.add_module(Bus).unwrap();
        let _ = two_nots().connect_const(bus, Bus::BUS_DATA_IN, 1);
    }

    #[test]
    fn test_reserved_names() {
        let mut system = System::new();
        system.add_module(Bus).unwrap();
        assert_eq!(
            system.add_named_module("anonymous_0", Bus).err(),
            Some(Error::ReservedModuleName {
                name: "anonymous_0".to_string()
            })
        );
        assert!(system.add_named_module("anonymous_7", Not).is_err());
        assert!(system.add_named_module("anonymous", Not).is_ok());
        assert_eq!(system.module_count(), 2);
    }
}
