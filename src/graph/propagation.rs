use super::error::{Error, Result};
use super::handles::{ModuleIndex, NetIndex};
use super::module::{Edge, InputReader};
use super::system::{StopReason, System, SystemInput};
use indexmap::IndexSet;
use num_integer::Integer;
use tracing::{error, info, trace, warn};

impl System {
    /// Evaluates module `index` if it's allowed to update, leaves the nets whose value
    /// changed in `self.changed`.
    fn evaluate(&mut self, index: usize) {
        self.changed.clear();
        let entry = &mut self.modules[index];
        if entry.guaranteed || !entry.update_enabled {
            return;
        }

        let range = entry.nets();
        self.snapshot.clear();
        self.snapshot.extend_from_slice(&self.nets[range.clone()]);

        let reader = InputReader {
            module: &entry.name,
            nets: &self.nets,
            drivers: &entry.drivers,
            inputs: entry.inputs,
            outputs: entry.outputs,
        };
        entry
            .behavior
            .evaluate(reader, &mut self.snapshot, &mut entry.guaranteed);

        for (net, new) in range.zip(self.snapshot.iter()) {
            if self.nets[net] != *new {
                self.nets[net] = *new;
                self.changed.push(NetIndex(net));
            }
        }
    }

    /// Runs the update of the module at `index` and returns the distinct modules reading
    /// one of its outputs that changed.
    ///
    /// Modules that guaranteed their outputs for this half cycle or whose update is disabled
    /// are skipped and affect nothing.
    pub fn update_and_check(&mut self, index: ModuleIndex) -> Vec<ModuleIndex> {
        self.entry(index);
        self.evaluate(index.0);
        let mut affected = IndexSet::new();
        for net in &self.changed {
            affected.extend(self.outgoing[net.0].iter().copied());
        }
        affected.into_iter().collect()
    }

    /// Updates modules until no output changes.
    ///
    /// Every module is evaluated once in index order, then every module reading an output
    /// that changed is queued again, until the queue is empty. Fails with
    /// [Error::DidNotSettle] if the configured limit of evaluations is reached, which means
    /// the combinational logic oscillates.
    pub fn update_all(&mut self) -> Result<()> {
        let limit = self.config.settle_limit(self.modules.len());
        self.queue.seed(self.modules.len());

        let mut evaluations = 0;
        while let Some(index) = self.queue.pop() {
            if limit.map_or(false, |limit| evaluations >= limit) {
                self.queue.clear();
                error!(
                    "The system did not settle after {} module evaluations",
                    evaluations
                );
                return Err(Error::DidNotSettle { evaluations });
            }
            evaluations += 1;

            self.evaluate(index);
            for net in &self.changed {
                for module in &self.outgoing[net.0] {
                    self.queue.push(module.0);
                }
            }
        }
        trace!("Settled after {} module evaluations", evaluations);
        Ok(())
    }

    /// Clears the guaranteed flags and calls the clock handler of every module in index order.
    fn clock_edge(&mut self, edge: Edge) {
        self.clock_value = match edge {
            Edge::Rising => 1,
            Edge::Falling => 0,
        };
        for entry in &mut self.modules {
            entry.guaranteed = false;
            let reader = InputReader {
                module: &entry.name,
                nets: &self.nets,
                drivers: &entry.drivers,
                inputs: entry.inputs,
                outputs: entry.outputs,
            };
            let outputs = &self.nets[entry.nets()];
            entry.behavior.edge(edge, reader, outputs);
        }
    }

    /// Simulates half a clock cycle, returns false if the simulation must stop.
    ///
    /// Before a rising edge the system inputs are checked in order: EXIT stops the
    /// simulation, ERROR stops it reporting EXIT_CODE, HALT calls the handler set with
    /// [System::on_halt] unless `resume` is true. The clock edge is followed by a settle,
    /// then every scope is sampled.
    pub fn half_step(&mut self, resume: bool) -> Result<bool> {
        self.check_initialized()?;
        self.update_all()?;

        if self.tick_count.is_even() {
            let exit_code = self.system_input(SystemInput::ExitCode);
            if self.system_input(SystemInput::Exit) != 0 {
                info!("Exited with exit code {}", exit_code);
                self.stop_reason = Some(StopReason::Exit(exit_code));
                return Ok(false);
            }
            if self.system_input(SystemInput::Error) != 0 {
                error!("The ERR signal was asserted (error code {})", exit_code);
                self.stop_reason = Some(StopReason::Error(exit_code));
                return Ok(false);
            }
            if self.system_input(SystemInput::Halt) != 0 && !resume {
                let cycle = self.cycle();
                match self.halt_handler.as_mut() {
                    Some(handler) => handler(cycle),
                    None => warn!("System halted at cycle {}, no halt handler set", cycle),
                }
            }
            self.clock_edge(Edge::Rising);
        } else {
            self.clock_edge(Edge::Falling);
        }

        self.update_all()?;

        let (tick, clock) = (self.tick_count, self.clock_value);
        for scope in self.scopes.values_mut() {
            scope.sample(tick, &self.nets, clock);
        }
        self.tick_count += 1;
        Ok(true)
    }

    /// Simulates a full clock cycle, returns false if the simulation must stop.
    ///
    /// Modules poked since the previous step get their update enabled again, also when the
    /// step fails.
    pub fn step(&mut self, resume: bool) -> Result<bool> {
        let running = match self.half_step(resume) {
            Ok(true) => self.half_step(resume),
            other => other,
        };
        for index in self.poked.drain(..) {
            self.modules[index.0].update_enabled = true;
        }
        running
    }

    /// Steps until EXIT or ERROR is asserted, returns the value of EXIT_CODE.
    pub fn run(&mut self, resume: bool) -> Result<u64> {
        while self.step(resume)? {}
        Ok(self.system_input(SystemInput::ExitCode))
    }
}
