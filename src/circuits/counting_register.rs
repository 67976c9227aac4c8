use crate::graph::*;
use tracing::warn;

/// 8 bit register that can load, increment or decrement its value on the rising edge.
///
/// * `CR_LD` loads `CR_DATA_IN`, it has priority over counting.
/// * `CR_INC` and `CR_DEC` count up and down, wrapping around. Both at once do nothing.
/// * `CR_EN` enables `CR_DATA_OUT`, which reads 0 otherwise. `CR_DATA_OUT_ALWAYS` is always
///   enabled.
/// * `CR_Z` is 1 when the value is 0.
///
/// # Example
/// ```
/// # use synclogic::{CountingRegister, System};
/// let mut system = System::new();
/// let cr = system.add_module(CountingRegister::new(254)).unwrap();
/// system.connect_const(cr, CountingRegister::CR_INC, 1).unwrap();
/// system.init().unwrap();
///
/// system.step(true).unwrap();
/// system.step(true).unwrap();
/// assert_eq!(system.output(cr, CountingRegister::CR_DATA_OUT_ALWAYS), 0);
/// assert_eq!(system.output(cr, CountingRegister::CR_Z), 1);
/// assert_eq!(system.output(cr, CountingRegister::CR_DATA_OUT), 0);
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct CountingRegister {
    reset_value: u8,
    value: u8,
}
ports! {
    CountingRegister {
        inputs {
            CR_INC: 1,
            CR_DEC: 1,
            CR_LD: 1,
            CR_EN: 1,
            CR_DATA_IN: 8,
        }
        outputs {
            CR_Z: 1,
            CR_DATA_OUT: 8,
            CR_DATA_OUT_ALWAYS: 8,
        }
    }
}
impl CountingRegister {
    /// Returns a register that holds `reset_value` after every reset.
    pub fn new(reset_value: u8) -> Self {
        Self {
            reset_value,
            value: reset_value,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }
}
impl Module for CountingRegister {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        let value = self.value as Signal;
        let enabled = ctx.input(Self::CR_EN) == 1;
        ctx.set_output(Self::CR_Z, (value == 0) as Signal);
        ctx.set_output(Self::CR_DATA_OUT, if enabled { value } else { 0 });
        ctx.set_output(Self::CR_DATA_OUT_ALWAYS, value);
    }

    fn clock_rising(&mut self, ctx: &ClockContext<'_, Self>) {
        if ctx.input(Self::CR_LD) == 1 {
            self.value = ctx.input(Self::CR_DATA_IN) as u8;
            return;
        }
        match (ctx.input(Self::CR_INC), ctx.input(Self::CR_DEC)) {
            (1, 1) => warn!("{}: CR_INC and CR_DEC are both asserted", ctx.name()),
            (1, _) => self.value = self.value.wrapping_add(1),
            (_, 1) => self.value = self.value.wrapping_sub(1),
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.value = self.reset_value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(reset_value: u8) -> (System, ModuleId<CountingRegister>) {
        let mut system = System::new();
        let cr = system
            .add_named_module("cr", CountingRegister::new(reset_value))
            .unwrap();
        (system, cr)
    }

    #[test]
    fn test_load() {
        let (mut system, cr) = register(0);
        system.connect_const(cr, CountingRegister::CR_LD, 1).unwrap();
        system.connect_const(cr, CountingRegister::CR_INC, 1).unwrap();
        system
            .connect_const(cr, CountingRegister::CR_DATA_IN, 0x5a)
            .unwrap();
        system.connect_const(cr, CountingRegister::CR_EN, 1).unwrap();
        system.init().unwrap();
        assert_eq!(system.output(cr, CountingRegister::CR_Z), 1);

        system.step(true).unwrap();
        assert_eq!(system.output(cr, CountingRegister::CR_DATA_OUT), 0x5a);
        assert_eq!(system.output(cr, CountingRegister::CR_Z), 0);
    }

    #[test]
    fn test_decrement_wraps() {
        let (mut system, cr) = register(1);
        system.connect_const(cr, CountingRegister::CR_DEC, 1).unwrap();
        system.init().unwrap();

        system.step(true).unwrap();
        assert_eq!(system.module(cr).value(), 0);
        system.step(true).unwrap();
        assert_eq!(system.module(cr).value(), 255);
        assert_eq!(
            system.get_output("cr", "CR_DATA_OUT_ALWAYS").unwrap(),
            255
        );
    }

    #[test]
    fn test_inc_and_dec_cancel() {
        let (mut system, cr) = register(9);
        system.connect_const(cr, CountingRegister::CR_INC, 1).unwrap();
        system.connect_const(cr, CountingRegister::CR_DEC, 1).unwrap();
        system.init().unwrap();

        system.step(true).unwrap();
        assert_eq!(system.module(cr).value(), 9);
    }

    #[test]
    fn test_changes_only_on_rising_edge() {
        let (mut system, cr) = register(0);
        system.connect_const(cr, CountingRegister::CR_INC, 1).unwrap();
        system.init().unwrap();

        system.half_step(true).unwrap();
        assert_eq!(system.module(cr).value(), 1);
        system.half_step(true).unwrap();
        assert_eq!(system.module(cr).value(), 1);
    }
}
