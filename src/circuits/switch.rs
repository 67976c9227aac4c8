use crate::graph::*;

/// 64 bit value set from outside of the simulation, like a row of levers.
///
/// The value survives resets.
///
/// # Example
/// ```
/// # use synclogic::{Switch, System};
/// let mut system = System::new();
/// let switch = system.add_module(Switch::new(0)).unwrap();
/// system.init().unwrap();
///
/// system.module_mut(switch).toggle();
/// system.update_all().unwrap();
/// assert_eq!(system.output(switch, Switch::SWITCH_OUT), 1);
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct Switch {
    value: Signal,
}
ports! {
    Switch {
        inputs {}
        outputs { SWITCH_OUT: 64 }
    }
}
impl Switch {
    pub fn new(value: Signal) -> Self {
        Self { value }
    }

    pub fn set(&mut self, value: Signal) {
        self.value = value;
    }

    /// Flips the lowest bit.
    pub fn toggle(&mut self) {
        self.value ^= 1;
    }

    pub fn value(&self) -> Signal {
        self.value
    }
}
impl Module for Switch {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        ctx.set_output(Self::SWITCH_OUT, self.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_survives_reset() {
        let mut system = System::new();
        let switch = system.add_named_module("switch", Switch::new(3)).unwrap();
        system.init().unwrap();

        system.get_module_mut::<Switch>("switch").unwrap().set(7);
        system.reset().unwrap();
        assert_eq!(system.output(switch, Switch::SWITCH_OUT), 7);

        system.module_mut(switch).toggle();
        assert_eq!(system.module(switch).value(), 6);
    }
}
