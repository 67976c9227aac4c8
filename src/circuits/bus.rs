use crate::graph::*;

/// 64 bit bus, forwards the wired or of everything connected to [Bus::BUS_DATA_IN].
///
/// # Example
/// ```
/// # use synclogic::{Bus, System};
/// let mut system = System::new();
/// let bus = system.add_module(Bus).unwrap();
/// system.connect_const(bus, Bus::BUS_DATA_IN, 0b0110).unwrap();
/// system.connect_const(bus, Bus::BUS_DATA_IN, 0b1000).unwrap();
/// system.init().unwrap();
///
/// assert_eq!(system.output(bus, Bus::BUS_DATA_OUT), 0b1110);
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct Bus;
ports! {
    Bus {
        inputs { BUS_DATA_IN: 64 }
        outputs { BUS_DATA_OUT: 64 }
    }
}
impl Module for Bus {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        ctx.set_output(Self::BUS_DATA_OUT, ctx.input(Self::BUS_DATA_IN));
    }
}
