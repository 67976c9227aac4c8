use crate::graph::*;

/// Exposes the system clock as an output, 1 after a rising edge and 0 after a falling edge.
///
/// Its output doesn't depend on any input so it only updates once per half cycle.
#[derive(Debug, Default, Copy, Clone)]
pub struct ClockSource {
    high: bool,
}
ports! {
    ClockSource {
        inputs {}
        outputs { CLK_OUT: 1 }
    }
}
impl Module for ClockSource {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        ctx.set_output(Self::CLK_OUT, self.high as Signal);
        ctx.guarantee_no_input();
    }

    fn clock_rising(&mut self, _ctx: &ClockContext<'_, Self>) {
        self.high = true;
    }

    fn clock_falling(&mut self, _ctx: &ClockContext<'_, Self>) {
        self.high = false;
    }

    fn reset(&mut self) {
        self.high = false;
    }
}
