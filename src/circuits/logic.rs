use crate::graph::*;

/// Declares a 1 bit gate with inputs `$a`, `$b` and output `$out`.
macro_rules! binary_gate {
    ($(#[$meta:meta])* $gate:ident, $a:ident, $b:ident, $out:ident, $op:tt) => {
        $(#[$meta])*
        #[derive(Debug, Default, Copy, Clone)]
        pub struct $gate;
        ports! {
            $gate {
                inputs { $a: 1, $b: 1 }
                outputs { $out: 1 }
            }
        }
        impl Module for $gate {
            fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
                let value = ctx.input(Self::$a) $op ctx.input(Self::$b);
                ctx.set_output(Self::$out, value);
            }
        }
    };
}

binary_gate!(
    /// 1 bit and gate.
    And, AND_IN_A, AND_IN_B, AND_OUT, &
);
binary_gate!(
    /// 1 bit or gate, a single input with several sources is a wired or too.
    Or, OR_IN_A, OR_IN_B, OR_OUT, |
);
binary_gate!(
    /// 1 bit exclusive or gate.
    Xor, XOR_IN_A, XOR_IN_B, XOR_OUT, ^
);

/// 1 bit inverter.
///
/// # Example
/// ```
/// # use synclogic::{Not, System};
/// let mut system = System::new();
/// let not = system.add_module(Not).unwrap();
/// system.connect_const(not, Not::NOT_IN, 1).unwrap();
/// system.init().unwrap();
///
/// assert_eq!(system.output(not, Not::NOT_OUT), 0);
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct Not;
ports! {
    Not {
        inputs { NOT_IN: 1 }
        outputs { NOT_OUT: 1 }
    }
}
impl Module for Not {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        ctx.set_output(Self::NOT_OUT, !ctx.input(Self::NOT_IN));
    }
}
