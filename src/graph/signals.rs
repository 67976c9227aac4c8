use std::fmt::{self, Display, Formatter};
use strum_macros::Display as StrumDisplay;

/// Value carried by a signal, only the lowest `width` bits are significant.
pub type Signal = u64;

/// Direction of a signal relative to the module that declares it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, StrumDisplay)]
pub enum Direction {
    #[strum(serialize = "input")]
    Input,
    #[strum(serialize = "output")]
    Output,
}

/// Returns the mask that keeps the lowest `width` bits of a [Signal].
///
/// # Example
/// ```
/// # use synclogic::mask;
/// assert_eq!(mask(1), 0b1);
/// assert_eq!(mask(8), 0xff);
/// assert_eq!(mask(64), u64::MAX);
/// ```
pub const fn mask(width: u32) -> Signal {
    if width >= 64 {
        !0
    } else {
        (1 << width) - 1
    }
}

/// Compile time metadata of a named, fixed width, directional wire.
///
/// Descriptors are normally created by the [ports!](crate::ports) macro.
///
/// # Example
/// ```
/// # use synclogic::{SignalDescriptor, Direction};
/// const DATA: SignalDescriptor = SignalDescriptor::output("DATA", 4);
/// const NDATA: SignalDescriptor = DATA.not();
///
/// assert_eq!(NDATA.name, "DATA");
/// assert_eq!(NDATA.width, 4);
/// assert_eq!(NDATA.active_low, true);
/// assert_eq!(DATA.mask(), 0xf);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SignalDescriptor {
    pub name: &'static str,
    pub width: u32,
    pub direction: Direction,
    pub active_low: bool,
}

impl SignalDescriptor {
    /// Returns a new input descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `width` is not in 1..=64, at compile time when used in a constant.
    pub const fn input(name: &'static str, width: u32) -> Self {
        assert!(width >= 1 && width <= 64, "Signal width must be in 1..=64");
        Self {
            name,
            width,
            direction: Direction::Input,
            active_low: false,
        }
    }

    /// Returns a new active high output descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `width` is not in 1..=64, at compile time when used in a constant.
    pub const fn output(name: &'static str, width: u32) -> Self {
        assert!(width >= 1 && width <= 64, "Signal width must be in 1..=64");
        Self {
            name,
            width,
            direction: Direction::Output,
            active_low: false,
        }
    }

    /// Returns the same output with inverted polarity.
    ///
    /// # Panics
    ///
    /// Panics if `self` is an input.
    pub const fn not(self) -> Self {
        assert!(
            matches!(self.direction, Direction::Output),
            "Only output signals can be negated"
        );
        Self {
            active_low: !self.active_low,
            ..self
        }
    }

    pub const fn mask(&self) -> Signal {
        mask(self.width)
    }

    pub const fn is_input(&self) -> bool {
        matches!(self.direction, Direction::Input)
    }

    pub const fn is_output(&self) -> bool {
        matches!(self.direction, Direction::Output)
    }
}

impl Display for SignalDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let not = if self.active_low { "!" } else { "" };
        write!(f, "{}{}[{}]:{}", not, self.name, self.width, self.direction)
    }
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Ordered, homogeneous (all inputs or all outputs) list of [SignalDescriptor]s with unique names.
///
/// The constructors are `const fn`s, a list that breaks the rules fails constant evaluation,
/// so a module type with a bad port declaration doesn't compile once it is used.
///
/// # Example
/// ```
/// # use synclogic::{SignalDescriptor, SignalList, Direction};
/// const SIGNALS: &[SignalDescriptor] = &[
///     SignalDescriptor::input("A", 1),
///     SignalDescriptor::input("B", 8),
/// ];
/// const INPUTS: SignalList = SignalList::new(SIGNALS);
///
/// assert_eq!(INPUTS.direction(), Some(Direction::Input));
/// assert_eq!(INPUTS.index_of("B"), Some(1));
/// assert_eq!(INPUTS.len(), 2);
/// ```
///
/// Mixed lists are rejected:
/// ```should_panic
/// # use synclogic::{SignalDescriptor, SignalList};
/// let signals: &'static [SignalDescriptor] = Box::leak(Box::new([
///     SignalDescriptor::input("A", 1),
///     SignalDescriptor::output("B", 1),
/// ]));
/// SignalList::new(signals);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SignalList {
    signals: &'static [SignalDescriptor],
}

impl SignalList {
    /// The list of a module without inputs or outputs.
    pub const EMPTY: SignalList = SignalList { signals: &[] };

    /// Returns a new list, the direction is taken from the first signal.
    ///
    /// # Panics
    ///
    /// Panics if the directions are mixed or a name is repeated.
    pub const fn new(signals: &'static [SignalDescriptor]) -> Self {
        if signals.is_empty() {
            return Self::EMPTY;
        }
        Self::checked(signals, signals[0].is_input())
    }

    /// Returns a new list of inputs.
    ///
    /// # Panics
    ///
    /// Panics if any signal is an output or a name is repeated.
    pub const fn inputs(signals: &'static [SignalDescriptor]) -> Self {
        Self::checked(signals, true)
    }

    /// Returns a new list of outputs.
    ///
    /// # Panics
    ///
    /// Panics if any signal is an input or a name is repeated.
    pub const fn outputs(signals: &'static [SignalDescriptor]) -> Self {
        Self::checked(signals, false)
    }

    const fn checked(signals: &'static [SignalDescriptor], inputs: bool) -> Self {
        let mut i = 0;
        while i < signals.len() {
            assert!(
                signals[i].is_input() == inputs,
                "Signal list must contain only inputs or outputs"
            );
            let mut j = i + 1;
            while j < signals.len() {
                assert!(
                    !str_eq(signals[i].name, signals[j].name),
                    "Signal names must be unique within a signal list"
                );
                j += 1;
            }
            i += 1;
        }
        Self { signals }
    }

    /// Returns the direction of the signals, [None] if the list is empty.
    pub fn direction(&self) -> Option<Direction> {
        self.signals.first().map(|s| s.direction)
    }

    pub const fn len(&self) -> usize {
        self.signals.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'static SignalDescriptor> {
        self.signals.get(index)
    }

    /// Returns the position of the signal called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        let signals = self.signals;
        signals.iter().map(|s| s.name)
    }

    pub fn iter(&self) -> std::slice::Iter<'static, SignalDescriptor> {
        let signals = self.signals;
        signals.iter()
    }

    pub fn as_slice(&self) -> &'static [SignalDescriptor] {
        self.signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUTS: &[SignalDescriptor] = &[
        SignalDescriptor::output("Q", 1),
        SignalDescriptor::output("DATA", 64),
    ];

    #[test]
    fn test_masks() {
        assert_eq!(mask(3), 0b111);
        assert_eq!(mask(63), u64::MAX >> 1);
        assert_eq!(SignalDescriptor::input("X", 64).mask(), u64::MAX);
    }

    #[test]
    fn test_output_list() {
        let list = SignalList::outputs(OUTPUTS);
        assert_eq!(list.direction(), Some(Direction::Output));
        assert_eq!(list.names().collect::<Vec<_>>(), vec!["Q", "DATA"]);
        assert_eq!(list.index_of("DATA"), Some(1));
        assert_eq!(list.index_of("NOPE"), None);
        assert_eq!(list.get(1).unwrap().width, 64);
    }

    #[test]
    fn test_empty_list() {
        let list = SignalList::new(&[]);
        assert_eq!(list, SignalList::EMPTY);
        assert_eq!(list.direction(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_double_negation() {
        let q = SignalDescriptor::output("Q", 1);
        assert_eq!(q.not().not(), q);
        assert_eq!(q.not().to_string(), "!Q[1]:output");
    }

    #[test]
    #[should_panic(expected = "Signal list must contain only inputs or outputs")]
    fn test_inputs_rejects_outputs() {
        SignalList::inputs(OUTPUTS);
    }

    #[test]
    #[should_panic(expected = "Signal names must be unique within a signal list")]
    fn test_duplicate_names() {
        const DUPLICATED: &[SignalDescriptor] = &[
            SignalDescriptor::input("A", 1),
            SignalDescriptor::input("A", 2),
        ];
        SignalList::new(DUPLICATED);
    }

    #[test]
    #[should_panic(expected = "Only output signals can be negated")]
    fn test_negating_input() {
        SignalDescriptor::input("A", 1).not();
    }

    #[test]
    #[should_panic(expected = "Signal width must be in 1..=64")]
    fn test_zero_width() {
        SignalDescriptor::output("A", 0);
    }
}
