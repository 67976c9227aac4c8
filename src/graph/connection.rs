use super::handles::NetIndex;
use super::signals::Signal;
use auto_from::From;
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// Source of the value of one connection.
#[derive(From, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Driver {
    /// An output of a module.
    Net(NetIndex),
    /// A constant value.
    Const(Signal),
}

/// One source of an input, with the polarity it is read with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Connection {
    pub driver: Driver,
    pub active_low: bool,
}

impl Connection {
    pub fn new<D: Into<Driver>>(driver: D, active_low: bool) -> Self {
        Self {
            driver: driver.into(),
            active_low,
        }
    }

    /// Returns the value of the source, inverted if the connection is active low.
    #[inline(always)]
    pub fn value(&self, nets: &[Signal]) -> Signal {
        let value = match self.driver {
            Driver::Net(net) => nets[net.0],
            Driver::Const(value) => value,
        };
        if self.active_low {
            !value
        } else {
            value
        }
    }
}

impl Display for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let not = if self.active_low { "!" } else { "" };
        match self.driver {
            Driver::Net(net) => write!(f, "{}net{}", not, net),
            Driver::Const(value) => write!(f, "{}{:#x}", not, value),
        }
    }
}

/// Sources of one input, most inputs have one or two.
pub(crate) type Drivers = SmallVec<[Connection; 2]>;

/// Adds `connection` to `drivers` unless it's already there, returns true if it was added.
pub(super) fn add_driver(drivers: &mut Drivers, connection: Connection) -> bool {
    if drivers.contains(&connection) {
        return false;
    }
    drivers.push(connection);
    true
}

/// Bitwise or of every source, 0 if there are none.
#[inline(always)]
pub(super) fn read_drivers(drivers: &[Connection], nets: &[Signal]) -> Signal {
    drivers.iter().fold(0, |acc, c| acc | c.value(nets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_drivers() {
        let drivers = Drivers::new();
        assert_eq!(read_drivers(&drivers, &[0xff]), 0);
    }

    #[test]
    fn test_wired_or() {
        let nets = [0b0011, 0b0101];
        for &(a_low, b_low) in &[(false, false), (true, false), (false, true), (true, true)] {
            let mut drivers = Drivers::new();
            add_driver(&mut drivers, Connection::new(NetIndex(0), a_low));
            add_driver(&mut drivers, Connection::new(NetIndex(1), b_low));

            let a = if a_low { !nets[0] } else { nets[0] };
            let b = if b_low { !nets[1] } else { nets[1] };
            assert_eq!(read_drivers(&drivers, &nets), a | b);
        }
    }

    #[test]
    fn test_constants() {
        let mut drivers = Drivers::new();
        add_driver(&mut drivers, Connection::new(0b1000u64, false));
        add_driver(&mut drivers, Connection::new(NetIndex(0), false));
        assert_eq!(read_drivers(&drivers, &[0b0001]), 0b1001);
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut drivers = Drivers::new();
        assert!(add_driver(&mut drivers, Connection::new(NetIndex(3), false)));
        assert!(!add_driver(&mut drivers, Connection::new(NetIndex(3), false)));
        assert!(add_driver(&mut drivers, Connection::new(NetIndex(3), true)));
        assert_eq!(drivers.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Connection::new(NetIndex(4), true).to_string(), "!net4");
        assert_eq!(Connection::new(255u64, false).to_string(), "0xff");
    }
}
