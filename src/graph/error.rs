use super::signals::{Direction, Signal};
use std::panic::Location;
use thiserror::Error;

/// Errors returned by fallible [System](super::System) and module port operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Tried to {action} after the system was initialized, at {location}")]
    SystemLocked {
        action: String,
        location: &'static Location<'static>,
    },
    #[error("{direction} index {index} is out of bounds for module \"{module}\" with {count} {direction}s")]
    IndexOutOfBounds {
        direction: Direction,
        module: String,
        index: usize,
        count: usize,
    },
    #[error("Module \"{module}\" has no signal named \"{signal}\"")]
    InvalidSignalName { module: String, signal: String },
    #[error("A module named \"{name}\" already exists")]
    DuplicateModuleNames { name: String },
    #[error("Module name \"{name}\" is reserved for anonymous modules")]
    ReservedModuleName { name: String },
    #[error("There is no module named \"{name}\"")]
    InvalidModuleName { name: String },
    #[error("Module \"{name}\" is a {actual}, not a {expected}")]
    InvalidModuleType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("The system must be initialized before it can be simulated, call System::init first")]
    SystemNotInitialized,
    #[error("There is no scope named \"{name}\"")]
    InvalidScopeName { name: String },
    #[error("A scope named \"{name}\" already exists")]
    DuplicateScopeNames { name: String },
    #[error("System frequency {frequency}Hz is outside of the supported range [0.005Hz, 0.5THz]")]
    SystemFrequencyOutOfRange { frequency: f64 },
    #[error("Constant {value:#x} doesn't fit in input \"{signal}\" of module \"{module}\" which is {width} bits wide")]
    ConstantOutOfRange {
        module: String,
        signal: &'static str,
        width: u32,
        value: Signal,
    },
    #[error("Combinational logic did not settle after {evaluations} module evaluations")]
    DidNotSettle { evaluations: usize },
}

impl Error {
    #[track_caller]
    pub(super) fn locked(action: &str) -> Self {
        Error::SystemLocked {
            action: action.to_string(),
            location: Location::caller(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::IndexOutOfBounds {
            direction: Direction::Output,
            module: "reg".to_string(),
            index: 3,
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "output index 3 is out of bounds for module \"reg\" with 2 outputs"
        );

        let err = Error::ConstantOutOfRange {
            module: "reg".to_string(),
            signal: "CR_LD",
            width: 1,
            value: 2,
        };
        assert_eq!(
            err.to_string(),
            "Constant 0x2 doesn't fit in input \"CR_LD\" of module \"reg\" which is 1 bits wide"
        );
    }

    #[test]
    fn test_locked_location() {
        let line = line!() + 1;
        let err = Error::locked("connect");
        match err {
            Error::SystemLocked { action, location } => {
                assert_eq!(action, "connect");
                assert_eq!(location.line(), line);
                assert!(location.file().ends_with("error.rs"));
            }
            _ => panic!("expected SystemLocked"),
        }
    }
}
