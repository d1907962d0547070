use alloc::string::String;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CmuError {
    #[error("could not allocate {what}")]
    AllocationFailure { what: &'static str },
    #[error("duplicate registration: {0}")]
    DuplicateRegistration(Collision),
    #[error("channel `{name}` does not belong to this registry's PLL")]
    UnknownParent { name: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collision {
    Name(String),
    Index(u32),
    Pll(String),
}

impl core::fmt::Display for Collision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name `{name}` already taken"),
            Self::Index(index) => write!(f, "channel index {index} already occupied"),
            Self::Pll(name) => write!(f, "PLL already registered, refusing `{name}`"),
        }
    }
}

impl From<Collision> for CmuError {
    fn from(value: Collision) -> Self {
        Self::DuplicateRegistration(value)
    }
}

impl From<alloc::collections::TryReserveError> for CmuError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        Self::AllocationFailure {
            what: "channel slots",
        }
    }
}
