//! Symbol records flowing through the pipeline

use std::fmt;

/// Function name printed by addr2line when it cannot resolve an address
pub const UNRESOLVED_NAME: &str = "??";

/// Location printed by addr2line when it cannot resolve an address
pub const UNRESOLVED_LOCATION: &str = "??:0";

/// One symbol table entry as emitted by `nm -S`
///
/// The address is fixed at construction; resolution fills in the location
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    address: String,
    pub size: String,
    pub symbol_type: Option<char>,
    pub symbol_name: String,
    pub location: Option<String>,
    resolved: bool,
}

impl Record {
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        size: impl Into<String>,
        symbol_type: Option<char>,
        symbol_name: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            size: size.into(),
            symbol_type,
            symbol_name: symbol_name.into(),
            location: None,
            resolved: false,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Hex address string exactly as read from the dump
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Address as an integer, `None` if the string is not valid hex
    #[must_use]
    pub fn address_value(&self) -> Option<u64> {
        u64::from_str_radix(&self.address, 16).ok()
    }

    #[must_use]
    pub fn resolved_successfully(&self) -> bool {
        self.resolved
    }

    /// Mark the record resolved at `location`
    pub fn mark_resolved(&mut self, location: String) {
        debug_assert!(!self.resolved, "record {} resolved twice", self.address);
        self.location = Some(location);
        self.resolved = true;
    }
}

/// Formats the record the way `nm -S -l` prints it:
/// `<address> <size>[ <type>][ <name>][\t<location>]`
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.size)?;
        if let Some(symbol_type) = self.symbol_type {
            write!(f, " {symbol_type}")?;
        }
        if !self.symbol_name.is_empty() {
            write!(f, " {}", self.symbol_name)?;
        }
        if let Some(ref location) = self.location {
            write!(f, "\t{location}")?;
        }
        Ok(())
    }
}

/// True iff addr2line answered with the unresolved sentinel pair
#[must_use]
pub fn is_unresolved(name: &str, location: &str) -> bool {
    name == UNRESOLVED_NAME && location == UNRESOLVED_LOCATION
}
