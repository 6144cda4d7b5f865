/// The `flags.3` half of a conditional parameter such as `flags.3?string`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Flag {
    /// Name of the flag word holding the bit (`flags`, `flags2`, ...).
    pub name: String,
    /// Bit position inside the 32-bit word.
    pub index: u32,
}

impl Flag {
    /// The single-bit mask selected by this flag.
    pub fn mask(&self) -> u32 {
        1u32.checked_shl(self.index).unwrap_or(0)
    }
}
