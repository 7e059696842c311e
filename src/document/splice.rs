//! Offset translation for files spliced into another unit with `include`.
//!
//! An included `.as` file has no compilation unit of its own: the compiler
//! parses it as part of the unit that includes it, so every node offset is an
//! offset into that unit's effective text. Offsets computed from the included
//! file's own text must be shifted before they can be matched against nodes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// From `local` onwards, effective offsets are shifted by `adjustment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetCue {
    pub local: usize,
    pub adjustment: isize,
}

/// How one file's text is spliced into the unit that includes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeSplice {
    /// File of the unit that includes this one.
    pub parent: PathBuf,
    /// Cues sorted by `local`.
    pub cues: Vec<OffsetCue>,
}

impl IncludeSplice {
    pub fn new(parent: PathBuf, mut cues: Vec<OffsetCue>) -> Self {
        cues.sort_by_key(|cue| cue.local);
        Self { parent, cues }
    }

    /// Translate an offset in the included file's own text to the effective
    /// text of the including unit.
    ///
    /// Returns `None` when no cue covers the offset or the shift would land
    /// before the start of the unit.
    pub fn to_effective(&self, local: usize) -> Option<usize> {
        let cue = self.cues.iter().take_while(|cue| cue.local <= local).last()?;
        local.checked_add_signed(cue.adjustment)
    }
}
