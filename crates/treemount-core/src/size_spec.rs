//! Encoded measurement constraints.
//!
//! A size spec packs a mode into the top two bits and a size into the low
//! thirty, matching the encoding host platforms hand to their views during
//! measurement.

use std::fmt;

const MODE_SHIFT: u32 = 30;
const MODE_MASK: u32 = 0x3 << MODE_SHIFT;
const UNSPECIFIED: u32 = 0;
const EXACTLY: u32 = 1 << MODE_SHIFT;
const AT_MOST: u32 = 2 << MODE_SHIFT;

/// Largest size a spec can carry.
pub const MAX_SIZE: i32 = (1 << MODE_SHIFT) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeSpecMode {
    /// The parent imposes no constraint.
    Unspecified,
    /// The parent decided the exact size.
    Exactly,
    /// The child may be as large as it wants up to the size.
    AtMost,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeSpec(u32);

impl SizeSpec {
    pub fn new(size: i32, mode: SizeSpecMode) -> Self {
        debug_assert!(
            (0..=MAX_SIZE).contains(&size),
            "size spec sizes fit in 30 bits: {size}"
        );
        let bits = match mode {
            SizeSpecMode::Unspecified => UNSPECIFIED,
            SizeSpecMode::Exactly => EXACTLY,
            SizeSpecMode::AtMost => AT_MOST,
        };
        Self((size.max(0) as u32 & !MODE_MASK) | bits)
    }

    pub fn exactly(size: i32) -> Self {
        Self::new(size, SizeSpecMode::Exactly)
    }

    pub fn at_most(size: i32) -> Self {
        Self::new(size, SizeSpecMode::AtMost)
    }

    pub fn unspecified() -> Self {
        Self::new(0, SizeSpecMode::Unspecified)
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn mode(self) -> SizeSpecMode {
        match self.0 & MODE_MASK {
            EXACTLY => SizeSpecMode::Exactly,
            AT_MOST => SizeSpecMode::AtMost,
            _ => SizeSpecMode::Unspecified,
        }
    }

    pub fn size(self) -> i32 {
        (self.0 & !MODE_MASK) as i32
    }

    /// Resolves a desired size against this constraint.
    pub fn resolve(self, desired: i32) -> i32 {
        match self.mode() {
            SizeSpecMode::Exactly => self.size(),
            SizeSpecMode::AtMost => desired.min(self.size()),
            SizeSpecMode::Unspecified => desired,
        }
    }
}

impl fmt::Debug for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SizeSpec({self})")
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode() {
            SizeSpecMode::Unspecified => "UNSPECIFIED",
            SizeSpecMode::Exactly => "EXACTLY",
            SizeSpecMode::AtMost => "AT_MOST",
        };
        write!(f, "{mode} {}", self.size())
    }
}

/// Returns whether a result measured as `old_measured` under `old` can be
/// reused for `new` without measuring again.
pub fn is_compatible(old: SizeSpec, new: SizeSpec, old_measured: i32) -> bool {
    if old == new {
        return true;
    }

    match (new.mode(), old.mode()) {
        (SizeSpecMode::Exactly, _) => new.size() == old_measured,
        (SizeSpecMode::AtMost, SizeSpecMode::Unspecified) => old_measured <= new.size(),
        (SizeSpecMode::AtMost, SizeSpecMode::AtMost) => {
            old.size() > new.size() && old_measured <= new.size()
        }
        _ => false,
    }
}

/// Width and height variant of [`is_compatible`].
pub fn has_compatible_size_spec(
    old_width_spec: SizeSpec,
    old_height_spec: SizeSpec,
    new_width_spec: SizeSpec,
    new_height_spec: SizeSpec,
    old_measured_width: i32,
    old_measured_height: i32,
) -> bool {
    is_compatible(old_width_spec, new_width_spec, old_measured_width)
        && is_compatible(old_height_spec, new_height_spec, old_measured_height)
}
