//! Fixed-function buffer state
//!
//! Color, depth and stencil write/test state as tracked by a renderer. Each
//! buffer can be *locked*: while locked, the guarded setters are ignored so a
//! pass can pin state (e.g. disable color writes) across draws that would
//! otherwise reconfigure it.
//!
//! | Buffer  | Lock-guarded             | Always applied                  |
//! |---------|--------------------------|---------------------------------|
//! | color   | `set_mask`               | `set_clear`                     |
//! | depth   | `set_mask`               | `set_test`, `set_func`, `set_clear` |
//! | stencil | `set_test`, `set_mask`   | `set_func`, `set_op`, `set_clear`   |

use glam::Vec4;
use wgpu::{CompareFunction, StencilOperation};

#[derive(Debug, Clone, PartialEq)]
pub struct ColorBufferState {
    mask: bool,
    locked: bool,
    clear: Vec4,
}

impl Default for ColorBufferState {
    fn default() -> Self {
        Self {
            mask: true,
            locked: false,
            clear: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

impl ColorBufferState {
    pub fn set_mask(&mut self, mask: bool) {
        if !self.locked {
            self.mask = mask;
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn set_clear(&mut self, clear: Vec4) {
        self.clear = clear;
    }

    #[must_use]
    pub fn mask(&self) -> bool {
        self.mask
    }

    #[must_use]
    pub fn locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn clear(&self) -> Vec4 {
        self.clear
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthBufferState {
    test: bool,
    mask: bool,
    func: CompareFunction,
    locked: bool,
    clear: f32,
}

impl Default for DepthBufferState {
    fn default() -> Self {
        Self {
            test: true,
            mask: true,
            func: CompareFunction::LessEqual,
            locked: false,
            clear: 1.0,
        }
    }
}

impl DepthBufferState {
    pub fn set_test(&mut self, test: bool) {
        self.test = test;
    }

    pub fn set_mask(&mut self, mask: bool) {
        if !self.locked {
            self.mask = mask;
        }
    }

    pub fn set_func(&mut self, func: CompareFunction) {
        self.func = func;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn set_clear(&mut self, depth: f32) {
        self.clear = depth;
    }

    #[must_use]
    pub fn test(&self) -> bool {
        self.test
    }

    #[must_use]
    pub fn mask(&self) -> bool {
        self.mask
    }

    #[must_use]
    pub fn func(&self) -> CompareFunction {
        self.func
    }

    #[must_use]
    pub fn locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn clear(&self) -> f32 {
        self.clear
    }

    /// Depth comparison of an incoming fragment against the stored depth.
    #[must_use]
    pub fn passes(&self, incoming: f32, stored: f32) -> bool {
        !self.test || compare(self.func, incoming, stored)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StencilBufferState {
    test: bool,
    write_mask: u32,
    func: CompareFunction,
    reference: u32,
    func_mask: u32,
    fail: StencilOperation,
    z_fail: StencilOperation,
    z_pass: StencilOperation,
    clear: u32,
    locked: bool,
}

impl Default for StencilBufferState {
    fn default() -> Self {
        Self {
            test: false,
            write_mask: 0xff,
            func: CompareFunction::Always,
            reference: 0,
            func_mask: 0xff,
            fail: StencilOperation::Keep,
            z_fail: StencilOperation::Keep,
            z_pass: StencilOperation::Keep,
            clear: 0,
            locked: false,
        }
    }
}

impl StencilBufferState {
    pub fn set_test(&mut self, test: bool) {
        if !self.locked {
            self.test = test;
        }
    }

    pub fn set_mask(&mut self, write_mask: u32) {
        if !self.locked {
            self.write_mask = write_mask;
        }
    }

    pub fn set_func(&mut self, func: CompareFunction, reference: u32, mask: u32) {
        self.func = func;
        self.reference = reference;
        self.func_mask = mask;
    }

    pub fn set_op(&mut self, fail: StencilOperation, z_fail: StencilOperation, z_pass: StencilOperation) {
        self.fail = fail;
        self.z_fail = z_fail;
        self.z_pass = z_pass;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn set_clear(&mut self, clear: u32) {
        self.clear = clear;
    }

    #[must_use]
    pub fn test(&self) -> bool {
        self.test
    }

    #[must_use]
    pub fn write_mask(&self) -> u32 {
        self.write_mask
    }

    #[must_use]
    pub fn func(&self) -> (CompareFunction, u32, u32) {
        (self.func, self.reference, self.func_mask)
    }

    #[must_use]
    pub fn ops(&self) -> (StencilOperation, StencilOperation, StencilOperation) {
        (self.fail, self.z_fail, self.z_pass)
    }

    #[must_use]
    pub fn locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn clear(&self) -> u32 {
        self.clear
    }

    /// Stencil comparison: `(ref & mask) FUNC (stored & mask)`.
    #[must_use]
    pub fn passes(&self, stored: u8) -> bool {
        if !self.test {
            return true;
        }
        let reference = self.reference & self.func_mask;
        let value = u32::from(stored) & self.func_mask;
        compare(self.func, reference, value)
    }

    /// New stored value after a fragment with the given outcome.
    #[must_use]
    pub fn apply(&self, stored: u8, stencil_passed: bool, depth_passed: bool) -> u8 {
        if !self.test {
            return stored;
        }
        let op = match (stencil_passed, depth_passed) {
            (false, _) => self.fail,
            (true, false) => self.z_fail,
            (true, true) => self.z_pass,
        };
        let reference = self.reference as u8;
        let next = match op {
            StencilOperation::Keep => stored,
            StencilOperation::Zero => 0,
            StencilOperation::Replace => reference,
            StencilOperation::Invert => !stored,
            StencilOperation::IncrementClamp => stored.saturating_add(1),
            StencilOperation::DecrementClamp => stored.saturating_sub(1),
            StencilOperation::IncrementWrap => stored.wrapping_add(1),
            StencilOperation::DecrementWrap => stored.wrapping_sub(1),
        };
        let mask = self.write_mask as u8;
        (stored & !mask) | (next & mask)
    }
}

/// Buffer state of a renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawState {
    pub color: ColorBufferState,
    pub depth: DepthBufferState,
    pub stencil: StencilBufferState,
}

impl DrawState {
    /// Unlocks everything and restores defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn compare<T: PartialOrd>(func: CompareFunction, a: T, b: T) -> bool {
    match func {
        CompareFunction::Never => false,
        CompareFunction::Less => a < b,
        CompareFunction::Equal => a == b,
        CompareFunction::LessEqual => a <= b,
        CompareFunction::Greater => a > b,
        CompareFunction::NotEqual => a != b,
        CompareFunction::GreaterEqual => a >= b,
        CompareFunction::Always => true,
    }
}
