//! Core contracts shared by the emulator crates.
//!
//! This crate defines the seams between components: the memory bus the CPU
//! executes against, the latched interrupt lines connecting interrupt
//! producers to the CPU, and the read-only observation surface the PPU
//! exposes to passive observers such as the scene stitcher.

mod bus;
mod interrupt;
mod observe;

pub use bus::{Bus, SimpleBus};
pub use interrupt::{Interrupt, InterruptLines};
pub use observe::{
    reg, CoarseScroll, MapperObserver, MaskView, PpuObserver, PpuRegisterView, PpuView,
    ScanlineIrqSource, FRAME_HEIGHT, FRAME_WIDTH,
};
