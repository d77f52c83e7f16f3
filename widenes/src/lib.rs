//! wideNES-style scene stitching.
//!
//! NES games pan a 256x240 viewport over worlds many screens wide by
//! rewriting the PPU scroll registers every frame. By watching those writes
//! (plus the two tricks games use to split the screen for HUDs: mid-frame
//! $2006 writes and mapper scanline IRQs), the engine recovers a global
//! camera position each frame and accretes the visible background into a
//! persistent map of screen-sized tiles, growing the recorded world as the
//! player explores.
//!
//! The engine is a passive observer: wire it to the PPU's `write_end` /
//! `frame_end` callbacks and the mapper's scanline IRQ, then read the tile
//! map back out for rendering.

mod engine;
mod tile;

pub use engine::{Diagnostics, Pad, SamplePolicy, Scroll, WideNes};
pub use tile::{Tile, TileMap, BLOCK, BLOCKS_H, BLOCKS_W, TILE_H, TILE_W};
