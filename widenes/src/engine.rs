//! Scroll heuristics and the frame-stitching pipeline.
//!
//! The engine never drives emulation. It watches PPU register writes and
//! mapper scanline IRQs as they happen, then once per frame fuses those
//! observations into a global camera position and copies the visible
//! background into the tile map.

use nes_core::{
    reg, MapperObserver, PpuObserver, PpuView, ScanlineIrqSource, FRAME_WIDTH,
};
use serde::Serialize;

use crate::tile::{Tile, TileMap, BLOCK, TILE_H, TILE_W};

/// Pixels of slack when deciding whether a scroll delta wrapped.
const FUZZ: i32 = 10;

/// How pixels are sampled into blocks that are already done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplePolicy {
    /// Keep the first fully-observed content; done blocks stop updating.
    /// The stitched map shows the world's initial state.
    FirstSeen,
    /// Track the latest content; done blocks keep updating. The stitched
    /// map shows the world as the player left it.
    #[default]
    LastSeen,
}

/// Screen-edge padding in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pad {
    pub l: i32,
    pub r: i32,
    pub t: i32,
    pub b: i32,
}

/// Global camera position and the last frame's delta.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Scroll {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
}

/// Wrapped 8-bit scroll observation.
#[derive(Debug, Clone, Copy, Default)]
struct NesScroll {
    x: u8,
    y: u8,
}

/// Volatile per-frame latches set by the write/IRQ observers and consumed
/// (then cleared) by the end-of-frame pipeline.
#[derive(Default)]
struct Heuristics {
    ppuscroll: PpuScrollLatch,
    ppuaddr: PpuAddrLatch,
    mapper_irq: MapperIrqLatch,
}

/// The original heuristic: sniff PPUSCROLL for the camera position.
#[derive(Default)]
struct PpuScrollLatch {
    curr: NesScroll,
}

/// Mid-frame $2006 writes double as a scroll mechanism (Zelda-style).
#[derive(Default)]
struct PpuAddrLatch {
    did_change: bool,
    changed_on_scanline: u32,
    changed_while_rendering: bool,
    /// The heuristic fired at least once; sticky across frames.
    active: bool,
    cut_scanline: u32,
    new_scroll: NesScroll,
}

/// Mapper scanline IRQs split the screen for status bars (SMB3-style).
struct MapperIrqLatch {
    happened: bool,
    on_scanline: u32,
    scroll_pre_irq: NesScroll,
}

impl Default for MapperIrqLatch {
    fn default() -> Self {
        Self {
            happened: false,
            // 239 pads out to zero when read by a frame with no IRQ
            on_scanline: 239,
            scroll_pre_irq: NesScroll::default(),
        }
    }
}

/// Snapshot of engine state for host diagnostics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Diagnostics {
    pub scroll: Scroll,
    pub pad_total: Pad,
    pub tile_count: usize,
}

/// The scene stitcher.
///
/// Register it as a PPU and mapper observer; read the tile map, scroll, and
/// padding back out for rendering. Tiles persist until cleared or evicted.
pub struct WideNes {
    tiles: TileMap,
    pad_guess: Pad,
    pad_offset: Pad,
    pad_total: Pad,
    last_scroll: NesScroll,
    curr_scroll: NesScroll,
    scroll: Scroll,
    h: Heuristics,
    policy: SamplePolicy,
}

impl WideNes {
    pub fn new() -> Self {
        Self::with_policy(SamplePolicy::default())
    }

    pub fn with_policy(policy: SamplePolicy) -> Self {
        Self {
            tiles: TileMap::new(),
            pad_guess: Pad::default(),
            pad_offset: Pad::default(),
            pad_total: Pad::default(),
            last_scroll: NesScroll::default(),
            curr_scroll: NesScroll::default(),
            scroll: Scroll::default(),
            h: Heuristics::default(),
            policy,
        }
    }

    /// User-supplied padding, added to the per-frame guess.
    pub fn pad_offset(&self) -> Pad {
        self.pad_offset
    }

    pub fn set_pad_offset(&mut self, pad: Pad) {
        self.pad_offset = pad;
    }

    /// Effective padding used by the last frame.
    pub fn pad_total(&self) -> Pad {
        self.pad_total
    }

    /// Global camera position and last frame's delta.
    pub fn scroll(&self) -> Scroll {
        self.scroll
    }

    pub fn policy(&self) -> SamplePolicy {
        self.policy
    }

    /// Tiles in `(tx, ty)` order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tile(&self, tx: i32, ty: i32) -> Option<&Tile> {
        self.tiles.get(&(tx, ty))
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Drop every recorded tile.
    pub fn clear_tiles(&mut self) {
        self.tiles.clear();
    }

    /// Drop tiles more than `radius` tiles (Chebyshev distance) away from
    /// the tile the camera is currently over.
    pub fn evict_beyond(&mut self, radius: i32) {
        let cam_tx = self.scroll.x.div_euclid(TILE_W);
        let cam_ty = self.scroll.y.div_euclid(TILE_H);
        self.tiles.retain(|&(tx, ty), _| {
            (tx - cam_tx).abs().max((ty - cam_ty).abs()) <= radius
        });
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            scroll: self.scroll,
            pad_total: self.pad_total,
            tile_count: self.tiles.len(),
        }
    }

    // =========================================================================
    // End-of-frame pipeline
    // =========================================================================

    fn end_frame(&mut self, ppu: &dyn PpuView) {
        let regs = ppu.registers();

        // Seed the frame's scroll from the last PPUSCROLL writes.
        self.curr_scroll = self.h.ppuscroll.curr;

        // A hidden left column means the game is masking scroll artifacts;
        // slice it off.
        self.pad_guess.l = if regs.mask.show_left { 0 } else { 8 };

        // Mid-frame $2006 writes that land while rendering are a creative
        // scroll implementation, usually paired with a HUD split.
        if self.h.ppuaddr.did_change {
            if self.h.ppuaddr.changed_on_scanline < 241 && self.h.ppuaddr.changed_while_rendering {
                self.h.ppuaddr.active = true;
                self.h.ppuaddr.cut_scanline = self.h.ppuaddr.changed_on_scanline;

                if self.h.ppuaddr.cut_scanline < 240 / 2 {
                    // HUD on top
                    self.pad_guess.t = self.h.ppuaddr.cut_scanline as i32;
                } else {
                    // HUD on the bottom; reads the mapper latch even when no
                    // IRQ fired this frame (inherited coupling, kept as-is)
                    self.pad_guess.b = 239 - self.h.mapper_irq.on_scanline as i32;
                }

                self.curr_scroll.y = self.h.ppuaddr.new_scroll.y;
            }
        }
        self.h.ppuaddr.did_change = false;

        // Scanline IRQs split the screen too, usually for a status bar.
        if self.h.mapper_irq.happened {
            if self.h.mapper_irq.on_scanline < 240 / 2 {
                // status bar on top; the scroll seen at frame end is the
                // playfield's
                self.pad_guess.t = self.h.mapper_irq.on_scanline as i32;
            } else {
                // status bar on the bottom; the playfield's scroll is the
                // one captured before the IRQ rewrote it
                self.pad_guess.b = 239 - self.h.mapper_irq.on_scanline as i32;
                self.curr_scroll = self.h.mapper_irq.scroll_pre_irq;
            }
        }
        self.h.mapper_irq.happened = false;

        self.pad_total.l = (self.pad_guess.l + self.pad_offset.l).max(0);
        self.pad_total.r = (self.pad_guess.r + self.pad_offset.r).max(0);
        self.pad_total.t = (self.pad_guess.t + self.pad_offset.t).max(0);
        self.pad_total.b = (self.pad_guess.b + self.pad_offset.b).max(0);

        // Scroll deltas, recovering motion across the 8-bit registers' wrap:
        // a jump close to the full visible span is a wrap, not a warp.
        let mut dx = self.curr_scroll.x as i32 - self.last_scroll.x as i32;
        let mut dy = self.curr_scroll.y as i32 - self.last_scroll.y as i32;

        let thresh_w = (TILE_W - self.pad_total.l - self.pad_total.r) - FUZZ;
        let thresh_h = (TILE_H - self.pad_total.t - self.pad_total.b) - FUZZ;

        if dx.abs() > thresh_w {
            dx += if dx < 0 { 256 } else { -256 };
        }
        if dy.abs() > thresh_h {
            dy += if dy < 0 { 240 } else { -240 };
        }

        // The $2006 override can inject a one-frame vertical jump; a delta
        // taller than the cut can't be real motion.
        if self.h.ppuaddr.active && dy.abs() > self.h.ppuaddr.cut_scanline as i32 {
            dy = 0;
        }

        self.scroll.x += dx;
        self.scroll.y += dy;
        self.scroll.dx = dx;
        self.scroll.dy = dy;
        self.last_scroll = self.curr_scroll;

        // Project every visible background pixel into its tile. Sprites
        // leave artifacts, so only the background layer is sampled.
        let fb = ppu.background_framebuffer();
        for sy in self.pad_total.t..(TILE_H - self.pad_total.b) {
            for sx in self.pad_total.l..(TILE_W - self.pad_total.r) {
                self.record_pixel(fb, sx, sy);
            }
        }

        // Up to 4 tiles intersect the screen; graduate their fully-observed
        // blocks and reset every fill count.
        let cam_tx = self.scroll.x.div_euclid(TILE_W);
        let cam_ty = self.scroll.y.div_euclid(TILE_H);
        for tx in [cam_tx, cam_tx + 1] {
            for ty in [cam_ty, cam_ty + 1] {
                if let Some(tile) = self.tiles.get_mut(&(tx, ty)) {
                    tile.commit_filled_blocks();
                }
            }
        }
    }

    /// Copy source pixel `(sx, sy)` into the tile it lands on.
    fn record_pixel(&mut self, fb: &[u8], sx: i32, sy: i32) {
        let tx = (self.scroll.x + sx).div_euclid(TILE_W);
        let ty = (self.scroll.y + sy).div_euclid(TILE_H);

        // Destination within that tile's 256x240 space
        let dx = (self.scroll.x - tx * TILE_W) + sx;
        let dy = (self.scroll.y - ty * TILE_H) + sy;

        let tile = self
            .tiles
            .entry((tx, ty))
            .or_insert_with(|| Tile::new(tx, ty));

        if self.policy == SamplePolicy::FirstSeen
            && tile.is_done((dx / BLOCK) as usize, (dy / BLOCK) as usize)
        {
            return;
        }

        let src = ((sy * FRAME_WIDTH as i32 + sx) * 4) as usize;
        tile.record(dx as usize, dy as usize, &fb[src..src + 4]);
    }
}

impl Default for WideNes {
    fn default() -> Self {
        Self::new()
    }
}

impl PpuObserver for WideNes {
    fn write_end(&mut self, ppu: &dyn PpuView, addr: u16, value: u8) {
        let regs = ppu.registers();

        match addr {
            reg::PPUSCROLL => {
                // The latch already toggled, so its post-write value names
                // the component this write supplied.
                if regs.scroll_latch {
                    self.h.ppuscroll.curr.x = value;
                } else {
                    self.h.ppuscroll.curr.y = value;
                }
            }
            reg::PPUADDR => {
                self.h.ppuaddr.did_change = true;

                if ppu.scanline() < 241 && regs.mask.is_rendering {
                    log::trace!("${addr:04X} <- {value:02X} on scanline {}", ppu.scanline());
                }

                self.h.ppuaddr.changed_while_rendering = regs.mask.is_rendering;
                self.h.ppuaddr.changed_on_scanline = ppu.scanline();

                // The t register doubles as a scroll source when rewritten
                // through $2006.
                if regs.scroll_latch {
                    self.h.ppuaddr.new_scroll.x = regs.t.coarse_x.wrapping_mul(8);
                } else {
                    self.h.ppuaddr.new_scroll.y = regs.t.coarse_y.wrapping_mul(8);
                }
            }
            _ => {}
        }
    }

    fn frame_end(&mut self, ppu: &dyn PpuView) {
        self.end_frame(ppu);
    }
}

impl MapperObserver for WideNes {
    fn scanline_irq(&mut self, mapper: &dyn ScanlineIrqSource, active: bool) {
        self.h.mapper_irq.scroll_pre_irq = self.h.ppuscroll.curr;
        self.h.mapper_irq.happened = true;
        self.h.mapper_irq.on_scanline = if active {
            mapper.peek_irq_latch() as u32
        } else {
            239 // pads out to zero
        };
    }
}
