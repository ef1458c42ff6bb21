//! コンポジット信号 → フレームバッファのピクセルレンダラ
//!
//! 1ビットずつ信号履歴に流し込み、デコードテーブルを引いて書き込む。
//! 1スキャンラインを2行に倍化して 560x384 で表示する。

use serde::{Deserialize, Serialize};

use crate::ntsc_table::{DecodeTable, NtscTables, ALPHA32_MASK, NTSC_NUM_PHASES, SIGNAL_HISTORY_MASK};
use crate::scanner::VIDEO_SCANNER_Y_DISPLAY;

/// 表示幅（280 * 2）
pub const NTSC_DISPLAY_WIDTH: usize = 560;
/// 表示高さ（192 * 2）
pub const NTSC_DISPLAY_HEIGHT: usize = VIDEO_SCANNER_Y_DISPLAY as usize * 2;
/// ライン終端で追加で書かれる画素数（最後のビット + 0 × 3）
pub const NTSC_EOL_PIXELS: usize = 4;

/// ライン開始時のカラー位相
pub const INITIAL_COLOR_PHASE: usize = 0;

const QUARTER_MASK: u32 = 0x00FC_FCFC;
const HALF_MASK: u32 = 0x00FE_FEFE;

/// フレームバッファの形状
///
/// 行は上から下。表示域は (x_offset, y_offset) から 564 × 384。
/// TV表示は表示域の2行上まで触るので y_offset >= 2 が必要。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    width: usize,
    height: usize,
    x_offset: usize,
    y_offset: usize,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl FrameGeometry {
    /// 標準のフレームバッファ (600x420、表示域は(20, 18)から)
    pub const STANDARD: FrameGeometry = FrameGeometry {
        width: 600,
        height: 420,
        x_offset: 20,
        y_offset: 18,
    };

    pub fn new(width: usize, height: usize, x_offset: usize, y_offset: usize) -> Result<Self, String> {
        if x_offset + NTSC_DISPLAY_WIDTH + NTSC_EOL_PIXELS > width {
            return Err(format!(
                "Framebuffer too narrow: width {} with x offset {} (need {})",
                width,
                x_offset,
                x_offset + NTSC_DISPLAY_WIDTH + NTSC_EOL_PIXELS
            ));
        }
        if y_offset < 2 {
            return Err(format!("Framebuffer y offset must be at least 2 (got {})", y_offset));
        }
        if y_offset + NTSC_DISPLAY_HEIGHT > height {
            return Err(format!(
                "Framebuffer too short: height {} with y offset {} (need {})",
                height,
                y_offset,
                y_offset + NTSC_DISPLAY_HEIGHT
            ));
        }
        Ok(FrameGeometry { width, height, x_offset, y_offset })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 表示域の左端
    pub fn x_offset(&self) -> usize {
        self.x_offset
    }

    /// 表示域の上端
    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    /// 表示行 y (0..384) の先頭インデックス
    pub fn line_start(&self, y: usize) -> usize {
        (self.y_offset + y) * self.width + self.x_offset
    }
}

/// デコードテーブルの系統
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeFamily {
    Monitor,
    Television,
}

/// スキャンラインの倍化方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanlineStyle {
    /// 1行だけ書き、隣の行はブレンド（ハーフスキャンライン）
    Single,
    /// 2行に同じ色（モニタ）/ 前ラインとの平均（TV）
    Double,
}

/// ピクセル書き込みの方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelStyle {
    pub family: DecodeFamily,
    pub scanline: ScanlineStyle,
}

impl Default for PixelStyle {
    fn default() -> Self {
        PixelStyle {
            family: DecodeFamily::Monitor,
            scanline: ScanlineStyle::Double,
        }
    }
}

/// ピクセルレンダラ
pub struct PixelRenderer {
    framebuffer: Vec<u32>,
    geometry: FrameGeometry,
    /// 書き込み位置（フレームバッファのインデックス）
    cursor: usize,
    /// 直近12ビットの信号履歴
    signal_bits: u16,
    color_phase: usize,
    style: PixelStyle,
    /// falseならカラー側もモノクロテーブルで描く（モノクロ表示）
    color_decode: bool,
}

impl PixelRenderer {
    pub fn new(geometry: FrameGeometry) -> Self {
        let framebuffer = vec![ALPHA32_MASK; geometry.width * geometry.height];
        PixelRenderer {
            framebuffer,
            geometry,
            cursor: geometry.line_start(0),
            signal_bits: 0,
            color_phase: INITIAL_COLOR_PHASE,
            style: PixelStyle::default(),
            color_decode: true,
        }
    }

    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn style(&self) -> PixelStyle {
        self.style
    }

    pub fn set_style(&mut self, style: PixelStyle, color_decode: bool) {
        self.style = style;
        self.color_decode = color_decode;
    }

    pub fn color_decode(&self) -> bool {
        self.color_decode
    }

    #[inline]
    pub fn color_phase(&self) -> usize {
        self.color_phase
    }

    #[cfg(test)]
    pub(crate) fn signal_bits(&self) -> u16 {
        self.signal_bits
    }

    /// 表示域内の現在の列
    pub fn cursor_column(&self) -> usize {
        (self.cursor - self.geometry.x_offset) % self.geometry.width
    }

    /// 表示域の画素 (x: 0..564, y: 0..384)
    #[cfg(test)]
    pub(crate) fn pixel(&self, x: usize, y: usize) -> u32 {
        self.framebuffer[self.geometry.line_start(y) + x]
    }

    /// 新しい表示ラインの開始
    pub fn begin_line(&mut self, vert: u16) {
        debug_assert!(vert < VIDEO_SCANNER_Y_DISPLAY);
        self.cursor = self.geometry.line_start(2 * vert as usize);
        self.color_phase = INITIAL_COLOR_PHASE;
        self.signal_bits = 0;
    }

    /// モノクロ画素（カラーバーストなし）
    #[inline]
    pub fn consume_mono(&mut self, tables: &NtscTables, signal: u16) {
        let table: &DecodeTable = match self.style.family {
            DecodeFamily::Monitor => &tables.mono_monitor_custom,
            DecodeFamily::Television => &tables.mono_television_custom,
        };
        let color0 = self.scanline_color(signal, table);
        self.put_pixel(color0);
    }

    /// カラー画素。位相を1つ進める。
    #[inline]
    pub fn consume_color(&mut self, tables: &NtscTables, signal: u16) {
        if !self.color_decode {
            self.consume_mono(tables, signal);
            return;
        }
        let table: &DecodeTable = match self.style.family {
            DecodeFamily::Monitor => &tables.color_monitor[self.color_phase],
            DecodeFamily::Television => &tables.color_television[self.color_phase],
        };
        let color0 = self.scanline_color(signal, table);
        self.put_pixel(color0);
        self.color_phase = (self.color_phase + 1) % NTSC_NUM_PHASES;
    }

    /// 信号ビット（ダブルLo-Res等のライン終端では2ビット幅もありうる）を履歴に入れて色を引く
    #[inline]
    fn scanline_color(&mut self, signal: u16, table: &DecodeTable) -> u32 {
        self.signal_bits = ((self.signal_bits << 1) | signal) & SIGNAL_HISTORY_MASK;
        table[self.signal_bits as usize]
    }

    #[inline]
    fn put_pixel(&mut self, color0: u32) {
        let w = self.geometry.width;
        let p = self.cursor;
        debug_assert!(self.cursor_column() < NTSC_DISPLAY_WIDTH + NTSC_EOL_PIXELS);

        match (self.style.family, self.style.scanline) {
            (DecodeFamily::Monitor, ScanlineStyle::Single) => {
                // 下の行は25%の明るさ
                self.framebuffer[p + w] = ((color0 & QUARTER_MASK) >> 2) | ALPHA32_MASK;
            }
            (DecodeFamily::Monitor, ScanlineStyle::Double) => {
                self.framebuffer[p + w] = color0;
            }
            (DecodeFamily::Television, ScanlineStyle::Single) => {
                // 上の行は75%の明るさ
                self.framebuffer[p - w] = (color0 - ((color0 & QUARTER_MASK) >> 2)) | ALPHA32_MASK;
            }
            (DecodeFamily::Television, ScanlineStyle::Double) => {
                // 上の行は前のスキャンラインとの50%ブレンド
                let color2 = self.framebuffer[p - 2 * w];
                self.framebuffer[p - w] = (((color0 & HALF_MASK) >> 1) + ((color2 & HALF_MASK) >> 1)) | ALPHA32_MASK;
            }
        }
        self.framebuffer[p] = color0;
        self.cursor += 1;
    }
}
