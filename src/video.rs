//! NTSCビデオ出力
//!
//! スキャナ・デコードテーブル・ピクセルレンダラをまとめ、
//! CPUの経過サイクル数に合わせて1サイクルずつ画面を描く。
//!
//! 1サイクル = 1バイト = 14ドット。1ライン65サイクル、1フレーム262ライン。

use serde::{Deserialize, Serialize};

use crate::charset::CharacterSet;
use crate::config::VideoConfig;
use crate::memory::VideoMemory;
use crate::modes::{self, select_mode, GraphicsMode, TextMode, VideoFlags};
use crate::ntsc_table::{ChromaFilter, NtscTables};
use crate::renderer::{DecodeFamily, FrameGeometry, PixelRenderer, PixelStyle, ScanlineStyle};
use crate::scanner::{AppleModel, VideoScanner, VIDEO_SCANNER_6502_CYCLES, VIDEO_SCANNER_Y_DISPLAY};

/// カラーバースト区間で設定されるカウンタ値
///
/// テキストモードのバースト区間ごとに1減り、2未満になるとモノクロで描画する。
pub const COLOR_BURST_PIXELS: u32 = 1024;

/// 表示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoType {
    /// カラーTV（にじみ・スキャンラインブレンドあり）
    ColorTv,
    /// カラーモニタ
    #[default]
    ColorMonitor,
    /// 白黒TV（テキスト向け）
    MonoTv,
    MonoAmber,
    MonoGreen,
    MonoWhite,
    /// 任意の単色（monochrome_rgb）
    MonoCustom,
}

impl VideoType {
    pub fn is_color(self) -> bool {
        matches!(self, VideoType::ColorTv | VideoType::ColorMonitor)
    }

    fn decode_family(self) -> DecodeFamily {
        match self {
            VideoType::ColorTv | VideoType::MonoTv => DecodeFamily::Television,
            _ => DecodeFamily::Monitor,
        }
    }

    /// 単色表示の色味。カラー表示では None。
    fn mono_tint(self, custom: (u8, u8, u8)) -> Option<(u8, u8, u8)> {
        match self {
            VideoType::ColorTv | VideoType::ColorMonitor => None,
            VideoType::MonoTv | VideoType::MonoWhite => Some((0xFF, 0xFF, 0xFF)),
            VideoType::MonoAmber => Some((0xFF, 0x80, 0x00)),
            VideoType::MonoGreen => Some((0x00, 0xC0, 0x00)),
            VideoType::MonoCustom => Some(custom),
        }
    }
}

/// NTSCビデオ
pub struct NtscVideo {
    scanner: VideoScanner,
    renderer: PixelRenderer,
    tables: NtscTables,
    charset: CharacterSet,

    graphics_mode: GraphicsMode,
    text_mode: TextMode,
    mixed: bool,
    /// 表示に使う文字セット（set_display_mode で確定）
    alt_charset: bool,
    alt_charset_offset: usize,

    /// 直前のバイトの最終ドット（Hi-Resの半ドットシフト用）
    last_column_pixel: u16,
    color_burst_pixels: u32,

    video_type: VideoType,
    half_scanlines: bool,
    monochrome_rgb: (u8, u8, u8),
}

impl NtscVideo {
    pub fn new(geometry: FrameGeometry, charset: CharacterSet, config: &VideoConfig) -> Self {
        let tables = NtscTables::build(config.chroma_filter);

        let mut video = NtscVideo {
            scanner: VideoScanner::new(),
            renderer: PixelRenderer::new(geometry),
            tables,
            charset,
            graphics_mode: GraphicsMode::Text40,
            text_mode: TextMode::Text40,
            mixed: false,
            alt_charset: false,
            alt_charset_offset: 0,
            last_column_pixel: 0,
            color_burst_pixels: 0,
            video_type: config.video_type,
            half_scanlines: config.half_scanlines,
            monochrome_rgb: config.monochrome_rgb,
        };
        video.set_model(config.model);
        video.apply_display_style();
        video.renderer.begin_line(0);
        log::info!(
            "NTSC video initialized: {:?} {:?} ({}x{})",
            config.model,
            config.video_type,
            geometry.width(),
            geometry.height()
        );
        video
    }

    /// 経過サイクル数ぶん描画を進める
    ///
    /// グラフィックスの混合モードで下4行にいる場合は、この呼び出し全体をテキスト側で処理する。
    pub fn advance<M: VideoMemory + ?Sized>(&mut self, mem: &M, cycles: u32) {
        let mode = if self.mixed && !self.graphics_mode.is_text() && self.scanner.in_mixed_text_region() {
            self.text_mode.graphics_mode()
        } else {
            self.graphics_mode
        };
        self.run(mode, mem, cycles);
    }

    /// 描画せずにクロックだけ進める（高速実行時）
    ///
    /// フレームの先頭に戻るたびに1フレーム分をまとめて描き直す。
    pub fn update_clock_only<M: VideoMemory + ?Sized>(&mut self, mem: &M, cycles: u32) {
        for _ in 0..cycles {
            if let Some(wrap) = self.scanner.tick() {
                self.start_line();
                if wrap.frame_wrapped {
                    self.advance(mem, VIDEO_SCANNER_6502_CYCLES);
                }
            }
        }
    }

    pub fn is_vbl(&self) -> bool {
        self.scanner.is_vbl()
    }

    /// 表示フラグを反映する。文字セットの切り替えもここで確定する。
    ///
    /// 混合モードで使うテキストの桁数も COL80 から決まる。
    pub fn set_display_mode(&mut self, flags: VideoFlags) {
        self.mixed = flags.contains(VideoFlags::MIXED);
        self.alt_charset = self.alt_charset_offset != 0;

        let (text_page, hires_page) = flags.pages();
        self.scanner.set_pages(text_page, hires_page);

        self.graphics_mode = select_mode(flags);
        let columns = if flags.contains(VideoFlags::COL80) { 80 } else { 40 };
        self.text_mode = TextMode::from_columns(columns);
        log::debug!("Video mode: {:?} ({:?})", self.graphics_mode, flags);
    }

    /// 混合モードで使うテキスト桁数（次の set_display_mode までの上書き）
    pub fn set_text_columns(&mut self, text_mode: TextMode) {
        self.text_mode = text_mode;
    }

    /// 表示方式とハーフスキャンラインを設定
    pub fn set_display_style(&mut self, video_type: VideoType, half_scanlines: bool) {
        self.video_type = video_type;
        self.half_scanlines = half_scanlines;
        self.apply_display_style();
    }

    /// MonoCustom で使う色
    pub fn set_monochrome_rgb(&mut self, rgb: (u8, u8, u8)) {
        self.monochrome_rgb = rgb;
        if self.video_type == VideoType::MonoCustom {
            self.apply_display_style();
        }
    }

    /// 代替文字セットのオフセット（0なら主文字セット）。次の set_display_mode で反映。
    pub fn set_character_set_offset(&mut self, offset: usize) {
        self.alt_charset_offset = offset;
    }

    pub fn set_model(&mut self, model: AppleModel) {
        self.scanner.set_model(model);
    }

    /// クロマ方式を変えてデコードテーブルを再生成
    pub fn set_chroma_filter(&mut self, chroma_filter: ChromaFilter) {
        if self.tables.chroma_filter() != chroma_filter {
            self.tables.rebuild(chroma_filter);
        }
    }

    /// ビデオ回路が今読んでいるバイト（フローティングバス）
    pub fn video_byte<M: VideoMemory + ?Sized>(&self, mem: &M) -> u8 {
        mem.read_main(self.scanner.last_address())
    }

    /// ARGB (0xAARRGGBB) のフレームバッファ
    pub fn framebuffer(&self) -> &[u32] {
        self.renderer.framebuffer()
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.renderer.geometry()
    }

    pub fn graphics_mode(&self) -> GraphicsMode {
        self.graphics_mode
    }

    pub fn video_type(&self) -> VideoType {
        self.video_type
    }

    /// 現在のビーム位置 (horz, vert)
    pub fn beam_position(&self) -> (u16, u16) {
        (self.scanner.horz(), self.scanner.vert())
    }

    fn apply_display_style(&mut self) {
        let scanline = if self.half_scanlines {
            ScanlineStyle::Single
        } else {
            ScanlineStyle::Double
        };
        let style = PixelStyle {
            family: self.video_type.decode_family(),
            scanline,
        };
        if let Some((r, g, b)) = self.video_type.mono_tint(self.monochrome_rgb) {
            self.tables.update_monochrome_color(r, g, b);
        }
        self.renderer.set_style(style, self.video_type.is_color());
        log::debug!("Video style: {:?} half_scanlines={}", self.video_type, self.half_scanlines);
    }

    fn run<M: VideoMemory + ?Sized>(&mut self, mode: GraphicsMode, mem: &M, cycles: u32) {
        for _ in 0..cycles {
            let address = if mode.uses_hires_address() {
                self.scanner.update_hires_address()
            } else {
                self.scanner.update_text_address()
            };

            if mode.is_text() {
                // テキストはバーストを出さないので、カウンタは全ラインで減っていく
                if self.scanner.in_color_burst() {
                    self.color_burst_pixels = self.color_burst_pixels.saturating_sub(1);
                } else if self.scanner.in_display_line() && self.scanner.in_visible_column() {
                    self.draw_byte(mode, mem, address);
                }
            } else if self.scanner.in_display_line() {
                if self.scanner.in_color_burst() {
                    self.color_burst_pixels = COLOR_BURST_PIXELS;
                } else if self.scanner.in_visible_column() {
                    self.draw_byte(mode, mem, address);
                }
            }

            if let Some(wrap) = self.scanner.tick() {
                if wrap.prev_vert < VIDEO_SCANNER_Y_DISPLAY {
                    self.end_line();
                }
                self.start_line();
            }
        }
    }

    fn draw_byte<M: VideoMemory + ?Sized>(&mut self, mode: GraphicsMode, mem: &M, address: u16) {
        let horz = self.scanner.horz();
        let vert = self.scanner.vert();
        let m = mem.read_main(address);

        match mode {
            GraphicsMode::Text40 => {
                let bits = modes::text40_bits(&self.charset, self.alt_charset, m, vert, self.scanner.flash_mask());
                self.draw_bits(bits);
            }
            GraphicsMode::Text80 => {
                let a = mem.read_aux(address);
                let bits = modes::text80_bits(&self.charset, self.alt_charset, m, a, vert, self.scanner.flash_mask());
                self.draw_bits(bits);
            }
            GraphicsMode::LoRes40 => self.draw_bits(modes::lores40_bits(m, horz, vert)),
            GraphicsMode::DoubleLoRes40 => self.draw_bits(modes::double_lores40_bits(m, horz, vert)),
            GraphicsMode::DoubleLoRes80 => {
                let a = mem.read_aux(address);
                let (bits, last) = modes::double_lores80_bits(m, a, horz, vert);
                self.draw_bits(bits);
                self.last_column_pixel = last;
            }
            GraphicsMode::HiRes40 => {
                let bits = modes::hires40_bits(m, self.last_column_pixel);
                self.draw_bits(bits);
            }
            GraphicsMode::DoubleHiRes40 => self.draw_bits(modes::double_hires40_bits(m)),
            GraphicsMode::DoubleHiRes80 => {
                let a = mem.read_aux(address);
                let (bits, last) = modes::double_hires80_bits(m, a, self.last_column_pixel);
                self.draw_bits(bits);
                self.last_column_pixel = last;
            }
        }
    }

    /// 14ドットを LSB から描き、最後のドットを覚えておく
    #[inline]
    fn draw_bits(&mut self, bits: u16) {
        let mono = self.color_burst_pixels < 2;
        for n in 0..14 {
            let signal = (bits >> n) & 1;
            if mono {
                self.renderer.consume_mono(&self.tables, signal);
            } else {
                self.renderer.consume_color(&self.tables, signal);
            }
        }
        self.last_column_pixel = (bits >> 13) & 1;
    }

    /// 表示ライン終端: 最後のドットと0を3つ流して信号を減衰させる
    fn end_line(&mut self) {
        let tail = [self.last_column_pixel, 0, 0, 0];
        if self.color_burst_pixels < 2 {
            for signal in tail {
                self.renderer.consume_mono(&self.tables, signal);
            }
        } else {
            for signal in tail {
                self.renderer.consume_color(&self.tables, signal);
            }
        }
    }

    fn start_line(&mut self) {
        if self.scanner.in_display_line() {
            self.renderer.begin_line(self.scanner.vert());
            self.last_column_pixel = 0;
        }
    }
}
