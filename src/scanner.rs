//! ビデオスキャナ（水平/垂直カウンタ）
//!
//! Understanding the Apple II, Timing Generation and the Video Scanner, Pg 3-11
//! 1フレーム = 65 × 262 = 17030 サイクル。
//! 水平0-64（25以降が表示域）、垂直0-261（192以降が帰線期間）。

use serde::{Deserialize, Serialize};

/// 1ラインの水平クロック数
pub const VIDEO_SCANNER_MAX_HORZ: u16 = 65;
/// 1フレームのスキャンライン数
pub const VIDEO_SCANNER_MAX_VERT: u16 = 262;
/// 1フレームの6502サイクル数
pub const VIDEO_SCANNER_6502_CYCLES: u32 = VIDEO_SCANNER_MAX_HORZ as u32 * VIDEO_SCANNER_MAX_VERT as u32;

/// カラーバースト検出窓 [BEG, END)
pub const VIDEO_SCANNER_HORZ_COLORBURST_BEG: u16 = 12;
pub const VIDEO_SCANNER_HORZ_COLORBURST_END: u16 = 16;

/// 最初の表示カラム
pub const VIDEO_SCANNER_HORZ_START: u16 = 25;
/// 混合モードでグラフィックスを表示するライン数
pub const VIDEO_SCANNER_Y_MIXED: u16 = 160;
/// 表示ライン数
pub const VIDEO_SCANNER_Y_DISPLAY: u16 = 192;

/// 点滅の周期（フレーム数）
const TEXT_FLASH_FRAMES: u8 = 16;

/// Apple IIのモデル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppleModel {
    AppleII,
    AppleIIPlus,
    #[default]
    AppleIIe,
    AppleIIeEnhanced,
}

impl AppleModel {
    /// 初代/II+ か（水平オフセット表がIIeと異なる）
    pub fn is_ii_or_plus(self) -> bool {
        matches!(self, AppleModel::AppleII | AppleModel::AppleIIPlus)
    }
}

type HorzClockOffsets = [[u16; VIDEO_SCANNER_MAX_HORZ as usize]; 5];

/// 水平クロック → アドレス下位オフセット表
///
/// 行は vert/64、開始値は行ごとに異なり $80 で折り返す。
/// 初代/II+ は水平帰線中のアドレスに $1000 が立つ。
const fn make_horz_clock_offsets(ii_plus: bool) -> HorzClockOffsets {
    const ROW_START: [u16; 5] = [0x68, 0x10, 0x38, 0x60, 0x60];
    let mut table = [[0u16; VIDEO_SCANNER_MAX_HORZ as usize]; 5];
    let mut row = 0;
    while row < 5 {
        let mut h = 0;
        while h < VIDEO_SCANNER_MAX_HORZ as usize {
            let n = if h == 0 { 0 } else { h as u16 - 1 };
            let mut ofs = (ROW_START[row] + n) & 0x7F;
            if ii_plus && (h as u16) < VIDEO_SCANNER_HORZ_START {
                ofs |= 0x1000;
            }
            table[row][h] = ofs;
            h += 1;
        }
        row += 1;
    }
    if !ii_plus {
        // IIe実機の表にある1エントリだけの例外
        table[0][8] |= 0x1000;
    }
    table
}

/// Hi-Res: 垂直位置 → ラインオフセット（$400刻みの行 + $80刻みのグループ）
const fn make_hgr_vert_offsets() -> [u16; VIDEO_SCANNER_MAX_VERT as usize] {
    let mut table = [0u16; VIDEO_SCANNER_MAX_VERT as usize];
    let mut v = 0;
    while v < VIDEO_SCANNER_MAX_VERT as usize {
        // 256以降（垂直帰線の末尾）は58行目からの並びを繰り返す
        let line = if v < 256 { v & 63 } else { v - 256 + 58 };
        table[v] = ((line & 7) as u16 * 0x400) + (((line >> 3) & 7) as u16 * 0x80);
        v += 1;
    }
    table
}

/// テキスト/Lo-Res: 文字行(vert/8) → ラインオフセット
const fn make_txt_vert_offsets() -> [u16; 33] {
    let mut table = [0u16; 33];
    let mut row = 0;
    while row < 32 {
        table[row] = (row as u16 & 7) * 0x80;
        row += 1;
    }
    table[32] = 0x380;
    table
}

static APPLE_IIP_HORZ_CLOCK_OFFSET: HorzClockOffsets = make_horz_clock_offsets(true);
static APPLE_IIE_HORZ_CLOCK_OFFSET: HorzClockOffsets = make_horz_clock_offsets(false);
static CLOCK_VERT_OFFSETS_HGR: [u16; VIDEO_SCANNER_MAX_VERT as usize] = make_hgr_vert_offsets();
static CLOCK_VERT_OFFSETS_TXT: [u16; 33] = make_txt_vert_offsets();

/// ライン終端で起きたこと
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineWrap {
    /// 折り返す前のライン
    pub prev_vert: u16,
    /// フレームの先頭に戻った
    pub frame_wrapped: bool,
}

/// ビデオスキャナの状態
#[derive(Debug, Clone)]
pub struct VideoScanner {
    horz: u16,
    vert: u16,
    text_flash_counter: u8,
    text_flash_mask: u16,
    text_page: u16,
    hires_page: u16,
    model: AppleModel,
    /// 水平位置ごとに最後に読んだアドレス（フローティングバス用）
    horz_mem_address: [u16; VIDEO_SCANNER_MAX_HORZ as usize],
}

impl Default for VideoScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoScanner {
    pub fn new() -> Self {
        VideoScanner {
            horz: 0,
            vert: 0,
            text_flash_counter: 0,
            text_flash_mask: 0,
            text_page: 1,
            hires_page: 1,
            model: AppleModel::default(),
            horz_mem_address: [0; VIDEO_SCANNER_MAX_HORZ as usize],
        }
    }

    #[inline]
    pub fn horz(&self) -> u16 {
        self.horz
    }

    #[inline]
    pub fn vert(&self) -> u16 {
        self.vert
    }

    /// 点滅マスク（0x0000 / 0xFFFF）
    #[inline]
    pub fn flash_mask(&self) -> u16 {
        self.text_flash_mask
    }

    pub fn set_model(&mut self, model: AppleModel) {
        self.model = model;
    }

    /// 表示ページ（1 or 2）を設定
    pub fn set_pages(&mut self, text_page: u16, hires_page: u16) {
        debug_assert!((1..=2).contains(&text_page) && (1..=2).contains(&hires_page));
        self.text_page = text_page;
        self.hires_page = hires_page;
    }

    fn horz_clock_offsets(&self) -> &'static HorzClockOffsets {
        if self.model.is_ii_or_plus() {
            &APPLE_IIP_HORZ_CLOCK_OFFSET
        } else {
            &APPLE_IIE_HORZ_CLOCK_OFFSET
        }
    }

    /// テキスト/Lo-Res のアドレスを計算して記録
    #[inline]
    pub fn update_text_address(&mut self) -> u16 {
        let v = self.vert as usize;
        let h = self.horz as usize;
        let ad = CLOCK_VERT_OFFSETS_TXT[v / 8] + self.horz_clock_offsets()[v / 64][h] + self.text_page * 0x400;
        self.horz_mem_address[h] = ad;
        ad
    }

    /// Hi-Res のアドレスを計算して記録
    ///
    /// 水平オフセットはモデルによらずIIeの表を使う（実機との照合待ち）。
    #[inline]
    pub fn update_hires_address(&mut self) -> u16 {
        let v = self.vert as usize;
        let h = self.horz as usize;
        let ad = CLOCK_VERT_OFFSETS_HGR[v] + APPLE_IIE_HORZ_CLOCK_OFFSET[v / 64][h] + self.hires_page * 0x2000;
        self.horz_mem_address[h] = ad;
        ad
    }

    /// 現在の水平位置で最後に計算したアドレス
    pub fn last_address(&self) -> u16 {
        self.horz_mem_address[self.horz as usize]
    }

    #[inline]
    pub fn in_color_burst(&self) -> bool {
        self.horz >= VIDEO_SCANNER_HORZ_COLORBURST_BEG && self.horz < VIDEO_SCANNER_HORZ_COLORBURST_END
    }

    #[inline]
    pub fn in_visible_column(&self) -> bool {
        self.horz >= VIDEO_SCANNER_HORZ_START
    }

    #[inline]
    pub fn in_display_line(&self) -> bool {
        self.vert < VIDEO_SCANNER_Y_DISPLAY
    }

    /// 混合モードでテキストに切り替わる領域か
    #[inline]
    pub fn in_mixed_text_region(&self) -> bool {
        self.vert >= VIDEO_SCANNER_Y_MIXED
    }

    /// 垂直帰線期間か
    pub fn is_vbl(&self) -> bool {
        self.vert >= VIDEO_SCANNER_Y_DISPLAY && self.vert < VIDEO_SCANNER_MAX_VERT
    }

    /// 水平カウンタを1進める。ライン終端なら垂直側も進めて結果を返す。
    #[inline]
    pub fn tick(&mut self) -> Option<LineWrap> {
        self.horz += 1;
        if self.horz < VIDEO_SCANNER_MAX_HORZ {
            return None;
        }
        self.horz = 0;

        let prev_vert = self.vert;
        self.vert += 1;
        let frame_wrapped = self.vert == VIDEO_SCANNER_MAX_VERT;
        if frame_wrapped {
            self.vert = 0;
            self.text_flash_counter += 1;
            if self.text_flash_counter == TEXT_FLASH_FRAMES {
                self.text_flash_counter = 0;
                self.text_flash_mask ^= 0xFFFF;
            }
        }
        debug_assert!(self.horz < VIDEO_SCANNER_MAX_HORZ && self.vert < VIDEO_SCANNER_MAX_VERT);

        Some(LineWrap { prev_vert, frame_wrapped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_frame_period() {
        let mut s = VideoScanner::new();
        let mut wraps = 0;
        let mut frames = 0;
        for _ in 0..VIDEO_SCANNER_6502_CYCLES {
            if let Some(wrap) = s.tick() {
                wraps += 1;
                if wrap.frame_wrapped {
                    frames += 1;
                }
            }
        }
        assert_eq!((s.horz(), s.vert()), (0, 0));
        assert_eq!(wraps, 262);
        assert_eq!(frames, 1);
    }

    #[test]
    fn test_period_from_any_state() {
        let mut s = VideoScanner::new();
        for _ in 0..12345 {
            s.tick();
        }
        let start = (s.horz(), s.vert());
        for _ in 0..VIDEO_SCANNER_6502_CYCLES {
            s.tick();
        }
        assert_eq!((s.horz(), s.vert()), start);
    }

    #[test]
    fn test_flash_toggles_every_16_frames() {
        let mut s = VideoScanner::new();
        let mut toggles = Vec::new();
        let mut last = s.flash_mask();
        for frame in 1..=48u32 {
            for _ in 0..VIDEO_SCANNER_6502_CYCLES {
                s.tick();
            }
            if s.flash_mask() != last {
                toggles.push(frame);
                last = s.flash_mask();
            }
        }
        assert_eq!(toggles, vec![16, 32, 48]);
    }

    #[test]
    fn test_vbl_window() {
        let mut s = VideoScanner::new();
        let mut vbl_lines = 0;
        for _ in 0..VIDEO_SCANNER_MAX_VERT {
            if s.is_vbl() {
                vbl_lines += 1;
            }
            for _ in 0..VIDEO_SCANNER_MAX_HORZ {
                s.tick();
            }
        }
        assert_eq!(vbl_lines, 70);
    }

    #[test]
    fn test_horz_offset_tables() {
        assert_eq!(APPLE_IIP_HORZ_CLOCK_OFFSET[0][0], 0x1068);
        assert_eq!(APPLE_IIP_HORZ_CLOCK_OFFSET[0][24], 0x107F);
        assert_eq!(APPLE_IIP_HORZ_CLOCK_OFFSET[0][25], 0x0000);
        assert_eq!(APPLE_IIP_HORZ_CLOCK_OFFSET[1][64], 0x004F);
        assert_eq!(APPLE_IIP_HORZ_CLOCK_OFFSET[3][32], 0x007F);
        assert_eq!(APPLE_IIP_HORZ_CLOCK_OFFSET[3][33], 0x0000);
        assert_eq!(APPLE_IIE_HORZ_CLOCK_OFFSET[0][7], 0x006E);
        assert_eq!(APPLE_IIE_HORZ_CLOCK_OFFSET[0][8], 0x106F);
        assert_eq!(APPLE_IIE_HORZ_CLOCK_OFFSET[0][9], 0x0070);
        assert_eq!(APPLE_IIE_HORZ_CLOCK_OFFSET[2][1], 0x0038);
        assert_eq!(APPLE_IIE_HORZ_CLOCK_OFFSET[2][64], 0x0077);
        assert_eq!(APPLE_IIE_HORZ_CLOCK_OFFSET[4], APPLE_IIE_HORZ_CLOCK_OFFSET[3]);
    }

    #[test]
    fn test_vert_offset_tables() {
        assert_eq!(CLOCK_VERT_OFFSETS_HGR[1], 0x0400);
        assert_eq!(CLOCK_VERT_OFFSETS_HGR[8], 0x0080);
        assert_eq!(CLOCK_VERT_OFFSETS_HGR[63], 0x1F80);
        assert_eq!(CLOCK_VERT_OFFSETS_HGR[64], 0x0000);
        assert_eq!(CLOCK_VERT_OFFSETS_HGR[256], 0x0B80);
        assert_eq!(CLOCK_VERT_OFFSETS_HGR[261], 0x1F80);
        assert_eq!(CLOCK_VERT_OFFSETS_TXT[9], 0x0080);
        assert_eq!(CLOCK_VERT_OFFSETS_TXT[32], 0x0380);
    }

    fn seek(s: &mut VideoScanner, horz: u16, vert: u16) {
        while s.vert() != vert || s.horz() != horz {
            s.tick();
        }
    }

    #[test]
    fn test_text_addresses() {
        let mut s = VideoScanner::new();
        seek(&mut s, VIDEO_SCANNER_HORZ_START, 0);
        assert_eq!(s.update_text_address(), 0x0400);
        seek(&mut s, 64, 8);
        assert_eq!(s.update_text_address(), 0x0480 + 39);
        seek(&mut s, VIDEO_SCANNER_HORZ_START, 64);
        assert_eq!(s.update_text_address(), 0x0428);
        seek(&mut s, VIDEO_SCANNER_HORZ_START, 128);
        assert_eq!(s.update_text_address(), 0x0450);
        s.set_pages(2, 2);
        assert_eq!(s.update_text_address(), 0x0850);
        assert_eq!(s.last_address(), 0x0850);
    }

    #[test]
    fn test_hires_addresses() {
        let mut s = VideoScanner::new();
        seek(&mut s, VIDEO_SCANNER_HORZ_START, 1);
        assert_eq!(s.update_hires_address(), 0x2400);
        seek(&mut s, VIDEO_SCANNER_HORZ_START + 1, 191);
        assert_eq!(s.update_hires_address(), 0x2000 + 0x1F80 + 0x50 + 1);
    }

    #[test]
    fn test_model_changes_text_blanking_address_only() {
        let mut iie = VideoScanner::new();
        let mut iip = VideoScanner::new();
        iip.set_model(AppleModel::AppleIIPlus);
        seek(&mut iie, 3, 0);
        seek(&mut iip, 3, 0);
        assert_eq!(iie.update_text_address(), 0x0400 + 0x6A);
        assert_eq!(iip.update_text_address(), 0x0400 + 0x106A);
        // Hi-ResはどちらのモデルでもIIeの表
        assert_eq!(iie.update_hires_address(), iip.update_hires_address());
        seek(&mut iie, 30, 0);
        seek(&mut iip, 30, 0);
        assert_eq!(iie.update_text_address(), iip.update_text_address());
    }

    #[test]
    fn test_windows() {
        let mut s = VideoScanner::new();
        seek(&mut s, 12, 0);
        assert!(s.in_color_burst());
        seek(&mut s, 16, 0);
        assert!(!s.in_color_burst());
        assert!(!s.in_visible_column());
        seek(&mut s, 25, 0);
        assert!(s.in_visible_column());
        seek(&mut s, 0, 160);
        assert!(s.in_mixed_text_region() && s.in_display_line());
        seek(&mut s, 0, 192);
        assert!(!s.in_display_line() && s.is_vbl());
    }
}
