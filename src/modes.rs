//! 表示モード選択と、メモリバイト → 14ビット信号の変換
//!
//! 各モードは1サイクルにつき1バイト（80桁系は main/aux の2バイト）を取り出し、
//! 560ドット幅で14ビットの合成信号を作る。ビットは LSB から順に画面左から右へ並ぶ。

use crate::charset::CharacterSet;

bitflags::bitflags! {
    /// ソフトスイッチから組み立てた表示フラグ
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct VideoFlags: u32 {
        /// 下4行をテキストで表示
        const MIXED   = 0x0001;
        const PAGE2   = 0x0002;
        /// 80STOREが立っているとPAGE2は表示ページを切り替えない
        const STORE80 = 0x0004;
        const TEXT    = 0x0008;
        const COL80   = 0x0010;
        const HIRES   = 0x0020;
        const DHIRES  = 0x0040;
    }
}

impl VideoFlags {
    /// 表示ページ (テキストページ, Hi-Resページ)。1 または 2。
    pub fn pages(self) -> (u16, u16) {
        if self.contains(VideoFlags::PAGE2) && !self.contains(VideoFlags::STORE80) {
            (2, 2)
        } else {
            (1, 1)
        }
    }
}

/// グラフィックス側のデコーダ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsMode {
    Text40,
    Text80,
    LoRes40,
    DoubleLoRes40,
    DoubleLoRes80,
    HiRes40,
    DoubleHiRes40,
    DoubleHiRes80,
}

impl GraphicsMode {
    pub fn is_text(self) -> bool {
        matches!(self, GraphicsMode::Text40 | GraphicsMode::Text80)
    }

    /// Hi-Resアドレス系を使うか
    pub fn uses_hires_address(self) -> bool {
        matches!(
            self,
            GraphicsMode::HiRes40 | GraphicsMode::DoubleHiRes40 | GraphicsMode::DoubleHiRes80
        )
    }
}

/// テキスト側のデコーダ（混在モードの下4行で使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    #[default]
    Text40,
    Text80,
}

impl TextMode {
    pub fn from_columns(cols: u32) -> Self {
        if cols == 40 {
            TextMode::Text40
        } else {
            TextMode::Text80
        }
    }

    pub fn graphics_mode(self) -> GraphicsMode {
        match self {
            TextMode::Text40 => GraphicsMode::Text40,
            TextMode::Text80 => GraphicsMode::Text80,
        }
    }
}

/// 表示フラグからグラフィックスデコーダを選ぶ
pub fn select_mode(flags: VideoFlags) -> GraphicsMode {
    let col80 = flags.contains(VideoFlags::COL80);
    let dhires = flags.contains(VideoFlags::DHIRES);

    if flags.contains(VideoFlags::TEXT) {
        if col80 {
            GraphicsMode::Text80
        } else {
            GraphicsMode::Text40
        }
    } else if flags.contains(VideoFlags::HIRES) {
        match (dhires, col80) {
            (true, true) => GraphicsMode::DoubleHiRes80,
            (true, false) => GraphicsMode::DoubleHiRes40,
            (false, _) => GraphicsMode::HiRes40,
        }
    } else {
        match (dhires, col80) {
            (true, true) => GraphicsMode::DoubleLoRes80,
            (true, false) => GraphicsMode::DoubleLoRes40,
            (false, _) => GraphicsMode::LoRes40,
        }
    }
}

const fn make_pixel_double_mask_hgr() -> [u16; 128] {
    let mut table = [0u16; 128];
    let mut byte = 0;
    while byte < 128 {
        let mut bit = 0;
        while bit < 7 {
            if byte & (1 << bit) != 0 {
                table[byte] |= 3 << (bit * 2);
            }
            bit += 1;
        }
        byte += 1;
    }
    table
}

const fn make_pixel_mask_gr() -> [u16; 16] {
    let mut table = [0u16; 16];
    let mut color = 0;
    while color < 16 {
        let c = color as u16;
        table[color] = (c << 12) | (c << 8) | (c << 4) | c;
        color += 1;
    }
    table
}

/// 7ビット → 14ビット（各ビットを2ドットに）。上位ビットは半ドットシフト用なので含まない。
pub static PIXEL_DOUBLE_MASK_HGR: [u16; 128] = make_pixel_double_mask_hgr();

/// Lo-Res 色番号 → 16ビットのパターン（ニブルを4回繰り返す）
pub static PIXEL_MASK_GR: [u16; 16] = make_pixel_mask_gr();

/// Lo-Resバイトのうち、この行で使うニブルのパターン
#[inline]
pub fn lores_pattern(m: u8, vert: u16) -> u16 {
    PIXEL_MASK_GR[((m >> (vert & 4)) & 0x0F) as usize]
}

/// 偶数列は2ビットずらして4ビット周期の位相を合わせる
#[inline]
fn lores_shift(horz: u16) -> u32 {
    u32::from(1 - (horz & 1)) * 2
}

/// フラッシュ属性か（主文字セットのみ。0x40-0x7F）
#[inline]
pub fn is_flashing(alt_charset: bool, m: u8) -> bool {
    !alt_charset && (m & 0xC0) == 0x40
}

/// 40桁テキスト
pub fn text40_bits(charset: &CharacterSet, alt_charset: bool, m: u8, vert: u16, flash_mask: u16) -> u16 {
    let c = charset.bits(alt_charset, m, vert as usize);
    let mut bits = PIXEL_DOUBLE_MASK_HGR[(c & 0x7F) as usize];
    if is_flashing(alt_charset, m) {
        bits ^= flash_mask;
    }
    bits
}

/// 80桁テキスト。aux の文字が左の7ドット、main が右の7ドット。
pub fn text80_bits(
    charset: &CharacterSet,
    alt_charset: bool,
    m: u8,
    a: u8,
    vert: u16,
    flash_mask: u16,
) -> u16 {
    let mut main = u16::from(charset.bits(alt_charset, m, vert as usize));
    let mut aux = u16::from(charset.bits(alt_charset, a, vert as usize));
    if is_flashing(alt_charset, m) {
        main ^= flash_mask;
    }
    if is_flashing(alt_charset, a) {
        aux ^= flash_mask;
    }
    // 反転後の上位ビットが main 側に漏れないようにする
    (main << 7) | (aux & 0x7F)
}

/// Lo-Res 40桁
#[inline]
pub fn lores40_bits(m: u8, horz: u16, vert: u16) -> u16 {
    lores_pattern(m, vert) >> lores_shift(horz)
}

/// ダブルLo-Res 40桁
#[inline]
pub fn double_lores40_bits(m: u8, horz: u16, vert: u16) -> u16 {
    let lo = lores_pattern(m, vert) >> lores_shift(horz);
    PIXEL_DOUBLE_MASK_HGR[((lo & 0xFF) & 0x7F) as usize]
}

/// ダブルLo-Res 80桁。戻り値は (描画ビット, 次の last_column_pixel)。
#[inline]
pub fn double_lores80_bits(m: u8, a: u8, horz: u16, vert: u16) -> (u16, u16) {
    let shift = lores_shift(horz) + 3;
    let main = lores_pattern(m, vert) >> shift;
    let aux = lores_pattern(a, vert) >> shift;
    let bits = (main << 7) | (aux & 0x7F);
    (bits, (bits >> 14) & 3)
}

/// Hi-Res。上位ビットが立っていれば半ドット右へずらし、前のバイトの最終ドットを引き継ぐ。
#[inline]
pub fn hires40_bits(m: u8, last_column_pixel: u16) -> u16 {
    let bits = PIXEL_DOUBLE_MASK_HGR[(m & 0x7F) as usize];
    if m & 0x80 != 0 {
        (bits << 1) | last_column_pixel
    } else {
        bits
    }
}

/// ダブルHi-Res 40桁（半ドットシフトなし）
#[inline]
pub fn double_hires40_bits(m: u8) -> u16 {
    PIXEL_DOUBLE_MASK_HGR[(m & 0x7F) as usize]
}

/// ダブルHi-Res 80桁。戻り値は (描画ビット, 次の last_column_pixel)。
#[inline]
pub fn double_hires80_bits(m: u8, a: u8, last_column_pixel: u16) -> (u16, u16) {
    let bits = (u16::from(m & 0x7F) << 7) | u16::from(a & 0x7F);
    let bits = (bits << 1) | last_column_pixel;
    (bits, (bits >> 14) & 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_mode() {
        assert_eq!(select_mode(VideoFlags::TEXT), GraphicsMode::Text40);
        assert_eq!(select_mode(VideoFlags::TEXT | VideoFlags::COL80), GraphicsMode::Text80);
        // TEXTが最優先
        assert_eq!(
            select_mode(VideoFlags::TEXT | VideoFlags::HIRES | VideoFlags::DHIRES),
            GraphicsMode::Text40
        );
        assert_eq!(select_mode(VideoFlags::empty()), GraphicsMode::LoRes40);
        assert_eq!(select_mode(VideoFlags::COL80), GraphicsMode::LoRes40);
        assert_eq!(select_mode(VideoFlags::DHIRES), GraphicsMode::DoubleLoRes40);
        assert_eq!(select_mode(VideoFlags::DHIRES | VideoFlags::COL80), GraphicsMode::DoubleLoRes80);
        assert_eq!(select_mode(VideoFlags::HIRES), GraphicsMode::HiRes40);
        assert_eq!(select_mode(VideoFlags::HIRES | VideoFlags::COL80), GraphicsMode::HiRes40);
        assert_eq!(select_mode(VideoFlags::HIRES | VideoFlags::DHIRES), GraphicsMode::DoubleHiRes40);
        assert_eq!(
            select_mode(VideoFlags::HIRES | VideoFlags::DHIRES | VideoFlags::COL80),
            GraphicsMode::DoubleHiRes80
        );
    }

    #[test]
    fn test_pages() {
        assert_eq!(VideoFlags::empty().pages(), (1, 1));
        assert_eq!(VideoFlags::PAGE2.pages(), (2, 2));
        assert_eq!((VideoFlags::PAGE2 | VideoFlags::STORE80).pages(), (1, 1));
    }

    #[test]
    fn test_expansion_tables() {
        assert_eq!(PIXEL_DOUBLE_MASK_HGR[0x01], 0x0003);
        assert_eq!(PIXEL_DOUBLE_MASK_HGR[0x02], 0x000C);
        assert_eq!(PIXEL_DOUBLE_MASK_HGR[0x40], 0x3000);
        assert_eq!(PIXEL_DOUBLE_MASK_HGR[0x7F], 0x3FFF);
        assert_eq!(PIXEL_MASK_GR[0x0], 0x0000);
        assert_eq!(PIXEL_MASK_GR[0x5], 0x5555);
        assert_eq!(PIXEL_MASK_GR[0xC], 0xCCCC);
    }

    #[test]
    fn test_text40_normal_a() {
        let cs = CharacterSet::builtin();
        // 'A' の最上段は中央の1ドット（..X....）
        let bits = text40_bits(&cs, false, 0xC1, 0, 0x0000);
        assert_eq!(bits, 0x00C0);
        // 通常文字はフラッシュマスクの影響を受けない
        assert_eq!(text40_bits(&cs, false, 0xC1, 0, 0xFFFF), bits);
    }

    #[test]
    fn test_text40_flashing_a() {
        let cs = CharacterSet::builtin();
        let off = text40_bits(&cs, false, 0x41, 0, 0x0000);
        let on = text40_bits(&cs, false, 0x41, 0, 0xFFFF);
        assert_eq!(off, PIXEL_DOUBLE_MASK_HGR[0x77]);
        assert_eq!(on, off ^ 0xFFFF);
        // 14ビット内では通常の 'A' と同じ形になる
        assert_eq!(on & 0x3FFF, 0x00C0);
        // 代替文字セットではフラッシュしない
        assert!(!is_flashing(true, 0x41));
        assert_eq!(text40_bits(&cs, true, 0x41, 0, 0xFFFF), text40_bits(&cs, true, 0x41, 0, 0));
    }

    #[test]
    fn test_text80_packs_aux_then_main() {
        let cs = CharacterSet::builtin();
        let bits = text80_bits(&cs, false, 0xC1, 0xA0, 0, 0);
        // aux は空白、main は 'A'
        assert_eq!(bits & 0x7F, 0);
        assert_eq!(bits >> 7, 0x08);
        // フラッシュ中の aux は下位7ビットに収まる
        let flashing = text80_bits(&cs, false, 0xA0, 0x41, 0, 0xFFFF);
        assert_eq!(flashing >> 7, 0);
        assert_eq!(flashing & 0x7F, 0x08);
    }

    #[test]
    fn test_lores_nibble_by_row() {
        // 上半分 (vert & 4 == 0) は下位ニブル
        assert_eq!(lores40_bits(0x3C, 25, 0), 0xCCCC);
        assert_eq!(lores40_bits(0x3C, 25, 4), 0x3333);
        // 偶数列は2ビットずらす
        assert_eq!(lores40_bits(0x3C, 26, 0), 0xCCCC >> 2);
        assert_eq!(double_lores40_bits(0x0F, 25, 0), 0x3FFF);
    }

    #[test]
    fn test_double_lores80_carry() {
        let (bits, last) = double_lores80_bits(0x0F, 0x0F, 25, 0);
        assert_eq!(bits, 0xFFFF);
        assert_eq!(last, 3);
        let (_, last) = double_lores80_bits(0x00, 0x0F, 25, 0);
        assert_eq!(last, 0);
    }

    #[test]
    fn test_hires_half_pixel_carry() {
        // 0x00 の次の 0x80: 先頭ドットは0のまま
        assert_eq!(hires40_bits(0x00, 0), 0);
        let bits = hires40_bits(0x80, 0);
        assert_eq!(bits & 1, 0);

        // 0x40 の最終ドットが次の 0x80 の先頭に引き継がれる
        let prev = hires40_bits(0x40, 0);
        let last = (prev >> 13) & 1;
        assert_eq!(last, 1);
        let bits = hires40_bits(0x80, last);
        assert_eq!(bits & 1, 1);

        // 上位ビットなしでは引き継がない
        assert_eq!(hires40_bits(0x01, 1), 0x0003);
        assert_eq!(hires40_bits(0x81, 0), 0x0006);
    }

    #[test]
    fn test_double_hires() {
        assert_eq!(double_hires40_bits(0xFF), 0x3FFF);
        let (bits, last) = double_hires80_bits(0x7F, 0x7F, 1);
        assert_eq!(bits, 0x7FFF);
        assert_eq!(last, 1);
        let (bits, last) = double_hires80_bits(0x40, 0x00, 0);
        assert_eq!(bits, 0x4000);
        assert_eq!(last, 1);
    }
}
