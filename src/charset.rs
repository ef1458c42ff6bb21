//! 文字セットのビットテーブル
//!
//! csbits[セット][文字コード][行] = 7ビットのグリフ行（ビット0が左端）。
//! セット0が通常の文字セット、セット1が代替文字セット（ALTCHARSET）。
//! 反転・点滅文字はここで反転済みの形で持ち、点滅はフラッシュマスクのXORで表現する。

/// グリフROMのサイズ（128文字 × 8バイト）
pub const GLYPH_ROM_SIZE: usize = 128 * 8;

/// 1文字セット分（256文字 × 8行）
pub type CharSetBits = [[u8; 8]; 256];

/// 内蔵フォント: 大文字・数字・記号 ($00-$3F)
/// ビット6が左端（MSBファースト）
const FONT_UPPER: [[u8; 8]; 64] = [
    [0x1C, 0x22, 0x2A, 0x2E, 0x2C, 0x20, 0x1E, 0x00], // @
    [0x08, 0x14, 0x22, 0x22, 0x3E, 0x22, 0x22, 0x00], // A
    [0x3C, 0x22, 0x22, 0x3C, 0x22, 0x22, 0x3C, 0x00], // B
    [0x1C, 0x22, 0x20, 0x20, 0x20, 0x22, 0x1C, 0x00], // C
    [0x3C, 0x22, 0x22, 0x22, 0x22, 0x22, 0x3C, 0x00], // D
    [0x3E, 0x20, 0x20, 0x3C, 0x20, 0x20, 0x3E, 0x00], // E
    [0x3E, 0x20, 0x20, 0x3C, 0x20, 0x20, 0x20, 0x00], // F
    [0x1E, 0x20, 0x20, 0x2E, 0x22, 0x22, 0x1E, 0x00], // G
    [0x22, 0x22, 0x22, 0x3E, 0x22, 0x22, 0x22, 0x00], // H
    [0x1C, 0x08, 0x08, 0x08, 0x08, 0x08, 0x1C, 0x00], // I
    [0x02, 0x02, 0x02, 0x02, 0x02, 0x22, 0x1C, 0x00], // J
    [0x22, 0x24, 0x28, 0x30, 0x28, 0x24, 0x22, 0x00], // K
    [0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x3E, 0x00], // L
    [0x22, 0x36, 0x2A, 0x2A, 0x22, 0x22, 0x22, 0x00], // M
    [0x22, 0x32, 0x2A, 0x26, 0x22, 0x22, 0x22, 0x00], // N
    [0x1C, 0x22, 0x22, 0x22, 0x22, 0x22, 0x1C, 0x00], // O
    [0x3C, 0x22, 0x22, 0x3C, 0x20, 0x20, 0x20, 0x00], // P
    [0x1C, 0x22, 0x22, 0x22, 0x2A, 0x24, 0x1A, 0x00], // Q
    [0x3C, 0x22, 0x22, 0x3C, 0x28, 0x24, 0x22, 0x00], // R
    [0x1C, 0x22, 0x20, 0x1C, 0x02, 0x22, 0x1C, 0x00], // S
    [0x3E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00], // T
    [0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x1C, 0x00], // U
    [0x22, 0x22, 0x22, 0x22, 0x14, 0x14, 0x08, 0x00], // V
    [0x22, 0x22, 0x22, 0x2A, 0x2A, 0x36, 0x22, 0x00], // W
    [0x22, 0x22, 0x14, 0x08, 0x14, 0x22, 0x22, 0x00], // X
    [0x22, 0x22, 0x14, 0x08, 0x08, 0x08, 0x08, 0x00], // Y
    [0x3E, 0x02, 0x04, 0x08, 0x10, 0x20, 0x3E, 0x00], // Z
    [0x1E, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1E, 0x00], // [
    [0x00, 0x20, 0x10, 0x08, 0x04, 0x02, 0x00, 0x00], // backslash
    [0x1E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x1E, 0x00], // ]
    [0x08, 0x14, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3F, 0x00], // _
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x08, 0x00], // !
    [0x14, 0x14, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x14, 0x14, 0x3E, 0x14, 0x3E, 0x14, 0x14, 0x00], // #
    [0x08, 0x1E, 0x28, 0x1C, 0x0A, 0x3C, 0x08, 0x00], // $
    [0x30, 0x32, 0x04, 0x08, 0x10, 0x26, 0x06, 0x00], // %
    [0x10, 0x28, 0x28, 0x10, 0x2A, 0x24, 0x1A, 0x00], // &
    [0x08, 0x08, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x04, 0x08, 0x10, 0x10, 0x10, 0x08, 0x04, 0x00], // (
    [0x10, 0x08, 0x04, 0x04, 0x04, 0x08, 0x10, 0x00], // )
    [0x00, 0x08, 0x2A, 0x1C, 0x2A, 0x08, 0x00, 0x00], // *
    [0x00, 0x08, 0x08, 0x3E, 0x08, 0x08, 0x00, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x08, 0x10], // ,
    [0x00, 0x00, 0x00, 0x3E, 0x00, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00], // .
    [0x00, 0x02, 0x04, 0x08, 0x10, 0x20, 0x00, 0x00], // /
    [0x1C, 0x22, 0x26, 0x2A, 0x32, 0x22, 0x1C, 0x00], // 0
    [0x08, 0x18, 0x08, 0x08, 0x08, 0x08, 0x1C, 0x00], // 1
    [0x1C, 0x22, 0x02, 0x0C, 0x10, 0x20, 0x3E, 0x00], // 2
    [0x1C, 0x22, 0x02, 0x0C, 0x02, 0x22, 0x1C, 0x00], // 3
    [0x04, 0x0C, 0x14, 0x24, 0x3E, 0x04, 0x04, 0x00], // 4
    [0x3E, 0x20, 0x3C, 0x02, 0x02, 0x22, 0x1C, 0x00], // 5
    [0x0E, 0x10, 0x20, 0x3C, 0x22, 0x22, 0x1C, 0x00], // 6
    [0x3E, 0x02, 0x04, 0x08, 0x10, 0x10, 0x10, 0x00], // 7
    [0x1C, 0x22, 0x22, 0x1C, 0x22, 0x22, 0x1C, 0x00], // 8
    [0x1C, 0x22, 0x22, 0x1E, 0x02, 0x04, 0x38, 0x00], // 9
    [0x00, 0x00, 0x08, 0x00, 0x00, 0x08, 0x00, 0x00], // :
    [0x00, 0x00, 0x08, 0x00, 0x00, 0x08, 0x08, 0x10], // ;
    [0x04, 0x08, 0x10, 0x20, 0x10, 0x08, 0x04, 0x00], // <
    [0x00, 0x00, 0x3E, 0x00, 0x3E, 0x00, 0x00, 0x00], // =
    [0x10, 0x08, 0x04, 0x02, 0x04, 0x08, 0x10, 0x00], // >
    [0x1C, 0x22, 0x02, 0x04, 0x08, 0x00, 0x08, 0x00], // ?
];

/// 内蔵フォント: 小文字 ($60-$7F の文字、グリフROM上は$40-$5F)
const FONT_LOWER: [[u8; 8]; 32] = [
    [0x10, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // `
    [0x00, 0x00, 0x1C, 0x02, 0x1E, 0x22, 0x1E, 0x00], // a
    [0x20, 0x20, 0x3C, 0x22, 0x22, 0x22, 0x3C, 0x00], // b
    [0x00, 0x00, 0x1C, 0x20, 0x20, 0x20, 0x1C, 0x00], // c
    [0x02, 0x02, 0x1E, 0x22, 0x22, 0x22, 0x1E, 0x00], // d
    [0x00, 0x00, 0x1C, 0x22, 0x3E, 0x20, 0x1C, 0x00], // e
    [0x0C, 0x10, 0x10, 0x3C, 0x10, 0x10, 0x10, 0x00], // f
    [0x00, 0x00, 0x1E, 0x22, 0x22, 0x1E, 0x02, 0x1C], // g
    [0x20, 0x20, 0x3C, 0x22, 0x22, 0x22, 0x22, 0x00], // h
    [0x08, 0x00, 0x18, 0x08, 0x08, 0x08, 0x1C, 0x00], // i
    [0x04, 0x00, 0x04, 0x04, 0x04, 0x04, 0x24, 0x18], // j
    [0x20, 0x20, 0x24, 0x28, 0x30, 0x28, 0x24, 0x00], // k
    [0x18, 0x08, 0x08, 0x08, 0x08, 0x08, 0x1C, 0x00], // l
    [0x00, 0x00, 0x36, 0x2A, 0x2A, 0x2A, 0x22, 0x00], // m
    [0x00, 0x00, 0x3C, 0x22, 0x22, 0x22, 0x22, 0x00], // n
    [0x00, 0x00, 0x1C, 0x22, 0x22, 0x22, 0x1C, 0x00], // o
    [0x00, 0x00, 0x3C, 0x22, 0x22, 0x3C, 0x20, 0x20], // p
    [0x00, 0x00, 0x1E, 0x22, 0x22, 0x1E, 0x02, 0x02], // q
    [0x00, 0x00, 0x2C, 0x32, 0x20, 0x20, 0x20, 0x00], // r
    [0x00, 0x00, 0x1E, 0x20, 0x1C, 0x02, 0x3C, 0x00], // s
    [0x10, 0x10, 0x3C, 0x10, 0x10, 0x10, 0x0C, 0x00], // t
    [0x00, 0x00, 0x22, 0x22, 0x22, 0x22, 0x1E, 0x00], // u
    [0x00, 0x00, 0x22, 0x22, 0x22, 0x14, 0x08, 0x00], // v
    [0x00, 0x00, 0x22, 0x2A, 0x2A, 0x2A, 0x14, 0x00], // w
    [0x00, 0x00, 0x22, 0x14, 0x08, 0x14, 0x22, 0x00], // x
    [0x00, 0x00, 0x22, 0x22, 0x22, 0x1E, 0x02, 0x1C], // y
    [0x00, 0x00, 0x3E, 0x04, 0x08, 0x10, 0x3E, 0x00], // z
    [0x04, 0x08, 0x08, 0x10, 0x08, 0x08, 0x04, 0x00], // {
    [0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00], // |
    [0x10, 0x08, 0x08, 0x04, 0x08, 0x08, 0x10, 0x00], // }
    [0x00, 0x00, 0x10, 0x2A, 0x04, 0x00, 0x00, 0x00], // ~
    [0x3E, 0x3E, 0x3E, 0x3E, 0x3E, 0x3E, 0x3E, 0x00], // DEL
];

/// MSBファースト（ビット6が左端）の行をビット0が左端の並びに変換
fn reverse7(row: u8) -> u8 {
    let mut out = 0;
    for bit in 0..7 {
        if row & (0x40 >> bit) != 0 {
            out |= 1 << bit;
        }
    }
    out
}

/// 通常・代替の2セットぶんの文字ビットテーブル
#[derive(Clone)]
pub struct CharacterSet {
    csbits: Box<[CharSetBits; 2]>,
}

impl Default for CharacterSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CharacterSet {
    /// 内蔵フォントから作成
    pub fn builtin() -> Self {
        let mut rom = [0u8; GLYPH_ROM_SIZE];
        for (idx, glyph) in FONT_UPPER.iter().chain(FONT_LOWER.iter()).enumerate() {
            rom[idx * 8..idx * 8 + 8].copy_from_slice(glyph);
        }
        Self::from_glyphs(&rom)
    }

    /// グリフROMから作成
    ///
    /// レイアウト: $00-$3F 大文字・記号、$40-$5F 小文字、$60-$7F MouseText。
    /// 各行はビット6が左端。MouseText部が空なら代替セットでも反転大文字を使う
    /// （初代IIeの挙動）。
    pub fn from_rom(data: &[u8]) -> Result<Self, String> {
        if data.len() < GLYPH_ROM_SIZE {
            return Err(format!(
                "Character ROM too small: {} bytes (need {})",
                data.len(),
                GLYPH_ROM_SIZE
            ));
        }
        log::info!("Loaded external character ROM ({} bytes)", data.len());
        Ok(Self::from_glyphs(&data[..GLYPH_ROM_SIZE]))
    }

    fn from_glyphs(rom: &[u8]) -> Self {
        let glyph = |index: usize, row: usize| reverse7(rom[index * 8 + row] & 0x7F);
        let has_mousetext = rom[0x60 * 8..0x80 * 8].iter().any(|&b| b != 0);

        let mut csbits = Box::new([[[0u8; 8]; 256]; 2]);
        for ch in 0..256usize {
            for row in 0..8 {
                let upper = glyph(ch & 0x3F, row);
                let lower = glyph(0x40 + (ch & 0x1F), row);
                let inverse = |bits: u8| !bits & 0x7F;

                // 通常セット: 反転 / 点滅(反転で格納) / 通常 / 小文字
                csbits[0][ch][row] = match ch {
                    0x00..=0x7F => inverse(upper),
                    0x80..=0xDF => upper,
                    _ => lower,
                };

                // 代替セット: 反転 / MouseText / 反転小文字 / 通常 / 小文字
                csbits[1][ch][row] = match ch {
                    0x00..=0x3F => inverse(upper),
                    0x40..=0x5F if has_mousetext => glyph(0x60 + (ch & 0x1F), row),
                    0x40..=0x5F => inverse(upper),
                    0x60..=0x7F => inverse(lower),
                    0x80..=0xDF => upper,
                    _ => lower,
                };
            }
        }

        CharacterSet { csbits }
    }

    /// 指定セット・文字・行の7ビットパターン
    #[inline]
    pub fn bits(&self, alt: bool, ch: u8, row: usize) -> u8 {
        self.csbits[usize::from(alt)][ch as usize][row & 7]
    }
}
