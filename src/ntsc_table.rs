//! NTSCデコードテーブルの生成
//!
//! 12ビットの信号履歴 × 4つのカラーバースト位相ごとに、
//! モニタ/TVそれぞれのモノクロ・カラー画素を事前計算する。
//! 画素は0xAARRGGBB形式（リトルエンディアンのBGRAと同じ並び）。

use serde::{Deserialize, Serialize};

use crate::filter::FilterBank;

/// カラーバースト位相の数
pub const NTSC_NUM_PHASES: usize = 4;
/// 12ビット信号履歴の全パターン数
pub const NTSC_NUM_SEQUENCES: usize = 4096;
/// 信号履歴のマスク
pub const SIGNAL_HISTORY_MASK: u16 = 0x0FFF;
/// アルファ値（常に不透明）
pub const ALPHA32_MASK: u32 = 0xFF00_0000;

// 単精度のまま計算する定数（丸め方もテーブル出力の一部）
const PI: f32 = 3.141_592_653_589_8;
const RAD_45: f32 = PI * 0.25;
const RAD_90: f32 = PI * 0.5;

// YIQ → RGB
const I_TO_R: f32 = 0.956;
const I_TO_G: f32 = -0.272;
const I_TO_B: f32 = -1.105;
const Q_TO_R: f32 = 0.621;
const Q_TO_G: f32 = -0.647;
const Q_TO_B: f32 = 1.702;

/// 白のリンギングを消すための補正量
const WHITE_RINGING_BIAS: f64 = 0.25;
const WHITE_RINGING_THRESHOLD: f32 = 0.9;

/// クロマ（色信号）の処理方式。テーブル生成時にのみ効く。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChromaFilter {
    /// 約8画素にわたるブラー（プリフィルタ + バンドパス）
    #[default]
    Blur,
    /// ブラーなし、クロマをそのまま使う
    Sharp,
    /// ソフトなクロマブラー、色フリンジ強め
    SoftFringe,
    /// ブラー強め、色フリンジ控えめ
    MutedFringe,
}

impl ChromaFilter {
    /// 位相の開始角（ラジアン、単精度で計算）
    fn cycle_start(self) -> f32 {
        match self {
            ChromaFilter::Blur => deg_to_rad(45.0),
            ChromaFilter::MutedFringe => PI / 4.0,
            ChromaFilter::Sharp | ChromaFilter::SoftFringe => deg_to_rad(115.0),
        }
    }
}

fn deg_to_rad(deg: f32) -> f32 {
    PI * deg / 180.0
}

#[inline]
fn clamp_zero_one(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}

#[inline]
fn to_channel(x: f32) -> u32 {
    // 0..=1 に収めた値を255倍して切り捨て
    (x * 255.0) as u8 as u32
}

#[inline]
fn pack_rgb(r: f32, g: f32, b: f32) -> u32 {
    ALPHA32_MASK | (to_channel(r) << 16) | (to_channel(g) << 8) | to_channel(b)
}

#[inline]
fn yiq_to_rgb(y: f64, i: f64, q: f64) -> (f64, f64, f64) {
    let r = y + (f64::from(I_TO_R) * i) + (f64::from(Q_TO_R) * q);
    let g = y + (f64::from(I_TO_G) * i) + (f64::from(Q_TO_G) * q);
    let b = y + (f64::from(I_TO_B) * i) + (f64::from(Q_TO_B) * q);
    (r, g, b)
}

/// モノクロテーブルを色味(r, g, b)で乗算した値
#[inline]
pub fn tint_pixel(base: u32, r: u8, g: u8, b: u8) -> u32 {
    let scale = |shift: u32, k: u8| ((((base >> shift) & 0xFF) * k as u32) >> 8) << shift;
    ALPHA32_MASK | scale(16, r) | scale(8, g) | scale(0, b)
}

/// テーブル1枚分（12ビット履歴でインデックス）
pub type DecodeTable = [u32; NTSC_NUM_SEQUENCES];

/// 生成済みNTSCデコードテーブル一式
#[derive(Clone)]
pub struct NtscTables {
    pub mono_monitor: Box<DecodeTable>,
    pub mono_television: Box<DecodeTable>,
    pub color_monitor: Box<[DecodeTable; NTSC_NUM_PHASES]>,
    pub color_television: Box<[DecodeTable; NTSC_NUM_PHASES]>,
    /// mono_monitor × 色味
    pub mono_monitor_custom: Box<DecodeTable>,
    /// mono_television × 色味
    pub mono_television_custom: Box<DecodeTable>,
    chroma_filter: ChromaFilter,
    monochrome_rgb: (u8, u8, u8),
}

impl NtscTables {
    /// 指定のクロマ方式でテーブルを生成する（モノクロ色味は白）
    pub fn build(chroma_filter: ChromaFilter) -> Self {
        let mut tables = NtscTables {
            mono_monitor: Box::new([0; NTSC_NUM_SEQUENCES]),
            mono_television: Box::new([0; NTSC_NUM_SEQUENCES]),
            color_monitor: Box::new([[0; NTSC_NUM_SEQUENCES]; NTSC_NUM_PHASES]),
            color_television: Box::new([[0; NTSC_NUM_SEQUENCES]; NTSC_NUM_PHASES]),
            mono_monitor_custom: Box::new([0; NTSC_NUM_SEQUENCES]),
            mono_television_custom: Box::new([0; NTSC_NUM_SEQUENCES]),
            chroma_filter,
            monochrome_rgb: (0xFF, 0xFF, 0xFF),
        };
        tables.rebuild(chroma_filter);
        tables
    }

    pub fn chroma_filter(&self) -> ChromaFilter {
        self.chroma_filter
    }

    pub fn monochrome_rgb(&self) -> (u8, u8, u8) {
        self.monochrome_rgb
    }

    /// クロマ方式を変えて全テーブルを再生成する
    pub fn rebuild(&mut self, chroma_filter: ChromaFilter) {
        self.chroma_filter = chroma_filter;
        self.init_chroma_phase_table();
        let (r, g, b) = self.monochrome_rgb;
        self.update_monochrome_color(r, g, b);
        log::info!("NTSC decode tables built ({:?})", chroma_filter);
    }

    /// 4位相ぶんのクロマ参照テーブルを作る
    fn init_chroma_phase_table(&mut self) {
        let mut bank = FilterBank::new();
        bank.reset();

        let cycle_start = self.chroma_filter.cycle_start();

        for phase in 0..NTSC_NUM_PHASES {
            // 位相角はシーケンスをまたいで累積する（1シーケンス = 3周）
            let mut phi = f64::from(phase as f32 * RAD_90 + cycle_start);
            for s in 0..NTSC_NUM_SEQUENCES {
                let mut t = s;
                let (mut z, mut y0, mut y1, mut c, mut i, mut q) = (0.0f64, 0.0, 0.0, 0.0, 0.0, 0.0);

                for _ in 0..12 {
                    z = if t & 0x800 != 0 { 1.0 } else { 0.0 };
                    t <<= 1;

                    // 1ビットセルを2ティックでオーバーサンプリング
                    for _ in 0..2 {
                        match self.chroma_filter {
                            ChromaFilter::Blur => {
                                let zz = bank.prefilter.apply(z);
                                c = bank.chroma.apply(zz);
                                y0 = bank.luma0.apply(zz);
                                y1 = bank.luma1.apply(zz - c);
                            }
                            sharp => {
                                y0 += (z - y0) / 4.0;
                                y1 = y0;
                                c = match sharp {
                                    ChromaFilter::Sharp => z,
                                    ChromaFilter::SoftFringe => z - y0,
                                    _ => bank.prefilter.apply(z),
                                };
                            }
                        }

                        c *= 2.0;
                        i += (c * phi.cos() - i) / 8.0;
                        q += (c * phi.sin() - q) / 8.0;

                        phi += f64::from(RAD_45);
                    }
                }

                // モノクロモニタは最後のビットそのもの
                let brightness = clamp_zero_one(z as f32);
                self.mono_monitor[s] = pack_rgb(brightness, brightness, brightness);

                let brightness = clamp_zero_one(y1 as f32);
                self.mono_television[s] = pack_rgb(brightness, brightness, brightness);

                let (mut r64, mut g64, mut b64) = yiq_to_rgb(y0, i, q);
                if brightness > WHITE_RINGING_THRESHOLD {
                    r64 += WHITE_RINGING_BIAS;
                    g64 += WHITE_RINGING_BIAS;
                    b64 += WHITE_RINGING_BIAS;
                }
                self.color_monitor[phase][s] = pack_rgb(
                    clamp_zero_one(r64 as f32),
                    clamp_zero_one(g64 as f32),
                    clamp_zero_one(b64 as f32),
                );

                let (r64, g64, b64) = yiq_to_rgb(y1, i, q);
                self.color_television[phase][s] = pack_rgb(
                    clamp_zero_one(r64 as f32),
                    clamp_zero_one(g64 as f32),
                    clamp_zero_one(b64 as f32),
                );
            }
        }
    }

    /// モノクロテーブルに色味を掛けてカスタムテーブルを作り直す
    pub fn update_monochrome_color(&mut self, r: u8, g: u8, b: u8) {
        self.monochrome_rgb = (r, g, b);
        for s in 0..NTSC_NUM_SEQUENCES {
            self.mono_monitor_custom[s] = tint_pixel(self.mono_monitor[s], r, g, b);
            self.mono_television_custom[s] = tint_pixel(self.mono_television[s], r, g, b);
        }
    }
}
