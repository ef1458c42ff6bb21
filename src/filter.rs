//! NTSCデコーダのアナログフロントエンドを模した2次IIRフィルタ群
//!
//! 係数は実機の応答に合わせて調整された単精度リテラル。
//! 倍精度に拡張して使うが、この丸め方自体がテーブル出力の一部になっている。

/// フィルタの分子（フィードフォワード）の形
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numerator {
    /// ローパス: x0 + x2 + 2*x1
    LowPass,
    /// バンドパス: x2 - x0
    BandPass,
}

/// 2次IIR (biquad) フィルタ
#[derive(Debug, Clone)]
pub struct Biquad {
    gain: f32,
    coef0: f32,
    coef1: f32,
    numerator: Numerator,
    xv: [f64; 3],
    yv: [f64; 3],
}

impl Biquad {
    const fn new(gain: f32, coef0: f32, coef1: f32, numerator: Numerator) -> Self {
        Biquad {
            gain,
            coef0,
            coef1,
            numerator,
            xv: [0.0; 3],
            yv: [0.0; 3],
        }
    }

    /// 信号プリフィルタ（ブラー）
    pub const fn signal_prefilter() -> Self {
        Self::new(7.614_490_548, -0.271_879_805_8, 0.746_565_607_2, Numerator::LowPass)
    }

    /// 輝度フィルタ（モニタ用とTV用で別インスタンスを使う）
    pub const fn luma() -> Self {
        Self::new(13.713_315_70, -0.396_107_544_9, 1.104_420_247_2, Numerator::LowPass)
    }

    /// 色差バンドパスフィルタ
    pub const fn chroma() -> Self {
        Self::new(7.438_011_255, -0.731_889_364_5, 1.233_644_271_1, Numerator::BandPass)
    }

    /// 1サンプル入力して出力を返す
    pub fn apply(&mut self, z: f64) -> f64 {
        self.xv[0] = self.xv[1];
        self.xv[1] = self.xv[2];
        self.xv[2] = z / f64::from(self.gain);
        self.yv[0] = self.yv[1];
        self.yv[1] = self.yv[2];

        let feed = match self.numerator {
            Numerator::LowPass => self.xv[0] + self.xv[2] + (2.0 * self.xv[1]),
            Numerator::BandPass => self.xv[2] - self.xv[0],
        };
        self.yv[2] = feed
            + (f64::from(self.coef0) * self.yv[0])
            + (f64::from(self.coef1) * self.yv[1]);

        self.yv[2]
    }

    /// 履歴をゼロに戻す
    pub fn reset(&mut self) {
        self.xv = [0.0; 3];
        self.yv = [0.0; 3];
    }
}

/// テーブル生成1回分で共有されるフィルタ一式
#[derive(Debug, Clone)]
pub struct FilterBank {
    pub prefilter: Biquad,
    pub luma0: Biquad,
    pub luma1: Biquad,
    pub chroma: Biquad,
}

impl Default for FilterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBank {
    pub fn new() -> Self {
        FilterBank {
            prefilter: Biquad::signal_prefilter(),
            luma0: Biquad::luma(),
            luma1: Biquad::luma(),
            chroma: Biquad::chroma(),
        }
    }

    /// 全フィルタの状態をリセット（テーブル生成の開始時に呼ぶ）
    pub fn reset(&mut self) {
        self.prefilter.reset();
        self.luma0.reset();
        self.luma1.reset();
        self.chroma.reset();
    }
}
