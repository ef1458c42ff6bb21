//! ビデオ設定の管理
//!
//! 表示方式などをJSON形式で永続化

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ntsc_table::ChromaFilter;
use crate::scanner::AppleModel;
use crate::video::VideoType;

/// 設定ファイルのデフォルトファイル名
const CONFIG_FILENAME: &str = "ntsc_video.json";

/// 実行ファイルのディレクトリを取得
pub fn get_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 相対パスを実行ファイルディレクトリからの絶対パスに解決
pub fn resolve_path(relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        get_exe_dir().join(relative)
    }
}

/// 設定ファイルのパスを取得
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join(CONFIG_FILENAME)
}

/// ビデオ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// 表示方式
    #[serde(default)]
    pub video_type: VideoType,
    /// ハーフスキャンライン（1行おきに暗くする）
    #[serde(default)]
    pub half_scanlines: bool,
    /// MonoCustom の色 (R, G, B)
    #[serde(default = "default_monochrome_rgb")]
    pub monochrome_rgb: (u8, u8, u8),
    /// クロマ処理方式
    #[serde(default)]
    pub chroma_filter: ChromaFilter,
    /// 機種（水平アドレスのタイミングが変わる）
    #[serde(default)]
    pub model: AppleModel,
    /// 文字ROMのパス（未設定なら内蔵フォント）
    #[serde(default)]
    pub char_rom: Option<String>,
    /// スクリーンショットディレクトリ
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: String,
}

fn default_monochrome_rgb() -> (u8, u8, u8) { (0xC0, 0xC0, 0xC0) }
fn default_screenshot_dir() -> String { "screenshots".to_string() }

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            video_type: VideoType::default(),
            half_scanlines: false,
            monochrome_rgb: default_monochrome_rgb(),
            chroma_filter: ChromaFilter::default(),
            model: AppleModel::default(),
            char_rom: None,
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

impl VideoConfig {
    /// 設定ファイルを読み込む（実行ファイルと同じディレクトリから）
    pub fn load() -> Self {
        Self::load_from(get_config_path())
    }

    /// 指定したパスから設定を読み込む
    ///
    /// ファイルがなければデフォルト、壊れていれば警告を出してデフォルト。
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse config {:?}: {}, using defaults", path.as_ref(), e);
                    VideoConfig::default()
                }
            },
            Err(_) => VideoConfig::default(),
        }
    }

    /// 設定ファイルを保存する（実行ファイルと同じディレクトリに）
    pub fn save(&self) -> Result<(), String> {
        self.save_to(get_config_path())
    }

    /// 指定したパスに設定を保存する
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, json)
            .map_err(|e| format!("Failed to write config: {}", e))?;
        Ok(())
    }

    /// スクリーンショットディレクトリの絶対パスを取得
    pub fn screenshot_dir_path(&self) -> PathBuf {
        resolve_path(&self.screenshot_dir)
    }

    /// 文字ROMのパス（設定されていれば）
    pub fn char_rom_path(&self) -> Option<PathBuf> {
        self.char_rom.as_deref().map(resolve_path)
    }
}
