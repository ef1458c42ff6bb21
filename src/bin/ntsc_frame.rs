//! NTSC Frame - RAMイメージから1フレームを描いてPNGに保存する
//!
//! 使用方法:
//!   cargo run --release --bin ntsc_frame -- --main ram.bin --mode hires -o hires.png
//!   cargo run --release --bin ntsc_frame -- --random --mode text80 --video green

use a2ntsc::charset::CharacterSet;
use a2ntsc::config::VideoConfig;
use a2ntsc::memory::RamBanks;
use a2ntsc::modes::VideoFlags;
use a2ntsc::ntsc_table::ChromaFilter;
use a2ntsc::renderer::FrameGeometry;
use a2ntsc::scanner::{AppleModel, VIDEO_SCANNER_6502_CYCLES};
use a2ntsc::video::{NtscVideo, VideoType};
use clap::Parser;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author = "A2NTSC Project")]
#[command(version = "0.1.0")]
#[command(about = "Render Apple II video memory through the NTSC composite model", long_about = None)]
struct Args {
    /// メインRAMイメージ（64KBまで）
    #[arg(long)]
    main: Option<String>,

    /// 補助RAMイメージ（80桁/ダブル系モード用）
    #[arg(long)]
    aux: Option<String>,

    /// RAMを乱数で埋める（イメージ指定がない部分）
    #[arg(long)]
    random: bool,

    /// 乱数のシード
    #[arg(long)]
    seed: Option<u64>,

    /// 表示モード (text, text80, lores, dlores, dlores80, hires, dhires, dhires80)
    #[arg(long, default_value = "text")]
    mode: String,

    /// 混合モード（下4行テキスト）
    #[arg(long)]
    mixed: bool,

    /// ページ2を表示
    #[arg(long)]
    page2: bool,

    /// 代替文字セット
    #[arg(long)]
    altchar: bool,

    /// 表示方式 (color-tv, color-monitor, mono-tv, amber, green, white, custom)
    #[arg(long)]
    video: Option<String>,

    /// ハーフスキャンライン
    #[arg(long)]
    half_scanlines: bool,

    /// クロマ処理 (blur, sharp, soft, muted)
    #[arg(long)]
    chroma: Option<String>,

    /// Apple IIモデル (ii, ii+, iie, iie-enhanced)
    #[arg(long)]
    model: Option<String>,

    /// 文字ROM（128文字 × 8バイト）
    #[arg(long)]
    charrom: Option<String>,

    /// 描画するフレーム数（点滅の確認用）
    #[arg(long, default_value = "1")]
    frames: u32,

    /// 設定ファイル
    #[arg(short, long)]
    config: Option<String>,

    /// 現在の設定を設定ファイルに保存
    #[arg(long)]
    save_config: bool,

    /// 出力PNGファイル（省略時はスクリーンショットディレクトリに日時付きで保存）
    #[arg(short, long)]
    output: Option<String>,
}

fn parse_display_mode(mode: &str) -> Result<VideoFlags, String> {
    let flags = match mode.to_lowercase().as_str() {
        "text" | "text40" => VideoFlags::TEXT,
        "text80" => VideoFlags::TEXT | VideoFlags::COL80,
        "lores" | "gr" => VideoFlags::empty(),
        "dlores" | "dlores40" => VideoFlags::DHIRES,
        "dlores80" | "dgr" => VideoFlags::DHIRES | VideoFlags::COL80,
        "hires" | "hgr" => VideoFlags::HIRES,
        "dhires" | "dhires40" => VideoFlags::HIRES | VideoFlags::DHIRES,
        "dhires80" | "dhgr" => VideoFlags::HIRES | VideoFlags::DHIRES | VideoFlags::COL80,
        _ => return Err(format!("Unknown display mode: {}", mode)),
    };
    Ok(flags)
}

fn parse_video_type(name: &str) -> Result<VideoType, String> {
    match name.to_lowercase().as_str() {
        "color-tv" | "tv" => Ok(VideoType::ColorTv),
        "color-monitor" | "color" | "monitor" => Ok(VideoType::ColorMonitor),
        "mono-tv" => Ok(VideoType::MonoTv),
        "amber" => Ok(VideoType::MonoAmber),
        "green" => Ok(VideoType::MonoGreen),
        "white" => Ok(VideoType::MonoWhite),
        "custom" => Ok(VideoType::MonoCustom),
        _ => Err(format!("Unknown video type: {}", name)),
    }
}

fn parse_chroma_filter(name: &str) -> Result<ChromaFilter, String> {
    match name.to_lowercase().as_str() {
        "blur" => Ok(ChromaFilter::Blur),
        "sharp" => Ok(ChromaFilter::Sharp),
        "soft" | "soft-fringe" => Ok(ChromaFilter::SoftFringe),
        "muted" | "muted-fringe" => Ok(ChromaFilter::MutedFringe),
        _ => Err(format!("Unknown chroma filter: {}", name)),
    }
}

fn parse_model(name: &str) -> Result<AppleModel, String> {
    match name.to_lowercase().as_str() {
        "ii" | "apple2" => Ok(AppleModel::AppleII),
        "ii+" | "iip" | "apple2+" | "apple2plus" => Ok(AppleModel::AppleIIPlus),
        "iie" | "apple2e" => Ok(AppleModel::AppleIIe),
        "iie-enhanced" | "iie+" | "apple2ee" => Ok(AppleModel::AppleIIeEnhanced),
        _ => Err(format!("Unknown model: {}", name)),
    }
}

/// PNG保存（RGB8）
fn save_screenshot(filename: &str, fb: &[u32], width: usize, height: usize) -> Result<(), Box<dyn std::error::Error>> {
    let file = fs::File::create(filename)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, width as u32, height as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;

    let mut rgb_data = Vec::with_capacity(width * height * 3);
    for pixel in fb.iter() {
        rgb_data.push(((pixel >> 16) & 0xFF) as u8);
        rgb_data.push(((pixel >> 8) & 0xFF) as u8);
        rgb_data.push((pixel & 0xFF) as u8);
    }

    writer.write_image_data(&rgb_data)?;
    Ok(())
}

fn load_ram(args: &Args) -> Result<RamBanks, String> {
    let mut ram = RamBanks::new();
    if args.random {
        match args.seed {
            Some(seed) => ram.fill_random(&mut rand::rngs::StdRng::seed_from_u64(seed)),
            None => ram.fill_random(&mut rand::thread_rng()),
        }
    }
    if let Some(path) = &args.main {
        let data = fs::read(path).map_err(|e| format!("Failed to read main RAM image {}: {}", path, e))?;
        ram.load_main(&data);
        log::info!("Loaded main RAM image {} ({} bytes)", path, data.len());
    }
    if let Some(path) = &args.aux {
        let data = fs::read(path).map_err(|e| format!("Failed to read aux RAM image {}: {}", path, e))?;
        ram.load_aux(&data);
        log::info!("Loaded aux RAM image {} ({} bytes)", path, data.len());
    }
    Ok(ram)
}

fn load_charset(path: Option<PathBuf>) -> Result<CharacterSet, String> {
    match path {
        Some(path) => {
            let data = fs::read(&path).map_err(|e| format!("Failed to read character ROM {:?}: {}", path, e))?;
            CharacterSet::from_rom(&data)
        }
        None => Ok(CharacterSet::builtin()),
    }
}

fn output_path(args: &Args, config: &VideoConfig) -> Result<String, String> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    let dir = config.screenshot_dir_path();
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create {:?}: {}", dir, e))?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    Ok(dir.join(format!("ntsc_{}.png", timestamp)).to_string_lossy().into_owned())
}

fn run(args: Args) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => VideoConfig::load_from(path),
        None => VideoConfig::load(),
    };

    // コマンドライン指定を優先
    if let Some(name) = &args.video {
        config.video_type = parse_video_type(name)?;
    }
    if let Some(name) = &args.chroma {
        config.chroma_filter = parse_chroma_filter(name)?;
    }
    if let Some(name) = &args.model {
        config.model = parse_model(name)?;
    }
    if let Some(path) = &args.charrom {
        config.char_rom = Some(path.clone());
    }
    config.half_scanlines |= args.half_scanlines;

    if args.save_config {
        match &args.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
    }

    let mut flags = parse_display_mode(&args.mode)?;
    flags.set(VideoFlags::MIXED, args.mixed);
    flags.set(VideoFlags::PAGE2, args.page2);

    let ram = load_ram(&args)?;
    // コマンドラインのパスはカレントディレクトリ基準
    let charrom = args.charrom.as_ref().map(PathBuf::from).or_else(|| config.char_rom_path());
    let charset = load_charset(charrom)?;

    let mut video = NtscVideo::new(FrameGeometry::STANDARD, charset, &config);
    video.set_character_set_offset(if args.altchar { 256 } else { 0 });
    video.set_display_mode(flags);

    for _ in 0..args.frames.max(1) {
        video.advance(&ram, VIDEO_SCANNER_6502_CYCLES);
    }

    let filename = output_path(&args, &config)?;
    let geometry = video.geometry();
    save_screenshot(&filename, video.framebuffer(), geometry.width(), geometry.height())
        .map_err(|e| format!("Failed to save {}: {}", filename, e))?;
    println!("Saved {} ({:?}, {:?})", filename, video.graphics_mode(), config.video_type);
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
