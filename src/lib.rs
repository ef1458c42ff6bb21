//! A2NTSC - Apple II NTSC composite video in Rust
//!
//! A cycle-accurate model of the Apple II video output:
//! - Video scanner clock (65 cycles × 262 lines) for II/II+ and IIe timing
//! - NTSC decode tables generated from simulated analog filters
//! - Text, Lo-Res, Hi-Res and their double (80-column) variants
//! - Color/monochrome monitor and TV styles with scanline blending

pub mod filter;
pub mod ntsc_table;
pub mod charset;
pub mod scanner;
pub mod renderer;
pub mod modes;
pub mod memory;
pub mod video;
pub mod config;
