//! ビデオ回路から見たメモリ
//!
//! ビデオは読み取り専用で、ソフトスイッチ（RAMRD等）を経由せず
//! main/aux の物理RAMを直接読む。

/// ビデオ回路が読むメモリ
pub trait VideoMemory {
    /// メインRAMから1バイト読み取り
    fn read_main(&self, address: u16) -> u8;
    /// 補助RAM (IIe 80桁カード) から1バイト読み取り
    fn read_aux(&self, address: u16) -> u8;
}

/// 64KB × 2 バンクの単純なRAM
#[derive(Clone)]
pub struct RamBanks {
    pub main_ram: Box<[u8; 65536]>,
    pub aux_ram: Box<[u8; 65536]>,
}

impl Default for RamBanks {
    fn default() -> Self {
        Self::new()
    }
}

impl RamBanks {
    pub fn new() -> Self {
        RamBanks {
            main_ram: Box::new([0; 65536]),
            aux_ram: Box::new([0; 65536]),
        }
    }

    /// RAMイメージを読み込む（先頭から最大64KB）
    pub fn load_main(&mut self, data: &[u8]) {
        let len = data.len().min(65536);
        self.main_ram[..len].copy_from_slice(&data[..len]);
    }

    pub fn load_aux(&mut self, data: &[u8]) {
        let len = data.len().min(65536);
        self.aux_ram[..len].copy_from_slice(&data[..len]);
    }

    /// 乱数で埋める（電源投入直後のRAM）
    pub fn fill_random<R: rand::Rng>(&mut self, rng: &mut R) {
        rng.fill(&mut self.main_ram[..]);
        rng.fill(&mut self.aux_ram[..]);
    }
}

impl VideoMemory for RamBanks {
    #[inline]
    fn read_main(&self, address: u16) -> u8 {
        self.main_ram[address as usize]
    }

    #[inline]
    fn read_aux(&self, address: u16) -> u8 {
        self.aux_ram[address as usize]
    }
}
