//! Configuration system for the pipeline model.
//!
//! This module defines every structure used to parameterize a core instance. It provides:
//! 1. **Defaults:** Baseline constants for the memory map, latencies, and cache geometry.
//! 2. **Structures:** Hierarchical config for general options, ISA variant, memory, cache, and CLINT.
//! 3. **Validation:** Geometry and memory-map checks run after deserialization.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built from `Config::default()`.

use serde::Deserialize;
use thiserror::Error;

/// Default configuration constants.
///
/// These values define the baseline core when a field is omitted from the JSON input.
mod defaults {
    /// Base address of the boot ROM.
    ///
    /// Instruction fetch starts here after reset unless `boot_pc` overrides it.
    pub const ROM_BASE: u64 = 0x0000_0000;

    /// Size of the boot ROM (64 KiB).
    pub const ROM_SIZE: u64 = 64 * 1024;

    /// Base address of data RAM.
    pub const RAM_BASE: u64 = 0x8000_0000;

    /// Size of data RAM (1 MiB).
    pub const RAM_SIZE: u64 = 1024 * 1024;

    /// Cycles for one ROM transaction through the memory controller.
    pub const ROM_LATENCY: u64 = 2;

    /// Cycles for one RAM transaction through the memory controller.
    ///
    /// A line fill or a dirty write-back each cost one transaction.
    pub const RAM_LATENCY: u64 = 8;

    /// Cycles for one uncached MMIO transaction.
    pub const MMIO_LATENCY: u64 = 1;

    /// Default data cache size in bytes (4 KiB).
    pub const CACHE_SIZE: usize = 4096;

    /// Default cache line size in bytes.
    pub const CACHE_LINE: usize = 32;

    /// Default cache associativity.
    pub const CACHE_WAYS: usize = 2;

    /// Base address of the core-local interruptor.
    pub const CLINT_BASE: u64 = 0x0200_0000;

    /// CLINT timer divider (mtime increments every N cycles).
    pub const CLINT_DIVIDER: u64 = 1;

    /// Cycle limit used by the command-line runner.
    pub const MAX_CYCLES: u64 = 1_000_000;
}

/// Errors raised while parsing or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document did not match the configuration schema.
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A size that must be a power of two is not.
    #[error("{field} must be a non-zero power of two (got {value})")]
    NotPowerOfTwo {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied.
        value: u64,
    },

    /// The cache geometry leaves no sets.
    #[error("cache of {size} bytes cannot hold {ways} ways of {line}-byte lines")]
    CacheGeometry {
        /// Total cache size.
        size: usize,
        /// Line size.
        line: usize,
        /// Associativity.
        ways: usize,
    },

    /// Two address regions overlap.
    #[error("address region {first} overlaps {second}")]
    Overlap {
        /// First region name.
        first: &'static str,
        /// Second region name.
        second: &'static str,
    },

    /// A device attached at run time overlaps an existing region.
    #[error("device {name} at {base:#x} overlaps an existing region")]
    DeviceOverlap {
        /// Device name.
        name: String,
        /// Device base address.
        base: u64,
    },

    /// A cacheable region cannot be filled in whole cache lines.
    #[error("region {region} must be aligned to and at least as large as a {line}-byte cache line")]
    LineAlignment {
        /// Region name.
        region: &'static str,
        /// Cache line size.
        line: usize,
    },

    /// A region does not fit below the address width of the configured ISA.
    #[error("region {0} extends past the end of the address space")]
    OutOfRange(&'static str),

    /// The boot address is not inside ROM or RAM.
    #[error("boot pc {0:#x} is not inside ROM or RAM")]
    BootPc(u64),
}

/// Native register width of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Xlen {
    /// 32-bit registers and addresses.
    #[serde(alias = "RV32", alias = "rv32")]
    Rv32,
    /// 64-bit registers and addresses.
    #[default]
    #[serde(alias = "RV64", alias = "rv64")]
    Rv64,
}

impl Xlen {
    /// Register width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Rv32 => 32,
            Self::Rv64 => 64,
        }
    }

    /// Truncates an address or program counter to the address width.
    #[inline]
    pub const fn addr(self, value: u64) -> u64 {
        match self {
            Self::Rv32 => value & 0xFFFF_FFFF,
            Self::Rv64 => value,
        }
    }

    /// Canonical register form: RV32 values are held sign-extended from bit 31.
    #[inline]
    pub const fn canonical(self, value: u64) -> u64 {
        match self {
            Self::Rv32 => value as u32 as i32 as i64 as u64,
            Self::Rv64 => value,
        }
    }

    /// Largest shift amount accepted by shift-immediate encodings.
    pub const fn shamt_mask(self) -> u32 {
        self.bits() - 1
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation options.
    #[serde(default)]
    pub general: GeneralConfig,
    /// ISA variant descriptor.
    #[serde(default)]
    pub isa: IsaConfig,
    /// Memory map and backing-store latencies.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Data cache geometry.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Core-local interruptor.
    #[serde(default)]
    pub clint: ClintConfig,
}

impl Config {
    /// Parses a JSON document and validates the result.
    ///
    /// # Arguments
    ///
    /// * `json` - Configuration document. Omitted fields take their defaults.
    ///
    /// # Returns
    ///
    /// The validated configuration, or the first parse/validation error.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cache geometry and the memory map.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mem = &self.memory;
        power_of_two("memory.rom_size", mem.rom_size)?;
        power_of_two("memory.ram_size", mem.ram_size)?;

        let limit = match self.isa.xlen {
            Xlen::Rv32 => 1u128 << 32,
            Xlen::Rv64 => 1u128 << 64,
        };
        let mut regions = vec![
            ("rom", mem.rom_base, mem.rom_size),
            ("ram", mem.ram_base, mem.ram_size),
        ];
        if self.clint.enabled {
            regions.push(("clint", self.clint.base, ClintConfig::REGION_SIZE));
        }
        for &(name, base, size) in &regions {
            if u128::from(base) + u128::from(size) > limit {
                return Err(ConfigError::OutOfRange(name));
            }
        }
        for (i, &(first, a_base, a_size)) in regions.iter().enumerate() {
            for &(second, b_base, b_size) in &regions[i + 1..] {
                let a_end = u128::from(a_base) + u128::from(a_size);
                let b_end = u128::from(b_base) + u128::from(b_size);
                if u128::from(a_base) < b_end && u128::from(b_base) < a_end {
                    return Err(ConfigError::Overlap { first, second });
                }
            }
        }

        if self.cache.enabled {
            let c = &self.cache;
            power_of_two("cache.line_bytes", c.line_bytes as u64)?;
            power_of_two("cache.ways", c.ways as u64)?;
            power_of_two("cache.size_bytes", c.size_bytes as u64)?;
            if c.line_bytes < 8 || c.num_sets() == 0 {
                return Err(ConfigError::CacheGeometry {
                    size: c.size_bytes,
                    line: c.line_bytes,
                    ways: c.ways,
                });
            }
            let line = c.line_bytes as u64;
            for (region, base, size) in [
                ("rom", mem.rom_base, mem.rom_size),
                ("ram", mem.ram_base, mem.ram_size),
            ] {
                if base % line != 0 || size < line {
                    return Err(ConfigError::LineAlignment {
                        region,
                        line: c.line_bytes,
                    });
                }
            }
        }

        let pc = self.general.boot_pc;
        let in_rom = pc >= mem.rom_base && pc - mem.rom_base < mem.rom_size;
        let in_ram = pc >= mem.ram_base && pc - mem.ram_base < mem.ram_size;
        if !in_rom && !in_ram {
            return Err(ConfigError::BootPc(pc));
        }
        Ok(())
    }
}

fn power_of_two(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::NotPowerOfTwo { field, value })
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Program counter loaded on reset.
    #[serde(default = "GeneralConfig::default_boot_pc")]
    pub boot_pc: u64,

    /// Emit per-stage `trace` events for every cycle.
    #[serde(default)]
    pub trace_pipeline: bool,

    /// Stop the machine when `ECALL` or `EBREAK` retires instead of vectoring.
    #[serde(default)]
    pub halt_on_ecall: bool,

    /// Cycle budget used by the command-line runner.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,
}

impl GeneralConfig {
    fn default_boot_pc() -> u64 {
        defaults::ROM_BASE
    }

    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            boot_pc: defaults::ROM_BASE,
            trace_pipeline: false,
            halt_on_ecall: false,
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

/// ISA variant descriptor consulted by decode and by operand-width logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IsaConfig {
    /// Register and address width.
    #[serde(default)]
    pub xlen: Xlen,

    /// Integer multiply/divide extension.
    #[serde(default = "enabled")]
    pub m_extension: bool,

    /// CSR access, trap instructions, and trap return.
    #[serde(default = "enabled")]
    pub zicsr: bool,

    /// User privilege mode. When disabled, `mstatus.MPP` is hard-wired to machine mode.
    #[serde(default = "enabled")]
    pub user_mode: bool,
}

const fn enabled() -> bool {
    true
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self {
            xlen: Xlen::Rv64,
            m_extension: true,
            zicsr: true,
            user_mode: true,
        }
    }
}

impl IsaConfig {
    /// Value of the read-only `misa` register for this variant.
    pub const fn misa(&self) -> u64 {
        let mxl = match self.xlen {
            Xlen::Rv32 => 1u64 << 30,
            Xlen::Rv64 => 2u64 << 62,
        };
        let mut ext = 1 << (b'I' - b'A');
        if self.m_extension {
            ext |= 1 << (b'M' - b'A');
        }
        if self.user_mode {
            ext |= 1 << (b'U' - b'A');
        }
        mxl | ext
    }
}

/// Memory map and backing-store timing.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// ROM base address.
    #[serde(default = "MemoryConfig::default_rom_base")]
    pub rom_base: u64,
    /// ROM size in bytes.
    #[serde(default = "MemoryConfig::default_rom_size")]
    pub rom_size: u64,
    /// RAM base address.
    #[serde(default = "MemoryConfig::default_ram_base")]
    pub ram_base: u64,
    /// RAM size in bytes.
    #[serde(default = "MemoryConfig::default_ram_size")]
    pub ram_size: u64,
    /// Cycles per ROM transaction.
    #[serde(default = "MemoryConfig::default_rom_latency")]
    pub rom_latency: u64,
    /// Cycles per RAM transaction.
    #[serde(default = "MemoryConfig::default_ram_latency")]
    pub ram_latency: u64,
    /// Cycles per MMIO transaction.
    #[serde(default = "MemoryConfig::default_mmio_latency")]
    pub mmio_latency: u64,
}

impl MemoryConfig {
    fn default_rom_base() -> u64 {
        defaults::ROM_BASE
    }

    fn default_rom_size() -> u64 {
        defaults::ROM_SIZE
    }

    fn default_ram_base() -> u64 {
        defaults::RAM_BASE
    }

    fn default_ram_size() -> u64 {
        defaults::RAM_SIZE
    }

    fn default_rom_latency() -> u64 {
        defaults::ROM_LATENCY
    }

    fn default_ram_latency() -> u64 {
        defaults::RAM_LATENCY
    }

    fn default_mmio_latency() -> u64 {
        defaults::MMIO_LATENCY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            rom_base: defaults::ROM_BASE,
            rom_size: defaults::ROM_SIZE,
            ram_base: defaults::RAM_BASE,
            ram_size: defaults::RAM_SIZE,
            rom_latency: defaults::ROM_LATENCY,
            ram_latency: defaults::RAM_LATENCY,
            mmio_latency: defaults::MMIO_LATENCY,
        }
    }
}

/// Cache replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReplacementPolicy {
    /// Evict the least recently used way.
    #[default]
    #[serde(alias = "LRU")]
    Lru,
    /// Evict ways in installation order.
    #[serde(alias = "FIFO")]
    Fifo,
    /// Pseudo-LRU with one MRU bit per way.
    #[serde(alias = "PLRU")]
    Plru,
}

/// Data cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// When disabled, loads and stores go to the memory controller uncached.
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Total capacity in bytes.
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,
    /// Line size in bytes.
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,
    /// Associativity; 1 is direct-mapped.
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,
    /// Victim selection policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    /// Number of sets implied by the geometry.
    pub const fn num_sets(&self) -> usize {
        if self.line_bytes == 0 || self.ways == 0 {
            0
        } else {
            self.size_bytes / (self.line_bytes * self.ways)
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_bytes: defaults::CACHE_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::CACHE_WAYS,
            policy: ReplacementPolicy::Lru,
        }
    }
}

/// Core-local interruptor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClintConfig {
    /// Map the CLINT into the address space.
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// MMIO base address.
    #[serde(default = "ClintConfig::default_base")]
    pub base: u64,
    /// `mtime` advances once every `divider` cycles.
    #[serde(default = "ClintConfig::default_divider")]
    pub divider: u64,
}

impl ClintConfig {
    /// Size of the CLINT register window.
    pub const REGION_SIZE: u64 = 0x1_0000;

    fn default_base() -> u64 {
        defaults::CLINT_BASE
    }

    fn default_divider() -> u64 {
        defaults::CLINT_DIVIDER
    }
}

impl Default for ClintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base: defaults::CLINT_BASE,
            divider: defaults::CLINT_DIVIDER,
        }
    }
}
