//! Memory Controller.
//!
//! Arbitrates every access that leaves the core. It provides:
//! 1. **Routing:** Address ranges select ROM, RAM, the CLINT, or an attached device.
//!    An address no region claims is a `MemFault::Unmapped`.
//! 2. **Serialization:** Exactly one transaction (line fill, line write-back, or uncached
//!    read/write) is in flight system-wide. Issuing a second one fails with `Busy`.
//! 3. **Latency:** A transaction completes after the latency of its target store
//!    (`rom_latency`, `ram_latency`, or `mmio_latency` cycles). Its effect is applied when
//!    it completes.
//! 4. **Combinational Ports:** Instruction fetch and the loader backdoor read and write
//!    ROM/RAM directly without occupying the transaction slot.

use tracing::debug;

use crate::common::{AccessType, MemFault, Width};
use crate::config::{Config, ConfigError};
use crate::soc::devices::Clint;
use crate::soc::memory::Memory;
use crate::soc::traits::Device;

/// Component an address routes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Boot/instruction ROM.
    Rom,
    /// Data RAM.
    Ram,
    /// Core-local interruptor.
    Clint,
    /// Attached device, by attachment index.
    Device(usize),
}

impl Target {
    /// Returns `true` for the backing stores the cache may hold lines of.
    pub const fn is_cacheable(self) -> bool {
        matches!(self, Self::Rom | Self::Ram)
    }
}

/// A transaction issued to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Read a whole cache line.
    Fill {
        /// Line-aligned address.
        addr: u64,
        /// Line size in bytes.
        len: usize,
    },
    /// Write a dirty cache line back.
    WriteBack {
        /// Line-aligned address.
        addr: u64,
        /// Line contents.
        data: Vec<u8>,
    },
    /// Uncached single-width read.
    Read {
        /// Address.
        addr: u64,
        /// Transfer width.
        width: Width,
    },
    /// Uncached single-width write.
    Write {
        /// Address.
        addr: u64,
        /// Transfer width.
        width: Width,
        /// Data (low `width` bytes).
        value: u64,
    },
}

impl Request {
    /// Target address of the transaction.
    pub const fn addr(&self) -> u64 {
        match self {
            Self::Fill { addr, .. }
            | Self::WriteBack { addr, .. }
            | Self::Read { addr, .. }
            | Self::Write { addr, .. } => *addr,
        }
    }

    fn len(&self) -> u64 {
        match self {
            Self::Fill { len, .. } => *len as u64,
            Self::WriteBack { data, .. } => data.len() as u64,
            Self::Read { width, .. } | Self::Write { width, .. } => width.bytes(),
        }
    }
}

/// Payload of a successful transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Line contents for a fill.
    Line(Vec<u8>),
    /// Zero-extended data for an uncached read.
    Data(u64),
    /// Acknowledgment of a write-back or uncached write.
    Ack,
}

/// A finished transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// The request as issued.
    pub request: Request,
    /// Its outcome.
    pub result: Result<Response, MemFault>,
}

#[derive(Clone, Debug)]
struct InFlight {
    request: Request,
    remaining: u64,
}

/// The memory controller and everything behind it.
#[derive(Debug)]
pub struct MemoryController {
    rom: Memory,
    ram: Memory,
    clint: Option<Clint>,
    devices: Vec<Box<dyn Device>>,
    rom_latency: u64,
    ram_latency: u64,
    mmio_latency: u64,
    in_flight: Option<InFlight>,
    transactions: u64,
}

impl MemoryController {
    /// Builds ROM, RAM, and (if enabled) the CLINT from the configuration.
    pub fn new(config: &Config) -> Self {
        let mem = &config.memory;
        Self {
            rom: Memory::new("ROM", mem.rom_base, mem.rom_size as usize, true),
            ram: Memory::new("RAM", mem.ram_base, mem.ram_size as usize, false),
            clint: config.clint.enabled.then(|| Clint::new(&config.clint)),
            devices: Vec::new(),
            rom_latency: mem.rom_latency.max(1),
            ram_latency: mem.ram_latency.max(1),
            mmio_latency: mem.mmio_latency.max(1),
            in_flight: None,
            transactions: 0,
        }
    }

    /// Attaches a memory-mapped device.
    ///
    /// # Returns
    ///
    /// `ConfigError::DeviceOverlap` if its range overlaps ROM, RAM, the CLINT, or another device.
    pub fn attach(&mut self, device: Box<dyn Device>) -> Result<(), ConfigError> {
        let (base, size) = device.address_range();
        let overlaps = |other: (u64, u64)| {
            u128::from(base) < u128::from(other.0) + u128::from(other.1)
                && u128::from(other.0) < u128::from(base) + u128::from(size)
        };
        let taken = overlaps(self.rom.address_range())
            || overlaps(self.ram.address_range())
            || self.clint.as_ref().is_some_and(|c| overlaps(c.address_range()))
            || self.devices.iter().any(|d| overlaps(d.address_range()));
        if taken || size == 0 {
            return Err(ConfigError::DeviceOverlap {
                name: device.name().to_owned(),
                base,
            });
        }
        debug!(device = device.name(), base = format_args!("{base:#x}"), size, "attached");
        self.devices.push(device);
        Ok(())
    }

    /// Routes `[addr, addr + len)` to the component that claims all of it.
    pub fn route(&self, addr: u64, len: u64) -> Option<Target> {
        if self.rom.contains(addr, len) {
            Some(Target::Rom)
        } else if self.ram.contains(addr, len) {
            Some(Target::Ram)
        } else if self.clint.as_ref().is_some_and(|c| c.contains(addr, len)) {
            Some(Target::Clint)
        } else {
            self.devices
                .iter()
                .position(|d| d.contains(addr, len))
                .map(Target::Device)
        }
    }

    /// Checks an access before it is issued.
    ///
    /// # Arguments
    ///
    /// * `addr` - Effective address.
    /// * `width` - Transfer width.
    /// * `kind` - Fetch, load, or store.
    ///
    /// # Returns
    ///
    /// The target on success; `Misaligned`, `Unmapped`, or `ReadOnly` (a store to ROM) otherwise.
    pub fn check(&self, addr: u64, width: Width, kind: AccessType) -> Result<Target, MemFault> {
        if !width.is_aligned(addr) {
            return Err(MemFault::Misaligned(addr));
        }
        let target = self
            .route(addr, width.bytes())
            .ok_or(MemFault::Unmapped(addr))?;
        match (target, kind) {
            (Target::Rom, AccessType::Write) => Err(MemFault::ReadOnly(addr)),
            (Target::Rom | Target::Ram, _) | (_, AccessType::Read | AccessType::Write) => {
                Ok(target)
            }
            (_, AccessType::Fetch) => Err(MemFault::Unmapped(addr)),
        }
    }

    /// Returns `true` while a transaction is in flight.
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of transactions issued since construction.
    pub const fn transactions(&self) -> u64 {
        self.transactions
    }

    /// Starts a transaction.
    ///
    /// # Returns
    ///
    /// `MemFault::Busy` if one is already in flight. Routing faults are reported by the
    /// completion, not here.
    pub fn issue(&mut self, request: Request) -> Result<(), MemFault> {
        if self.in_flight.is_some() {
            return Err(MemFault::Busy);
        }
        let remaining = match self.route(request.addr(), request.len()) {
            Some(Target::Rom) => self.rom_latency,
            Some(Target::Ram) => self.ram_latency,
            _ => self.mmio_latency,
        };
        debug!(?request, latency = remaining, "controller issue");
        self.transactions += 1;
        self.in_flight = Some(InFlight { request, remaining });
        Ok(())
    }

    /// Advances the in-flight transaction by one cycle.
    ///
    /// # Returns
    ///
    /// The completion, in the cycle its latency expires.
    pub fn tick(&mut self) -> Option<Completion> {
        let flight = self.in_flight.as_mut()?;
        flight.remaining = flight.remaining.saturating_sub(1);
        if flight.remaining > 0 {
            return None;
        }
        let request = self.in_flight.take()?.request;
        let result = self.perform(&request);
        debug!(addr = format_args!("{:#x}", request.addr()), ok = result.is_ok(), "controller complete");
        Some(Completion { request, result })
    }

    fn device_mut(&mut self, target: Target) -> Option<&mut dyn Device> {
        match target {
            Target::Rom => Some(&mut self.rom),
            Target::Ram => Some(&mut self.ram),
            Target::Clint => self.clint.as_mut().map(|c| c as &mut dyn Device),
            Target::Device(i) => self.devices.get_mut(i).map(|d| &mut **d as &mut dyn Device),
        }
    }

    fn store(&self, addr: u64, len: u64) -> Result<&Memory, MemFault> {
        match self.route(addr, len) {
            Some(Target::Rom) => Ok(&self.rom),
            Some(Target::Ram) => Ok(&self.ram),
            _ => Err(MemFault::Unmapped(addr)),
        }
    }

    fn store_mut(&mut self, addr: u64, len: u64) -> Result<&mut Memory, MemFault> {
        match self.route(addr, len) {
            Some(Target::Rom) => Ok(&mut self.rom),
            Some(Target::Ram) => Ok(&mut self.ram),
            _ => Err(MemFault::Unmapped(addr)),
        }
    }

    fn perform(&mut self, request: &Request) -> Result<Response, MemFault> {
        match request {
            Request::Fill { addr, len } => {
                let mut line = vec![0; *len];
                self.read_bytes(*addr, &mut line)?;
                Ok(Response::Line(line))
            }
            Request::WriteBack { addr, data } => {
                self.load(*addr, data)?;
                Ok(Response::Ack)
            }
            Request::Read { addr, width } => {
                let target = self.check(*addr, *width, AccessType::Read)?;
                let device = self.device_mut(target).ok_or(MemFault::Unmapped(*addr))?;
                let (base, _) = device.address_range();
                device.read(addr - base, *width).map(Response::Data)
            }
            Request::Write { addr, width, value } => {
                let target = self.check(*addr, *width, AccessType::Write)?;
                let device = self.device_mut(target).ok_or(MemFault::Unmapped(*addr))?;
                let (base, _) = device.address_range();
                device.write(addr - base, *width, *value).map(|()| Response::Ack)
            }
        }
    }

    /// Reads one instruction word combinationally from ROM or RAM.
    pub fn fetch(&self, addr: u64) -> Result<u32, MemFault> {
        let _ = self.check(addr, Width::Word, AccessType::Fetch)?;
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads ROM or RAM without timing or side effects.
    pub fn read_bytes(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemFault> {
        let store = self.store(addr, buf.len() as u64)?;
        store.read_bytes(addr - store.address_range().0, buf)
    }

    /// Writes ROM or RAM through the backdoor, ignoring write protection.
    ///
    /// # Returns
    ///
    /// `MemFault::Unmapped` if the bytes do not fit inside a single store.
    pub fn load(&mut self, addr: u64, bytes: &[u8]) -> Result<(), MemFault> {
        let store = self.store_mut(addr, bytes.len() as u64)?;
        let base = store.address_range().0;
        store.write_bytes(addr - base, bytes)
    }

    /// Ticks the CLINT and every attached device.
    ///
    /// # Returns
    ///
    /// The OR of the devices' interrupt outputs.
    pub fn tick_devices(&mut self) -> bool {
        if let Some(clint) = self.clint.as_mut() {
            let _ = clint.tick();
        }
        self.devices
            .iter_mut()
            .fold(false, |line, device| device.tick() | line)
    }

    /// The CLINT, if mapped.
    pub const fn clint(&self) -> Option<&Clint> {
        self.clint.as_ref()
    }

    /// Discards any in-flight transaction. Memory contents are kept.
    pub fn reset(&mut self) {
        self.in_flight = None;
    }
}
