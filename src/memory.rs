//! # Memory Bus
//!
//! The [`MemoryBus`] trait decouples the CPU from the memory it runs against.
//! [`Memory`] is the full implementation used by the emulator:
//!
//! - a flat 64 KiB address space
//! - a per-address lock bitmap, so ROM images cannot be overwritten
//! - [`BusObserver`] notifications on every read, write and rejected write
//! - RAM and ROM image loading from files or byte slices
//!
//! Write protection and address-mapped I/O interception happen here and
//! nowhere else.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::events::BusObserver;

/// Size of the 6502 address space.
pub const MEMORY_SIZE: usize = 0x10000;

/// Memory access capability used by the CPU.
///
/// Reads take `&mut self` because a read may have side effects: notifications,
/// or an I/O location that changes once consumed.
///
/// # Implementing Custom Memory
///
/// ```
/// use sim6502::MemoryBus;
///
/// struct RomRamMemory {
///     ram: [u8; 0x8000],
///     rom: [u8; 0x8000],
/// }
///
/// impl MemoryBus for RomRamMemory {
///     fn read(&mut self, addr: u16) -> u8 {
///         if addr < 0x8000 {
///             self.ram[addr as usize]
///         } else {
///             self.rom[(addr - 0x8000) as usize]
///         }
///     }
///
///     fn write(&mut self, addr: u16, value: u8) {
///         if addr < 0x8000 {
///             self.ram[addr as usize] = value;
///         }
///         // Writes to ROM are ignored
///     }
/// }
/// ```
pub trait MemoryBus {
    /// Reads a byte. Must never panic.
    fn read(&mut self, addr: u16) -> u8;

    /// Writes a byte. Read-only locations may ignore the write.
    fn write(&mut self, addr: u16, value: u8);

    /// Returns the bus to its power-on state. Called by
    /// [`CPU::initialise`](crate::CPU::initialise).
    fn initialise(&mut self) {}
}

/// Errors raised while loading memory images.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The image does not fit between its load offset and the end of memory.
    #[error("image of {length} bytes does not fit at ${offset:04X} ({available} bytes available)")]
    ImageTooLarge {
        length: usize,
        offset: u16,
        available: usize,
    },

    #[error("failed to read image {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Backing store: the bytes and their lock bits.
struct Cells {
    bytes: Box<[u8]>,
    locked: Box<[bool]>,
}

impl Cells {
    fn new() -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE].into_boxed_slice(),
            locked: vec![false; MEMORY_SIZE].into_boxed_slice(),
        }
    }
}

/// Direct access to memory handed to [`BusObserver::reading_byte`].
///
/// Writes through this handle honour the lock bitmap but raise no further
/// notifications.
pub struct BusAccess<'a> {
    cells: &'a mut Cells,
}

impl BusAccess<'_> {
    pub fn get(&self, address: u16) -> u8 {
        self.cells.bytes[address as usize]
    }

    /// Stores `value` unless the address is locked. Returns whether it was stored.
    pub fn set(&mut self, address: u16, value: u8) -> bool {
        if self.cells.locked[address as usize] {
            return false;
        }
        self.cells.bytes[address as usize] = value;
        true
    }

    pub fn is_locked(&self, address: u16) -> bool {
        self.cells.locked[address as usize]
    }
}

/// 64 KiB of lockable, observable memory.
///
/// # Examples
///
/// ```
/// use sim6502::{Memory, MemoryBus};
///
/// let mut memory = Memory::new();
/// memory.load_rom_bytes(&[0xA9, 0x2A], 0xF000).unwrap();
///
/// memory.write(0xF000, 0xEA); // rejected: ROM is locked
/// assert_eq!(memory.read(0xF000), 0xA9);
///
/// memory.write(0x0200, 0x42);
/// assert_eq!(memory.read(0x0200), 0x42);
/// ```
pub struct Memory {
    cells: Cells,
    observers: Vec<Box<dyn BusObserver>>,
}

impl Memory {
    /// Creates zeroed, unlocked memory with no observers.
    pub fn new() -> Self {
        Self {
            cells: Cells::new(),
            observers: Vec::new(),
        }
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn add_observer(&mut self, observer: Box<dyn BusObserver>) {
        self.observers.push(observer);
    }

    /// Reads a byte and notifies observers.
    pub fn get_byte(&mut self, address: u16) -> u8 {
        let value = self.cells.bytes[address as usize];
        let mut access = BusAccess {
            cells: &mut self.cells,
        };
        for observer in &mut self.observers {
            observer.reading_byte(&mut access, address, value);
        }
        value
    }

    /// Stores a byte, or rejects it if the address is locked. Exactly one
    /// notification is raised either way.
    pub fn set_byte(&mut self, address: u16, value: u8) {
        if self.cells.locked[address as usize] {
            for observer in &mut self.observers {
                observer.invalid_write_attempt(address, value);
            }
        } else {
            self.cells.bytes[address as usize] = value;
            for observer in &mut self.observers {
                observer.writing_byte(address, value);
            }
        }
    }

    /// Reads without notifying anyone. For inspection by tools and tests.
    pub fn peek(&self, address: u16) -> u8 {
        self.cells.bytes[address as usize]
    }

    /// Stores without notifying and regardless of locks.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.cells.bytes[address as usize] = value;
    }

    pub fn is_locked(&self, address: u16) -> bool {
        self.cells.locked[address as usize]
    }

    /// Write-protects `length` bytes starting at `offset`, clamped to the end of memory.
    pub fn lock_memory(&mut self, offset: u16, length: usize) {
        let start = offset as usize;
        let end = (start + length).min(MEMORY_SIZE);
        self.cells.locked[start..end].fill(true);
    }

    /// Zeroes every byte.
    pub fn clear_memory(&mut self) {
        self.cells.bytes.fill(0);
    }

    /// Unlocks every byte.
    pub fn clear_locking(&mut self) {
        self.cells.locked.fill(false);
    }

    /// Copies `image` into memory at `offset` and returns its length.
    ///
    /// Locked bytes inside the range are overwritten; loading is not a bus write.
    pub fn load_bytes(&mut self, image: &[u8], offset: u16) -> Result<usize, MemoryError> {
        let start = offset as usize;
        let available = MEMORY_SIZE - start;
        if image.len() > available {
            return Err(MemoryError::ImageTooLarge {
                length: image.len(),
                offset,
                available,
            });
        }
        self.cells.bytes[start..start + image.len()].copy_from_slice(image);
        Ok(image.len())
    }

    /// Loads `image` at `offset` and locks the range it occupies.
    pub fn load_rom_bytes(&mut self, image: &[u8], offset: u16) -> Result<usize, MemoryError> {
        let length = self.load_bytes(image, offset)?;
        self.lock_memory(offset, length);
        Ok(length)
    }

    /// Loads a writable image from a file.
    pub fn load_ram(&mut self, path: impl AsRef<Path>, offset: u16) -> Result<usize, MemoryError> {
        let path = path.as_ref();
        let image = read_image(path)?;
        let length = self.load_bytes(&image, offset)?;
        debug!("loaded RAM image {} ({length} bytes) at ${offset:04X}", path.display());
        Ok(length)
    }

    /// Loads a write-protected image from a file.
    pub fn load_rom(&mut self, path: impl AsRef<Path>, offset: u16) -> Result<usize, MemoryError> {
        let path = path.as_ref();
        let image = read_image(path)?;
        let length = self.load_rom_bytes(&image, offset)?;
        debug!("loaded ROM image {} ({length} bytes) at ${offset:04X}, locked", path.display());
        Ok(length)
    }
}

fn read_image(path: &Path) -> Result<Vec<u8>, MemoryError> {
    fs::read(path).map_err(|source| MemoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("locked", &self.cells.locked.iter().filter(|&&l| l).count())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl MemoryBus for Memory {
    fn read(&mut self, addr: u16) -> u8 {
        self.get_byte(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.set_byte(addr, value);
    }

    fn initialise(&mut self) {
        self.clear_memory();
        self.clear_locking();
    }
}
