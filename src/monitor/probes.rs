//! Runtime introspection probes
//!
//! Memory and battery readings are optional capabilities. Each probe reports
//! either a reading or an explicit `Unsupported`, never an error.

use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Result of asking a probe for a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    Available(T),
    Unsupported,
}

impl<T> Reading<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Reading::Available(_))
    }

    pub fn available(self) -> Option<T> {
        match self {
            Reading::Available(value) => Some(value),
            Reading::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySample {
    pub used_mb: f64,
    pub limit_mb: f64,
}

impl MemorySample {
    pub fn usage_percent(&self) -> f64 {
        if self.limit_mb <= 0.0 {
            return 0.0;
        }
        (self.used_mb / self.limit_mb * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySample {
    /// Charge level in [0, 1]
    pub level: f64,
    pub charging: bool,
}

pub trait MemoryProbe: Send + Sync {
    fn read(&self) -> Reading<MemorySample>;
}

pub trait BatteryProbe: Send + Sync {
    fn read(&self) -> Reading<BatterySample>;
}

/// Probe for platforms without the capability
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl MemoryProbe for Unsupported {
    fn read(&self) -> Reading<MemorySample> {
        Reading::Unsupported
    }
}

impl BatteryProbe for Unsupported {
    fn read(&self) -> Reading<BatterySample> {
        Reading::Unsupported
    }
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Process resident memory against total system memory, via sysinfo
pub struct SysinfoMemoryProbe {
    system: Mutex<System>,
    pid: Pid,
}

impl SysinfoMemoryProbe {
    pub fn new() -> Self {
        Self {
            // Creating a System is expensive, keep one around
            system: Mutex::new(System::new()),
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoMemoryProbe {
    fn read(&self) -> Reading<MemorySample> {
        let mut sys = self.system.lock();
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Reading::Unsupported;
        }

        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            ProcessRefreshKind::new().with_memory(),
        );

        match sys.process(self.pid) {
            Some(process) => Reading::Available(MemorySample {
                used_mb: process.memory() as f64 / BYTES_PER_MB,
                limit_mb: total as f64 / BYTES_PER_MB,
            }),
            None => Reading::Unsupported,
        }
    }
}

/// Battery state from Linux `/sys/class/power_supply`
pub struct SysfsBatteryProbe {
    root: PathBuf,
}

impl SysfsBatteryProbe {
    pub fn new() -> Self {
        Self::with_root("/sys/class/power_supply")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn find_battery(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.root).ok()?;
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| is_battery(path))
    }
}

impl Default for SysfsBatteryProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn is_battery(path: &Path) -> bool {
    fs::read_to_string(path.join("type"))
        .map(|kind| kind.trim().eq_ignore_ascii_case("battery"))
        .unwrap_or(false)
}

impl BatteryProbe for SysfsBatteryProbe {
    fn read(&self) -> Reading<BatterySample> {
        let Some(battery) = self.find_battery() else {
            return Reading::Unsupported;
        };

        let capacity = fs::read_to_string(battery.join("capacity"))
            .ok()
            .and_then(|raw| raw.trim().parse::<f64>().ok());
        let Some(capacity) = capacity else {
            return Reading::Unsupported;
        };

        let status = fs::read_to_string(battery.join("status")).unwrap_or_default();
        let charging = matches!(status.trim(), "Charging" | "Full");

        Reading::Available(BatterySample {
            level: (capacity / 100.0).clamp(0.0, 1.0),
            charging,
        })
    }
}
