//! Sysfs GPIO emitter
//!
//! Drives the indicators through the Linux sysfs GPIO interface:
//! `<root>/export`, `<root>/gpio<N>/direction` and `<root>/gpio<N>/value`.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{EmitterError, SignalEmitter};
use crate::config::IndicatorConfig;
use crate::types::Channel;

/// One exported output line.
#[derive(Debug)]
struct GpioLine {
    number: u32,
    value_path: PathBuf,
}

/// Indicator emitter backed by two sysfs GPIO output lines.
#[derive(Debug)]
pub struct SysfsGpioEmitter {
    up: GpioLine,
    down: GpioLine,
    active_low: bool,
}

impl SysfsGpioEmitter {
    /// Export both lines (if needed) and configure them as outputs.
    pub fn open(config: &IndicatorConfig) -> Result<Self, EmitterError> {
        let root = Path::new(&config.sysfs_root);
        info!(
            "Opening GPIO indicators: up=gpio{} down=gpio{} active_low={}",
            config.up_gpio, config.down_gpio, config.active_low
        );
        Ok(Self {
            up: export_output(root, config.up_gpio)?,
            down: export_output(root, config.down_gpio)?,
            active_low: config.active_low,
        })
    }

    fn line(&self, channel: Channel) -> &GpioLine {
        match channel {
            Channel::Up => &self.up,
            Channel::Down => &self.down,
        }
    }
}

fn write_sysfs(path: &Path, contents: &str) -> Result<(), EmitterError> {
    std::fs::write(path, contents).map_err(|source| EmitterError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn export_output(root: &Path, number: u32) -> Result<GpioLine, EmitterError> {
    let line_dir = root.join(format!("gpio{number}"));
    if !line_dir.exists() {
        debug!("Exporting gpio{}", number);
        write_sysfs(&root.join("export"), &number.to_string())?;
    }
    write_sysfs(&line_dir.join("direction"), "out")?;
    Ok(GpioLine {
        number,
        value_path: line_dir.join("value"),
    })
}

impl SignalEmitter for SysfsGpioEmitter {
    fn set_indicator(&mut self, channel: Channel, on: bool) -> Result<(), EmitterError> {
        let line = self.line(channel);
        let high = on != self.active_low;
        debug!("gpio{} <- {}", line.number, u8::from(high));
        write_sysfs(&line.value_path, if high { "1" } else { "0" })
    }

    fn emitter_name(&self) -> &str {
        "sysfs-gpio"
    }
}
