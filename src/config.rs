//! Table geometry and resize policy configuration.

use thiserror::Error;

/// Smallest bucket count a table is ever created with.
pub const INIT_SIZE: usize = 64;
/// Each resize multiplies or divides the bucket count by `1 << RESIZE_BITS`.
pub const RESIZE_BITS: u32 = 2;
/// Load, in percent of the bucket count, at which the table grows.
pub const RESIZE_THRESHOLD: u32 = 80;

const MAX_RESIZE_BITS: u32 = 8;

/// Which comparison fires growth on insertion.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ResizeTrigger {
    /// Grow once the live count exceeds `grow_mark`.
    #[default]
    OverGrowMark,
    /// Grow on insertion when the live count is *below* `shrink_mark`.
    ///
    /// This reproduces the historical inverted check, but only for tables
    /// built without a size hint. `shrink_mark` is zero at or below the
    /// initial size, so such a table never grows by insertion alone. A
    /// hinted table keeps its hinted size as the shrink floor here, whereas
    /// the historical floor was always `INIT_SIZE`; its geometry differs.
    Legacy,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("resize bits must be at least 1")]
    ZeroResizeBits,
    #[error("resize bits {0} exceeds the maximum of 8")]
    ResizeBitsTooLarge(u32),
    #[error("load threshold {0}% is outside 1..=100")]
    LoadFactorOutOfRange(u32),
    #[error("size hint {0} does not fit an addressable bucket array")]
    SizeHintOverflow(usize),
}

/// Validated table configuration. Obtain one through [`TableConfig::builder`]
/// or `Default`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableConfig {
    size_hint: usize,
    resize_bits: u32,
    load_percent: u32,
    resize_trigger: ResizeTrigger,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            size_hint: 0,
            resize_bits: RESIZE_BITS,
            load_percent: RESIZE_THRESHOLD,
            resize_trigger: ResizeTrigger::default(),
        }
    }
}

impl TableConfig {
    pub fn builder() -> TableConfigBuilder {
        TableConfigBuilder {
            config: TableConfig::default(),
        }
    }

    /// Default policy with the given size hint. A hint too large to address
    /// is saturated; allocating for it then aborts like any other
    /// allocation failure.
    pub fn with_size_hint(size_hint: usize) -> Self {
        Self {
            size_hint,
            ..Self::default()
        }
    }

    pub fn size_hint(&self) -> usize {
        self.size_hint
    }
    pub fn resize_bits(&self) -> u32 {
        self.resize_bits
    }
    pub fn load_percent(&self) -> u32 {
        self.load_percent
    }
    pub fn resize_trigger(&self) -> ResizeTrigger {
        self.resize_trigger
    }

    /// Bucket count a fresh table starts with: the smallest
    /// `INIT_SIZE << (k * resize_bits)` at which the hint is at most
    /// `load_percent` full.
    pub fn initial_size(&self) -> usize {
        initial_size_for(self.size_hint, self.resize_bits, self.load_percent).unwrap_or_else(|| {
            let mut size = INIT_SIZE;
            while let Some(next) = size.checked_mul(1usize << self.resize_bits) {
                size = next;
            }
            size
        })
    }

    pub(crate) fn grow_mark(&self, size: usize) -> usize {
        // Saturate rather than wrap for bucket counts near usize::MAX.
        (size / 100).saturating_mul(self.load_percent as usize)
            + (size % 100) * self.load_percent as usize / 100
    }

    /// Zero at or below `floor`, which disables shrinking there.
    pub(crate) fn shrink_mark(&self, size: usize, floor: usize) -> usize {
        if size <= floor {
            0
        } else {
            self.grow_mark(size) / ((1usize << self.resize_bits) + 1)
        }
    }
}

fn initial_size_for(hint: usize, bits: u32, load_percent: u32) -> Option<usize> {
    let wanted = hint.checked_mul(100)? / load_percent as usize;
    let mut size = INIT_SIZE;
    while wanted > size {
        size = size.checked_mul(1usize << bits)?;
    }
    Some(size)
}

pub struct TableConfigBuilder {
    config: TableConfig,
}

impl TableConfigBuilder {
    /// Number of entries the table should hold without growing.
    pub fn size_hint(mut self, hint: usize) -> Self {
        self.config.size_hint = hint;
        self
    }

    pub fn resize_bits(mut self, bits: u32) -> Self {
        self.config.resize_bits = bits;
        self
    }

    pub fn load_percent(mut self, percent: u32) -> Self {
        self.config.load_percent = percent;
        self
    }

    pub fn resize_trigger(mut self, trigger: ResizeTrigger) -> Self {
        self.config.resize_trigger = trigger;
        self
    }

    pub fn build(self) -> Result<TableConfig, ConfigError> {
        let c = self.config;
        if c.resize_bits == 0 {
            return Err(ConfigError::ZeroResizeBits);
        }
        if c.resize_bits > MAX_RESIZE_BITS {
            return Err(ConfigError::ResizeBitsTooLarge(c.resize_bits));
        }
        if c.load_percent == 0 || c.load_percent > 100 {
            return Err(ConfigError::LoadFactorOutOfRange(c.load_percent));
        }
        initial_size_for(c.size_hint, c.resize_bits, c.load_percent)
            .ok_or(ConfigError::SizeHintOverflow(c.size_hint))?;
        Ok(c)
    }
}
