//! Codec configuration.

/// Width of the version field used by the consent-string layouts.
pub const DEFAULT_VERSION_BITS: usize = 6;

/// How data problems are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Mode {
    /// Compatible with existing tokens: short input decodes to zeros, values
    /// too wide for their field are truncated, and the text decoder accepts
    /// either base64 alphabet with or without padding.
    #[default]
    Lenient,
    /// Report truncated input, malformed text and out-of-range values as errors.
    Strict,
}

/// Configuration shared by every call on a [`crate::versions::Codec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    /// Width of the version field at offset 0, agreed across all versions.
    pub version_bits: usize,
    pub mode: Mode,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            version_bits: DEFAULT_VERSION_BITS,
            mode: Mode::Lenient,
        }
    }
}

impl CodecConfig {
    pub fn strict() -> Self {
        Self {
            mode: Mode::Strict,
            ..Default::default()
        }
    }

    pub fn set_version_bits(&mut self, version_bits: usize) -> &mut Self {
        self.version_bits = version_bits;
        self
    }

    pub fn set_mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = mode;
        self
    }
}
