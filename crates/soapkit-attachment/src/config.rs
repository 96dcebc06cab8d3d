//! Attachment content configuration.

use std::rc::Rc;

use crate::convert::ConverterRegistry;

/// Default line width for Base64 output.
pub const DEFAULT_BASE64_LINE_LENGTH: usize = 76;

/// Default initial buffer size when materializing streams.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Settings shared by the content accessors of an attachment.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Line width of Base64 output; `None` emits a single line.
    pub base64_line_length: Option<usize>,
    /// Initial buffer capacity when reading a stream into memory.
    pub read_buffer_size: usize,
    /// Converters used to produce typed content.
    pub converters: Rc<ConverterRegistry>,
}

impl ContentConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base64_line_length: Some(DEFAULT_BASE64_LINE_LENGTH),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            converters: Rc::new(ConverterRegistry::default()),
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ContentConfigBuilder {
        ContentConfigBuilder::new()
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ContentConfig`].
#[derive(Debug, Clone)]
pub struct ContentConfigBuilder {
    config: ContentConfig,
}

impl ContentConfigBuilder {
    /// Creates a builder starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ContentConfig::new(),
        }
    }

    /// Sets the Base64 line width.
    #[must_use]
    pub fn base64_line_length(mut self, length: usize) -> Self {
        self.config.base64_line_length = Some(length);
        self
    }

    /// Emits Base64 output as one unbroken line.
    #[must_use]
    pub fn unwrapped_base64(mut self) -> Self {
        self.config.base64_line_length = None;
        self
    }

    /// Sets the initial read buffer size.
    #[must_use]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Sets the converter registry.
    #[must_use]
    pub fn converters(mut self, converters: ConverterRegistry) -> Self {
        self.config.converters = Rc::new(converters);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ContentConfig {
        self.config
    }
}

impl Default for ContentConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
