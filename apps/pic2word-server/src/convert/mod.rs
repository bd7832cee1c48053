//! Conversion Module
//!
//! Turns LaTeX source into a Word document with an external converter.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pic2word_server::convert::{DocumentConverter, PandocConverter};
//!
//! let converter = PandocConverter::new(&config.converter, temp_store);
//! if converter.is_available().await {
//!     let document = converter.latex_to_docx(&latex).await?;
//!     let bytes = document.read().await?;
//!     document.remove().await?;
//! }
//! ```

mod converter;
mod pandoc;
mod types;

pub use converter::DocumentConverter;
pub use pandoc::PandocConverter;
pub use types::{combined_output, ConversionError, OutputFormat};
