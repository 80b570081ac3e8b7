//! px2vw - convert pixel lengths in stylesheets into viewport units.
//!
//! This library provides the core functionality for px2vw, including:
//! - Configuration file parsing and discovery
//! - File, selector, property and media-query filtering
//! - Pixel value conversion with fixed precision and per-property overrides
//! - A stylesheet tree with a parser and serializer
//!
//! # Example
//!
//! ```
//! use px2vw::config::Options;
//! use px2vw::convert::Converter;
//! use std::path::Path;
//!
//! let converter = Converter::new(&Options::default()).unwrap();
//! let (css, report) = converter
//!     .process_source(".a { width: 16px }", Some(Path::new("src/a.css")))
//!     .unwrap();
//!
//! assert_eq!(css, ".a {\n  width: 5vw;\n}\n");
//! assert_eq!(report.converted, 1);
//! ```

pub mod config;
pub mod convert;
pub mod css;
pub mod error;

pub use error::{Px2VwError, Result, TransformError};
