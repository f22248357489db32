//! Window layout ("gump") decoding.
//!
//! A layout message carries a text grammar of `{ command args... }` groups
//! and a list of UTF-16 text lines referenced by index. The compressed form
//! wraps each part in a length-prefixed zlib block. [`LayoutDecoder`] turns
//! either form into a [`LayoutTree`] of widget descriptions; drawing them is
//! left to the consumer.

pub mod compressed;
pub mod config;
pub mod error;
pub mod layout;
pub mod tokenizer;
pub mod widget;

pub use compressed::{inflate_into, parse_lines};
pub use config::{LayoutConfig, DEFAULT_MAX_DECOMPRESSED_LEN, DEFAULT_MAX_LINES};
pub use error::{GumpError, Result};
pub use layout::{LayoutDecoder, LayoutFlags, LayoutHeader, LayoutTree, PlacedWidget};
pub use tokenizer::{Tokenizer, TERMINATOR};
pub use widget::{HtmlText, Tooltip, Widget, DEFAULT_COLOR, DEFAULT_COLOR_SENTINEL};
