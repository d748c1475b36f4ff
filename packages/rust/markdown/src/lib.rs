//! Markdown line processing for the wiki index.
//!
//! Turns one downloaded page into searchable lines:
//! - [`annotate_lines`] prefixes every content line with a backlink built from
//!   the surrounding headings
//! - [`extract_sections`] flattens the `***`-separated base64 page into one
//!   line per section, optionally decoding its encoded links

mod annotate;
mod base64_page;

pub use annotate::{HeadingContext, HeadingGrammar, annotate_lines, breadcrumb_label, heading_anchor};
pub use base64_page::{decode_backtick_spans, extract_sections, restore_padding};
