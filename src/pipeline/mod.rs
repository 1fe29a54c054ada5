//! Pipeline stages for a ratings export.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! paginate ──▶ extract ──▶ layout ──▶ document
//! (listing)    (Record)    (+assets)   (PDF)
//! ```
//!
//! 1. [`paginate`]: fetch `p=1, 2, …` until a page is empty or not 2xx
//! 2. [`extract`]: read the eight fields of each entry, with defaults
//! 3. [`assets`]: fetch and normalise poster/flag images; failures stay
//!    local to the image
//! 4. [`layout`]: build the fixed visual block for one record
//! 5. [`document`]: collect blocks plus separators and write the PDF once
//!
//! [`http`] holds the client shared by the network-facing stages.

pub mod assets;
pub mod document;
pub mod extract;
pub mod http;
pub mod layout;
pub mod paginate;
