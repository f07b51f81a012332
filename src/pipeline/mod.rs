//! Pipeline stages for one render pass.
//!
//! Each submodule implements exactly one transformation step, and all but
//! the last are pure functions.
//!
//! ## Data Flow
//!
//! ```text
//! split ──▶ url ──▶ markup ──▶ probe
//! (text)   (links)  (nodes)    (HTTP)
//! ```
//!
//! 1. [`split`]:  detect SMILES lines vs. CTAB blocks and produce records
//! 2. [`url`]:    build depiction URLs from options and payload
//! 3. [`markup`]: lay a record out as a typed fragment
//! 4. [`probe`]:  load each image once; recover the error text on failure.
//!    The only stage with network I/O

pub mod markup;
pub mod probe;
pub mod split;
pub mod url;
