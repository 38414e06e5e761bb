//! One sub-module per check family (spec.md §4.E–§4.L, §4.K, §4.P),
//! invoked in sequence by [`orchestrator`](crate::orchestrator).
//!
//! Each function here takes whatever slice of the parsed model it needs
//! plus `&mut Report`, and appends findings directly — there is no
//! intermediate per-checker result type, matching spec.md §9's
//! "Reporting resource discipline" (the report is the only mutable shared
//! resource; a checker acquires the borrow long enough to append).

pub mod accessibility;
pub mod content;
pub mod content_model;
pub mod css;
pub mod encoding;
pub mod fixed_layout;
pub mod nav;
pub mod ocf;
pub mod opf;
pub mod pkg;
pub mod xref;
