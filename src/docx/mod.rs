//! DOCX container and WordprocessingML layer
//!
//! [`package`] reads and writes the zip container, [`part`] slices each
//! XML part into an addressable element arena, and [`text`] carries the
//! shared text-projection and `w:t` editing machinery.

pub mod package;
pub mod part;
pub mod text;

pub use package::{DocxPackage, CORE_PROPERTIES, MAIN_DOCUMENT};
pub use part::{DocPart, DocumentModel, PartKind, Segment, SlotKind};
