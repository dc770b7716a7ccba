//! # digitar
//!
//! Packs a directory tree into a single text artifact and restores the files
//! byte-for-byte from it.
//!
//! ## Format
//!
//! Every file becomes one record: a header line holding its relative path,
//! followed by its contents written as binary digits, eight per byte, most
//! significant bit first, and a blank line:
//!
//! ```text
//! --- a.txt ---
//! 0100100001101001
//!
//! --- dir/x.bin ---
//! 00000001
//!
//! ```
//!
//! Paths use `/` as separator. The stream has no header, footer, count or
//! checksum; it ends where the input ends. Text before the first record is
//! ignored.
//!
//! ## Failure policy
//!
//! A bad record (broken framing, invalid digits, a path leaving the
//! destination root) is skipped and reported while the rest of the archive is
//! processed. Only failures of the stream itself are fatal.
//!
//! ## Compression
//!
//! Whole streams may be gzip compressed. The decoder detects gzip input by its
//! magic bytes.
//!
//! ```
//! use digitar::{Archive, Decoder, Encoder, Entry};
//!
//! let mut archive = Archive::new();
//! archive.add_entry(Entry::new("a.txt", "Hi")).unwrap();
//!
//! let text = Encoder::new().encode(&archive);
//! assert_eq!(text, "--- a.txt ---\n0100100001101001\n\n");
//!
//! let (decoded, skipped) = Decoder::new().decode(&text).unwrap();
//! assert!(skipped.is_empty());
//! assert_eq!(decoded.entries(), archive.entries());
//! ```

pub mod archive;
pub mod codec;
pub mod compression;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod report;
pub mod walk;

pub use archive::{normalize_path, Archive, Entry};
pub use compression::Compression;
pub use decoder::{Decoder, Records};
pub use encoder::Encoder;
pub use error::{EntryError, Error, Result};
pub use report::{ArchiveReport, ExtractReport};
pub use walk::WalkConfig;
