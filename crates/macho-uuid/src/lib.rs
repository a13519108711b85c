//! # macho-uuid
//!
//! Finds the Mach-O images inside `.app`, `.dSYM`, `.framework`, `.bundle`
//! and `.xcarchive` bundles, fat binaries and plain executables, and reduces
//! them to one image per build UUID so crashes can be matched to their debug
//! symbols.
//!
//! ```no_run
//! let members = macho_uuid::resolve_macho_files("Build.xcarchive")?;
//! for member in &members {
//!     println!("{} {}", member.uuid_hex()?, member.cpu_type()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod locate;
pub mod resolve;

pub use error::Error;
pub use locate::{list_all_files, locate_symbol_files, SYMBOL_FILE_EXTENSIONS};
pub use resolve::{resolve_macho_files, Resolution, ResolutionSet};

pub use macho_uuid_formats::{CpuType, FatArchive, MachoMember, ParseError};
