//! Utilities for the working directory and the final archive.
//!
//! ## Creating an Archive
//!
//! ```no_run
//! use sos_collector::utils::archive::{ArchiveBuilder, WorkDir};
//! use std::path::Path;
//!
//! # fn example() -> sos_collector::error::Result<()> {
//! let work_dir = WorkDir::create(None)?;
//! let builder = ArchiveBuilder::new(Some("jdoe"), Some("01234567"));
//! let archive = builder.build(work_dir.path(), Path::new("/var/tmp"), None)?;
//! println!("Created archive: {}", archive.path.display());
//! work_dir.cleanup()?;
//! # Ok(())
//! # }
//! ```

/// Working directory management and tar.gz archive creation
pub mod archive;
