//! Disk-backed result streams.
//!
//! Query results and transfer outcomes can be arbitrarily large, so they are spooled to
//! a temporary JSON-lines file instead of being collected in memory.
//!
//! - [`ResultWriter`] - concurrent append, lazily creates the backing file
//! - [`ResultReader`] - single consumer, decodes one record per call
//!
//! ```
//! use depot_stream::ResultWriter;
//!
//! let writer = ResultWriter::new();
//! writer.write(&"a".to_string()).unwrap();
//! writer.write(&"b".to_string()).unwrap();
//!
//! let mut reader = writer.finish().unwrap();
//! assert_eq!(reader.len().unwrap(), 2);
//! assert_eq!(reader.next_record().as_deref(), Some("a"));
//! reader.close().unwrap();
//! ```

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::ResultReader;
pub use writer::ResultWriter;
