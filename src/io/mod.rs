/// Device I/O: source resolution, scanning and archive output

/// Archive bundle writer
pub mod archive;
/// Multi-pass track scanner
pub mod scanner;
/// Source device resolution
pub mod source;

pub use archive::{base_name, fingerprint, sanitize_comment, ArchiveBuilder, ArchiveBundle};
pub use scanner::{ScanOutcome, Scanner};
pub use source::{
    platform_resolver, DeviceCandidate, LinuxResolver, SourceResolver, UnixResolver,
    WindowsResolver, AUTO_SOURCE,
};

use std::io::{self, Read, Seek, SeekFrom};

/// Seek to `offset` and fill `buffer` with as much as the source returns
///
/// Stops early at end of data; the returned count may be shorter than the
/// buffer. Interrupted reads are retried.
pub fn read_at<S: Read + Seek>(source: &mut S, offset: u64, buffer: &mut [u8]) -> io::Result<usize> {
    source.seek(SeekFrom::Start(offset))?;
    let mut filled = 0;
    while filled < buffer.len() {
        match source.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
