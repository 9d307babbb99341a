// ABOUTME: In-memory tar helpers for moving file bytes across the container boundary
// ABOUTME: Packs a single entry for upload and extracts the first entry from a download

use std::io::Read;
use tar::{Archive, Builder, EntryType, Header};

/// Build a tar archive holding exactly one regular file
pub fn pack_single_file(
    name: &str,
    content: &[u8],
    mode: u32,
    mtime: u64,
) -> std::io::Result<Vec<u8>> {
    let mut builder = Builder::new(Vec::new());

    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(content.len() as u64);
    header.set_mode(mode);
    header.set_mtime(mtime);
    builder.append_data(&mut header, name, content)?;

    builder.into_inner()
}

/// Bytes of the first entry in `data`, or `None` for an empty archive
pub fn first_entry_bytes(data: &[u8]) -> std::io::Result<Option<Vec<u8>>> {
    let mut archive = Archive::new(data);
    let mut entries = archive.entries()?;

    match entries.next() {
        Some(entry) => {
            let mut entry = entry?;
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut content)?;
            Ok(Some(content))
        }
        None => Ok(None),
    }
}
