use std::io::{self, Read, Write};

/// Default streaming buffer (64 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Copy `reader` into `writer` through a fixed-size buffer, returning bytes copied
pub(crate) fn pipe<R, W>(reader: &mut R, writer: &mut W, buffer_size: usize) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut copied = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..read])?;
        copied += read as u64;
    }

    writer.flush()?;
    Ok(copied)
}
