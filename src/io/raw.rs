//! Read / write float arrays as raw little-endian binary. This is the format
//! in which scalar maps, tensor volumes and PMF volumes are exchanged.

use std::fs::File;
use std::io::{Write, Read, BufWriter, BufReader};

pub fn write(data: impl Iterator<Item = f32>, path: &std::path::Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(&datum.to_le_bytes())?;
    }
    buf.flush()
}

type IORes<T> = std::io::Result<T>;
pub fn read<'a>(path: &std::path::Path) -> IORes<impl Iterator<Item = IORes<f32>> + 'a> {
    let file = File::open(path)?;
    let mut buf = BufReader::new(file);
    let mut buffer = [0; 4];

    Ok(std::iter::from_fn(move || {
        use std::io::ErrorKind::{Interrupted, UnexpectedEof};
        let mut filled = 0;
        while filled < buffer.len() {
            match buf.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == Interrupted => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        match filled {
            0 => None,
            4 => Some(Ok(f32::from_le_bytes(buffer))),
            n => Some(Err(std::io::Error::new(UnexpectedEof, format!("file ends {n} bytes into a float")))),
        }
    }))
}

/// Read a whole file of floats into memory
pub fn read_all(path: &std::path::Path) -> IORes<Vec<f32>> {
    read(path)?.collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raw_io_roundtrip() -> std::io::Result<()> {
        use tempfile::tempdir;
        #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

        // Harmless temporary location for output file
        let dir = tempdir()?;
        let file_path = dir.path().join("fa.raw");

        let original_data = vec![0.12, 0.45, 0.78, 0.0, -0.25];

        write(original_data.iter().copied(), &file_path)?;
        let reloaded_data = read_all(&file_path)?;

        // Check that roundtrip didn't corrupt the data
        assert_eq!(original_data, reloaded_data);
        Ok(())
    }

    #[test]
    fn truncated_float_is_an_error() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let file_path = dir.path().join("short.raw");
        write([1.0, 2.0, 3.0].into_iter(), &file_path)?;
        let mut file = std::fs::OpenOptions::new().append(true).open(&file_path)?;
        file.write_all(&[0, 0])?;
        drop(file);
        assert!(read_all(&file_path).is_err());
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(&dir.path().join("not-there.raw")).is_err());
    }
}
