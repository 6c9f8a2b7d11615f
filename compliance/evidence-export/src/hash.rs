//! SHA-256 content hashing for manifest entries.

use std::io::{self, Read, Write};

use sha2::{Digest, Sha256};

const CHUNK: usize = 8192;

/// Which side of a [`copy_hashed`] failed.
#[derive(Debug)]
pub enum CopyError {
  Read(io::Error),
  Write(io::Error),
}

fn hex(hasher: Sha256) -> String {
  hasher
    .finalize()
    .iter()
    .map(|b| format!("{b:02x}"))
    .collect()
}

/// Copy `reader` into `writer`, hashing exactly the bytes written.
/// Returns the hex SHA-256 and the byte count.
pub fn copy_hashed<R: Read, W: Write>(
  mut reader: R,
  writer: &mut W,
) -> Result<(String, u64), CopyError> {
  let mut hasher = Sha256::new();
  let mut buf = [0u8; CHUNK];
  let mut len = 0u64;
  loop {
    let n = match reader.read(&mut buf) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(CopyError::Read(e)),
    };
    writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
    hasher.update(&buf[..n]);
    len += n as u64;
  }
  Ok((hex(hasher), len))
}

/// Hex SHA-256 of everything `reader` yields, plus the byte count.
pub fn sha256_reader<R: Read>(reader: R) -> io::Result<(String, u64)> {
  copy_hashed(reader, &mut io::sink()).map_err(|e| match e {
    CopyError::Read(e) | CopyError::Write(e) => e,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_digests() {
    let (empty, n) = sha256_reader(&b""[..]).unwrap();
    assert_eq!(n, 0);
    assert_eq!(
      empty,
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    let (abc, n) = sha256_reader(&b"abc"[..]).unwrap();
    assert_eq!(n, 3);
    assert_eq!(
      abc,
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn spans_multiple_chunks() {
    let data = vec![7u8; CHUNK * 2 + 5];
    let (chunked, n) = sha256_reader(&data[..]).unwrap();
    assert_eq!(n, data.len() as u64);
    let whole: String = Sha256::digest(&data)
      .iter()
      .map(|b| format!("{b:02x}"))
      .collect();
    assert_eq!(chunked, whole);
  }

  #[test]
  fn copy_hashes_what_it_writes() {
    let data = vec![3u8; CHUNK + 17];
    let mut sink = Vec::new();
    let (copied, n) = copy_hashed(&data[..], &mut sink).unwrap();
    assert_eq!(sink, data);
    assert_eq!(n, data.len() as u64);
    assert_eq!(copied, sha256_reader(&sink[..]).unwrap().0);
  }

  struct Broken;

  impl Read for Broken {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
    }
  }

  impl Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn copy_reports_failing_side() {
    assert!(matches!(
      copy_hashed(Broken, &mut Vec::new()),
      Err(CopyError::Read(_))
    ));
    assert!(matches!(
      copy_hashed(&b"abc"[..], &mut Broken),
      Err(CopyError::Write(_))
    ));
  }
}
