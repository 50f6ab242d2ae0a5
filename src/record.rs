//! Checksummed record framing (TFRecord layout).
//!
//! Each record is laid out as:
//!
//! ```text
//! u64 (LE)  length
//! u32 (LE)  masked CRC32C of length
//! [u8]      data
//! u32 (LE)  masked CRC32C of data
//! ```
use crate::{ErrorKind, Result};
use byteorder::{ByteOrder as _, LittleEndian, ReadBytesExt as _, WriteBytesExt as _};
use std::io::{Read, Write};

const CRC_MASK_DELTA: u32 = 0xa282_ead8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub data: Vec<u8>,
}
impl Record {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut len_buf = [0; 8];
        track_io!(reader.read_exact(&mut len_buf))?;
        let len = LittleEndian::read_u64(&len_buf);
        let len_crc = track_io!(reader.read_u32::<LittleEndian>())?;
        track!(check_crc(&len_buf, len_crc))?;

        let mut data = vec![0; len as usize];
        track_io!(reader.read_exact(&mut data))?;
        let data_crc = track_io!(reader.read_u32::<LittleEndian>())?;
        track!(check_crc(&data, data_crc))?;

        Ok(Self { data })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut len_buf = [0; 8];
        LittleEndian::write_u64(&mut len_buf, self.data.len() as u64);
        track_io!(writer.write_all(&len_buf))?;
        track_io!(writer.write_u32::<LittleEndian>(masked_crc(&len_buf)))?;
        track_io!(writer.write_all(&self.data))?;
        track_io!(writer.write_u32::<LittleEndian>(masked_crc(&self.data)))?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecordStream<R> {
    reader: R,
}
impl<R: Read> RecordStream<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}
impl<R: Read> Iterator for RecordStream<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut peek = [0; 1];
        match track_io!(self.reader.read(&mut peek)) {
            Err(e) => Some(Err(e)),
            Ok(0) => None,
            Ok(_) => Some(track!(Record::read_from(peek.chain(&mut self.reader)))),
        }
    }
}

fn masked_crc(bytes: &[u8]) -> u32 {
    let crc = crc::crc32::checksum_castagnoli(bytes);
    crc.rotate_right(15).wrapping_add(CRC_MASK_DELTA)
}

fn check_crc(bytes: &[u8], actual_crc: u32) -> Result<()> {
    let expected_crc = masked_crc(bytes);
    track_assert_eq!(actual_crc, expected_crc, ErrorKind::InvalidInput);
    Ok(())
}
