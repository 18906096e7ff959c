use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::page::{PageId, PAGE_SIZE};

/// Page-granular file I/O for the buffer pool. Pages live at byte offset
/// `page_id * PAGE_SIZE`. Both operations are synchronous and blocking;
/// retry and recovery are the caller's concern.
#[derive(Debug)]
pub struct DiskManager {
    file: Mutex<File>,
}

impl DiskManager {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Fills `buf` with the persisted image of `page_id`. A page that was
    /// never written reads back as zeroes.
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start((page_id * PAGE_SIZE) as u64))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf[filled..].fill(0);
        Ok(())
    }

    /// Persists `buf` as the durable image of `page_id`.
    pub fn write_page(&self, page_id: PageId, buf: &[u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start((page_id * PAGE_SIZE) as u64))?;
        file.write_all(buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use tempfile::NamedTempFile;

    fn test_disk() -> (DiskManager, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let disk = DiskManager::open(file.path()).unwrap();
        (disk, file)
    }

    #[test]
    fn test_write_then_read_page() {
        let (disk, _file) = test_disk();
        let mut rng = rand::thread_rng();
        let payload: Vec<u8> = (0..PAGE_SIZE).map(|_| rng.gen()).collect();

        disk.write_page(3, &payload).unwrap();

        let mut buf = vec![0u8; PAGE_SIZE];
        disk.read_page(3, &mut buf).unwrap();
        assert_eq!(buf, payload);
    }

    #[test]
    fn test_unwritten_page_reads_zeroed() {
        let (disk, _file) = test_disk();
        disk.write_page(2, &vec![0xAA; PAGE_SIZE]).unwrap();

        // page 0 sits before the written range, page 9 past end of file
        let mut buf = vec![0xFFu8; PAGE_SIZE];
        disk.read_page(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));

        let mut buf = vec![0xFFu8; PAGE_SIZE];
        disk.read_page(9, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pages_do_not_overlap() {
        let (disk, _file) = test_disk();
        for page_id in 0..4 {
            disk.write_page(page_id, &vec![page_id as u8 + 1; PAGE_SIZE])
                .unwrap();
        }

        let mut buf = vec![0u8; PAGE_SIZE];
        for page_id in 0..4 {
            disk.read_page(page_id, &mut buf).unwrap();
            assert!(buf.iter().all(|&b| b == page_id as u8 + 1));
        }
    }
}
