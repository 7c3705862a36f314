// Copyright 2026 The layermerge developers
// License: MIT
//
// Delta channel: the stream of per-column coverage changes flowing from the
// sweep into contour reconstruction. Small layers stay in memory; large
// ones spill to a temporary file in a fixed big-endian wire format so a run
// never holds the whole delta stream resident.
//
// Wire format, all integers big-endian:
//     record  := 0x01  x:i32  count:i32  count × toggle:i32
//     toggle  := (y << 1) | bit      bit 1 ⇒ coverage begins at y
//     stream  := record* 0x00
// Toggles within a record are in ascending y; a coverage step of magnitude
// two is carried as two identical consecutive toggles.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MergeError, Result};

/// A single coverage transition on one sweep column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeltaToggle {
    pub y: i32,
    /// True when merged coverage begins at `y` going upward.
    pub rising: bool,
}

impl DeltaToggle {
    #[inline]
    fn encode(self) -> i32 {
        (self.y << 1) | self.rising as i32
    }

    #[inline]
    fn decode(w: i32) -> Self {
        DeltaToggle {
            y: w >> 1,
            rising: w & 1 != 0,
        }
    }
}

/// All coverage transitions happening at one x coordinate, ascending in y.
/// Columns with no transitions are never recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaRecord {
    pub x: i32,
    pub toggles: Vec<DeltaToggle>,
}

/// Write side of a delta channel. Records must arrive in strictly
/// ascending x.
pub trait DeltaSink {
    fn push(&mut self, rec: DeltaRecord) -> Result<()>;

    /// Seal the channel and hand back its read side.
    fn finish(self: Box<Self>) -> Result<Box<dyn DeltaSource>>;
}

/// Read side; yields records in the order they were pushed.
pub trait DeltaSource {
    fn next(&mut self) -> Result<Option<DeltaRecord>>;
}

// ─────────────────────────── in-memory channel ───────────────────────────

/// Channel that buffers every record in a Vec. The default for layers whose
/// estimated size is under the spill threshold.
#[derive(Default)]
pub struct MemoryChannel {
    records: Vec<DeltaRecord>,
    cursor: usize,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeltaSink for MemoryChannel {
    fn push(&mut self, rec: DeltaRecord) -> Result<()> {
        self.records.push(rec);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Box<dyn DeltaSource>> {
        Ok(self)
    }
}

impl DeltaSource for MemoryChannel {
    fn next(&mut self) -> Result<Option<DeltaRecord>> {
        if self.cursor < self.records.len() {
            let rec = self.records[self.cursor].clone();
            self.cursor += 1;
            Ok(Some(rec))
        } else {
            Ok(None)
        }
    }
}

// ─────────────────────────── spill channel ───────────────────────────

static SPILL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Owns a temp file path and deletes it on drop.
struct TempPath(PathBuf);

impl TempPath {
    fn fresh() -> Self {
        let n = SPILL_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("layermerge-{}-{}.delta", std::process::id(), n);
        TempPath(std::env::temp_dir().join(name))
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("failed to remove spill file {:?}: {e}", self.0);
            }
        }
    }
}

fn write_i32<W: Write>(w: &mut W, v: i32) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

fn read_i32<R: Read>(r: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Channel backed by a temporary file; used for layers whose estimated
/// delta volume exceeds the spill threshold.
pub struct SpillWriter {
    out: BufWriter<File>,
    path: TempPath,
}

impl SpillWriter {
    pub fn create() -> Result<Self> {
        let path = TempPath::fresh();
        let file = File::create(&path.0)?;
        Ok(SpillWriter {
            out: BufWriter::new(file),
            path,
        })
    }
}

impl DeltaSink for SpillWriter {
    fn push(&mut self, rec: DeltaRecord) -> Result<()> {
        self.out.write_all(&[1])?;
        write_i32(&mut self.out, rec.x)?;
        write_i32(&mut self.out, rec.toggles.len() as i32)?;
        for t in &rec.toggles {
            write_i32(&mut self.out, t.encode())?;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Box<dyn DeltaSource>> {
        self.out.write_all(&[0])?;
        self.out.flush()?;
        drop(self.out);
        let file = File::open(&self.path.0)?;
        Ok(Box::new(SpillReader {
            input: BufReader::new(file),
            done: false,
            _path: self.path,
        }))
    }
}

pub struct SpillReader {
    input: BufReader<File>,
    done: bool,
    _path: TempPath,
}

impl DeltaSource for SpillReader {
    fn next(&mut self) -> Result<Option<DeltaRecord>> {
        if self.done {
            return Ok(None);
        }
        let mut tag = [0u8; 1];
        self.input.read_exact(&mut tag)?;
        if tag[0] == 0 {
            self.done = true;
            return Ok(None);
        }
        let x = read_i32(&mut self.input)?;
        let count = read_i32(&mut self.input)?;
        if count < 0 {
            return Err(MergeError::MalformedDeltaStream {
                x,
                detail: "negative toggle count in spill record",
            });
        }
        let mut toggles = Vec::with_capacity(count as usize);
        for _ in 0..count {
            toggles.push(DeltaToggle::decode(read_i32(&mut self.input)?));
        }
        Ok(Some(DeltaRecord { x, toggles }))
    }
}
