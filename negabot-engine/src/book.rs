//! Polyglot opening book reader.
//!
//! A Polyglot book is a sequence of 16 byte big-endian records
//! `(key: u64, move: u16, weight: u16, learn: u32)` sorted by key, where the key
//! is the position's Polyglot Zobrist hash. Lookups binary search the file
//! in place, so a book is never loaded into memory as a whole.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::debug;
use rand::Rng;
use serde::Deserialize;
use shakmaty::{Move, Role, Square};

use crate::error::{self, ErrorKind};
use crate::position::{uci, HashKind, Position};

/// Size in bytes of one book record.
pub const ENTRY_SIZE: u64 = 16;

/// How one move is picked when a position has several book moves.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookSelection {
    /// The move with the highest weight. Equal weights keep the first in file order.
    #[default]
    BestWeight,
    /// A random move, with probability proportional to its weight.
    WeightedRandom,
}

/// One record of a Polyglot book.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BookEntry {
    pub key: HashKind,
    pub raw_move: u16,
    pub weight: u16,
    pub learn: u32,
}

impl BookEntry {
    /// Decode a record from its 16 byte big-endian form.
    pub fn from_bytes(bytes: &[u8; ENTRY_SIZE as usize]) -> Self {
        let mut key = [0u8; 8];
        key.copy_from_slice(&bytes[0..8]);
        let mut learn = [0u8; 4];
        learn.copy_from_slice(&bytes[12..16]);

        Self {
            key: u64::from_be_bytes(key),
            raw_move: u16::from_be_bytes([bytes[8], bytes[9]]),
            weight: u16::from_be_bytes([bytes[10], bytes[11]]),
            learn: u32::from_be_bytes(learn),
        }
    }

    /// Encode a record into its 16 byte big-endian form.
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE as usize] {
        let mut bytes = [0u8; ENTRY_SIZE as usize];
        bytes[0..8].copy_from_slice(&self.key.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.raw_move.to_be_bytes());
        bytes[10..12].copy_from_slice(&self.weight.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.learn.to_be_bytes());
        bytes
    }

    /// The legal move in `position` that this record's move describes, if any.
    ///
    /// Polyglot packs `to` file and rank into bits 0-5, `from` into bits 6-11 and
    /// a promotion piece into bits 12-14. Castling is written as the king
    /// capturing its own rook, which is also how shakmaty names a castle's target.
    pub fn to_move(&self, position: &Position) -> Option<Move> {
        let raw = u32::from(self.raw_move);
        let to = Square::new(raw & 0o77);
        let from = Square::new((raw >> 6) & 0o77);
        let promotion = match (raw >> 12) & 0b111 {
            0 => None,
            1 => Some(Role::Knight),
            2 => Some(Role::Bishop),
            3 => Some(Role::Rook),
            4 => Some(Role::Queen),
            _ => return None,
        };

        position.legal_moves().into_iter().find(|legal_move| {
            legal_move.from() == Some(from)
                && legal_move.to() == to
                && legal_move.promotion() == promotion
        })
    }
}

/// Read access to a Polyglot book. The underlying reader is dropped, and a
/// file closed, when the book is dropped.
#[derive(Debug)]
pub struct OpeningBook<R> {
    reader: R,
    num_entries: u64,
}

impl OpeningBook<BufReader<File>> {
    /// Open a book file.
    pub fn open<P: AsRef<Path>>(path: P) -> error::Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> OpeningBook<R> {
    /// Wrap a reader positioned anywhere in a Polyglot book.
    pub fn new(mut reader: R) -> error::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        if len % ENTRY_SIZE != 0 {
            return Err((
                ErrorKind::BookMalformed,
                format!("length {len} is not a multiple of {ENTRY_SIZE}"),
            )
                .into());
        }

        Ok(Self {
            reader,
            num_entries: len / ENTRY_SIZE,
        })
    }

    /// Number of records in the book.
    pub fn len(&self) -> u64 {
        self.num_entries
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    fn read_entry(&mut self, index: u64) -> error::Result<BookEntry> {
        let mut bytes = [0u8; ENTRY_SIZE as usize];
        self.reader.seek(SeekFrom::Start(index * ENTRY_SIZE))?;
        self.reader.read_exact(&mut bytes)?;
        Ok(BookEntry::from_bytes(&bytes))
    }

    /// All records stored for `key`, in file order.
    pub fn entries(&mut self, key: HashKind) -> error::Result<Vec<BookEntry>> {
        // Lower bound of key.
        let (mut low, mut high) = (0, self.num_entries);
        while low < high {
            let mid = low + (high - low) / 2;
            if self.read_entry(mid)?.key < key {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        let mut entries = Vec::new();
        for index in low..self.num_entries {
            let entry = self.read_entry(index)?;
            if entry.key != key {
                break;
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Book move for `position`, chosen with the thread-local random generator
    /// when the selection is random.
    pub fn lookup(
        &mut self,
        position: &Position,
        selection: BookSelection,
    ) -> error::Result<Option<Move>> {
        self.lookup_with_rng(position, selection, &mut rand::thread_rng())
    }

    /// Book move for `position`, or None if the position is not in the book.
    /// Records with zero weight or with a move that is not legal are ignored.
    pub fn lookup_with_rng<G: Rng + ?Sized>(
        &mut self,
        position: &Position,
        selection: BookSelection,
        rng: &mut G,
    ) -> error::Result<Option<Move>> {
        let candidates: Vec<(Move, u16)> = self
            .entries(position.hash())?
            .into_iter()
            .filter(|entry| entry.weight > 0)
            .filter_map(|entry| entry.to_move(position).map(|book_move| (book_move, entry.weight)))
            .collect();

        let chosen = match selection {
            BookSelection::BestWeight => best_weight(candidates),
            BookSelection::WeightedRandom => weighted_random(candidates, rng),
        };

        if let Some(book_move) = &chosen {
            debug!("book move {} for {}", uci(book_move), position);
        }
        Ok(chosen)
    }
}

fn best_weight(candidates: Vec<(Move, u16)>) -> Option<Move> {
    let mut best: Option<(Move, u16)> = None;
    for (candidate, weight) in candidates {
        let improves = best
            .as_ref()
            .map_or(true, |(_, best_weight)| weight > *best_weight);
        if improves {
            best = Some((candidate, weight));
        }
    }
    best.map(|(book_move, _)| book_move)
}

fn weighted_random<G: Rng + ?Sized>(candidates: Vec<(Move, u16)>, rng: &mut G) -> Option<Move> {
    let total: u32 = candidates.iter().map(|(_, weight)| u32::from(*weight)).sum();
    if total == 0 {
        return None;
    }

    let mut pick = rng.gen_range(0..total);
    for (candidate, weight) in candidates {
        let weight = u32::from(weight);
        if pick < weight {
            return Some(candidate);
        }
        pick -= weight;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    /// Polyglot move encoding of from/to square indices and a promotion code.
    fn encode(from: u16, to: u16, promotion: u16) -> u16 {
        (promotion << 12) | (from << 6) | to
    }

    fn book_of(mut entries: Vec<BookEntry>) -> OpeningBook<Cursor<Vec<u8>>> {
        entries.sort_by_key(|entry| entry.key);
        let bytes: Vec<u8> = entries.iter().flat_map(|entry| entry.to_bytes()).collect();
        OpeningBook::new(Cursor::new(bytes)).unwrap()
    }

    fn entry(key: HashKind, raw_move: u16, weight: u16) -> BookEntry {
        BookEntry {
            key,
            raw_move,
            weight,
            learn: 0,
        }
    }

    #[test]
    fn record_bytes_are_big_endian() {
        let record = entry(0x463b96181691fc9c, 0x031c, 0x0102);
        let bytes = record.to_bytes();
        assert_eq!(&bytes[0..2], &[0x46, 0x3b]);
        assert_eq!(&bytes[8..12], &[0x03, 0x1c, 0x01, 0x02]);
        assert_eq!(BookEntry::from_bytes(&bytes), record);
    }

    #[test]
    fn decodes_normal_castle_and_promotion() {
        let start = Position::start_position();
        // e2e4: from 12, to 28.
        let e2e4 = entry(0, encode(12, 28, 0), 1).to_move(&start).unwrap();
        assert_eq!(uci(&e2e4), "e2e4");

        let castling = Position::parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        // e1h1 is the king side castle.
        let castle = entry(0, encode(4, 7, 0), 1).to_move(&castling).unwrap();
        assert!(castle.is_castle());
        assert_eq!(uci(&castle), "e1g1");

        let promoting = Position::parse_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        // a7a8n: from 48, to 56, knight.
        let underpromotion = entry(0, encode(48, 56, 1), 1).to_move(&promoting).unwrap();
        assert_eq!(uci(&underpromotion), "a7a8n");

        // e2e5 is not legal.
        assert_eq!(entry(0, encode(12, 36, 0), 1).to_move(&start), None);
    }

    #[test]
    fn best_weight_lookup() {
        let start = Position::start_position();
        let key = start.hash();
        let mut book = book_of(vec![
            entry(key - 1, encode(11, 27, 0), 100),
            entry(key, encode(12, 28, 5), 50), // Bad promotion code, skipped.
            entry(key, encode(12, 28, 0), 20),
            entry(key, encode(11, 27, 0), 40),
            entry(key, encode(6, 21, 0), 40),
            entry(key + 1, encode(10, 26, 0), 100),
        ]);

        assert_eq!(book.len(), 6);
        assert_eq!(book.entries(key).unwrap().len(), 4);

        let book_move = book.lookup(&start, BookSelection::BestWeight).unwrap();
        assert_eq!(book_move.map(|m| uci(&m)), Some("d2d4".to_string()));
    }

    #[test]
    fn miss_is_none() {
        let mut book = book_of(vec![entry(1, encode(12, 28, 0), 1)]);
        let found = book
            .lookup(&Position::start_position(), BookSelection::BestWeight)
            .unwrap();
        assert_eq!(found, None);

        let mut empty = book_of(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.entries(1).unwrap(), Vec::new());
    }

    #[test]
    fn weighted_random_skips_zero_weight() {
        let start = Position::start_position();
        let key = start.hash();
        let mut book = book_of(vec![
            entry(key, encode(12, 28, 0), 0),
            entry(key, encode(11, 27, 0), 3),
            entry(key, encode(6, 21, 0), 1),
        ]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let book_move = book
                .lookup_with_rng(&start, BookSelection::WeightedRandom, &mut rng)
                .unwrap()
                .unwrap();
            assert_ne!(uci(&book_move), "e2e4");
        }
    }

    #[test]
    fn truncated_book_is_malformed() {
        let err = OpeningBook::new(Cursor::new(vec![0u8; 17])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BookMalformed);
    }

    #[test]
    fn open_reads_file() {
        use std::io::Write;

        let start = Position::start_position();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&entry(start.hash(), encode(12, 28, 0), 1).to_bytes())
            .unwrap();
        file.flush().unwrap();

        let mut book = OpeningBook::open(file.path()).unwrap();
        let found = book.lookup(&start, BookSelection::BestWeight).unwrap();
        assert_eq!(found.map(|m| uci(&m)), Some("e2e4".to_string()));

        let missing = OpeningBook::open(file.path().with_extension("missing"));
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::BookIo);
    }
}
