//! Binary dialect: a compound document with one storage per object kind.
//!
//! Every storage holds a `Data` stream of length-prefixed chunks. Text-like
//! streams carry `|KEY=VALUE|` blobs that go through the same field tokenizer
//! as the text dialect; geometry streams carry fixed-layout records that are
//! turned into synthetic fields with the same keys.

use std::io::{Read, Seek};

use log::{debug, warn};

use super::ascii;
use super::context::Diagnostic;
use super::keywords::{FieldKey, RecordKind, StreamName};
use super::tree::{Field, Name, Span, Tree, Value};
use super::units;
use crate::error::ImportError;

const MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Chunks this long are never produced by real files; treat them as corruption.
const MAX_CHUNK_LEN: usize = 1 << 20;

const TAG_ARC: u8 = 1;
const TAG_PAD: u8 = 2;
const TAG_VIA: u8 = 3;
const TAG_TRACK: u8 = 4;
const TAG_TEXT: u8 = 5;
const TAG_FILL: u8 = 6;

const TRACK_LEN: usize = 45;
const ARC_LEN: usize = 56;
const FILL_LEN: usize = 46;
const VIA_LEN: usize = 209;
const TEXT_LEN: usize = 230;
const PAD_LEN: usize = 120;
const PAD_SIZE_SHAPE_LEN: usize = 275;

/// Hole shape code of a slotted pad hole.
const HOLE_SHAPE_SLOT: u8 = 2;

pub fn sniff<R: Read>(mut reader: R) -> bool {
    let mut head = [0u8; 8];
    reader.read_exact(&mut head).is_ok() && head == MAGIC
}

/// Decode every known storage into records of `tree`.
///
/// Returns the per-record problems that were skipped over.
pub fn parse<R: Read + Seek>(reader: R, tree: &mut Tree) -> Result<Vec<Diagnostic>, ImportError> {
    let mut file = cfb::CompoundFile::open(reader)
        .map_err(|e| ImportError::Container(format!("not a compound document: {e}")))?;

    let storages: Vec<String> = file
        .read_root_storage()
        .filter(|entry| entry.is_storage())
        .map(|entry| entry.name().to_string())
        .collect();

    let mut decoder = Decoder {
        tree,
        diagnostics: Vec::new(),
    };
    for name in storages {
        let kind = StreamName::lookup(name.as_bytes());
        if kind == StreamName::Unknown {
            debug!("PcbDoc: skipping storage {name}");
            continue;
        }
        let path = format!("/{name}/Data");
        let mut stream = file
            .open_stream(&path)
            .map_err(|e| ImportError::Container(format!("{path}: {e}")))?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        debug!("PcbDoc: {path}: {} bytes", data.len());
        decoder.decode(kind, ChunkReader::new(&name, &data))?;
    }
    Ok(decoder.diagnostics)
}

// ─── Framing ─────────────────────────────────────────────────────────

struct ChunkReader<'a> {
    stream: &'a str,
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    fn new(stream: &'a str, data: &'a [u8]) -> Self {
        Self {
            stream,
            data,
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn framing(&self, message: String) -> ImportError {
        ImportError::Framing {
            stream: self.stream.to_string(),
            message,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ImportError> {
        let data = self.data;
        let Some(bytes) = data.get(self.pos..self.pos + n) else {
            return Err(self.framing(format!(
                "chunk of {n} bytes at offset {} runs past the end of the stream",
                self.pos
            )));
        };
        self.pos += n;
        Ok(bytes)
    }

    fn length(&mut self, width: usize) -> Result<usize, ImportError> {
        let raw = load_int(self.take(width)?, 0, width);
        match usize::try_from(raw) {
            Ok(len) if len < MAX_CHUNK_LEN => Ok(len),
            _ => Err(self.framing(format!("invalid chunk length {raw}"))),
        }
    }

    fn tag(&mut self) -> Result<Option<u8>, ImportError> {
        if self.at_end() {
            return Ok(None);
        }
        Ok(Some(self.take(1)?[0]))
    }

    /// A 4-byte length followed by the payload; the payload may be empty.
    fn chunk(&mut self) -> Result<&'a [u8], ImportError> {
        let len = self.length(4)?;
        self.take(len)
    }

    /// Record-level chunk; `None` at end of stream or on a zero length.
    fn record(&mut self) -> Result<Option<&'a [u8]>, ImportError> {
        if self.at_end() {
            return Ok(None);
        }
        let chunk = self.chunk()?;
        Ok((!chunk.is_empty()).then_some(chunk))
    }

    fn tagged(&mut self) -> Result<Option<(u8, &'a [u8])>, ImportError> {
        let Some(tag) = self.tag()? else {
            return Ok(None);
        };
        Ok(self.record()?.map(|chunk| (tag, chunk)))
    }

    fn with_id(&mut self) -> Result<Option<(i64, &'a [u8])>, ImportError> {
        if self.at_end() {
            return Ok(None);
        }
        let id = load_int(self.take(2)?, 0, 2);
        Ok(self.record()?.map(|chunk| (id, chunk)))
    }
}

// ─── Value decoding ──────────────────────────────────────────────────

/// Sign-extended little-endian integer of `width` bytes.
fn load_int(d: &[u8], offset: usize, width: usize) -> i64 {
    let mut v: u64 = 0;
    for (i, &b) in d[offset..offset + width].iter().enumerate() {
        v |= (b as u64) << (8 * i);
    }
    let bits = 8 * width as u32;
    if bits < 64 && v >= 1 << (bits - 1) {
        v as i64 - (1i64 << bits)
    } else {
        v as i64
    }
}

fn load_f64(d: &[u8], offset: usize) -> f64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&d[offset..offset + 8]);
    f64::from_le_bytes(b)
}

fn int(key: FieldKey, d: &[u8], offset: usize, width: usize) -> Field {
    Field::synthetic(key, Value::Int(load_int(d, offset, width)))
}

fn coord(key: FieldKey, d: &[u8], offset: usize) -> Field {
    Field::synthetic(
        key,
        Value::Coord(units::from_board_units(load_int(d, offset, 4))),
    )
}

fn double(key: FieldKey, d: &[u8], offset: usize) -> Field {
    Field::synthetic(key, Value::Double(load_f64(d, offset)))
}

/// Length byte followed by that many bytes, clamped to the chunk.
fn pascal_string(d: &[u8]) -> &[u8] {
    match d.split_first() {
        Some((&len, rest)) => &rest[..rest.len().min(len as usize)],
        None => &[],
    }
}

/// Copy string bytes into the tree so the field can refer to them.
fn string_field(tree: &mut Tree, key: FieldKey, bytes: &[u8]) -> Field {
    let block = tree.push_block(bytes.to_vec());
    Field::synthetic(
        key,
        Value::Str(Span {
            block,
            start: 0,
            end: bytes.len(),
        }),
    )
}

// ─── Per-stream decoding ─────────────────────────────────────────────

struct Decoder<'t> {
    tree: &'t mut Tree,
    diagnostics: Vec<Diagnostic>,
}

impl Decoder<'_> {
    fn diag(&mut self, object: String, message: String) {
        warn!("PcbDoc: {object}: {message}");
        self.diagnostics.push(Diagnostic { object, message });
    }

    fn add(&mut self, kind: RecordKind, fields: Vec<Field>) {
        self.tree
            .add_record(kind, Name::Static(kind.as_str()), fields);
    }

    fn decode(&mut self, kind: StreamName, mut r: ChunkReader<'_>) -> Result<(), ImportError> {
        match kind {
            StreamName::Board6 => self.text_blobs(&mut r, RecordKind::Board),
            StreamName::Nets6 => self.text_blobs(&mut r, RecordKind::Net),
            StreamName::Classes6 => self.text_blobs(&mut r, RecordKind::Class),
            StreamName::Components6 => self.text_blobs(&mut r, RecordKind::Component),
            StreamName::Polygons6 => self.text_blobs(&mut r, RecordKind::Polygon),
            StreamName::Rules6 => self.rules(&mut r),
            StreamName::Tracks6 => {
                self.fixed(&mut r, RecordKind::Track, TAG_TRACK, TRACK_LEN, track_fields)
            }
            StreamName::Arcs6 => self.fixed(&mut r, RecordKind::Arc, TAG_ARC, ARC_LEN, arc_fields),
            StreamName::Fills6 => {
                self.fixed(&mut r, RecordKind::Fill, TAG_FILL, FILL_LEN, fill_fields)
            }
            StreamName::Vias6 => self.fixed(&mut r, RecordKind::Via, TAG_VIA, VIA_LEN, via_fields),
            StreamName::Texts6 => self.texts(&mut r),
            StreamName::Pads6 => self.pads(&mut r),
            StreamName::Unknown => Ok(()),
        }
    }

    fn blob(&mut self, kind: RecordKind, object: String, raw: &[u8]) {
        if let Err(message) = ascii::parse_blob(self.tree, kind, kind.as_str(), raw) {
            self.diag(object, message);
        }
    }

    fn text_blobs(&mut self, r: &mut ChunkReader<'_>, kind: RecordKind) -> Result<(), ImportError> {
        let mut ordinal = 0;
        while let Some(raw) = r.record()? {
            self.blob(kind, format!("{} record {ordinal}", r.stream), raw);
            ordinal += 1;
        }
        Ok(())
    }

    fn rules(&mut self, r: &mut ChunkReader<'_>) -> Result<(), ImportError> {
        while let Some((id, raw)) = r.with_id()? {
            self.blob(RecordKind::Rule, format!("{} rule {id}", r.stream), raw);
        }
        Ok(())
    }

    fn fixed(
        &mut self,
        r: &mut ChunkReader<'_>,
        kind: RecordKind,
        tag: u8,
        min_len: usize,
        fields: fn(&[u8]) -> Vec<Field>,
    ) -> Result<(), ImportError> {
        let mut ordinal = 0;
        while let Some((t, d)) = r.tagged()? {
            let object = format!("{} record {ordinal}", r.stream);
            ordinal += 1;
            if let Err(message) = check_record(t, tag, d.len(), min_len) {
                self.diag(object, message);
                continue;
            }
            self.add(kind, fields(d));
        }
        Ok(())
    }

    fn texts(&mut self, r: &mut ChunkReader<'_>) -> Result<(), ImportError> {
        let mut ordinal = 0;
        while let Some((t, d)) = r.tagged()? {
            let object = format!("{} record {ordinal}", r.stream);
            ordinal += 1;
            // the string chunk always follows, even for a rejected record
            let string = r.chunk()?;
            if let Err(message) = check_record(t, TAG_TEXT, d.len(), TEXT_LEN) {
                self.diag(object, message);
                continue;
            }
            let mut fields = text_fields(d);
            fields.push(string_field(self.tree, FieldKey::Text, pascal_string(string)));
            self.add(RecordKind::Text, fields);
        }
        Ok(())
    }

    fn pads(&mut self, r: &mut ChunkReader<'_>) -> Result<(), ImportError> {
        let mut ordinal = 0;
        while let Some(tag) = r.tag()? {
            let object = format!("{} record {ordinal}", r.stream);
            ordinal += 1;
            if tag != TAG_PAD {
                let skipped = r.chunk()?;
                self.diag(
                    object,
                    format!("non-pad object (type {tag}, {} bytes) skipped", skipped.len()),
                );
                continue;
            }
            let name = r.chunk()?;
            if name.is_empty() {
                break;
            }
            for _ in 0..3 {
                r.chunk()?;
            }
            let main = r.chunk()?;
            let size_shape = r.chunk()?;
            if main.len() < PAD_LEN {
                self.diag(
                    object,
                    format!("record too short; expected {PAD_LEN}, got {}", main.len()),
                );
                continue;
            }
            let mut fields = vec![string_field(self.tree, FieldKey::Name, pascal_string(name))];
            fields.extend(pad_fields(main, size_shape));
            self.add(RecordKind::Pad, fields);
        }
        Ok(())
    }
}

fn check_record(tag: u8, expected: u8, len: usize, min_len: usize) -> Result<(), String> {
    if tag != expected {
        return Err(format!("wrong record type; expected {expected}, got {tag}"));
    }
    if len < min_len {
        return Err(format!("record too short; expected {min_len}, got {len}"));
    }
    Ok(())
}

/// Layer, net and component prefix shared by every primitive.
fn owner_fields(d: &[u8]) -> Vec<Field> {
    vec![
        int(FieldKey::Layer, d, 0, 1),
        int(FieldKey::Net, d, 3, 2),
        int(FieldKey::Component, d, 7, 2),
    ]
}

fn track_fields(d: &[u8]) -> Vec<Field> {
    let mut f = owner_fields(d);
    f.extend([
        coord(FieldKey::X1, d, 13),
        coord(FieldKey::Y1, d, 17),
        coord(FieldKey::X2, d, 21),
        coord(FieldKey::Y2, d, 25),
        coord(FieldKey::Width, d, 29),
    ]);
    f
}

fn arc_fields(d: &[u8]) -> Vec<Field> {
    let mut f = owner_fields(d);
    f.extend([
        coord(FieldKey::X, d, 13),
        coord(FieldKey::Y, d, 17),
        coord(FieldKey::Radius, d, 21),
        double(FieldKey::StartAngle, d, 25),
        double(FieldKey::EndAngle, d, 33),
        coord(FieldKey::Width, d, 41),
    ]);
    f
}

fn fill_fields(d: &[u8]) -> Vec<Field> {
    let mut f = owner_fields(d);
    f.extend([
        coord(FieldKey::X1, d, 13),
        coord(FieldKey::Y1, d, 17),
        coord(FieldKey::X2, d, 21),
        coord(FieldKey::Y2, d, 25),
        double(FieldKey::Rotation, d, 29),
    ]);
    f
}

fn via_fields(d: &[u8]) -> Vec<Field> {
    vec![
        int(FieldKey::StartLayer, d, 0, 1),
        int(FieldKey::EndLayer, d, 1, 1),
        int(FieldKey::Net, d, 3, 2),
        int(FieldKey::Component, d, 7, 2),
        coord(FieldKey::X, d, 13),
        coord(FieldKey::Y, d, 17),
        coord(FieldKey::Diameter, d, 21),
        coord(FieldKey::HoleSize, d, 25),
    ]
}

fn text_fields(d: &[u8]) -> Vec<Field> {
    vec![
        int(FieldKey::Layer, d, 0, 1),
        int(FieldKey::Component, d, 7, 2),
        coord(FieldKey::X, d, 13),
        coord(FieldKey::Y, d, 17),
        coord(FieldKey::Height, d, 21),
        double(FieldKey::Rotation, d, 27),
        int(FieldKey::Mirror, d, 35, 1),
        int(FieldKey::IsComment, d, 40, 1),
        int(FieldKey::IsDesignator, d, 41, 1),
    ]
}

fn pad_fields(d: &[u8], size_shape: &[u8]) -> Vec<Field> {
    let mut f = owner_fields(d);
    f.extend([
        coord(FieldKey::X, d, 13),
        coord(FieldKey::Y, d, 17),
        coord(FieldKey::TopXSize, d, 21),
        coord(FieldKey::TopYSize, d, 25),
        int(FieldKey::TopShape, d, 49, 1),
        coord(FieldKey::HoleSize, d, 45),
        double(FieldKey::Rotation, d, 52),
        int(FieldKey::Plated, d, 60, 1),
        coord(FieldKey::PasteMaskExpansionManual, d, 86),
        coord(FieldKey::SolderMaskExpansionManual, d, 90),
        int(FieldKey::PasteMaskExpansionMode, d, 101, 1),
        int(FieldKey::SolderMaskExpansionMode, d, 102, 1),
    ]);
    // simple stack mode: only the top level is meaningful
    if d[62] != 0 {
        f.extend([
            coord(FieldKey::MidXSize, d, 29),
            coord(FieldKey::MidYSize, d, 33),
            int(FieldKey::MidShape, d, 50, 1),
            coord(FieldKey::BotXSize, d, 37),
            coord(FieldKey::BotYSize, d, 41),
            int(FieldKey::BotShape, d, 51, 1),
        ]);
    }
    if size_shape.len() >= PAD_SIZE_SHAPE_LEN && size_shape[262] == HOLE_SHAPE_SLOT {
        f.extend([
            coord(FieldKey::SlotSize, size_shape, 263),
            double(FieldKey::SlotRotation, size_shape, 267),
        ]);
    }
    f
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::fixtures::*;
    use super::*;
    use crate::parsers::altium::tree::FieldRef;

    fn decode(streams: &[(&str, Vec<u8>)]) -> (Tree, Vec<Diagnostic>) {
        let mut tree = Tree::new();
        let diags = parse(Cursor::new(document(streams)), &mut tree).unwrap();
        (tree, diags)
    }

    fn field<'t>(tree: &'t Tree, kind: RecordKind, idx: usize, key: FieldKey) -> FieldRef<'t> {
        let rec = &tree.records(kind)[idx];
        tree.fields(rec).find(|f| f.key() == key).unwrap()
    }

    #[test]
    fn test_sniff() {
        let doc = document(&[]);
        assert!(sniff(&doc[..]));
        assert!(!sniff(&b"RECORD=Board|X=1\n"[..]));
        assert!(!sniff(&[0xD0u8][..]));
    }

    #[test]
    fn test_load_int_sign_extends() {
        assert_eq!(load_int(&[0xFF, 0xFF], 0, 2), -1);
        assert_eq!(load_int(&[0x34, 0x12], 0, 2), 0x1234);
        assert_eq!(load_int(&[0x80], 0, 1), -128);
        assert_eq!(load_int(&[0, 0, 0, 0x80], 0, 4), i32::MIN as i64);
        assert_eq!(load_int(&[9, 0x10, 0, 0, 0], 1, 4), 0x10);
    }

    #[test]
    fn test_text_streams() {
        let mut nets = text_blob("|NAME=GND|");
        nets.extend(text_blob("|NAME=VCC|"));
        let (tree, diags) = decode(&[
            ("Board6", text_blob("|SHEETWIDTH=1000mil|SHEETHEIGHT=500mil|")),
            ("Nets6", nets),
            ("Rules6", rule_blob(7, "|RULEKIND=Clearance|GAP=8mil|")),
        ]);
        assert!(diags.is_empty());
        assert_eq!(tree.records(RecordKind::Net).len(), 2);
        assert_eq!(field(&tree, RecordKind::Net, 1, FieldKey::Name).str(), "VCC");
        assert_eq!(
            field(&tree, RecordKind::Board, 0, FieldKey::SheetHeight).coord(),
            Some(units::mil(500.0))
        );
        assert_eq!(
            field(&tree, RecordKind::Rule, 0, FieldKey::Gap).coord(),
            Some(units::mil(8.0))
        );
    }

    #[test]
    fn test_tracks_and_arcs() {
        let mut tracks = track(1, 0, 0xFFFF, bu(100.0), bu(200.0), bu(300.0), bu(200.0), bu(10.0));
        tracks.extend(track(32, 1, 2, 0, 0, bu(1.0), 0, bu(5.0)));
        let arcs = arc(33, 0xFFFF, bu(50.0), bu(50.0), bu(25.0), 0.0, 90.0, bu(8.0));
        let (tree, _) = decode(&[("Tracks6", tracks), ("Arcs6", arcs)]);

        assert_eq!(tree.records(RecordKind::Track).len(), 2);
        assert_eq!(field(&tree, RecordKind::Track, 0, FieldKey::Layer).int(), Some(1));
        assert_eq!(field(&tree, RecordKind::Track, 0, FieldKey::Component).int(), Some(-1));
        assert_eq!(
            field(&tree, RecordKind::Track, 0, FieldKey::X2).coord(),
            Some(units::mil(300.0))
        );
        assert_eq!(field(&tree, RecordKind::Track, 1, FieldKey::Net).int(), Some(1));
        assert_eq!(field(&tree, RecordKind::Arc, 0, FieldKey::EndAngle).f64(), Some(90.0));
        assert_eq!(
            field(&tree, RecordKind::Arc, 0, FieldKey::Radius).coord(),
            Some(units::mil(25.0))
        );
    }

    #[test]
    fn test_texts_and_pads() {
        let pads = pad(&Pad {
            name: "A1",
            layer: 74,
            net: 0,
            comp: 0,
            x: bu(10.0),
            y: bu(20.0),
            size: (bu(60.0), bu(40.0)),
            shape: 2,
            hole: bu(30.0),
            slot: Some((bu(50.0), 90.0)),
        });
        let texts = text(33, 0, bu(1.0), bu(2.0), bu(60.0), ".Designator");
        let (tree, diags) = decode(&[("Pads6", pads), ("Texts6", texts)]);
        assert!(diags.is_empty());

        assert_eq!(field(&tree, RecordKind::Pad, 0, FieldKey::Name).str(), "A1");
        assert_eq!(field(&tree, RecordKind::Pad, 0, FieldKey::TopShape).int(), Some(2));
        assert_eq!(
            field(&tree, RecordKind::Pad, 0, FieldKey::SlotSize).coord(),
            Some(units::mil(50.0))
        );
        assert_eq!(field(&tree, RecordKind::Pad, 0, FieldKey::Plated).bool(), Some(true));
        // simple stack mode: no mid/bottom fields
        let rec = &tree.records(RecordKind::Pad)[0];
        assert!(tree.fields(rec).all(|f| f.key() != FieldKey::MidXSize));

        assert_eq!(field(&tree, RecordKind::Text, 0, FieldKey::Text).str(), ".Designator");
        assert_eq!(field(&tree, RecordKind::Text, 0, FieldKey::Layer).int(), Some(33));
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let mut tracks = tagged(4, &[1, 2, 3]);
        tracks.extend(tagged(9, &[0u8; 45]));
        tracks.extend(track(1, 0, 0, 0, 0, bu(1.0), 0, bu(1.0)));
        let (tree, diags) = decode(&[("Tracks6", tracks)]);
        assert_eq!(tree.records(RecordKind::Track).len(), 1);
        assert_eq!(diags.len(), 2);
        assert!(diags[0].message.contains("too short"));
        assert!(diags[1].message.contains("wrong record type"));
    }

    #[test]
    fn test_short_pad_is_skipped() {
        let mut pads = vec![TAG_PAD];
        pads.extend(chunk(&pascal("1")));
        for _ in 0..3 {
            pads.extend(chunk(&[0]));
        }
        pads.extend(chunk(&[0u8; 115]));
        pads.extend(chunk(&[]));
        pads.extend(pad(&Pad {
            name: "2",
            layer: 1,
            net: 0xFFFF,
            comp: 0xFFFF,
            x: 0,
            y: 0,
            size: (bu(20.0), bu(20.0)),
            shape: 1,
            hole: 0,
            slot: None,
        }));
        let (tree, diags) = decode(&[("Pads6", pads)]);
        assert_eq!(tree.records(RecordKind::Pad).len(), 1);
        assert_eq!(field(&tree, RecordKind::Pad, 0, FieldKey::Name).str(), "2");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("expected 120, got 115"));
    }

    #[test]
    fn test_zero_length_ends_stream() {
        let mut tracks = track(1, 0, 0, 0, 0, bu(1.0), 0, bu(1.0));
        tracks.extend(tagged(4, &[]));
        tracks.extend(track(1, 0, 0, 0, 0, bu(2.0), 0, bu(1.0)));
        let (tree, _) = decode(&[("Tracks6", tracks)]);
        assert_eq!(tree.records(RecordKind::Track).len(), 1);
    }

    #[test]
    fn test_oversized_chunk_is_fatal() {
        let mut tracks = vec![4];
        tracks.extend((2u32 << 20).to_le_bytes());
        let mut tree = Tree::new();
        let err = parse(Cursor::new(document(&[("Tracks6", tracks)])), &mut tree).unwrap_err();
        assert!(matches!(err, ImportError::Framing { ref stream, .. } if stream == "Tracks6"));
    }

    #[test]
    fn test_truncated_chunk_is_fatal() {
        let mut nets = 100u32.to_le_bytes().to_vec();
        nets.extend_from_slice(b"|NAME=X|");
        let mut tree = Tree::new();
        let err = parse(Cursor::new(document(&[("Nets6", nets)])), &mut tree).unwrap_err();
        assert!(matches!(err, ImportError::Framing { .. }));
    }

    #[test]
    fn test_unknown_storages_are_skipped() {
        let (tree, diags) = decode(&[
            ("WideStrings6", vec![1, 2, 3]),
            ("Nets6", text_blob("|NAME=GND|")),
        ]);
        assert!(diags.is_empty());
        assert_eq!(tree.records(RecordKind::Net).len(), 1);
    }

    #[test]
    fn test_not_a_container() {
        let mut tree = Tree::new();
        let err = parse(Cursor::new(b"RECORD=Board|X=1\n".to_vec()), &mut tree).unwrap_err();
        assert!(matches!(err, ImportError::Container(_)));
    }
}
