pub mod ascii;
pub mod binary;
pub mod context;
mod convert;
mod finalize;
mod geometry_records;
pub mod keywords;
mod layers;
mod padstack;
mod rules;
pub mod tree;
pub mod units;

use std::io::{Read, Seek};

use log::{debug, info};

use crate::error::ImportError;
use crate::{Dialect, Import, ImportOptions};
use context::Context;
use tree::Tree;

/// Import a PcbDoc of a known dialect into a board.
pub fn import<R: Read + Seek>(
    reader: R,
    dialect: Dialect,
    opts: &ImportOptions,
) -> Result<Import, ImportError> {
    // 1. Build the record tree
    let mut tree = Tree::new();
    let mut diagnostics = match dialect {
        Dialect::Ascii => {
            ascii::parse(reader, opts.block_size, &mut tree)?;
            Vec::new()
        }
        Dialect::Binary => binary::parse(reader, &mut tree)?,
    };
    debug!(
        "PcbDoc: {} records in {} blocks",
        tree.record_count(),
        tree.block_count()
    );

    // 2. Administrative records, in dependency order
    let mut ctx = Context::new(&tree, opts);
    convert::board(&mut ctx);
    convert::nets(&mut ctx);
    convert::classes(&mut ctx);
    convert::clearance_rules(&mut ctx);
    convert::components(&mut ctx);
    convert::texts(&mut ctx);

    // 3. Geometry
    geometry_records::pads(&mut ctx);
    geometry_records::tracks(&mut ctx);
    geometry_records::arcs(&mut ctx);
    geometry_records::vias(&mut ctx);
    geometry_records::polygons(&mut ctx);
    geometry_records::fills(&mut ctx);

    // 4. Extent, planes and thermals
    finalize::finalize(&mut ctx);

    let (board, converted) = ctx.finish();
    diagnostics.extend(converted);
    info!(
        "PcbDoc: {} layers, {} nets, {} components, {} padstacks, {} lines, {} arcs, {} polygons, {} texts ({} skipped)",
        board.layers.len(),
        board.nets.len(),
        board.components.len(),
        board.padstacks.len(),
        board.lines.len(),
        board.arcs.len(),
        board.polygons.len(),
        board.texts.len(),
        diagnostics.len()
    );
    Ok(Import { board, diagnostics })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::binary::fixtures::*;
    use super::*;
    use crate::types::{PadLevel, ShapeRole, Side};
    use units::mil;

    const ASCII_BOARD: &str = "\
|RECORD=Board|SHEETWIDTH=1000mil|SHEETHEIGHT=500mil
|RECORD=Net|NAME=GND
|RECORD=Net|NAME=SIG
|RECORD=Component|X=100mil|Y=100mil|PATTERN=R0603|SOURCEDESIGNATOR=R1|LAYER=TOP
|RECORD=Text|LAYER=TOPOVERLAY|COMPONENT=0|X=100mil|Y=150mil|HEIGHT=60mil|ROTATION=0|MIRROR=FALSE|TEXT=R1
|RECORD=Pad|NAME=1|LAYER=MULTILAYER|NET=0|COMPONENT=0|X=100mil|Y=100mil|TOPSHAPE=ROUND|TOPXSIZE=60mil|TOPYSIZE=60mil|HOLESIZE=30mil|PLATED=TRUE|ROTATION=0
|RECORD=Track|LAYER=TOP|NET=0|X1=0mil|Y1=0mil|X2=100mil|Y2=0mil|WIDTH=10mil
|RECORD=Arc|LAYER=TOP|NET=1|X=500mil|Y=250mil|RADIUS=50mil|STARTANGLE=0|ENDANGLE=90|WIDTH=8mil
|RECORD=Via|NET=0|X=300mil|Y=300mil|DIAMETER=24mil|HOLESIZE=12mil|STARTLAYER=TOP|ENDLAYER=BOTTOM
|RECORD=Fill|LAYER=TOP|X1=600mil|Y1=100mil|X2=700mil|Y2=200mil|ROTATION=0
";

    fn binary_board() -> Vec<u8> {
        let mut nets = text_blob("|NAME=GND|");
        nets.extend(text_blob("|NAME=SIG|"));
        document(&[
            ("Board6", text_blob("|SHEETWIDTH=1000mil|SHEETHEIGHT=500mil|")),
            ("Nets6", nets),
            (
                "Components6",
                text_blob("|X=100mil|Y=100mil|PATTERN=R0603|SOURCEDESIGNATOR=R1|LAYER=TOP|"),
            ),
            ("Texts6", text(33, 0, bu(100.0), bu(150.0), bu(60.0), "R1")),
            (
                "Pads6",
                pad(&Pad {
                    name: "1",
                    layer: 74,
                    net: 0,
                    comp: 0,
                    x: bu(100.0),
                    y: bu(100.0),
                    size: (bu(60.0), bu(60.0)),
                    shape: 1,
                    hole: bu(30.0),
                    slot: None,
                }),
            ),
            (
                "Tracks6",
                track(1, 0, 0xFFFF, 0, 0, bu(100.0), 0, bu(10.0)),
            ),
            (
                "Arcs6",
                arc(1, 1, bu(500.0), bu(250.0), bu(50.0), 0.0, 90.0, bu(8.0)),
            ),
            ("Vias6", via(0, bu(300.0), bu(300.0), bu(24.0), bu(12.0))),
            ("Fills6", fill(1, 0xFFFF, bu(600.0), bu(100.0), bu(700.0), bu(200.0))),
        ])
    }

    #[test]
    fn test_ascii_import() {
        let opts = ImportOptions::default();
        let result = import(Cursor::new(ASCII_BOARD), Dialect::Ascii, &opts).unwrap();
        assert!(result.diagnostics.is_empty());
        let board = &result.board;
        assert_eq!(board.width, mil(1000.0));
        assert_eq!(board.components.len(), 1);
        assert_eq!(board.components[0].side, Side::Top);
        assert_eq!(board.components[0].refdes.as_deref(), Some("R1"));
        assert_eq!(board.padstacks.len(), 2);
        let pad = &board.padstacks[0];
        assert_eq!(pad.component.map(|c| c.0), Some(0));
        // two copper layers: nothing between top and bottom
        assert_eq!(pad.shapes_on(PadLevel::Internal, ShapeRole::Copper).count(), 0);
        assert_eq!(pad.shapes_on(PadLevel::Bottom, ShapeRole::Copper).count(), 1);
        assert_eq!(board.lines.len(), 1);
        assert_eq!(board.arcs.len(), 1);
        assert_eq!(board.polygons.len(), 1);
        assert_eq!(board.texts[0].string, "R1");
    }

    #[test]
    fn test_dialects_converge() {
        let opts = ImportOptions::default();
        let ascii = import(Cursor::new(ASCII_BOARD), Dialect::Ascii, &opts).unwrap();
        let binary = import(Cursor::new(binary_board()), Dialect::Binary, &opts).unwrap();
        assert!(binary.diagnostics.is_empty());
        assert_eq!(
            serde_json::to_value(&ascii.board).unwrap(),
            serde_json::to_value(&binary.board).unwrap()
        );
    }

    #[test]
    fn test_block_size_does_not_change_the_board() {
        let reference = import(
            Cursor::new(ASCII_BOARD),
            Dialect::Ascii,
            &ImportOptions::default(),
        )
        .unwrap();
        let expected = serde_json::to_value(&reference.board).unwrap();
        for block_size in [1, 7, 64, 333] {
            let opts = ImportOptions {
                block_size,
                ..ImportOptions::default()
            };
            let result = import(Cursor::new(ASCII_BOARD), Dialect::Ascii, &opts).unwrap();
            assert_eq!(serde_json::to_value(&result.board).unwrap(), expected);
        }
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let opts = ImportOptions::default();
        let err = import(
            Cursor::new("RECORD=Board|SHEETWIDTH=1mil\nGARBAGE\n"),
            Dialect::Ascii,
            &opts,
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_binary_diagnostics_are_reported() {
        let mut tracks = track(1, 0xFFFF, 0xFFFF, 0, 0, bu(100.0), 0, bu(10.0));
        tracks.extend(tagged(4, &[0; 10]));
        // a track on a layer id nothing maps to
        tracks.extend(track(200, 0xFFFF, 0xFFFF, 0, 0, bu(100.0), 0, bu(10.0)));
        let doc = document(&[
            ("Board6", text_blob("|SHEETWIDTH=1000mil|SHEETHEIGHT=500mil|")),
            ("Tracks6", tracks),
        ]);
        let opts = ImportOptions::default();
        let result = import(Cursor::new(doc), Dialect::Binary, &opts).unwrap();
        assert_eq!(result.board.lines.len(), 1);
        assert_eq!(result.diagnostics.len(), 2);
    }

    #[test]
    fn test_out_of_range_coordinate_is_skipped() {
        let text = "\
RECORD=Board|SHEETWIDTH=1000mil|SHEETHEIGHT=500mil
RECORD=Track|LAYER=TOP|X1=0|Y1=-99999999999999999999mil|X2=100mil|Y2=0|WIDTH=10mil
RECORD=Track|LAYER=TOP|X1=0|Y1=0|X2=100mil|Y2=0|WIDTH=10mil
";
        let opts = ImportOptions::default();
        let result = import(Cursor::new(text), Dialect::Ascii, &opts).unwrap();
        assert_eq!(result.board.lines.len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].object, "Track #0");
    }

    #[test]
    fn test_unresolved_net_is_reported() {
        let text = "\
RECORD=Board|SHEETWIDTH=1000mil|SHEETHEIGHT=500mil
RECORD=Track|LAYER=TOP|NET=5|X1=0|Y1=0|X2=100mil|Y2=0|WIDTH=10mil
";
        let opts = ImportOptions::default();
        let result = import(Cursor::new(text), Dialect::Ascii, &opts).unwrap();
        assert!(result.board.lines.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("NET 5"));
    }
}
