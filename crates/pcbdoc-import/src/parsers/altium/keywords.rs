//! Keyword tables for record types, field keys, layer names and stream names.
//!
//! Every table is a closed enum with a fallback variant. Lookups are
//! case-insensitive and go through a hash table built on first use, so the
//! converter can `match` on variants instead of comparing strings.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Longer names can't be keywords and resolve to the fallback.
const MAX_KEYWORD_LEN: usize = 32;

macro_rules! keyword_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident fallback $fallback:ident {
            $($variant:ident => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
            $fallback,
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];
            pub const COUNT: usize = Self::ALL.len() + 1;

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                    $name::$fallback => "",
                }
            }

            pub fn index(self) -> usize {
                self as usize
            }

            /// Resolve a raw name, ignoring ASCII case.
            pub fn lookup(raw: &[u8]) -> Self {
                static TABLE: OnceLock<HashMap<&'static [u8], $name>> = OnceLock::new();
                let table = TABLE.get_or_init(|| {
                    Self::ALL
                        .iter()
                        .map(|&k| (k.as_str().as_bytes(), k))
                        .collect()
                });
                let mut buf = [0u8; MAX_KEYWORD_LEN];
                let Some(upper) = buf.get_mut(..raw.len()) else {
                    return $name::$fallback;
                };
                upper.copy_from_slice(raw);
                upper.make_ascii_uppercase();
                table.get(&*upper).copied().unwrap_or($name::$fallback)
            }
        }
    };
}

keyword_table! {
    /// Logical record types. Unrecognized types land in `Misc`.
    pub enum RecordKind fallback Misc {
        Board => "BOARD",
        Net => "NET",
        Class => "CLASS",
        Rule => "RULE",
        Component => "COMPONENT",
        Text => "TEXT",
        Pad => "PAD",
        Track => "TRACK",
        Arc => "ARC",
        Via => "VIA",
        Polygon => "POLYGON",
        Fill => "FILL",
    }
}

keyword_table! {
    pub enum FieldKey fallback Unknown {
        Name => "NAME",
        Layer => "LAYER",
        V7Layer => "V7_LAYER",
        Net => "NET",
        Component => "COMPONENT",
        X => "X",
        Y => "Y",
        X1 => "X1",
        Y1 => "Y1",
        X2 => "X2",
        Y2 => "Y2",
        Width => "WIDTH",
        Rotation => "ROTATION",
        Radius => "RADIUS",
        StartAngle => "STARTANGLE",
        EndAngle => "ENDANGLE",
        Text => "TEXT",
        Height => "HEIGHT",
        Mirror => "MIRROR",
        IsDesignator => "ISDESIGNATOR",
        IsComment => "ISCOMMENT",
        Pattern => "PATTERN",
        SourceDesignator => "SOURCEDESIGNATOR",
        Comment => "COMMENT",
        Shape => "SHAPE",
        TopShape => "TOPSHAPE",
        MidShape => "MIDSHAPE",
        BotShape => "BOTSHAPE",
        TopXSize => "TOPXSIZE",
        TopYSize => "TOPYSIZE",
        MidXSize => "MIDXSIZE",
        MidYSize => "MIDYSIZE",
        BotXSize => "BOTXSIZE",
        BotYSize => "BOTYSIZE",
        HoleSize => "HOLESIZE",
        SlotSize => "SLOTSIZE",
        SlotRotation => "SLOTROTATION",
        Plated => "PLATED",
        SolderMaskExpansionMode => "SOLDERMASKEXPANSIONMODE",
        SolderMaskExpansionManual => "SOLDERMASKEXPANSION_MANUAL",
        PasteMaskExpansionMode => "PASTEMASKEXPANSIONMODE",
        PasteMaskExpansionManual => "PASTEMASKEXPANSION_MANUAL",
        Diameter => "DIAMETER",
        StartLayer => "STARTLAYER",
        EndLayer => "ENDLAYER",
        TentingTop => "TENTINGTOP",
        TentingBottom => "TENTINGBOTTOM",
        RuleKind => "RULEKIND",
        Enabled => "ENABLED",
        NetScope => "NETSCOPE",
        LayerKind => "LAYERKIND",
        Scope1Expression => "SCOPE1EXPRESSION",
        Scope2Expression => "SCOPE2EXPRESSION",
        Gap => "GAP",
        Kind => "KIND",
        SuperClass => "SUPERCLASS",
        SheetWidth => "SHEETWIDTH",
        SheetHeight => "SHEETHEIGHT",
        ToggleLayers => "TOGGLELAYERS",
    }
}

keyword_table! {
    /// Fixed layer names. `MIDn`, `PLANEn` and `MECHANICALn` are parsed separately.
    pub enum LayerName fallback Unknown {
        Top => "TOP",
        Bottom => "BOTTOM",
        TopOverlay => "TOPOVERLAY",
        BottomOverlay => "BOTTOMOVERLAY",
        TopPaste => "TOPPASTE",
        BottomPaste => "BOTTOMPASTE",
        TopSolder => "TOPSOLDER",
        BottomSolder => "BOTTOMSOLDER",
        DrillGuide => "DRILLGUIDE",
        KeepOut => "KEEPOUT",
        DrillDrawing => "DRILLDRAWING",
        MultiLayer => "MULTILAYER",
    }
}

keyword_table! {
    /// Top-level storages of the binary dialect.
    pub enum StreamName fallback Unknown {
        Board6 => "BOARD6",
        Nets6 => "NETS6",
        Classes6 => "CLASSES6",
        Rules6 => "RULES6",
        Components6 => "COMPONENTS6",
        Pads6 => "PADS6",
        Tracks6 => "TRACKS6",
        Arcs6 => "ARCS6",
        Vias6 => "VIAS6",
        Fills6 => "FILLS6",
        Texts6 => "TEXTS6",
        Polygons6 => "POLYGONS6",
    }
}

keyword_table! {
    pub enum ShapeName fallback Unknown {
        Round => "ROUND",
        Rectangle => "RECTANGLE",
        Octagonal => "OCTAGONAL",
        RoundedRectangle => "ROUNDEDRECTANGLE",
    }
}

/// Index of a numbered key such as `LAYER12NAME`, `VX3` or `M0`.
pub fn indexed(raw: &str, prefix: &str, suffix: &str) -> Option<usize> {
    let upper = raw.to_ascii_uppercase();
    let digits = upper.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
