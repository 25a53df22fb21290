//! Prelude module for this crate.
//!
//! You can use `use bms_chart::prelude::*;` to import the decoders and the model at once.

#[cfg(feature = "diagnostics")]
pub use crate::diagnostics::{SimpleSource, ToAriadne, collect_reports, emit_decode_log};

#[cfg(feature = "bmson")]
pub use crate::bmson::decode::decode_bmson_json;
#[cfg(feature = "rand")]
pub use crate::rng::RandRng;
pub use crate::{
    bms::{BmsDecodeOutput, BmsGenerator, decode_bms, decode_bms_str, numeral::ObjId},
    bmson::{
        Bmson,
        decode::{DecodeOutput, decode_bmson},
    },
    chart::{
        Chart, ChartHeader, NoteCategory,
        lane::{EventLane, Lane, PlacedNote},
        mode::Mode,
        note::{LongNote, LongNoteType, Note, NoteArena, NoteId, NoteKind, NoteSound},
        timeline::{MeasurePosition, MissFrame, MissLayer, TimeLine},
    },
    config::{BmsSourceKind, ContentHashes, DecodeConfig, LnType},
    decode_log::{
        DecodeError, DecodeInfo, DecodeLog, DecodeWarning, LogEntry, LogKind, LogMessage,
    },
    rng::{Rng, RngMock},
};
