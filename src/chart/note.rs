//! Notes and the arena that owns them.
//!
//! Timelines refer to notes through [`NoteId`] handles, and a long note refers to its other end
//! the same way, so the pair relation is a plain index and the model stays acyclic.

/// Handle of a note in a [`NoteArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteId(pub usize);

/// Classification of a long note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LongNoteType {
    /// Not specified by the chart. The global [`crate::config::LnType`] decides.
    #[default]
    Undefined,
    /// Judged at the start only.
    LongNote,
    /// Judged at the start and the end.
    ChargeNote,
    /// Judged at the start, the end and while held.
    HellChargeNote,
}

impl LongNoteType {
    /// Reads the `#LNMODE` / bmson `ln_type` numbering, where `1..=3` are defined.
    #[must_use]
    pub const fn from_number(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::LongNote),
            2 => Some(Self::ChargeNote),
            3 => Some(Self::HellChargeNote),
            _ => None,
        }
    }
}

/// A sound played by a note: a resource index and the slice of the file to play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteSound {
    /// Index into [`crate::chart::Chart::wav_list`], `None` for a silent note.
    pub wav: Option<usize>,
    /// Offset into the sound in microseconds.
    pub start_us: i64,
    /// Length to play in microseconds, 0 for the whole sound.
    pub duration_us: i64,
}

impl NoteSound {
    /// A sound played from its start.
    #[must_use]
    pub const fn new(wav: Option<usize>) -> Self {
        Self {
            wav,
            start_us: 0,
            duration_us: 0,
        }
    }

    /// A slice of a sound, for continued bmson channels.
    #[must_use]
    pub const fn sliced(wav: Option<usize>, start_us: i64, duration_us: i64) -> Self {
        Self {
            wav,
            start_us,
            duration_us,
        }
    }
}

/// One end of a long note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LongNote {
    /// The other end. `None` only while the note is being decoded.
    pub pair: Option<NoteId>,
    /// Whether this is the chronologically later end.
    pub end: bool,
    /// Classification shared by both ends.
    pub ln_type: LongNoteType,
}

/// Variant part of a [`Note`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteKind {
    /// A note to hit.
    Normal,
    /// One end of a long note.
    Long(LongNote),
    /// A note to avoid.
    Mine {
        /// Damage dealt when hit.
        damage: f64,
    },
}

/// A note with its sound and the sounds layered on it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note {
    /// Variant data.
    pub kind: NoteKind,
    /// Main sound.
    pub sound: NoteSound,
    /// Sounds played together with the main one.
    pub layered: Vec<NoteSound>,
}

impl Note {
    /// A normal note.
    #[must_use]
    pub const fn normal(sound: NoteSound) -> Self {
        Self {
            kind: NoteKind::Normal,
            sound,
            layered: Vec::new(),
        }
    }

    /// An unpaired long-note end.
    #[must_use]
    pub const fn long(sound: NoteSound) -> Self {
        Self {
            kind: NoteKind::Long(LongNote {
                pair: None,
                end: false,
                ln_type: LongNoteType::Undefined,
            }),
            sound,
            layered: Vec::new(),
        }
    }

    /// A mine.
    #[must_use]
    pub const fn mine(sound: NoteSound, damage: f64) -> Self {
        Self {
            kind: NoteKind::Mine { damage },
            sound,
            layered: Vec::new(),
        }
    }

    /// Long-note data, if this is a long note.
    #[must_use]
    pub const fn as_long(&self) -> Option<&LongNote> {
        match &self.kind {
            NoteKind::Long(long) => Some(long),
            _ => None,
        }
    }

    /// Whether this is a normal note.
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        matches!(self.kind, NoteKind::Normal)
    }

    /// Whether this is a mine.
    #[must_use]
    pub const fn is_mine(&self) -> bool {
        matches!(self.kind, NoteKind::Mine { .. })
    }

    /// Whether this is a long note that still waits for its other end.
    #[must_use]
    pub const fn is_unpaired_long(&self) -> bool {
        matches!(self.kind, NoteKind::Long(LongNote { pair: None, .. }))
    }
}

/// Storage of every note of a chart.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteArena {
    notes: Vec<Note>,
}

impl NoteArena {
    /// Stores a note and returns its handle.
    pub fn alloc(&mut self, note: Note) -> NoteId {
        self.notes.push(note);
        NoteId(self.notes.len() - 1)
    }

    /// The note behind `id`.
    #[must_use]
    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id.0)
    }

    /// The note behind `id`, mutably.
    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.get_mut(id.0)
    }

    /// Number of stored notes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// All notes with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &Note)> {
        self.notes
            .iter()
            .enumerate()
            .map(|(index, note)| (NoteId(index), note))
    }

    /// Links two long notes as a pair.
    ///
    /// `start` must be the chronologically earlier end; `end` is flagged as the end. Both take
    /// the start's classification if it is defined, else the end's, falling back to `ln_type`.
    pub fn link(&mut self, start: NoteId, end: NoteId, ln_type: LongNoteType) {
        let start_type = self
            .get(start)
            .and_then(Note::as_long)
            .map_or(LongNoteType::Undefined, |long| long.ln_type);
        let end_type = self
            .get(end)
            .and_then(Note::as_long)
            .map_or(LongNoteType::Undefined, |long| long.ln_type);
        let shared = [start_type, end_type, ln_type]
            .into_iter()
            .find(|ty| *ty != LongNoteType::Undefined)
            .unwrap_or_default();
        for (id, pair, is_end) in [(start, end, false), (end, start, true)] {
            if let Some(note) = self.get_mut(id) {
                note.kind = NoteKind::Long(LongNote {
                    pair: Some(pair),
                    end: is_end,
                    ln_type: shared,
                });
            }
        }
    }

    /// Rebuilds the arena keeping only `order`, in that order, and rewrites pair handles.
    ///
    /// Returns the mapping from old to new handles. Pair handles pointing at dropped notes
    /// become `None`.
    pub fn compact(&mut self, order: impl IntoIterator<Item = NoteId>) -> Vec<Option<NoteId>> {
        let mut mapping = vec![None; self.notes.len()];
        let mut notes = Vec::with_capacity(self.notes.len());
        for old in order {
            let Some(slot) = mapping.get_mut(old.0) else {
                continue;
            };
            if slot.is_some() {
                continue;
            }
            let Some(note) = self.notes.get(old.0) else {
                continue;
            };
            *slot = Some(NoteId(notes.len()));
            notes.push(note.clone());
        }
        for note in &mut notes {
            if let NoteKind::Long(long) = &mut note.kind {
                long.pair = long.pair.and_then(|pair| mapping.get(pair.0).copied().flatten());
            }
        }
        self.notes = notes;
        mapping
    }
}
