// Floor-data program decoding.
//
// A sector may point into the level's floor-data table: a flat array of
// `u16` words holding a chain of chunks. Each chunk starts with a header word
// whose low five bits name the function and whose top bit marks the last
// chunk of the chain. Operand layout per function:
//
//   PortalSector  header + 1 word (target room index)
//   FloorSlant    header + 1 word (low byte X slope, high byte Z slope, signed)
//   CeilingSlant  header + 1 word (same layout)
//   Trigger       header + 1 setup word + action words (see below)
//   Death         header only
//   anything else header only
//
// Trigger action words carry their own "last" bit (bit 15), the action
// function in bits 10..13 and a 10 bit parameter. A camera-target action is
// followed by one extra word; that extra word's top bit decides whether the
// action list ends there.
//
// Index 0 of the table is reserved: a sector with `floor_data_index == 0`
// has no program.
//
// `Chunks` walks a chain without panicking; if the chain runs off the end of
// the table it stops and sets `malformed()`. `World::validate` uses that to
// reject bad data at load; per-tick queries run on validated data.
//
// See also: `height.rs` (the interpreter), `world.rs` (portal lookup),
// `builder.rs` (uses `FloorDataProgram` to author chains).

/// Top bit on headers and trigger actions: last entry of its list.
pub const LAST_ENTRY: u16 = 0x8000;

/// Floor-data chunk function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloorFunction {
    PortalSector,
    FloorSlant,
    CeilingSlant,
    Trigger,
    Death,
    Other(u8),
}

impl FloorFunction {
    pub fn from_header(word: u16) -> Self {
        match word & 0x1f {
            1 => Self::PortalSector,
            2 => Self::FloorSlant,
            3 => Self::CeilingSlant,
            4 => Self::Trigger,
            5 => Self::Death,
            other => Self::Other(other as u8),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::PortalSector => 1,
            Self::FloorSlant => 2,
            Self::CeilingSlant => 3,
            Self::Trigger => 4,
            Self::Death => 5,
            Self::Other(c) => u16::from(c) & 0x1f,
        }
    }
}

/// Trigger action function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerFunction {
    /// Activates an item; the parameter is the item index.
    Object,
    /// Points the camera somewhere; followed by one extra word.
    CameraTarget,
    Other(u8),
}

impl TriggerFunction {
    pub fn from_word(word: u16) -> Self {
        match (word >> 10) & 0x0f {
            0 => Self::Object,
            1 => Self::CameraTarget,
            other => Self::Other(other as u8),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Object => 0,
            Self::CameraTarget => 1,
            Self::Other(c) => u16::from(c) & 0x0f,
        }
    }
}

pub fn is_last(word: u16) -> bool {
    word & LAST_ENTRY != 0
}

/// Split a slant operand into its signed (x, z) components.
pub fn decode_slant(word: u16) -> (i8, i8) {
    ((word & 0xff) as u8 as i8, ((word >> 8) & 0xff) as u8 as i8)
}

pub fn encode_slant(x: i8, z: i8) -> u16 {
    u16::from(x as u8) | (u16::from(z as u8) << 8)
}

/// One decoded chunk of a floor-data chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chunk {
    Portal { target: u16 },
    FloorSlant { x: i8, z: i8 },
    CeilingSlant { x: i8, z: i8 },
    /// `actions` is the index of the first action word (after the setup word).
    Trigger { actions: usize },
    Death,
    Other(u8),
}

/// A chunk plus the table index of its header word.
///
/// The header index is what `HeightInfo::last_trigger_or_kill` stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkEntry {
    pub header: usize,
    pub chunk: Chunk,
}

/// Iterator over the chunks of one chain.
pub struct Chunks<'a> {
    data: &'a [u16],
    pos: usize,
    done: bool,
    malformed: bool,
}

impl<'a> Chunks<'a> {
    /// Walk the chain starting at `start`. `start == 0` yields nothing.
    pub fn new(data: &'a [u16], start: usize) -> Self {
        Self {
            data,
            pos: start,
            done: start == 0,
            malformed: false,
        }
    }

    /// True once the walk stopped because the chain ran off the table.
    pub fn malformed(&self) -> bool {
        self.malformed
    }

    fn word(&mut self, index: usize) -> Option<u16> {
        let w = self.data.get(index).copied();
        if w.is_none() {
            self.malformed = true;
            self.done = true;
        }
        w
    }
}

impl Iterator for Chunks<'_> {
    type Item = ChunkEntry;

    fn next(&mut self) -> Option<ChunkEntry> {
        if self.done {
            return None;
        }
        let header = self.pos;
        let word = self.word(header)?;
        if is_last(word) {
            self.done = true;
        }

        let chunk = match FloorFunction::from_header(word) {
            FloorFunction::PortalSector => {
                let operand = self.word(header + 1)?;
                self.pos = header + 2;
                Chunk::Portal { target: operand }
            }
            FloorFunction::FloorSlant => {
                let (x, z) = decode_slant(self.word(header + 1)?);
                self.pos = header + 2;
                Chunk::FloorSlant { x, z }
            }
            FloorFunction::CeilingSlant => {
                let (x, z) = decode_slant(self.word(header + 1)?);
                self.pos = header + 2;
                Chunk::CeilingSlant { x, z }
            }
            FloorFunction::Trigger => {
                // Setup word, then the action list.
                self.word(header + 1)?;
                let actions = header + 2;
                let mut list = TriggerActions::new(self.data, actions);
                for _ in list.by_ref() {}
                if list.malformed {
                    self.malformed = true;
                    self.done = true;
                    return None;
                }
                self.pos = list.pos;
                Chunk::Trigger { actions }
            }
            FloorFunction::Death => {
                self.pos = header + 1;
                Chunk::Death
            }
            FloorFunction::Other(code) => {
                self.pos = header + 1;
                Chunk::Other(code)
            }
        };

        Some(ChunkEntry { header, chunk })
    }
}

/// One trigger action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerAction {
    pub function: TriggerFunction,
    pub param: u16,
}

impl TriggerAction {
    pub fn object(item: u16) -> Self {
        Self {
            function: TriggerFunction::Object,
            param: item,
        }
    }
}

/// Iterator over a trigger's action list.
pub struct TriggerActions<'a> {
    data: &'a [u16],
    pos: usize,
    done: bool,
    malformed: bool,
}

impl<'a> TriggerActions<'a> {
    pub fn new(data: &'a [u16], start: usize) -> Self {
        Self {
            data,
            pos: start,
            done: false,
            malformed: false,
        }
    }
}

impl Iterator for TriggerActions<'_> {
    type Item = TriggerAction;

    fn next(&mut self) -> Option<TriggerAction> {
        if self.done {
            return None;
        }
        let Some(&word) = self.data.get(self.pos) else {
            self.malformed = true;
            self.done = true;
            return None;
        };
        self.pos += 1;
        let mut last = is_last(word);
        let function = TriggerFunction::from_word(word);
        if function == TriggerFunction::CameraTarget {
            let Some(&extra) = self.data.get(self.pos) else {
                self.malformed = true;
                self.done = true;
                return None;
            };
            last = is_last(extra);
            self.pos += 1;
        }
        if last {
            self.done = true;
        }
        Some(TriggerAction {
            function,
            param: word & 0x3ff,
        })
    }
}

/// Authoring helper that assembles one chain.
///
/// The last bit is set on the final chunk header by `finish`.
#[derive(Clone, Debug, Default)]
pub struct FloorDataProgram {
    words: Vec<u16>,
    last_header: Option<usize>,
}

impl FloorDataProgram {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&mut self, function: FloorFunction) {
        self.last_header = Some(self.words.len());
        self.words.push(function.code());
    }

    pub fn portal(mut self, room: u16) -> Self {
        self.header(FloorFunction::PortalSector);
        self.words.push(room);
        self
    }

    pub fn floor_slant(mut self, x: i8, z: i8) -> Self {
        self.header(FloorFunction::FloorSlant);
        self.words.push(encode_slant(x, z));
        self
    }

    pub fn ceiling_slant(mut self, x: i8, z: i8) -> Self {
        self.header(FloorFunction::CeilingSlant);
        self.words.push(encode_slant(x, z));
        self
    }

    /// Append a trigger chunk. An empty action list still gets one
    /// terminating no-op action so the chain stays well formed.
    pub fn trigger(mut self, actions: &[TriggerAction]) -> Self {
        self.header(FloorFunction::Trigger);
        self.words.push(0);
        if actions.is_empty() {
            self.words.push(LAST_ENTRY | (TriggerFunction::Other(15).code() << 10));
            return self;
        }
        for (i, action) in actions.iter().enumerate() {
            let last = i + 1 == actions.len();
            let mut word = (action.function.code() << 10) | (action.param & 0x3ff);
            if action.function == TriggerFunction::CameraTarget {
                self.words.push(word);
                self.words.push(if last { LAST_ENTRY } else { 0 });
                continue;
            }
            if last {
                word |= LAST_ENTRY;
            }
            self.words.push(word);
        }
        self
    }

    pub fn death(mut self) -> Self {
        self.header(FloorFunction::Death);
        self
    }

    pub fn finish(mut self) -> Vec<u16> {
        if let Some(h) = self.last_header {
            self.words[h] |= LAST_ENTRY;
        }
        self.words
    }
}
