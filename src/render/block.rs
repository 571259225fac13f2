//! Fenced block detection for code (```` ``` ````) and math (`$$`) regions.
//!
//! Block membership cannot be decided from a single line: every fence from
//! line 0 onward flips the open/closed state of its kind. Fence lines are
//! boundaries and are never counted as inside the region they delimit.

/// The two kinds of fenced region the renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Code,
    Math,
}

impl BlockKind {
    pub const fn delimiter(self) -> &'static str {
        match self {
            Self::Code => "```",
            Self::Math => "$$",
        }
    }

    /// Code fences may carry a language tag; math fences must be bare.
    pub fn is_fence(self, line: &str) -> bool {
        let trimmed = line.trim();
        match self {
            Self::Code => trimmed.starts_with(self.delimiter()),
            Self::Math => trimmed == self.delimiter(),
        }
    }
}

/// Returns true if `line` is a fence of either kind.
pub fn is_fence_line(line: &str) -> bool {
    BlockKind::Code.is_fence(line) || BlockKind::Math.is_fence(line)
}

/// Where a single line sits relative to one kind of block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockContext {
    pub in_block: bool,
    pub is_start: bool,
    pub is_end: bool,
}

impl BlockContext {
    pub const fn is_boundary(self) -> bool {
        self.is_start || self.is_end
    }
}

/// Block context of one line for both kinds, evaluated independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineContext {
    pub code: BlockContext,
    pub math: BlockContext,
}

impl LineContext {
    pub const fn get(self, kind: BlockKind) -> BlockContext {
        match kind {
            BlockKind::Code => self.code,
            BlockKind::Math => self.math,
        }
    }
}

/// Open/closed state of both block kinds at some point in the document.
///
/// Scanning is incremental: seed a state (or start from the top with
/// [`BlockState::default`]) and [`advance`](Self::advance) line by line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockState {
    code_open: bool,
    math_open: bool,
}

impl BlockState {
    /// State after every line in `lines` has been seen.
    pub fn after<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut state = Self::default();
        for line in lines {
            state.advance(line.as_ref());
        }
        state
    }

    pub const fn is_open(self, kind: BlockKind) -> bool {
        match kind {
            BlockKind::Code => self.code_open,
            BlockKind::Math => self.math_open,
        }
    }

    /// Context of a line that would follow this state, without consuming it.
    ///
    /// Used for positions past the end of the document, which are inside
    /// any block left open.
    pub const fn trailing(self) -> LineContext {
        LineContext {
            code: BlockContext {
                in_block: self.code_open,
                is_start: false,
                is_end: false,
            },
            math: BlockContext {
                in_block: self.math_open,
                is_start: false,
                is_end: false,
            },
        }
    }

    /// Classify `line` against the current state, then move past it.
    pub fn advance(&mut self, line: &str) -> LineContext {
        LineContext {
            code: step(&mut self.code_open, BlockKind::Code, line),
            math: step(&mut self.math_open, BlockKind::Math, line),
        }
    }
}

fn step(open: &mut bool, kind: BlockKind, line: &str) -> BlockContext {
    if kind.is_fence(line) {
        let context = BlockContext {
            in_block: false,
            is_start: !*open,
            is_end: *open,
        };
        *open = !*open;
        context
    } else {
        BlockContext {
            in_block: *open,
            ..BlockContext::default()
        }
    }
}

/// Block context of `all_lines[line_index]`, scanning from line 0.
///
/// O(`line_index`). Indices past the end report the trailing state of the
/// document so an unterminated fence keeps swallowing lines.
pub fn detect_line<S: AsRef<str>>(line_index: usize, all_lines: &[S]) -> LineContext {
    let Some(line) = all_lines.get(line_index) else {
        return BlockState::after(all_lines).trailing();
    };
    let mut state = BlockState::after(&all_lines[..line_index]);
    state.advance(line.as_ref())
}

/// Block context of one kind for `all_lines[line_index]`.
pub fn detect<S: AsRef<str>>(kind: BlockKind, line_index: usize, all_lines: &[S]) -> BlockContext {
    detect_line(line_index, all_lines).get(kind)
}
