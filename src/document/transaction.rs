//! Replace transactions and the position mappings they produce.

/// Replace the text at `from..to` with `text`.
///
/// Positions are interpreted against the document as it is *after* every earlier
/// step of the same transaction has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub text: String,
}

impl ReplaceStep {
    pub fn new(from: usize, to: usize, text: impl Into<String>) -> Self {
        Self {
            from,
            to,
            text: text.into(),
        }
    }

    /// Net change in document size caused by this step.
    pub fn delta(&self) -> isize {
        self.text.chars().count() as isize - (self.to as isize - self.from as isize)
    }
}

/// An ordered group of replace steps dispatched as one document update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    steps: Vec<ReplaceStep>,
    add_to_history: bool,
    origin: Option<&'static str>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    /// Empty transaction that records undo history.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            add_to_history: true,
            origin: None,
        }
    }

    pub fn from_steps(steps: Vec<ReplaceStep>) -> Self {
        Self {
            steps,
            add_to_history: true,
            origin: None,
        }
    }

    /// Builder-style single step append.
    pub fn replace(mut self, from: usize, to: usize, text: impl Into<String>) -> Self {
        self.steps.push(ReplaceStep::new(from, to, text));
        self
    }

    pub fn push(&mut self, step: ReplaceStep) {
        self.steps.push(step);
    }

    /// Suppress undo-history recording for this transaction.
    pub fn without_history(mut self) -> Self {
        self.add_to_history = false;
        self
    }

    pub fn records_history(&self) -> bool {
        self.add_to_history
    }

    /// Tag the transaction so subscribers can tell who dispatched it.
    pub fn with_origin(mut self, origin: &'static str) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<&'static str> {
        self.origin
    }

    pub fn steps(&self) -> &[ReplaceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Which side a position sticks to when text is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// Position change caused by one replace step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    pub from: usize,
    pub old_len: usize,
    pub new_len: usize,
}

impl StepMap {
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        let end = self.from + self.old_len;
        if pos < self.from {
            return pos;
        }
        if pos > end {
            return pos - self.old_len + self.new_len;
        }
        // Inside or on the edge of the replaced range
        let stick_after = if self.old_len == 0 {
            assoc == Assoc::After
        } else if pos == self.from {
            false
        } else if pos == end {
            true
        } else {
            assoc == Assoc::After
        };
        if stick_after {
            self.from + self.new_len
        } else {
            self.from
        }
    }
}

/// Sequence of step maps, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    /// Append every step of `other` after the steps already held.
    pub fn append(&mut self, other: &Mapping) {
        self.maps.extend_from_slice(&other.maps);
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos, assoc))
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }
}
