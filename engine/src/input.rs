//! Integer text fields: validation against bounds and a staging buffer that
//! only touches the canonical record on an explicit commit.

/// Inclusive bounds for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub const HIT_POINTS: Bounds = Bounds { min: 0, max: 999_999 };
    pub const ARMOR_CLASS: Bounds = Bounds { min: 0, max: 99 };
    pub const MOVEMENT: Bounds = Bounds { min: 0, max: 999 };
    pub const DURATION: Bounds = Bounds { min: 0, max: 999 };
    pub const INITIATIVE: Bounds = Bounds { min: -99, max: 99 };

    pub fn contains(&self, v: i64) -> bool {
        (self.min..=self.max).contains(&v)
    }
}

/// An accepted edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The field was emptied.
    Clear,
    Set(i64),
}

impl Commit {
    pub fn value(self) -> Option<i64> {
        match self {
            Commit::Clear => None,
            Commit::Set(v) => Some(v),
        }
    }
}

/// Parse field text. `None` means the text is rejected and the stored value
/// must stay as it was.
pub fn parse_field(text: &str, bounds: Bounds) -> Option<Commit> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Commit::Clear);
    }
    let v: i64 = trimmed.parse().ok()?;
    bounds.contains(v).then_some(Commit::Set(v))
}

/// Like [`parse_field`] but clamps out-of-range integers instead of
/// rejecting them. Non-integer text is still rejected.
pub fn parse_clamped(text: &str, bounds: Bounds) -> Option<Commit> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Commit::Clear);
    }
    let v: i64 = trimmed.parse().ok()?;
    Some(Commit::Set(v.clamp(bounds.min, bounds.max)))
}

/// Uncommitted edit state for one numeric field.
///
/// The committed value belongs to the caller's record; the buffer only holds
/// what the user is typing until blur/Enter.
#[derive(Debug, Clone)]
pub struct EditBuffer {
    bounds: Bounds,
    draft: Option<String>,
}

impl EditBuffer {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds, draft: None }
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn input(&mut self, text: impl Into<String>) {
        self.draft = Some(text.into());
    }

    /// Text to show: the draft while editing, otherwise the committed value.
    pub fn display(&self, committed: Option<i64>) -> String {
        match (&self.draft, committed) {
            (Some(d), _) => d.clone(),
            (None, Some(v)) => v.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Ends the edit. Returns the accepted change, or `None` when nothing
    /// was typed or the draft was rejected; either way the draft is dropped.
    pub fn commit(&mut self) -> Option<Commit> {
        let draft = self.draft.take()?;
        parse_field(&draft, self.bounds)
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }
}
