use serde::{Deserialize, Serialize};

/// Survey years of the glacier inventory shipped with the atlas pages.
pub const DEFAULT_YEARS: [i32; 5] = [1850, 1931, 1973, 2010, 2016];

/// Calendar year of a glacier extent survey.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Year(pub i32);

impl Year {
    /// Number of years from `earlier` to `self` (negative if `earlier` is later).
    pub fn years_since(self, earlier: Year) -> i32 {
        self.0 - earlier.0
    }
}

impl std::fmt::Display for Year {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearSetError {
    Empty,
    NotAscending { previous: Year, next: Year },
}

impl std::fmt::Display for YearSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YearSetError::Empty => write!(f, "year set must not be empty"),
            YearSetError::NotAscending { previous, next } => {
                write!(f, "years must be strictly ascending: {previous} then {next}")
            }
        }
    }
}

impl std::error::Error for YearSetError {}

/// Closed, strictly ascending set of survey years.
///
/// Index 0 is the baseline year. Indices are what the year slider moves over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSet {
    years: Vec<Year>,
}

impl YearSet {
    pub fn new(years: impl IntoIterator<Item = Year>) -> Result<Self, YearSetError> {
        let years: Vec<Year> = years.into_iter().collect();
        if years.is_empty() {
            return Err(YearSetError::Empty);
        }
        for pair in years.windows(2) {
            if pair[1] <= pair[0] {
                return Err(YearSetError::NotAscending {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self { years })
    }

    pub fn glacier_default() -> Self {
        Self {
            years: DEFAULT_YEARS.iter().copied().map(Year).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Always `false`; construction rejects empty sets.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Year> {
        self.years.get(index).copied()
    }

    pub fn index_of(&self, year: Year) -> Option<usize> {
        self.years.binary_search(&year).ok()
    }

    pub fn baseline(&self) -> Year {
        self.years[0]
    }

    pub fn last_index(&self) -> usize {
        self.years.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = Year> + '_ {
        self.years.iter().copied()
    }

    pub fn as_slice(&self) -> &[Year] {
        &self.years
    }
}
