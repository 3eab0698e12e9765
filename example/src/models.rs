use std::marker::PhantomData;

use dtogen_macros::has_dto;

/// Joins tags into one comma separated string and splits them back.
pub struct TagConverter;

pub trait TagConvert {
    type Output;

    fn convert_tags(self) -> Self::Output;
}

impl TagConvert for Vec<String> {
    type Output = String;

    fn convert_tags(self) -> String {
        self.join(",")
    }
}

impl TagConvert for String {
    type Output = Vec<String>;

    fn convert_tags(self) -> Vec<String> {
        if self.is_empty() {
            Vec::new()
        } else {
            self.split(',').map(str::to_owned).collect()
        }
    }
}

impl TagConverter {
    pub fn convert<T: TagConvert>(value: T) -> T::Output {
        value.convert_tags()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(pub u32);

impl From<Score> for u32 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl From<u32> for Score {
    fn from(value: u32) -> Self {
        Score(value)
    }
}

#[has_dto(name = "[class]Dto", conversion = StaticMethods | Explicit)]
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[dto_ignore]
    pub password_hash: String,
    #[has_indirect_conversion(TagConverter, "convert", "String")]
    pub tags: Vec<String>,
    pub nickname: Option<String>,
}

#[has_dto(conversion = Implicit | ReferenceMethods)]
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: u64,
    #[has_conversion(Explicit, "u32")]
    pub score: Score,
    #[dto_ignore]
    pub cached_rank: Option<u32>,
}

#[has_dto]
pub struct Tagged<T> {
    pub value: u8,
    pub marker: PhantomData<T>,
}

/// Keeps its note private, so the build script reports it and generates nothing for it.
#[has_dto]
pub struct Audit {
    pub id: u64,
    note: String,
}

impl Audit {
    pub fn new(id: u64, note: impl Into<String>) -> Self {
        Self {
            id,
            note: note.into(),
        }
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

/// Crate-visible members are reachable from `crate::dto`.
#[has_dto(conversion = Explicit)]
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub id: u64,
    pub(crate) total: i64,
}

impl Ledger {
    pub fn new(id: u64, total: i64) -> Self {
        Self { id, total }
    }

    pub fn total(&self) -> i64 {
        self.total
    }
}

pub mod inner {
    use dtogen_macros::has_dto;

    #[has_dto(name = "[class]Wire", conversion = None)]
    #[derive(Debug)]
    pub struct Note {
        pub text: String,
    }
}
