use std::marker::PhantomData;

use dtogen_macros::has_dto;

pub struct TagConverter;

impl TagConverter {
    pub fn convert(tags: Vec<String>) -> String {
        tags.join(",")
    }
}

#[has_dto(name = "[class]Dto", conversion = StaticMethods | Explicit)]
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[dto_ignore]
    pub password_hash: String,
    #[has_conversion(Implicit, "String")]
    pub nickname: &'static str,
    #[has_indirect_conversion(TagConverter, "convert", "String")]
    pub tags: Vec<String>,
}

#[has_dto]
pub struct Empty {}

#[has_dto("[class]Wire", ReferenceMethods)]
pub struct Marked<T> {
    pub value: u8,
    pub marker: PhantomData<T>,
}

#[test]
fn test_smoke() {
    let user = User {
        id: 1,
        name: "ada".to_string(),
        password_hash: "hash".to_string(),
        nickname: "a",
        tags: vec!["x".to_string()],
    };
    assert_eq!(user.clone(), user);

    let _ = Empty {};
    let marked: Marked<String> = Marked {
        value: 3,
        marker: PhantomData,
    };
    assert_eq!(marked.value, 3);
}
