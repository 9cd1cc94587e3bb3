use serde::{Deserialize, Deserializer};

/// A field of a partial-update payload.
///
/// JSON has three states for a key, and `Option<T>` can only express two of them:
///
/// * the key is absent: [`Field::Missing`] (leave the stored value alone),
/// * the key is `null`: [`Field::Null`],
/// * the key carries a value: [`Field::Present`].
///
/// Use it with `#[serde(default)]` so that an absent key falls back to `Missing`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Missing,
    Null,
    Present(T),
}

impl<T> Field<T> {
    /// Maps the carried value, keeping `Missing` and `Null` as they are.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Field::Missing => Field::Missing,
            Field::Null => Field::Null,
            Field::Present(value) => Field::Present(f(value)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the key exists.
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Field::Present(value),
            None => Field::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default)]
        description: Field<String>,
    }

    #[test]
    fn test_field_distinguishes_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.description, Field::Missing);

        let null: Patch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(null.description, Field::Null);

        let empty: Patch = serde_json::from_str(r#"{"description": ""}"#).unwrap();
        assert_eq!(empty.description, Field::Present(String::new()));
    }

    #[test]
    fn test_field_map() {
        let field = Field::Present("  padded ".to_string()).map(|s| s.trim().to_string());
        assert_eq!(field, Field::Present("padded".to_string()));
        assert_eq!(Field::<String>::Missing.map(|s| s.len()), Field::Missing);
    }
}
