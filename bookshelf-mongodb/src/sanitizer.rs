//! Field-name escaping for MongoDB compatibility.
//!
//! MongoDB reserves `.` for path traversal and a leading `$` for operators, and field names
//! cannot contain NUL. Stored keys and the segments of query field paths are escaped on the
//! way in and restored on the way out. Values are never touched.

use bson::Bson;

pub(crate) struct FieldSanitizer;

impl FieldSanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively escapes every document key inside `value`.
    pub(crate) fn sanitize_keys(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(arr.iter().map(Self::sanitize_keys).collect()),
            Bson::Document(doc) => Bson::Document(
                doc.iter()
                    .map(|(k, v)| (Self::sanitize_name(k), Self::sanitize_keys(v)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    /// Inverse of [`FieldSanitizer::sanitize_keys`].
    pub(crate) fn restore_keys(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(arr.iter().map(Self::restore_keys).collect()),
            Bson::Document(doc) => Bson::Document(
                doc.iter()
                    .map(|(k, v)| (Self::restore_name(k), Self::restore_keys(v)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    /// Escapes each segment of a dotted field path, keeping the dots as separators.
    pub(crate) fn sanitize_path(path: &str) -> String {
        path.split('.')
            .map(Self::sanitize_name)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn sanitize_name(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    pub(crate) fn restore_name(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn test_keys_are_escaped_and_values_untouched() {
        let value = Bson::Document(doc! { "a.b": "x.y", "$op": { "c$": 1 } });

        let sanitized = FieldSanitizer::sanitize_keys(&value);
        assert_eq!(
            sanitized,
            Bson::Document(doc! { "a__dot__b": "x.y", "__dollar__op": { "c__dollar__": 1 } })
        );
        assert_eq!(FieldSanitizer::restore_keys(&sanitized), value);
    }

    #[test]
    fn test_paths_keep_separators() {
        assert_eq!(
            FieldSanitizer::sanitize_path("purchaseHistory.$where"),
            "purchaseHistory.__dollar__where"
        );
    }
}
