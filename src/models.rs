use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Book {
    #[serde(default, deserialize_with = "nullable")]
    pub user_book_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub author: String,
    #[serde(default, deserialize_with = "nullable")]
    pub readable_title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cover_image_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub unique_url: String,
    #[serde(default, deserialize_with = "tag_names")]
    pub book_tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: String,
    #[serde(default, deserialize_with = "nullable")]
    pub document_note: String,
    #[serde(default, deserialize_with = "nullable")]
    pub readwise_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub asin: String,
    #[serde(default, deserialize_with = "nullable")]
    pub highlights: Vec<Highlight>,

    /// Year of the first highlight, filled in by [`crate::chronology::derive_order`].
    #[serde(skip)]
    pub first_highlight_year: i32,
    /// Position in the final ordering, used as the anchor label when rendering.
    #[serde(skip)]
    pub display_index: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Highlight {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    pub text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub location: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub location_type: String,
    #[serde(default, deserialize_with = "opaque_token")]
    pub end_location: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub note: String,
    #[serde(default, deserialize_with = "nullable")]
    pub color: String,
    /// Kept verbatim; parsing happens during chronology derivation.
    #[serde(default, deserialize_with = "nullable")]
    pub highlighted_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub external_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub book_id: i64,
    #[serde(default, deserialize_with = "tag_names")]
    pub tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_discard: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub readwise_url: String,
}

impl Book {
    pub fn has_highlights(&self) -> bool {
        !self.highlights.is_empty()
    }
}

/// A wire value the API sends either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OpaqueToken {
    Text(String),
    Number(serde_json::Number),
}

impl OpaqueToken {
    /// Reduces the token to a single string form; `None` when it carries nothing.
    pub fn into_token(self) -> Option<String> {
        let token = match self {
            OpaqueToken::Text(s) => s.trim().to_string(),
            OpaqueToken::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else if let Some(u) = n.as_u64() {
                    u.to_string()
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() => format!("{:.0}", f),
                        _ => String::new(),
                    }
                }
            }
        };

        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

/// Tags arrive as bare names in older payloads and as `{id, name}` objects in newer ones.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Name(String),
    Entry { name: String },
}

impl TagRepr {
    fn into_name(self) -> String {
        match self {
            TagRepr::Name(name) | TagRepr::Entry { name } => name,
        }
    }
}

pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn tag_names<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags: Option<Vec<TagRepr>> = Option::deserialize(deserializer)?;
    Ok(tags
        .unwrap_or_default()
        .into_iter()
        .map(TagRepr::into_name)
        .collect())
}

fn opaque_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let token: Option<OpaqueToken> = Option::deserialize(deserializer)?;
    Ok(token.and_then(OpaqueToken::into_token))
}
