//! Post submission rules on top of the post store.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::db::{self, Database, NewPost, Post, DEFAULT_AUTHOR};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Body of `POST /api/posts`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Informational only; nothing ties it to a signed-in user.
    #[serde(default)]
    pub author_id: Option<String>,
}

impl CreatePost {
    /// Check required fields and fill in the default author.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::MissingField`] if title or content is absent or blank.
    pub fn validate(self) -> Result<NewPost, PostError> {
        let title = non_blank(self.title).ok_or(PostError::MissingField("title"))?;
        let content = non_blank(self.content).ok_or(PostError::MissingField("content"))?;
        let author_id = non_blank(self.author_id)
            .map_or_else(|| DEFAULT_AUTHOR.to_string(), |a| a.trim().to_string());

        Ok(NewPost {
            title,
            content,
            author_id,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validate and persist a post.
///
/// # Errors
///
/// Returns a validation error without touching the store, or a store error if
/// the insert fails.
pub async fn create_post(db: &Database, input: CreatePost) -> Result<Post, PostError> {
    let new_post = input.validate()?;
    let post = db::insert_post(db.pool(), &new_post).await?;
    info!(post_id = post.id, author = %post.author_id, "Created post");
    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: Option<&str>, content: Option<&str>, author: Option<&str>) -> CreatePost {
        CreatePost {
            title: title.map(String::from),
            content: content.map(String::from),
            author_id: author.map(String::from),
        }
    }

    #[test]
    fn test_validate_defaults_author() {
        let post = input(Some("Hello"), Some("World"), None).validate().unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.content, "World");
        assert_eq!(post.author_id, "Anonymous");
    }

    #[test]
    fn test_validate_blank_author_is_anonymous() {
        let post = input(Some("Hello"), Some("World"), Some("   "))
            .validate()
            .unwrap();
        assert_eq!(post.author_id, "Anonymous");
    }

    #[test]
    fn test_validate_keeps_author() {
        let post = input(Some("Hello"), Some("World"), Some("ada@example.com"))
            .validate()
            .unwrap();
        assert_eq!(post.author_id, "ada@example.com");
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(matches!(
            input(None, Some("World"), None).validate(),
            Err(PostError::MissingField("title"))
        ));
        assert!(matches!(
            input(Some(""), Some("World"), None).validate(),
            Err(PostError::MissingField("title"))
        ));
        assert!(matches!(
            input(Some("Hello"), Some("  \n"), None).validate(),
            Err(PostError::MissingField("content"))
        ));
    }

    #[test]
    fn test_body_accepts_camel_case_author() {
        let body: CreatePost =
            serde_json::from_str(r#"{"title":"t","content":"c","authorId":"me"}"#).unwrap();
        assert_eq!(body.author_id.as_deref(), Some("me"));

        let body: CreatePost = serde_json::from_str("{}").unwrap();
        assert!(body.title.is_none());
    }
}
