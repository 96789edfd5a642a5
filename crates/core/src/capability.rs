//! Principals, capabilities and post visibility rules.
//!
//! The REST surface authenticates each request into a [`Principal`] carrying a capability
//! set. Visibility of stored posts is decided here:
//! - published posts are readable by anyone,
//! - drafts require the edit capability,
//! - attachments are invisible under the base rule; [`can_read_post`] grants them to
//!   principals holding [`Capability::EditPosts`], which is what media workflows need when
//!   the base rule would otherwise lock editors out of their own uploads.

use crate::store::{PostStatus, PostType, StoredPost};

/// A grantable capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Create and modify posts, read drafts and attachments, and write registered
    /// metadata fields.
    EditPosts,
}

impl Capability {
    /// Stable wire name for this capability, as exposed by the field schema endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::EditPosts => "edit_posts",
        }
    }
}

/// An authenticated (or anonymous) caller.
#[derive(Clone, Debug)]
pub struct Principal {
    name: &'static str,
    capabilities: &'static [Capability],
}

impl Principal {
    /// The unauthenticated caller. Holds no capabilities.
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous",
            capabilities: &[],
        }
    }

    /// A caller that presented the editor API key.
    pub fn editor() -> Self {
        Self {
            name: "editor",
            capabilities: &[Capability::EditPosts],
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Decides whether `principal` may read `post`.
///
/// # Arguments
///
/// * `principal` - The caller, as produced by request authentication.
/// * `post` - The stored record under consideration.
///
/// # Returns
///
/// `true` when the post is visible to the caller.
pub fn can_read_post(principal: &Principal, post: &StoredPost) -> bool {
    match post.post_type {
        // the base rule never exposes attachments; editors get them via this override
        PostType::Attachment => principal.can(Capability::EditPosts),
        PostType::Post => match post.status {
            PostStatus::Published => true,
            PostStatus::Draft => principal.can(Capability::EditPosts),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post_id::PostId;
    use chrono::Utc;

    fn sample_post(post_type: PostType, status: PostStatus) -> StoredPost {
        let now = Utc::now();
        StoredPost {
            id: PostId::new(),
            post_type,
            status,
            title: "Sample".into(),
            slug: "sample".into(),
            content: String::new(),
            excerpt: String::new(),
            featured_media: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_published_posts_are_public() {
        let post = sample_post(PostType::Post, PostStatus::Published);
        assert!(can_read_post(&Principal::anonymous(), &post));
        assert!(can_read_post(&Principal::editor(), &post));
    }

    #[test]
    fn test_drafts_require_edit_capability() {
        let post = sample_post(PostType::Post, PostStatus::Draft);
        assert!(!can_read_post(&Principal::anonymous(), &post));
        assert!(can_read_post(&Principal::editor(), &post));
    }

    #[test]
    fn test_attachments_hidden_from_anonymous_callers() {
        let attachment = sample_post(PostType::Attachment, PostStatus::Published);
        assert!(!can_read_post(&Principal::anonymous(), &attachment));
    }

    #[test]
    fn test_attachments_visible_to_editors() {
        let attachment = sample_post(PostType::Attachment, PostStatus::Published);
        assert!(can_read_post(&Principal::editor(), &attachment));
    }

    #[test]
    fn test_principal_capability_checks() {
        assert!(Principal::editor().can(Capability::EditPosts));
        assert!(!Principal::anonymous().can(Capability::EditPosts));
        assert_eq!(Principal::editor().name(), "editor");
        assert_eq!(Capability::EditPosts.as_str(), "edit_posts");
    }
}
