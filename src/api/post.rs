use chrono::{DateTime, Utc};
use poem::web::Data;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use super::Message;
use crate::entities::post;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{self, AuthoredPost, PostFields};
use crate::token::Identity;

/// Characters of content kept in a search result summary.
const SUMMARY_CHARS: usize = 100;

#[derive(Debug, Object)]
pub struct PostInput {
    title: String,
    content: String,
    #[oai(default)]
    is_public: bool,
}

impl From<PostInput> for PostFields {
    fn from(input: PostInput) -> Self {
        Self {
            title: input.title,
            content: input.content,
            is_public: input.is_public,
        }
    }
}

/// A post as its owner sees it in their own listing.
#[derive(Debug, Object)]
pub struct OwnPost {
    id: i32,
    title: String,
    content: String,
    is_public: bool,
    created_at: DateTime<Utc>,
}

/// A public post in search results.
#[derive(Debug, Object)]
pub struct PostSummary {
    id: i32,
    title: String,
    summary: String,
    created_at: DateTime<Utc>,
    author: String,
    is_public: bool,
}

#[derive(Debug, Object)]
pub struct PostDetail {
    id: i32,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    author: String,
    is_public: bool,
}

impl From<AuthoredPost> for PostSummary {
    fn from(row: AuthoredPost) -> Self {
        Self {
            summary: summarize(&row.content),
            id: row.id,
            title: row.title,
            created_at: row.created_at,
            author: row.author,
            is_public: row.is_public,
        }
    }
}

impl From<AuthoredPost> for PostDetail {
    fn from(row: AuthoredPost) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            author: row.author,
            is_public: row.is_public,
        }
    }
}

#[derive(ApiResponse)]
enum CreatedResponse {
    #[oai(status = 201)]
    Created(Json<Message>),
}

fn summarize(content: &str) -> String {
    content.chars().take(SUMMARY_CHARS).collect()
}

pub struct PostApi {
    state: AppState,
}

impl PostApi {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Load a post and make sure `caller` owns it. Absence wins over ownership.
    async fn owned_post(
        &self,
        id: i32,
        caller: &Identity,
        failure: &'static str,
    ) -> Result<post::Model, ApiError> {
        let post = store::post_by_id(&self.state.db, id)
            .await
            .map_err(ApiError::persistence(failure))?
            .ok_or(ApiError::NotFound)?;
        if post.user_id != caller.user_id {
            tracing::debug!(post_id = id, caller = caller.user_id, "ownership check failed");
            return Err(ApiError::Forbidden);
        }
        Ok(post)
    }
}

#[OpenApi]
impl PostApi {
    /// Create a post owned by the caller
    #[oai(path = "/post", method = "post")]
    async fn create(
        &self,
        identity: Data<&Identity>,
        Json(input): Json<PostInput>,
    ) -> poem::Result<CreatedResponse> {
        let post = store::insert_post(&self.state.db, identity.user_id, input.into())
            .await
            .map_err(ApiError::persistence("Failed to create post"))?;
        tracing::info!(post_id = post.id, owner = post.user_id, "post created");
        Ok(CreatedResponse::Created(Json(Message::new(
            "Post created successfully",
        ))))
    }

    /// Posts owned by the caller, newest first
    #[oai(path = "/post/myposts", method = "get")]
    async fn my_posts(&self, identity: Data<&Identity>) -> poem::Result<Json<Vec<OwnPost>>> {
        let rows = store::posts_by_owner(&self.state.db, identity.user_id)
            .await
            .map_err(ApiError::persistence("Failed to fetch your posts"))?;
        let posts = rows
            .into_iter()
            .map(|row| OwnPost {
                id: row.id,
                title: row.title,
                content: row.content,
                is_public: row.is_public,
                created_at: row.created_at,
            })
            .collect();
        Ok(Json(posts))
    }

    /// Public posts, optionally filtered by a title/content substring
    #[oai(path = "/post/get", method = "get")]
    async fn search(
        &self,
        Query(search): Query<Option<String>>,
    ) -> poem::Result<Json<Vec<PostSummary>>> {
        let term = search.unwrap_or_default();
        let rows = store::search_public(&self.state.db, &term)
            .await
            .map_err(ApiError::persistence("Failed to fetch posts"))?;
        Ok(Json(rows.into_iter().map(PostSummary::from).collect()))
    }

    /// A single post by id
    ///
    /// Any authenticated caller may read any post, private or not.
    #[oai(path = "/post/:id", method = "get")]
    async fn get(&self, Path(id): Path<i32>) -> poem::Result<Json<PostDetail>> {
        let row = store::authored_post_by_id(&self.state.db, id)
            .await
            .map_err(ApiError::persistence("Failed to fetch post"))?
            .ok_or(ApiError::NotFound)?;
        Ok(Json(row.into()))
    }

    /// Overwrite a post owned by the caller
    #[oai(path = "/post/:id", method = "put")]
    async fn update(
        &self,
        identity: Data<&Identity>,
        Path(id): Path<i32>,
        Json(input): Json<PostInput>,
    ) -> poem::Result<Json<Message>> {
        const FAILURE: &str = "Update failed";
        let post = self.owned_post(id, identity.0, FAILURE).await?;
        store::update_post(&self.state.db, post, input.into())
            .await
            .map_err(ApiError::persistence(FAILURE))?;
        tracing::info!(post_id = id, "post updated");
        Ok(Json(Message::new("Post updated successfully")))
    }

    /// Delete a post owned by the caller
    #[oai(path = "/post/:id", method = "delete")]
    async fn delete(
        &self,
        identity: Data<&Identity>,
        Path(id): Path<i32>,
    ) -> poem::Result<Json<Message>> {
        const FAILURE: &str = "Deletion failed";
        self.owned_post(id, identity.0, FAILURE).await?;
        store::delete_post(&self.state.db, id)
            .await
            .map_err(ApiError::persistence(FAILURE))?;
        tracing::info!(post_id = id, "post deleted");
        Ok(Json(Message::new("Post deleted successfully")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_keeps_first_hundred_chars() {
        let long = "x".repeat(250);
        assert_eq!(summarize(&long).len(), 100);
        assert_eq!(summarize("short"), "short");
    }

    #[test]
    fn summary_counts_characters_not_bytes() {
        let text = "é".repeat(150);
        let summary = summarize(&text);
        assert_eq!(summary.chars().count(), 100);
        assert_eq!(summary.len(), 200);
    }
}
