//! Parameterized queries over the `posts` and `users` tables.
//!
//! Nothing here knows about ownership; callers decide who may touch a row.
//! The only business rule expressed in SQL is the public-only filter on search.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Schema, Set,
};

use crate::entities::{post, user};
use crate::error::StoreError;

/// Title, body and visibility of a post, as written by its owner.
#[derive(Debug, Clone)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub is_public: bool,
}

/// A post row joined with its author's username.
#[derive(Debug, Clone, FromQueryResult)]
pub struct AuthoredPost {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub author: String,
}

/// Create the tables if they are missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut users = schema.create_table_from_entity(user::Entity);
    users.if_not_exists();
    db.execute(backend.build(&users)).await?;

    let mut posts = schema.create_table_from_entity(post::Entity);
    posts.if_not_exists();
    db.execute(backend.build(&posts)).await?;

    Ok(())
}

pub async fn insert_post(
    db: &DatabaseConnection,
    owner: i32,
    fields: PostFields,
) -> Result<post::Model, StoreError> {
    let am = post::ActiveModel {
        title: Set(fields.title),
        content: Set(fields.content),
        is_public: Set(fields.is_public),
        user_id: Set(owner),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

/// Every post owned by `owner`, newest first.
pub async fn posts_by_owner(
    db: &DatabaseConnection,
    owner: i32,
) -> Result<Vec<post::Model>, StoreError> {
    let rows = post::Entity::find()
        .filter(post::Column::UserId.eq(owner))
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

/// Public posts whose title or content contains `term`, ignoring case.
///
/// An empty term matches every public post.
pub async fn search_public(
    db: &DatabaseConnection,
    term: &str,
) -> Result<Vec<AuthoredPost>, StoreError> {
    let pattern = format!("%{}%", term.to_lowercase());
    let rows = authored()
        .filter(post::Column::IsPublic.eq(true))
        .filter(
            Condition::any()
                .add(lower_like(post::Column::Title, &pattern))
                .add(lower_like(post::Column::Content, &pattern)),
        )
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .into_model::<AuthoredPost>()
        .all(db)
        .await?;
    Ok(rows)
}

/// A single post with its author, regardless of visibility.
pub async fn authored_post_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<AuthoredPost>, StoreError> {
    let row = authored()
        .filter(post::Column::Id.eq(id))
        .into_model::<AuthoredPost>()
        .one(db)
        .await?;
    Ok(row)
}

pub async fn post_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<post::Model>, StoreError> {
    Ok(post::Entity::find_by_id(id).one(db).await?)
}

/// Overwrite the editable fields of an existing row.
pub async fn update_post(
    db: &DatabaseConnection,
    existing: post::Model,
    fields: PostFields,
) -> Result<post::Model, StoreError> {
    let mut am: post::ActiveModel = existing.into();
    am.title = Set(fields.title);
    am.content = Set(fields.content);
    am.is_public = Set(fields.is_public);
    Ok(am.update(db).await?)
}

/// Returns the number of rows removed.
pub async fn delete_post(db: &DatabaseConnection, id: i32) -> Result<u64, StoreError> {
    let res = post::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}

/// Insert a user. A taken username surfaces as [`StoreError::Duplicate`].
pub async fn insert_user(
    db: &DatabaseConnection,
    username: String,
    password_hash: String,
) -> Result<user::Model, StoreError> {
    let am = user::ActiveModel {
        username: Set(username),
        password: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>, StoreError> {
    let row = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;
    Ok(row)
}

fn authored() -> sea_orm::Select<post::Entity> {
    post::Entity::find()
        .select_only()
        .columns([
            post::Column::Id,
            post::Column::Title,
            post::Column::Content,
            post::Column::IsPublic,
            post::Column::CreatedAt,
        ])
        .column_as(user::Column::Username, "author")
        .join(JoinType::InnerJoin, post::Relation::User.def())
}

fn lower_like(column: post::Column, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((post::Entity, column)))).like(pattern)
}
