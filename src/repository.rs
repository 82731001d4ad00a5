use crate::models::{
    Category, Comment, CreateCategoryRequest, CreatePostRequest, DashboardStats, NewUser, Post,
    PostFilter, PostStatus, UpdateCategoryRequest, UpdatePostRequest, UpdateUserRequest, User,
    UserFilter,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The persistence API. Handlers only depend on this trait; the Postgres
/// implementation below and in-memory test doubles both satisfy it.
/// `None`/`false` mean "no such row"; `Err` is a store failure.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self, filter: &UserFilter) -> RepoResult<(Vec<User>, i64)>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> RepoResult<Option<User>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool>;
    // `None` removes the avatar.
    async fn set_avatar(&self, id: Uuid, avatar: Option<String>) -> RepoResult<Option<User>>;
    // Authored posts and comments go with the user (FK cascade).
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;

    // --- Posts ---
    async fn list_posts(&self, filter: &PostFilter) -> RepoResult<(Vec<Post>, i64)>;
    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>>;
    async fn get_post_by_slug(&self, slug: &str) -> RepoResult<Option<Post>>;
    async fn create_post(&self, req: CreatePostRequest, author_id: Uuid) -> RepoResult<Post>;
    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> RepoResult<Option<Post>>;
    async fn replace_post(&self, id: Uuid, req: CreatePostRequest) -> RepoResult<Option<Post>>;
    // Bumps `view_count` and returns the updated post.
    async fn record_post_view(&self, id: Uuid) -> RepoResult<Option<Post>>;
    async fn delete_post(&self, id: Uuid) -> RepoResult<bool>;

    // --- Categories ---
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>>;
    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category>;
    async fn update_category(&self, id: Uuid, req: UpdateCategoryRequest) -> RepoResult<Option<Category>>;
    // Posts in the category are detached, never deleted.
    async fn delete_category(&self, id: Uuid) -> RepoResult<bool>;

    // --- Comments ---
    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<Comment>>;
    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>>;
    async fn create_comment(&self, post_id: Uuid, user_id: Uuid, content: String) -> RepoResult<Comment>;
    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool>;

    // --- Dashboard ---
    async fn get_stats(&self) -> RepoResult<DashboardStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, name, email, password, role, avatar, bio, website, github, linkedin, twitter, created_at, updated_at";
const POST_COLUMNS: &str = "id, title, slug, content, excerpt, tags, status, featured_image, author_id, category_id, view_count, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";

/// PostgresRepository
///
/// `Repository` backed by a Postgres connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn search_pattern(search: &str) -> String {
    format!("%{}%", search.trim())
}

/// Appends the WHERE clause shared by the post listing and its count query.
fn push_post_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    builder.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = search_pattern(search);
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR excerpt ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR content ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    builder.push(" WHERE TRUE");
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = search_pattern(search);
        builder.push(" AND (name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_users
    ///
    /// Paginated listing with case-insensitive search on name and email.
    async fn list_users(&self, filter: &UserFilter) -> RepoResult<(Vec<User>, i64)> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_user_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_user_filters(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset());
        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password, role, bio, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .bind(user.bio)
        .fetch_one(&self.pool)
        .await
    }

    /// update_user
    ///
    /// COALESCE keeps every column whose field was not provided.
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                bio = COALESCE($5, bio),
                website = COALESCE($6, website),
                github = COALESCE($7, github),
                linkedin = COALESCE($8, linkedin),
                twitter = COALESCE($9, twitter),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.email)
        .bind(req.role)
        .bind(req.bio)
        .bind(req.website)
        .bind(req.github)
        .bind(req.linkedin)
        .bind(req.twitter)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_avatar(&self, id: Uuid, avatar: Option<String>) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// list_posts
    ///
    /// Filtering built with QueryBuilder so every user value is a bind parameter.
    async fn list_posts(&self, filter: &PostFilter) -> RepoResult<(Vec<Post>, i64)> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM posts");
        push_post_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts"));
        push_post_filters(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset());
        let posts = builder.build_query_as::<Post>().fetch_all(&self.pool).await?;

        Ok((posts, total))
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_post_by_slug(&self, slug: &str) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_post(&self, req: CreatePostRequest, author_id: Uuid) -> RepoResult<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, title, slug, content, excerpt, tags, status, featured_image,
                               author_id, category_id, view_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, NOW(), NOW())
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(req.title)
        .bind(req.slug)
        .bind(req.content)
        .bind(req.excerpt)
        .bind(req.tags)
        .bind(req.status)
        .bind(req.featured_image)
        .bind(author_id)
        .bind(req.category_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                content = COALESCE($4, content),
                excerpt = COALESCE($5, excerpt),
                tags = COALESCE($6, tags),
                status = COALESCE($7, status),
                featured_image = COALESCE($8, featured_image),
                category_id = COALESCE($9, category_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.slug)
        .bind(req.content)
        .bind(req.excerpt)
        .bind(req.tags)
        .bind(req.status)
        .bind(req.featured_image)
        .bind(req.category_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// replace_post
    ///
    /// Overwrites every editable column, including clearing optional ones.
    async fn replace_post(&self, id: Uuid, req: CreatePostRequest) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = $2, slug = $3, content = $4, excerpt = $5, tags = $6, status = $7,
                featured_image = $8, category_id = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.slug)
        .bind(req.content)
        .bind(req.excerpt)
        .bind(req.tags)
        .bind(req.status)
        .bind(req.featured_image)
        .bind(req.category_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_post_view(&self, id: Uuid) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// list_categories
    ///
    /// Categories ordered by name with the number of posts attached to each.
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.created_at, c.updated_at,
                   COUNT(p.id) AS post_count
            FROM categories c
            LEFT JOIN posts p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM posts p WHERE p.category_id = c.id) AS post_count
            FROM categories c
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (id, name, slug, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.name)
        .bind(req.slug)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_category(&self, id: Uuid, req: UpdateCategoryRequest) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.slug)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await
    }

    /// delete_category
    ///
    /// Posts are detached explicitly in the same transaction, on top of the
    /// `ON DELETE SET NULL` foreign key.
    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE posts SET category_id = NULL WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.content, c.user_id, c.post_id, c.created_at, c.updated_at,
                   u.name AS author_name
            FROM comments c
            JOIN users u ON c.user_id = u.id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, content, user_id, post_id, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// create_comment
    ///
    /// Insert and author join in one statement via a CTE.
    async fn create_comment(&self, post_id: Uuid, user_id: Uuid, content: String) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (id, content, user_id, post_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, NOW(), NOW())
                RETURNING id, content, user_id, post_id, created_at, updated_at
            )
            SELECT i.id, i.content, i.user_id, i.post_id, i.created_at, i.updated_at,
                   u.name AS author_name
            FROM inserted i JOIN users u ON i.user_id = u.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// get_stats
    ///
    /// All dashboard counters in a single round trip.
    async fn get_stats(&self) -> RepoResult<DashboardStats> {
        let row: (i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts),
                (SELECT COUNT(*) FROM posts WHERE status = $1),
                (SELECT COUNT(*) FROM posts WHERE status = $2),
                (SELECT COUNT(*) FROM categories),
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM comments),
                (SELECT COALESCE(SUM(view_count), 0)::BIGINT FROM posts)
            "#,
        )
        .bind(PostStatus::Published)
        .bind(PostStatus::Draft)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_posts: row.0,
            published_posts: row.1,
            draft_posts: row.2,
            total_categories: row.3,
            total_users: row.4,
            total_comments: row.5,
            total_views: row.6,
        })
    }
}
