#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Utc;
use portfolio_cms::{
    AppConfig, AppState, MockStorageService, create_router,
    auth::issue_token,
    cookies::SESSION_COOKIE,
    models::{
        Category, Comment, CreateCategoryRequest, CreatePostRequest, DashboardStats, NewUser, Post,
        PostFilter, PostStatus, Role, UpdateCategoryRequest, UpdatePostRequest, UpdateUserRequest,
        User, UserFilter,
    },
    password::hash_password,
    repository::{RepoResult, Repository, RepositoryState},
    storage::StorageState,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "secret123";

// --- In-memory repository ---

#[derive(Default)]
struct Store {
    users: Vec<User>,
    posts: Vec<Post>,
    categories: Vec<Category>,
    comments: Vec<Comment>,
}

/// Repository kept in a Mutex. Mirrors the foreign-key behaviour of the schema:
/// deleting a user removes their posts and comments, deleting a post removes its
/// comments, deleting a category detaches its posts.
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

fn page<T: Clone>(items: &[T], offset: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a post directly, bypassing handlers.
    pub fn insert_post(&self, post: Post) -> Post {
        self.store.lock().unwrap().posts.push(post.clone());
        post
    }

    pub fn insert_category(&self, category: Category) -> Category {
        self.store.lock().unwrap().categories.push(category.clone());
        category
    }

    pub fn posts(&self) -> Vec<Post> {
        self.store.lock().unwrap().posts.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.store.lock().unwrap().users.clone()
    }

    pub fn stored_password(&self, id: Uuid) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .and_then(|u| u.password.clone())
    }

    fn category_with_count(store: &Store, category: &Category) -> Category {
        let mut category = category.clone();
        category.post_count = store
            .posts
            .iter()
            .filter(|p| p.category_id == Some(category.id))
            .count() as i64;
        category
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_users(&self, filter: &UserFilter) -> RepoResult<(Vec<User>, i64)> {
        let store = self.store.lock().unwrap();
        let mut users: Vec<User> = store
            .users
            .iter()
            .filter(|u| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|s| contains_ci(&u.name, s) || contains_ci(&u.email, s))
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = users.len() as i64;
        Ok((page(&users, filter.offset(), filter.limit), total))
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.store.lock().unwrap().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            bio: user.bio,
            created_at: now,
            updated_at: now,
            ..User::default()
        };
        self.store.lock().unwrap().users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> RepoResult<Option<User>> {
        let mut store = self.store.lock().unwrap();
        let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            user.name = name;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        if req.bio.is_some() {
            user.bio = req.bio;
        }
        if req.website.is_some() {
            user.website = req.website;
        }
        if req.github.is_some() {
            user.github = req.github;
        }
        if req.linkedin.is_some() {
            user.linkedin = req.linkedin;
        }
        if req.twitter.is_some() {
            user.twitter = req.twitter;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        match store.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password = Some(password_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_avatar(&self, id: Uuid, avatar: Option<String>) -> RepoResult<Option<User>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.avatar = avatar;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        let removed_posts: Vec<Uuid> = store
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        store.posts.retain(|p| p.author_id != id);
        store
            .comments
            .retain(|c| c.user_id != id && !removed_posts.contains(&c.post_id));
        Ok(store.users.len() < before)
    }

    async fn list_posts(&self, filter: &PostFilter) -> RepoResult<(Vec<Post>, i64)> {
        let store = self.store.lock().unwrap();
        let mut posts: Vec<Post> = store
            .posts
            .iter()
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| filter.category_id.is_none_or(|c| p.category_id == Some(c)))
            .filter(|p| {
                filter.search.as_deref().is_none_or(|s| {
                    contains_ci(&p.title, s)
                        || contains_ci(&p.content, s)
                        || p.excerpt.as_deref().is_some_and(|e| contains_ci(e, s))
                })
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = posts.len() as i64;
        Ok((page(&posts, filter.offset(), filter.limit), total))
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        Ok(self.store.lock().unwrap().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_post_by_slug(&self, slug: &str) -> RepoResult<Option<Post>> {
        Ok(self.store.lock().unwrap().posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create_post(&self, req: CreatePostRequest, author_id: Uuid) -> RepoResult<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: req.title,
            slug: req.slug,
            content: req.content,
            excerpt: req.excerpt,
            tags: req.tags,
            status: req.status,
            featured_image: req.featured_image,
            author_id,
            category_id: req.category_id,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> RepoResult<Option<Post>> {
        let mut store = self.store.lock().unwrap();
        let Some(post) = store.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            post.title = title;
        }
        if let Some(slug) = req.slug {
            post.slug = slug;
        }
        if let Some(content) = req.content {
            post.content = content;
        }
        if req.excerpt.is_some() {
            post.excerpt = req.excerpt;
        }
        if let Some(tags) = req.tags {
            post.tags = tags;
        }
        if let Some(status) = req.status {
            post.status = status;
        }
        if req.featured_image.is_some() {
            post.featured_image = req.featured_image;
        }
        if req.category_id.is_some() {
            post.category_id = req.category_id;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn replace_post(&self, id: Uuid, req: CreatePostRequest) -> RepoResult<Option<Post>> {
        let mut store = self.store.lock().unwrap();
        let Some(post) = store.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = req.title;
        post.slug = req.slug;
        post.content = req.content;
        post.excerpt = req.excerpt;
        post.tags = req.tags;
        post.status = req.status;
        post.featured_image = req.featured_image;
        post.category_id = req.category_id;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn record_post_view(&self, id: Uuid) -> RepoResult<Option<Post>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.view_count += 1;
            post.clone()
        }))
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.posts.len();
        store.posts.retain(|p| p.id != id);
        store.comments.retain(|c| c.post_id != id);
        Ok(store.posts.len() < before)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let store = self.store.lock().unwrap();
        let mut categories: Vec<Category> = store
            .categories
            .iter()
            .map(|c| Self::category_with_count(&store, c))
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| Self::category_with_count(&store, c)))
    }

    async fn get_category_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: req.name,
            slug: req.slug,
            description: req.description,
            created_at: now,
            updated_at: now,
            post_count: 0,
        };
        self.store.lock().unwrap().categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, req: UpdateCategoryRequest) -> RepoResult<Option<Category>> {
        let mut store = self.store.lock().unwrap();
        let Some(category) = store.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            category.name = name;
        }
        if let Some(slug) = req.slug {
            category.slug = slug;
        }
        if req.description.is_some() {
            category.description = req.description;
        }
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.categories.len();
        store.categories.retain(|c| c.id != id);
        if store.categories.len() == before {
            return Ok(false);
        }
        for post in store.posts.iter_mut().filter(|p| p.category_id == Some(id)) {
            post.category_id = None;
        }
        Ok(true)
    }

    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<Comment>> {
        let store = self.store.lock().unwrap();
        let mut comments: Vec<Comment> = store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        Ok(self.store.lock().unwrap().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create_comment(&self, post_id: Uuid, user_id: Uuid, content: String) -> RepoResult<Comment> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();
        let author_name = store.users.iter().find(|u| u.id == user_id).map(|u| u.name.clone());
        let comment = Comment {
            id: Uuid::new_v4(),
            content,
            user_id,
            post_id,
            created_at: now,
            updated_at: now,
            author_name,
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.comments.len();
        store.comments.retain(|c| c.id != id);
        Ok(store.comments.len() < before)
    }

    async fn get_stats(&self) -> RepoResult<DashboardStats> {
        let store = self.store.lock().unwrap();
        let published = store
            .posts
            .iter()
            .filter(|p| p.status == PostStatus::Published)
            .count() as i64;
        Ok(DashboardStats {
            total_posts: store.posts.len() as i64,
            published_posts: published,
            draft_posts: store.posts.len() as i64 - published,
            total_categories: store.categories.len() as i64,
            total_users: store.users.len() as i64,
            total_comments: store.comments.len() as i64,
            total_views: store.posts.iter().map(|p| p.view_count).sum(),
        })
    }
}

// --- Application under test ---

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepository>,
    pub storage: MockStorageService,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(MockStorageService::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let config = AppConfig::default();
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage.clone()) as StorageState,
            config: config.clone(),
        };
        Self {
            router: create_router(state),
            repo,
            storage,
            config,
        }
    }

    /// Creates a user with `TEST_PASSWORD`.
    pub async fn user(&self, role: Role, email: &str) -> User {
        self.repo
            .create_user(NewUser {
                name: format!("{:?} {}", role, email),
                email: email.to_string(),
                password_hash: Some(hash_password(TEST_PASSWORD).unwrap()),
                role,
                bio: None,
            })
            .await
            .unwrap()
    }

    /// `Cookie` header value carrying a valid session for `user`.
    pub fn cookie_for(&self, user: &User) -> String {
        let token = issue_token(&self.config.jwt_secret, user).unwrap();
        format!("{}={}", SESSION_COOKIE, token)
    }

    pub fn post(&self, author_id: Uuid, slug: &str, status: PostStatus) -> Post {
        let now = Utc::now();
        self.repo.insert_post(Post {
            id: Uuid::new_v4(),
            title: format!("Title {}", slug),
            slug: slug.to_string(),
            content: "Body".to_string(),
            status,
            author_id,
            created_at: now,
            updated_at: now,
            ..Post::default()
        })
    }

    pub fn category(&self, slug: &str) -> Category {
        let now = Utc::now();
        self.repo.insert_category(Category {
            id: Uuid::new_v4(),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            created_at: now,
            updated_at: now,
            ..Category::default()
        })
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            text,
            json,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(json_request(Method::GET, uri, None, cookie)).await
    }

    pub async fn call(&self, method: Method, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.send(json_request(method, uri, Some(body), cookie)).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub json: Value,
}

impl TestResponse {
    pub fn error(&self) -> &str {
        self.json["error"].as_str().unwrap_or_default()
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

pub fn json_request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

const BOUNDARY: &str = "portfolio-test-boundary";

/// Multipart request with a single `file` field.
pub fn multipart_request(
    method: Method,
    uri: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
    cookie: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}
