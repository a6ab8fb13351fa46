use crate::config::DatabaseConfig;
use crate::error::ApiError;
use crate::media::{MediaStorage, StoredImage};
use crate::models::category::{Category, CreateCategoryRequest};
use crate::models::comment::{Comment, CreateCommentRequest, UpdateCommentRequest};
use crate::models::like::{CreateLikeRequest, Like, LikeTarget, LikeTargetKind};
use crate::models::post::{CreatePostRequest, Post, UpdatePostRequest};
use crate::models::post_image::{PostImage, UpdatePostImageRequest};
use crate::models::user::{CreateUserRequest, User};
use deadpool_postgres::{Config, Object, Pool, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How many fresh storage paths to try before giving up on a collision.
const MAX_PATH_ATTEMPTS: usize = 5;

/// Column list shared by every post query; see `post_from_row`.
const POST_COLUMNS: &str = r#"
    p.id, p.title, p.author_id, p.description, p.created_at, p.status,
    ARRAY(
        SELECT pc.category_id FROM post_categories pc
        WHERE pc.post_id = p.id ORDER BY pc.category_id
    ) AS category_ids,
    (
        SELECT COUNT(*) FROM likes l
        WHERE l.target_kind = 'post' AND l.target_id = p.id
    ) AS total_likes
"#;

const POST_IMAGE_COLUMNS: &str =
    "id, post_id, image_path, content_type, size, width, height, created_at";

const COMMENT_COLUMNS: &str = "id, post_id, user_id, body, created";

const LIKE_COLUMNS: &str = "id, user_id, target_kind, target_id, created_at";

/// Schema, applied in order by `migrate`. Every statement is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "post_status type",
        r#"
        DO $$ BEGIN
            CREATE TYPE post_status AS ENUM ('draft', 'published');
        EXCEPTION WHEN duplicate_object THEN NULL;
        END $$
        "#,
    ),
    (
        "like_target_kind type",
        r#"
        DO $$ BEGIN
            CREATE TYPE like_target_kind AS ENUM ('post');
        EXCEPTION WHEN duplicate_object THEN NULL;
        END $$
        "#,
    ),
    (
        "users table",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            username VARCHAR(150) UNIQUE NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "categories table",
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id SERIAL PRIMARY KEY,
            name VARCHAR(100) UNIQUE NOT NULL
        )
        "#,
    ),
    (
        "posts table",
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id SERIAL PRIMARY KEY,
            title VARCHAR(250) NOT NULL CHECK (btrim(title) <> ''),
            author_id UUID REFERENCES users(id) ON DELETE CASCADE,
            description TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
            status post_status NOT NULL DEFAULT 'draft'
        )
        "#,
    ),
    (
        "posts created_at index",
        "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC)",
    ),
    (
        "post_categories table",
        r#"
        CREATE TABLE IF NOT EXISTS post_categories (
            post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            PRIMARY KEY (post_id, category_id)
        )
        "#,
    ),
    (
        "post_images table",
        r#"
        CREATE TABLE IF NOT EXISTS post_images (
            id SERIAL PRIMARY KEY,
            post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            image_path VARCHAR(255) NOT NULL UNIQUE,
            content_type VARCHAR(100) NOT NULL,
            size BIGINT NOT NULL CHECK (size >= 0),
            width INTEGER NOT NULL,
            height INTEGER NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "post_images post_id index",
        "CREATE INDEX IF NOT EXISTS idx_post_images_post_id ON post_images(post_id)",
    ),
    (
        "comments table",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id SERIAL PRIMARY KEY,
            post_id INTEGER REFERENCES posts(id) ON DELETE CASCADE,
            user_id UUID REFERENCES users(id) ON DELETE CASCADE,
            body TEXT NOT NULL CHECK (btrim(body) <> ''),
            created TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
        )
        "#,
    ),
    (
        "comments post_id index",
        "CREATE INDEX IF NOT EXISTS idx_comments_post_created ON comments(post_id, created DESC)",
    ),
    (
        "likes table",
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            id SERIAL PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            target_kind like_target_kind NOT NULL,
            target_id INTEGER NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
        )
        "#,
    ),
    (
        "likes target index",
        "CREATE INDEX IF NOT EXISTS idx_likes_target ON likes(target_kind, target_id)",
    ),
];

/// Repository over a deadpool PostgreSQL pool. Every entity operation lives here.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Build the pool and make sure a connection can be checked out.
    pub async fn new(config: DatabaseConfig) -> Result<Self, ApiError> {
        info!("Creating PostgreSQL connection pool for host: {}:{}", config.host, config.port);

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.test_connection().await?;

        Ok(db)
    }

    fn create_pool(config: DatabaseConfig) -> Result<Pool, ApiError> {
        let mut pg_config = Config::new();

        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        if !config.password.is_empty() {
            pg_config.password = Some(config.password);
        }

        pg_config.ssl_mode = Some(match config.ssl_mode.as_str() {
            "disable" => deadpool_postgres::SslMode::Disable,
            "require" => deadpool_postgres::SslMode::Require,
            "prefer" => deadpool_postgres::SslMode::Prefer,
            other => {
                warn!("Unknown SSL mode '{}', defaulting to 'prefer'", other);
                deadpool_postgres::SslMode::Prefer
            }
        });

        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        let mut pool_config = deadpool_postgres::PoolConfig::new(config.max_connections as usize);
        pool_config.timeouts.wait = Some(config.connection_timeout);
        pool_config.timeouts.create = Some(config.connection_timeout);
        pg_config.pool = Some(pool_config);

        let tls_connector = TlsConnector::builder()
            .build()
            .map_err(|e| {
                error!("Failed to create TLS connector: {}", e);
                ApiError::Storage(format!("TLS connector creation failed: {}", e))
            })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                ApiError::Storage(format!("Connection pool creation failed: {}", e))
            })
    }

    async fn get_connection(&self) -> Result<Object, ApiError> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// `SELECT 1` round trip, used by `/health`.
    pub async fn health_check(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[])
            .await
            .map_err(|e| {
                error!("Database health check failed: {}", e);
                ApiError::Storage(format!("Health check failed: {}", e))
            })?;

        Ok(())
    }

    pub async fn test_connection(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[])
            .await
            .map_err(|e| {
                error!("Database connection test failed: {}", e);
                ApiError::Storage(format!("Database unavailable: {}", e))
            })?;

        info!("Database connection test successful");
        Ok(())
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), ApiError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        for (name, statement) in MIGRATIONS {
            client.batch_execute(statement)
                .await
                .map_err(|e| {
                    error!("Failed to create {}: {}", name, e);
                    ApiError::Storage(format!("Migration '{}' failed: {}", name, e))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    // User repository operations

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let user = request.into_user();
        let client = self.get_connection().await?;

        let row = client.query_one(
            "INSERT INTO users (id, username, created_at) VALUES ($1, $2, $3) RETURNING id, username, created_at",
            &[&user.id, &user.username, &user.created_at],
        )
        .await
        .map_err(ApiError::from)?;

        let created_user = User {
            id: row.get(0),
            username: row.get(1),
            created_at: row.get(2),
        };

        info!("Created user with id: {}", created_user.id);
        Ok(created_user)
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, ApiError> {
        let client = self.get_connection().await?;

        let row = client.query_opt("SELECT id, username, created_at FROM users WHERE id = $1", &[&user_id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(User {
                id: row.get(0),
                username: row.get(1),
                created_at: row.get(2),
            }),
            None => Err(ApiError::NotFound(format!("User with id {}", user_id))),
        }
    }

    // Category repository operations

    pub async fn create_category(&self, request: CreateCategoryRequest) -> Result<Category, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let name = request.get_normalized_name();
        let client = self.get_connection().await?;

        let row = client.query_one(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
            &[&name],
        )
        .await
        .map_err(ApiError::from)?;

        let category = Category {
            id: row.get(0),
            name: row.get(1),
        };

        info!("Created category with id: {}", category.id);
        Ok(category)
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>, ApiError> {
        let client = self.get_connection().await?;

        let rows = client.query("SELECT id, name FROM categories ORDER BY name", &[])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(|row| Category { id: row.get(0), name: row.get(1) }).collect())
    }

    // Post repository operations

    /// Insert a post and its category links in one transaction.
    pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let title = request.get_normalized_title();
        let category_ids = request.get_normalized_category_ids();

        let mut client = self.get_connection().await?;
        let transaction = client.transaction().await?;

        let row = transaction.query_one(
            r#"
            INSERT INTO posts (title, author_id, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
            &[&title, &request.author_id, &request.description, &request.status],
        )
        .await?;
        let post_id: i32 = row.get(0);

        link_categories(&transaction, post_id, &category_ids).await?;
        transaction.commit().await?;

        info!("Created post with id: {}", post_id);
        self.get_post_by_id(post_id).await
    }

    pub async fn get_post_by_id(&self, post_id: i32) -> Result<Post, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM posts p WHERE p.id = $1", POST_COLUMNS);

        let row = client.query_opt(&query, &[&post_id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(post_from_row(&row)),
            None => Err(ApiError::NotFound(format!("Post with id {}", post_id))),
        }
    }

    /// All posts, newest first.
    pub async fn get_all_posts(&self) -> Result<Vec<Post>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM posts p ORDER BY p.created_at DESC, p.id DESC",
            POST_COLUMNS
        );

        let rows = client.query(&query, &[])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Apply a partial update. `created_at` is never written.
    pub async fn update_post(&self, post_id: i32, request: UpdatePostRequest) -> Result<Post, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let title = request.get_normalized_title();
        let category_ids = request.get_normalized_category_ids();

        let mut client = self.get_connection().await?;
        let transaction = client.transaction().await?;

        let rows_affected = if request.has_row_changes() {
            let mut assignments = Vec::new();
            let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

            if let Some(ref title) = title {
                params.push(title);
                assignments.push(format!("title = ${}", params.len()));
            }

            if let Some(ref description) = request.description {
                params.push(description);
                assignments.push(format!("description = ${}", params.len()));
            }

            if let Some(ref status) = request.status {
                params.push(status);
                assignments.push(format!("status = ${}", params.len()));
            }

            params.push(&post_id);
            let query = format!(
                "UPDATE posts SET {} WHERE id = ${}",
                assignments.join(", "),
                params.len()
            );

            transaction.execute(&query, &params).await?
        } else {
            transaction
                .execute("SELECT 1 FROM posts WHERE id = $1 FOR UPDATE", &[&post_id])
                .await?
        };

        if rows_affected == 0 {
            return Err(ApiError::NotFound(format!("Post with id {}", post_id)));
        }

        if let Some(ref category_ids) = category_ids {
            transaction
                .execute("DELETE FROM post_categories WHERE post_id = $1", &[&post_id])
                .await?;
            link_categories(&transaction, post_id, category_ids).await?;
        }

        transaction.commit().await?;

        info!("Updated post with id: {}", post_id);
        self.get_post_by_id(post_id).await
    }

    /// Delete a post together with its images, comments, category links and likes.
    /// Returns the storage paths of the removed images so their files can be cleaned up.
    pub async fn delete_post(&self, post_id: i32) -> Result<Vec<String>, ApiError> {
        let mut client = self.get_connection().await?;
        let transaction = client.transaction().await?;

        // Waits for in-flight image and like inserts holding FOR SHARE, so the
        // statements below see their rows
        let post = transaction
            .query_opt("SELECT 1 FROM posts WHERE id = $1 FOR UPDATE", &[&post_id])
            .await?;
        if post.is_none() {
            return Err(ApiError::NotFound(format!("Post with id {}", post_id)));
        }

        let image_paths: Vec<String> = transaction
            .query(
                "DELETE FROM post_images WHERE post_id = $1 RETURNING image_path",
                &[&post_id],
            )
            .await?
            .iter()
            .map(|row| row.get(0))
            .collect();

        // Likes point at posts through (kind, id) only, so no FK cascade reaches them
        let likes_removed = transaction
            .execute(
                "DELETE FROM likes WHERE target_kind = $1 AND target_id = $2",
                &[&LikeTargetKind::Post, &post_id],
            )
            .await?;

        transaction
            .execute("DELETE FROM posts WHERE id = $1", &[&post_id])
            .await?;

        transaction.commit().await?;

        info!(
            "Deleted post with id: {} ({} images, {} likes)",
            post_id,
            image_paths.len(),
            likes_removed
        );
        Ok(image_paths)
    }

    // Post image repository operations

    /// Persist a freshly ingested image for `post_id`.
    ///
    /// The row is inserted and the bytes are written inside one transaction;
    /// a failed write rolls the row back. A storage path that is already taken
    /// is replaced with a new random one, up to `MAX_PATH_ATTEMPTS` times.
    pub async fn create_post_image(
        &self,
        post_id: i32,
        mut image: StoredImage,
        storage: &MediaStorage,
    ) -> Result<PostImage, ApiError> {
        let size = i64::try_from(image.size)
            .map_err(|_| ApiError::constraint("Image is too large"))?;
        let width = i32::try_from(image.width)
            .map_err(|_| ApiError::constraint("Image is too wide"))?;
        let height = i32::try_from(image.height)
            .map_err(|_| ApiError::constraint("Image is too tall"))?;

        let mut client = self.get_connection().await?;
        let transaction = client.transaction().await?;

        let post = transaction
            .query_opt("SELECT 1 FROM posts WHERE id = $1 FOR SHARE", &[&post_id])
            .await?;
        if post.is_none() {
            return Err(ApiError::NotFound(format!("Post with id {}", post_id)));
        }

        let query = format!(
            r#"
            INSERT INTO post_images (post_id, image_path, content_type, size, width, height)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (image_path) DO NOTHING
            RETURNING {}
            "#,
            POST_IMAGE_COLUMNS
        );

        for attempt in 1..=MAX_PATH_ATTEMPTS {
            let path = image.storage_path();
            let content_type = image.content_type;

            let row = transaction
                .query_opt(&query, &[&post_id, &path, &content_type, &size, &width, &height])
                .await?;

            let Some(row) = row else {
                warn!(
                    "Storage path {} already taken (attempt {}/{})",
                    path, attempt, MAX_PATH_ATTEMPTS
                );
                image.reroll_path();
                continue;
            };

            let created = post_image_from_row(&row);
            if let Err(e) = storage.save(&created.image_path, &image.data).await {
                // The row rolls back with the dropped transaction; drop any partial file too
                if let Err(cleanup) = storage.remove(&created.image_path).await {
                    warn!("Failed to remove partial {}: {}", created.image_path, cleanup);
                }
                return Err(ApiError::from(e));
            }

            if let Err(e) = transaction.commit().await {
                if let Err(cleanup) = storage.remove(&created.image_path).await {
                    warn!("Failed to remove {} after rollback: {}", created.image_path, cleanup);
                }
                return Err(ApiError::from(e));
            }

            info!("Created post image {} at {}", created.id, created.image_path);
            return Ok(created);
        }

        Err(ApiError::conflict("Could not allocate a unique image path"))
    }

    pub async fn get_post_image_by_id(&self, image_id: i32) -> Result<PostImage, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM post_images WHERE id = $1", POST_IMAGE_COLUMNS);

        let row = client.query_opt(&query, &[&image_id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(post_image_from_row(&row)),
            None => Err(ApiError::NotFound(format!("Post image with id {}", image_id))),
        }
    }

    pub async fn get_images_for_post(&self, post_id: i32) -> Result<Vec<PostImage>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM post_images WHERE post_id = $1 ORDER BY id",
            POST_IMAGE_COLUMNS
        );

        let rows = client.query(&query, &[&post_id])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(post_image_from_row).collect())
    }

    /// Change which post an image belongs to. The stored bytes and path are untouched.
    pub async fn update_post_image(
        &self,
        image_id: i32,
        request: UpdatePostImageRequest,
    ) -> Result<PostImage, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let client = self.get_connection().await?;
        let query = format!(
            "UPDATE post_images SET post_id = $1 WHERE id = $2 RETURNING {}",
            POST_IMAGE_COLUMNS
        );

        let row = client.query_opt(&query, &[&request.post_id, &image_id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => {
                info!("Moved post image {} to post {}", image_id, request.post_id);
                Ok(post_image_from_row(&row))
            }
            None => Err(ApiError::NotFound(format!("Post image with id {}", image_id))),
        }
    }

    // Comment repository operations

    pub async fn create_comment(
        &self,
        post_id: Option<i32>,
        request: CreateCommentRequest,
    ) -> Result<Comment, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let body = request.get_normalized_body();
        let client = self.get_connection().await?;
        let query = format!(
            "INSERT INTO comments (post_id, user_id, body) VALUES ($1, $2, $3) RETURNING {}",
            COMMENT_COLUMNS
        );

        let row = client.query_one(&query, &[&post_id, &request.user_id, &body])
            .await
            .map_err(ApiError::from)?;

        let comment = comment_from_row(&row);
        info!("Created comment with id: {}", comment.id);
        Ok(comment)
    }

    pub async fn get_comment_by_id(&self, comment_id: i32) -> Result<Comment, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);

        let row = client.query_opt(&query, &[&comment_id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(comment_from_row(&row)),
            None => Err(ApiError::NotFound(format!("Comment with id {}", comment_id))),
        }
    }

    /// Comments on one post, newest first.
    pub async fn get_comments_for_post(&self, post_id: i32) -> Result<Vec<Comment>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM comments WHERE post_id = $1 ORDER BY created DESC, id DESC",
            COMMENT_COLUMNS
        );

        let rows = client.query(&query, &[&post_id])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    /// Every comment, newest first.
    pub async fn get_all_comments(&self) -> Result<Vec<Comment>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM comments ORDER BY created DESC, id DESC",
            COMMENT_COLUMNS
        );

        let rows = client.query(&query, &[])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn update_comment(
        &self,
        comment_id: i32,
        request: UpdateCommentRequest,
    ) -> Result<Comment, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let body = request.get_normalized_body();
        let client = self.get_connection().await?;
        let query = format!(
            "UPDATE comments SET body = $1 WHERE id = $2 RETURNING {}",
            COMMENT_COLUMNS
        );

        let row = client.query_opt(&query, &[&body, &comment_id])
            .await
            .map_err(ApiError::from)?;

        match row {
            Some(row) => Ok(comment_from_row(&row)),
            None => Err(ApiError::NotFound(format!("Comment with id {}", comment_id))),
        }
    }

    pub async fn delete_comment(&self, comment_id: i32) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        let rows_affected = client.execute("DELETE FROM comments WHERE id = $1", &[&comment_id])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            Err(ApiError::NotFound(format!("Comment with id {}", comment_id)))
        } else {
            info!("Deleted comment with id: {}", comment_id);
            Ok(())
        }
    }

    // Like repository operations

    /// Whether the entity a target names exists, looked up in the table for its kind.
    pub async fn resolve_like_target(&self, target: LikeTarget) -> Result<bool, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            target.kind().table()
        );

        let row = client.query_one(&query, &[&target.id()])
            .await
            .map_err(ApiError::from)?;

        Ok(row.get(0))
    }

    /// Record a like. The target must exist and stays locked until the insert commits.
    pub async fn create_like(&self, request: CreateLikeRequest) -> Result<Like, ApiError> {
        request.validate().map_err(ApiError::Constraint)?;

        let target = request.target;
        let mut client = self.get_connection().await?;
        let transaction = client.transaction().await?;

        let lookup = format!("SELECT 1 FROM {} WHERE id = $1 FOR SHARE", target.kind().table());
        if transaction.query_opt(&lookup, &[&target.id()]).await?.is_none() {
            return Err(ApiError::NotFound(format!("Like target {}", target)));
        }

        let query = format!(
            "INSERT INTO likes (user_id, target_kind, target_id) VALUES ($1, $2, $3) RETURNING {}",
            LIKE_COLUMNS
        );
        let row = transaction
            .query_one(&query, &[&request.user_id, &target.kind(), &target.id()])
            .await?;
        transaction.commit().await?;

        let like = like_from_row(&row);
        info!("User {} liked {}", like.user_id, like.target);
        Ok(like)
    }

    pub async fn delete_like(&self, like_id: i32) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        let rows_affected = client.execute("DELETE FROM likes WHERE id = $1", &[&like_id])
            .await
            .map_err(ApiError::from)?;

        if rows_affected == 0 {
            Err(ApiError::NotFound(format!("Like with id {}", like_id)))
        } else {
            info!("Deleted like with id: {}", like_id);
            Ok(())
        }
    }

    pub async fn get_likes_for_target(&self, target: LikeTarget) -> Result<Vec<Like>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM likes WHERE target_kind = $1 AND target_id = $2 ORDER BY created_at DESC, id DESC",
            LIKE_COLUMNS
        );

        let rows = client.query(&query, &[&target.kind(), &target.id()])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(like_from_row).collect())
    }

    /// Number of likes on `target`, counted at call time.
    pub async fn total_likes(&self, target: LikeTarget) -> Result<i64, ApiError> {
        let client = self.get_connection().await?;

        let row = client.query_one(
            "SELECT COUNT(*) FROM likes WHERE target_kind = $1 AND target_id = $2",
            &[&target.kind(), &target.id()],
        )
        .await
        .map_err(ApiError::from)?;

        Ok(row.get(0))
    }
}

async fn link_categories(
    transaction: &tokio_postgres::Transaction<'_>,
    post_id: i32,
    category_ids: &[i32],
) -> Result<(), ApiError> {
    if category_ids.is_empty() {
        return Ok(());
    }

    transaction
        .execute(
            "INSERT INTO post_categories (post_id, category_id) SELECT $1, UNNEST($2::INTEGER[])",
            &[&post_id, &category_ids],
        )
        .await?;

    Ok(())
}

fn post_from_row(row: &Row) -> Post {
    Post {
        id: row.get(0),
        title: row.get(1),
        author_id: row.get(2),
        description: row.get(3),
        created_at: row.get(4),
        status: row.get(5),
        category_ids: row.get(6),
        total_likes: row.get(7),
    }
}

fn post_image_from_row(row: &Row) -> PostImage {
    PostImage {
        id: row.get(0),
        post_id: row.get(1),
        image_path: row.get(2),
        content_type: row.get(3),
        size: row.get(4),
        width: row.get(5),
        height: row.get(6),
        created_at: row.get(7),
    }
}

fn comment_from_row(row: &Row) -> Comment {
    Comment {
        id: row.get(0),
        post_id: row.get(1),
        user_id: row.get(2),
        body: row.get(3),
        created: row.get(4),
    }
}

fn like_from_row(row: &Row) -> Like {
    let kind: LikeTargetKind = row.get(2);
    Like {
        id: row.get(0),
        user_id: row.get(1),
        target: LikeTarget::new(kind, row.get(3)),
        created_at: row.get(4),
    }
}
