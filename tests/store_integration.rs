//! Entity store tests against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use blog_posts_api::{
    config::DatabaseConfig,
    media::{self, MediaStorage},
    models::{
        CreateCommentRequest, CreateLikeRequest, CreatePostRequest, CreateUserRequest, LikeTarget,
        LikeTargetKind, PostStatus, UpdatePostImageRequest, UpdatePostRequest,
    },
    ApiError, Database,
};
use image::{DynamicImage, GenericImageView, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::time::Duration;
use tokio_postgres::NoTls;
use uuid::Uuid;

async fn database() -> Database {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let config = DatabaseConfig::from_connection_string(&url).expect("valid DATABASE_URL");

    let db = Database::new(config).await.expect("database reachable");
    db.migrate().await.expect("migrations apply");
    db
}

/// A second, independent session for holding locks while `Database` works.
async fn raw_client() -> tokio_postgres::Client {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let (client, connection) = tokio_postgres::connect(&url, NoTls)
        .await
        .expect("database reachable");
    tokio::spawn(connection);
    client
}

fn temp_storage() -> MediaStorage {
    MediaStorage::new(std::env::temp_dir().join(format!("blog-media-{}", Uuid::new_v4())))
}

fn post_request(title: &str) -> CreatePostRequest {
    CreatePostRequest {
        title: title.to_string(),
        author_id: None,
        description: "integration".to_string(),
        status: PostStatus::Draft,
        category_ids: Vec::new(),
    }
}

async fn user(db: &Database) -> Uuid {
    db.create_user(CreateUserRequest {
        username: format!("user-{}", Uuid::new_v4().simple()),
    })
    .await
    .expect("user created")
    .id
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 60, 90])))
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .expect("encode PNG");
    buf
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_post_defaults_and_created_at_is_immutable() {
    let db = database().await;

    let post = db.create_post(post_request("Defaults")).await.expect("post created");
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.author_id, None);
    assert_eq!(post.total_likes, 0);

    let updated = db
        .update_post(
            post.id,
            UpdatePostRequest {
                status: Some(PostStatus::Published),
                ..Default::default()
            },
        )
        .await
        .expect("post updated");

    assert_eq!(updated.status, PostStatus::Published);
    assert_eq!(updated.created_at, post.created_at);
    assert_eq!(updated.title, "Defaults");

    db.delete_post(post.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_posts_are_listed_newest_first() {
    let db = database().await;

    let first = db.create_post(post_request("Older")).await.expect("post created");
    let second = db.create_post(post_request("Newer")).await.expect("post created");

    let posts = db.get_all_posts().await.expect("posts listed");
    let position = |id: i32| posts.iter().position(|p| p.id == id).expect("post listed");
    assert!(position(second.id) < position(first.id));

    for window in posts.windows(2) {
        assert!(window[0].created_at >= window[1].created_at);
    }

    db.delete_post(first.id).await.expect("cleanup");
    db.delete_post(second.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_total_likes_counts_fresh() {
    let db = database().await;
    let liker = user(&db).await;
    let post = db.create_post(post_request("Likeable")).await.expect("post created");
    let target = post.like_target();

    assert_eq!(db.total_likes(target).await.expect("count"), 0);

    let like = db
        .create_like(CreateLikeRequest { user_id: liker, target })
        .await
        .expect("like created");
    assert_eq!(db.total_likes(target).await.expect("count"), 1);

    // No uniqueness: the same user may like twice
    db.create_like(CreateLikeRequest { user_id: liker, target })
        .await
        .expect("second like created");
    assert_eq!(db.total_likes(target).await.expect("count"), 2);
    assert_eq!(db.get_post_by_id(post.id).await.expect("post").total_likes, 2);
    assert_eq!(db.get_likes_for_target(target).await.expect("likes").len(), 2);

    db.delete_like(like.id).await.expect("like deleted");
    assert_eq!(db.total_likes(target).await.expect("count"), 1);

    db.delete_post(post.id).await.expect("cleanup");
    assert_eq!(db.total_likes(target).await.expect("count"), 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_like_requires_existing_target() {
    let db = database().await;
    let liker = user(&db).await;

    let result = db
        .create_like(CreateLikeRequest {
            user_id: liker,
            target: LikeTarget::Post(i32::MAX),
        })
        .await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
    assert!(!db.resolve_like_target(LikeTarget::Post(i32::MAX)).await.expect("lookup"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_comments_are_listed_newest_first() {
    let db = database().await;
    let post = db.create_post(post_request("Discussed")).await.expect("post created");

    for body in ["first", "second", "third"] {
        db.create_comment(
            Some(post.id),
            CreateCommentRequest {
                user_id: None,
                body: body.to_string(),
            },
        )
        .await
        .expect("comment created");
    }

    let bodies: Vec<String> = db
        .get_comments_for_post(post.id)
        .await
        .expect("comments listed")
        .into_iter()
        .map(|c| c.body)
        .collect();
    assert_eq!(bodies, vec!["third", "second", "first"]);

    db.delete_post(post.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_image_is_ingested_once_and_update_keeps_bytes() {
    let db = database().await;
    let storage = temp_storage();
    let post = db.create_post(post_request("Gallery")).await.expect("post created");
    let other = db.create_post(post_request("Other gallery")).await.expect("post created");

    let stored = media::ingest(&png(4000, 3000), "big.png").expect("ingested");
    let image = db
        .create_post_image(post.id, stored, &storage)
        .await
        .expect("image created");

    assert!(image.image_path.starts_with("post_images/"));
    assert!(image.image_path.ends_with(".png"));
    assert_eq!((image.width, image.height), (1020, 573));

    let bytes = storage.read(&image.image_path).await.expect("file written");
    let decoded = image::load_from_memory(&bytes).expect("valid JPEG");
    assert_eq!(decoded.dimensions(), (1020, 573));
    assert_eq!(bytes.len() as i64, image.size);

    let moved = db
        .update_post_image(image.id, UpdatePostImageRequest { post_id: other.id })
        .await
        .expect("image moved");

    assert_eq!(moved.post_id, other.id);
    assert_eq!(moved.image_path, image.image_path);
    assert_eq!(storage.read(&moved.image_path).await.expect("file kept"), bytes);

    db.delete_post(post.id).await.expect("cleanup");
    db.delete_post(other.id).await.expect("cleanup");
    let _ = tokio::fs::remove_dir_all(storage.root()).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_image_for_missing_post_writes_nothing() {
    let db = database().await;
    let storage = temp_storage();

    let stored = media::ingest(&png(50, 50), "orphan.png").expect("ingested");
    let path = stored.storage_path();

    let result = db.create_post_image(i32::MAX, stored, &storage).await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
    assert!(storage.read(&path).await.is_err());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_delete_post_cascades() {
    let db = database().await;
    let storage = temp_storage();
    let liker = user(&db).await;
    let post = db.create_post(post_request("Doomed")).await.expect("post created");

    let image = db
        .create_post_image(post.id, media::ingest(&png(80, 60), "a.png").expect("ingested"), &storage)
        .await
        .expect("image created");
    let comment = db
        .create_comment(
            Some(post.id),
            CreateCommentRequest {
                user_id: Some(liker),
                body: "bye".to_string(),
            },
        )
        .await
        .expect("comment created");
    db.create_like(CreateLikeRequest {
        user_id: liker,
        target: post.like_target(),
    })
    .await
    .expect("like created");

    let removed_paths = db.delete_post(post.id).await.expect("post deleted");

    assert_eq!(removed_paths, vec![image.image_path.clone()]);
    assert!(matches!(db.get_post_by_id(post.id).await, Err(ApiError::NotFound(_))));
    assert!(matches!(db.get_post_image_by_id(image.id).await, Err(ApiError::NotFound(_))));
    assert!(matches!(db.get_comment_by_id(comment.id).await, Err(ApiError::NotFound(_))));
    assert!(db.get_likes_for_target(post.like_target()).await.expect("likes").is_empty());
    assert!(matches!(db.delete_post(post.id).await, Err(ApiError::NotFound(_))));

    let _ = tokio::fs::remove_dir_all(storage.root()).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_missing_category_is_a_constraint_error() {
    let db = database().await;

    let mut request = post_request("Uncategorizable");
    request.category_ids = vec![i32::MAX];

    let result = db.create_post(request).await;
    assert!(matches!(result, Err(ApiError::Constraint(_))));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_blank_title_is_rejected() {
    let db = database().await;

    let result = db.create_post(post_request("   ")).await;
    assert!(matches!(result, Err(ApiError::Constraint(_))));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_delete_post_waits_for_in_flight_inserts() {
    let db = database().await;
    let liker = user(&db).await;
    let post = db.create_post(post_request("Contended")).await.expect("post created");
    let path = format!("post_images/{}/{}.png", post.id, post.id);

    // Same sequence as create_like / create_post_image, left uncommitted
    let mut client = raw_client().await;
    let transaction = client.transaction().await.expect("transaction");
    transaction
        .query_one("SELECT 1 FROM posts WHERE id = $1 FOR SHARE", &[&post.id])
        .await
        .expect("post locked");
    transaction
        .execute(
            "INSERT INTO likes (user_id, target_kind, target_id) VALUES ($1, $2, $3)",
            &[&liker, &LikeTargetKind::Post, &post.id],
        )
        .await
        .expect("like inserted");
    transaction
        .execute(
            "INSERT INTO post_images (post_id, image_path, content_type, size, width, height) \
             VALUES ($1, $2, 'image/jpeg', 1, 1020, 573)",
            &[&post.id, &path],
        )
        .await
        .expect("image inserted");

    let delete = tokio::spawn({
        let db = db.clone();
        let post_id = post.id;
        async move { db.delete_post(post_id).await }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!delete.is_finished(), "delete must wait for the post lock");

    transaction.commit().await.expect("inserts committed");

    let removed_paths = delete.await.expect("task joined").expect("post deleted");
    assert_eq!(removed_paths, vec![path]);
    assert_eq!(db.total_likes(post.like_target()).await.expect("count"), 0);
    assert!(db.get_likes_for_target(post.like_target()).await.expect("likes").is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_failed_write_rolls_back_image_row() {
    let db = database().await;
    let post = db.create_post(post_request("Unwritable")).await.expect("post created");

    // A regular file where the media root directory should be
    let root = std::env::temp_dir().join(format!("blog-media-file-{}", Uuid::new_v4()));
    std::fs::write(&root, b"not a directory").expect("root file written");
    let storage = MediaStorage::new(&root);

    let stored = media::ingest(&png(64, 64), "blocked.png").expect("ingested");
    let result = db.create_post_image(post.id, stored, &storage).await;

    assert!(matches!(result, Err(ApiError::Storage(_))));
    assert!(db.get_images_for_post(post.id).await.expect("images").is_empty());

    db.delete_post(post.id).await.expect("cleanup");
    let _ = std::fs::remove_file(&root);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_taken_path_is_rerolled() {
    let db = database().await;
    let storage = temp_storage();
    let post = db.create_post(post_request("Crowded")).await.expect("post created");

    let first_stored = media::ingest(&png(64, 64), "first.png").expect("ingested");
    let taken = first_stored.path.clone();
    let first = db
        .create_post_image(post.id, first_stored, &storage)
        .await
        .expect("first image created");

    let mut second_stored = media::ingest(&png(64, 64), "second.png").expect("ingested");
    second_stored.path = taken;
    let second = db
        .create_post_image(post.id, second_stored, &storage)
        .await
        .expect("second image created");

    assert_ne!(second.image_path, first.image_path);
    assert!(second.image_path.ends_with(".png"));
    assert!(storage.read(&first.image_path).await.is_ok());
    assert!(storage.read(&second.image_path).await.is_ok());
    assert_eq!(db.get_images_for_post(post.id).await.expect("images").len(), 2);

    db.delete_post(post.id).await.expect("cleanup");
    let _ = tokio::fs::remove_dir_all(storage.root()).await;
}
