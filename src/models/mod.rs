// Models module

pub mod category;
pub mod comment;
pub mod like;
pub mod post;
pub mod post_image;
pub mod user;

// Re-export commonly used types
pub use category::{Category, CreateCategoryRequest};
pub use comment::{Comment, CreateCommentRequest, UpdateCommentRequest};
pub use like::{CreateLikeRequest, Like, LikeSummary, LikeTarget, LikeTargetKind};
pub use post::{CreatePostRequest, Post, PostStatus, UpdatePostRequest};
pub use post_image::{PostImage, PostImageResponse, UpdatePostImageRequest};
pub use user::{CreateUserRequest, User};
