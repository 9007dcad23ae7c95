pub mod auth;
pub mod comment;
pub mod pages;
pub mod post;
pub mod profile;

use crate::application::auth_service::AuthService;
use crate::application::comment_service::CommentService;
use crate::application::post_service::PostService;
use crate::data::category_repository::PostgresCategoryRepository;
use crate::data::comment_repository::PostgresCommentRepository;
use crate::data::location_repository::PostgresLocationRepository;
use crate::data::post_repository::PostgresPostRepository;
use crate::data::user_repository::PostgresUserRepository;

pub type Auth = AuthService<PostgresUserRepository>;
pub type Posts =
    PostService<PostgresPostRepository, PostgresCategoryRepository, PostgresLocationRepository>;
pub type Comments = CommentService<PostgresCommentRepository, PostgresPostRepository>;
