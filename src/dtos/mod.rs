pub mod auth_dtos;
pub mod post_dtos;
pub mod story_dtos;
pub mod user_dtos;

pub use auth_dtos::{Credentials, NewUser};
pub use post_dtos::{FilePayload, NewPost, UpdatePost};
pub use story_dtos::NewStory;
pub use user_dtos::UpdateUser;
