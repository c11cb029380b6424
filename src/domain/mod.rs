mod api_response;
mod credential;
mod user_email;
mod user_id;
mod user_payload;

pub use api_response::{ApiResponse, FieldError, ResponseData};
pub use credential::Credential;
pub use user_email::UserEmail;
pub use user_id::UserId;
pub use user_payload::{Gender, NewUser, UserStatus, UserUpdate};
