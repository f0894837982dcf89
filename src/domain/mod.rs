mod form_spec;
mod list_schema;
pub mod response_code;
mod submission;
mod subscriber_email;
// allow external `use` statements to skip `list_schema` etc
pub use form_spec::*;
pub use list_schema::*;
pub use submission::*;
pub use subscriber_email::SubscriberEmail;
