mod list_id;
mod new_subscription;
mod subscriber_email;
// allow external `use` statements to skip `new_subscription` etc
pub use list_id::ListId;
pub use new_subscription::NewSubscription;
pub use subscriber_email::SubscriberEmail;
