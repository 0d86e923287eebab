//! Database entities

pub mod admin_activity_log;
pub mod care_recipient;
pub mod client_access_token;
pub mod note;
pub mod team_member;
pub mod user;

pub use admin_activity_log::Entity as AdminActivityLog;
pub use care_recipient::Entity as CareRecipient;
pub use client_access_token::Entity as ClientAccessToken;
pub use note::Entity as Note;
pub use team_member::Entity as TeamMember;
pub use user::Entity as User;

pub mod prelude {
    pub use super::admin_activity_log::Entity as AdminActivityLog;
    pub use super::care_recipient::Entity as CareRecipient;
    pub use super::client_access_token::Entity as ClientAccessToken;
    pub use super::note::Entity as Note;
    pub use super::team_member::Entity as TeamMember;
    pub use super::user::Entity as User;
}
