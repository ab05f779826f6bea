use serde::Serialize;
use sqlx::FromRow;

use crate::models::user::User;

pub const AVATAR_PATH: &str = "/api/v1/profile/avatar";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub bio: String,
    pub phone_number: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub avatar_key: Option<String>,
    pub notification_email_updates: bool,
    pub notification_job_alerts: bool,
}

#[cfg(test)]
impl Profile {
    /// A default-valued profile, as stores materialize it.
    pub fn empty(user_id: i64) -> Self {
        Profile {
            user_id,
            bio: String::new(),
            phone_number: String::new(),
            linkedin_url: String::new(),
            portfolio_url: String::new(),
            avatar_key: None,
            notification_email_updates: false,
            notification_job_alerts: false,
        }
    }
}

/// Validated changes for one profile update. `None` leaves the column as is.
///
/// `first_name`/`last_name` land on the user row, everything else on the
/// profile row; stores apply both in one transaction.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub avatar_key: Option<String>,
    pub notification_email_updates: Option<bool>,
    pub notification_job_alerts: Option<bool>,
}

/// Profile as returned to its owner, merged with the identity fields of the user.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub phone_number: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub avatar: Option<String>,
    pub notification_email_updates: bool,
    pub notification_job_alerts: bool,
}

impl ProfileView {
    pub fn new(user: &User, profile: &Profile) -> Self {
        ProfileView {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: profile.bio.clone(),
            phone_number: profile.phone_number.clone(),
            linkedin_url: profile.linkedin_url.clone(),
            portfolio_url: profile.portfolio_url.clone(),
            avatar: profile.avatar_key.as_ref().map(|_| AVATAR_PATH.to_string()),
            notification_email_updates: profile.notification_email_updates,
            notification_job_alerts: profile.notification_job_alerts,
        }
    }
}
