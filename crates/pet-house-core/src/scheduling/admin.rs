//! Admin dashboard actions on profiles.

use super::{require_admin, ScheduleError, ScheduleResult};
use crate::db::Database;
use crate::lifecycle::Actor;
use crate::models::{Role, RoleCounts, UserProfile};

/// Profile administration.
pub struct AdminService<'a> {
    db: &'a Database,
}

impl<'a> AdminService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Every profile, newest first, optionally narrowed to one role.
    pub fn profiles(&self, actor: &Actor, role: Option<Role>) -> ScheduleResult<Vec<UserProfile>> {
        require_admin(actor, "list profiles")?;
        let profiles = match role {
            Some(role) => self.db.list_profiles_by_role(role)?,
            None => self.db.list_profiles()?,
        };
        Ok(profiles)
    }

    pub fn role_counts(&self, actor: &Actor) -> ScheduleResult<RoleCounts> {
        require_admin(actor, "view profile counts")?;
        Ok(self.db.role_counts()?)
    }

    /// Delete another user's profile. Admins cannot delete themselves.
    pub fn delete_profile(&self, actor: &Actor, profile_id: &str) -> ScheduleResult<()> {
        require_admin(actor, "delete profiles")?;
        if actor.id == profile_id {
            tracing::warn!(admin_id = %actor.id, "refused self-deletion");
            return Err(ScheduleError::Forbidden(
                "you cannot delete your own profile".into(),
            ));
        }
        if !self.db.delete_profile(profile_id)? {
            return Err(ScheduleError::NotFound(format!("Profile {profile_id}")));
        }
        tracing::info!(admin_id = %actor.id, profile_id, "profile deleted");
        Ok(())
    }
}
