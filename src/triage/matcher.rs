use crate::model::{Role, User};

/// Selects a moderator for a set of required skills.
pub struct SkillMatcher;

impl SkillMatcher {
    /// Pick a moderator whose skill set overlaps the required skills.
    ///
    /// A moderator matches when any of their skills contains any required
    /// skill, case-insensitively; any overlap wins, there is no ranking
    /// by overlap size. Candidates are scanned in ascending user-id order
    /// so selection is deterministic for a fixed roster.
    pub fn select<'a>(required: &[String], users: &'a [User]) -> Option<&'a User> {
        if required.is_empty() {
            return None;
        }
        let mut moderators: Vec<&User> =
            users.iter().filter(|u| u.role == Role::Moderator).collect();
        moderators.sort_by(|a, b| a.id.cmp(&b.id));
        moderators
            .into_iter()
            .find(|m| Self::matches_any(required, &m.skills))
    }

    fn matches_any(required: &[String], skills: &[String]) -> bool {
        required.iter().any(|req| {
            let req = req.to_lowercase();
            !req.is_empty() && skills.iter().any(|skill| skill.to_lowercase().contains(&req))
        })
    }
}
