//! Turn a group into a plan. Nothing here touches the filesystem.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::DuplicateGroup;

/// What to do with the copies that are not kept. A plan carries the same
/// value on each of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStrategy {
    Delete,
    /// Move into this directory
    MoveTo(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub action: ResolutionStrategy,
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action {
            ResolutionStrategy::Delete => write!(f, "delete {}", self.path.display()),
            ResolutionStrategy::MoveTo(dir) => {
                write!(f, "move {} -> {}", self.path.display(), dir.display())
            }
        }
    }
}

/// Planned outcome for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPlan {
    pub group_id: Uuid,
    pub keep: PathBuf,
    pub actions: Vec<PlannedAction>,
    /// Low-confidence groups are planned but flagged for a person
    pub needs_review: bool,
    pub reclaimable_bytes: u64,
}

/// Plan the removal of every non-kept member. `None` for a group without members.
pub fn resolve(group: &DuplicateGroup, strategy: &ResolutionStrategy) -> Option<ResolutionPlan> {
    let keep = group.keep()?;

    let actions = group
        .duplicates()
        .iter()
        .map(|member| PlannedAction {
            path: member.path.clone(),
            size_bytes: member.file_size_bytes,
            action: strategy.clone(),
        })
        .collect();

    Some(ResolutionPlan {
        group_id: group.id,
        keep: keep.path.clone(),
        actions,
        needs_review: group.needs_review(),
        reclaimable_bytes: group.reclaimable_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{find_duplicates, MatchTier};
    use super::*;

    #[test]
    fn plan_keeps_best_and_acts_on_rest() {
        let mut a = entry("/a", "heat", Some("1995"));
        let mut b = entry("/b", "heat", Some("1995"));
        a.quality.score = 90;
        b.quality.score = 40;
        b.file_size_bytes = 700 * MB;

        let groups = find_duplicates(&[b, a]);
        let plan = resolve(&groups[0], &ResolutionStrategy::Delete).unwrap();
        assert_eq!(plan.keep, PathBuf::from("/a"));
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].to_string(), "delete /b");
        assert_eq!(plan.reclaimable_bytes, 700 * MB);
        assert!(!plan.needs_review);
    }

    #[test]
    fn move_strategy_targets_directory() {
        let group = DuplicateGroup::new(
            MatchTier::TitleOnly,
            vec![entry("/a", "clip", None), entry("/b", "clip", None)],
        );
        let plan = resolve(&group, &ResolutionStrategy::MoveTo("/trash".into())).unwrap();
        assert_eq!(plan.actions[0].action, ResolutionStrategy::MoveTo("/trash".into()));
        assert_eq!(plan.actions[0].to_string(), "move /b -> /trash");
        assert!(plan.needs_review);
    }

    #[test]
    fn every_action_carries_the_chosen_strategy() {
        let group = DuplicateGroup::new(
            MatchTier::ContentHash,
            vec![
                entry("/a", "clip", None),
                entry("/b", "clip", None),
                entry("/c", "clip", None),
            ],
        );
        for strategy in [
            ResolutionStrategy::Delete,
            ResolutionStrategy::MoveTo("/review".into()),
        ] {
            let plan = resolve(&group, &strategy).unwrap();
            assert_eq!(plan.actions.len(), 2);
            assert!(plan.actions.iter().all(|a| a.action == strategy));
        }
    }

    #[test]
    fn empty_group_has_no_plan() {
        let group = DuplicateGroup::new(MatchTier::ContentHash, Vec::new());
        assert!(resolve(&group, &ResolutionStrategy::Delete).is_none());
    }
}
