//! Manual refinement of a generated grouping.
//!
//! Holding an [`EditSession`] means the grouping is being edited; `save` and
//! `cancel` consume it and hand back the grouping to display. Every
//! mutation checks its preconditions first, so an `Err` always means the
//! session is untouched.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::engine;
use crate::error::{EditConflict, SaveValidationError};
use crate::group::{Group, Grouping};
use crate::policy::{Policy, PolicyFamily};
use crate::roster::Student;

/// Where a student is moved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentSource {
    Unassigned(usize),
    Group { group: usize, student: usize },
}

#[derive(Debug, Clone)]
pub struct EditSession {
    original: Grouping,
    current: Grouping,
    unassigned: Vec<Student>,
    policy: Policy,
}

/// Returned by [`EditSession::save`] when validation fails. The session
/// comes back unchanged so editing can continue.
#[derive(Debug)]
pub struct SaveRejected {
    pub session: EditSession,
    pub error: SaveValidationError,
}

impl EditSession {
    /// Starts editing a copy of `grouping`. The caller's value is never touched.
    pub fn enable(grouping: &[Group], policy: Policy) -> Self {
        debug!(policy = %policy, groups = grouping.len(), "edit session started");
        EditSession {
            original: grouping.to_vec(),
            current: grouping.to_vec(),
            unassigned: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn original(&self) -> &[Group] {
        &self.original
    }

    pub fn current(&self) -> &[Group] {
        &self.current
    }

    pub fn unassigned(&self) -> &[Student] {
        &self.unassigned
    }

    /// Whether another student may be dropped on `group`. The slot one past
    /// the last group (a new group) always accepts.
    pub fn can_add_to(&self, group: usize) -> bool {
        match (self.current.get(group), self.policy.max_group_size()) {
            (Some(g), Some(max)) => g.len() < max,
            _ => true,
        }
    }

    /// Moves a student into `target`. `target == current().len()` creates a
    /// new group. Moving within the same group is a no-op.
    pub fn move_student(
        &mut self,
        source: StudentSource,
        target: usize,
    ) -> Result<(), EditConflict> {
        if let StudentSource::Group { group, .. } = source {
            if group == target && target < self.current.len() {
                return Ok(());
            }
        }
        if target > self.current.len() {
            return self.reject(EditConflict::InvalidTarget {
                target,
                groups: self.current.len(),
            });
        }
        if !self.can_add_to(target) {
            let max = self.policy.max_group_size().unwrap_or_default();
            return self.reject(EditConflict::TeamFull { group: target, max });
        }
        if self.student_at(source).is_none() {
            return self.reject(EditConflict::StudentNotFound);
        }

        let student = match source {
            StudentSource::Unassigned(index) => self.unassigned.remove(index),
            StudentSource::Group { group, student } => self.current[group].members.remove(student),
        };
        debug!(student = %student.name, group = target, "moved student");

        if target == self.current.len() {
            self.current.push(Group::new());
        }
        self.current[target].members.push(student);
        self.prune_empty_groups();
        Ok(())
    }

    /// Takes a student out of its group and parks it as unassigned.
    pub fn remove_student(&mut self, group: usize, student: usize) -> Result<(), EditConflict> {
        let source = StudentSource::Group { group, student };
        if self.student_at(source).is_none() {
            return self.reject(EditConflict::StudentNotFound);
        }
        let removed = self.current[group].members.remove(student);
        debug!(student = %removed.name, group, "student unassigned");
        self.unassigned.push(removed);
        Ok(())
    }

    /// Unassigns every member of `group` and deletes the group.
    pub fn dissolve_group(&mut self, group: usize) -> Result<(), EditConflict> {
        if group >= self.current.len() {
            return self.reject(EditConflict::GroupNotFound(group));
        }
        let dissolved = self.current.remove(group);
        debug!(group, members = dissolved.len(), "group dissolved");
        self.unassigned.extend(dissolved.members);
        Ok(())
    }

    pub fn reset_to_original(&mut self) {
        self.current = self.original.clone();
        self.unassigned.clear();
        debug!("edit session reset to original");
    }

    /// Regroups every student, assigned or not, using the thread-local RNG.
    pub fn auto_balance(&mut self) {
        self.auto_balance_with(&mut rand::thread_rng());
    }

    /// Regroups every student with the policy matching this session's family.
    pub fn auto_balance_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let pool: Vec<Student> = self
            .current
            .drain(..)
            .flat_map(|g| g.members)
            .chain(self.unassigned.drain(..))
            .collect();

        self.current = match self.policy {
            Policy::HeterogeneousTeams => engine::heterogeneous_teams(&pool),
            Policy::MixedSexTeams => engine::mixed_sex_teams(&pool, rng),
            Policy::MixedSexPairs => engine::mixed_sex_pairs(&pool, rng),
            Policy::MixedAbilityTeams => engine::mixed_ability_teams(&pool),
            _ => self.round_robin(pool),
        };
        debug!(groups = self.current.len(), "auto-balanced");
    }

    /// Deals students out over `ceil(n / target)` groups, or exactly two
    /// groups for the two-team policies.
    fn round_robin(&self, pool: Vec<Student>) -> Grouping {
        let count = match self.policy.family() {
            // Two-team policies always end with the class split in half.
            PolicyFamily::TwoTeams => 2,
            _ => pool.len().div_ceil(self.policy.target_group_size()),
        };
        let mut groups = vec![Group::new(); count];
        for (i, student) in pool.into_iter().enumerate() {
            groups[i % count].members.push(student);
        }
        groups
    }

    /// Checks that every student is placed and no non-empty group is below
    /// the policy minimum.
    pub fn validate(&self) -> Result<(), SaveValidationError> {
        let min = self.policy.min_group_size();
        if let Some((group, g)) = self
            .current
            .iter()
            .enumerate()
            .find(|(_, g)| !g.is_empty() && g.len() < min)
        {
            return Err(SaveValidationError::Undersized {
                group,
                size: g.len(),
                min,
            });
        }
        if !self.unassigned.is_empty() {
            return Err(SaveValidationError::Unassigned(self.unassigned.len()));
        }
        Ok(())
    }

    /// Commits the edits, ending the session.
    pub fn save(self) -> Result<Grouping, SaveRejected> {
        match self.validate() {
            Ok(()) => {
                info!(policy = %self.policy, groups = self.current.len(), "edits saved");
                Ok(self.current)
            }
            Err(error) => {
                warn!(%error, "save rejected");
                Err(SaveRejected {
                    session: self,
                    error,
                })
            }
        }
    }

    /// Drops all edits and returns the grouping as it was before editing.
    pub fn cancel(self) -> Grouping {
        info!(policy = %self.policy, "edits cancelled");
        self.original
    }

    fn student_at(&self, source: StudentSource) -> Option<&Student> {
        match source {
            StudentSource::Unassigned(index) => self.unassigned.get(index),
            StudentSource::Group { group, student } => {
                self.current.get(group).and_then(|g| g.members.get(student))
            }
        }
    }

    /// Drops empty groups created during editing, keeping the original
    /// positions and the final slot.
    fn prune_empty_groups(&mut self) {
        let original_count = self.original.len();
        let last = self.current.len().saturating_sub(1);
        let mut index = 0;
        self.current.retain(|g| {
            let keep = !g.is_empty() || index < original_count || index == last;
            index += 1;
            keep
        });
    }

    fn reject(&self, conflict: EditConflict) -> Result<(), EditConflict> {
        warn!(%conflict, "edit rejected");
        Err(conflict)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::group::student_count;
    use crate::roster::Sex;

    fn student(name: &str, score: i64, sex: Sex) -> Student {
        Student::new(name, score, sex).unwrap()
    }

    fn group(names: &[&str]) -> Group {
        Group::from(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let sex = if i % 2 == 0 { Sex::M } else { Sex::F };
                    student(n, 50 + i as i64, sex)
                })
                .collect::<Vec<_>>(),
        )
    }

    fn names(grouping: &[Group]) -> Vec<Vec<String>> {
        grouping
            .iter()
            .map(|g| g.members.iter().map(|s| s.name.clone()).collect())
            .collect()
    }

    fn pairs() -> Grouping {
        vec![group(&["A", "B"]), group(&["C", "D"]), group(&["E", "F"])]
    }

    #[test]
    fn test_enable_copies_the_grouping() {
        let grouping = pairs();
        let mut session = EditSession::enable(&grouping, Policy::RandomPairs);
        session.remove_student(0, 0).unwrap();
        assert_eq!(grouping, pairs());
        assert_eq!(session.original(), &pairs()[..]);
    }

    #[test]
    fn test_move_into_full_pair_fails_without_change() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomPairs);
        let before = session.clone();

        let err = session
            .move_student(StudentSource::Group { group: 0, student: 0 }, 1)
            .unwrap_err();
        assert_eq!(err, EditConflict::TeamFull { group: 1, max: 2 });
        assert_eq!(session.current(), before.current());
        assert_eq!(session.unassigned(), before.unassigned());
    }

    #[test]
    fn test_move_to_new_group() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomPairs);
        session
            .move_student(StudentSource::Group { group: 0, student: 1 }, 3)
            .unwrap();
        assert_eq!(
            names(session.current()),
            vec![vec!["A"], vec!["C", "D"], vec!["E", "F"], vec!["B"]]
        );
    }

    #[test]
    fn test_move_past_new_slot_is_rejected() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomPairs);
        let before = session.clone();

        let err = session
            .move_student(StudentSource::Group { group: 0, student: 0 }, 5)
            .unwrap_err();
        assert_eq!(err, EditConflict::InvalidTarget { target: 5, groups: 3 });
        assert_eq!(session.current(), before.current());
        assert_eq!(session.unassigned(), before.unassigned());
    }

    #[test]
    fn test_move_within_same_group_is_noop() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomPairs);
        session
            .move_student(StudentSource::Group { group: 1, student: 0 }, 1)
            .unwrap();
        assert_eq!(session.current(), &pairs()[..]);
    }

    #[test]
    fn test_stale_source_is_rejected() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomTeams);
        assert_eq!(
            session.move_student(StudentSource::Unassigned(0), 0),
            Err(EditConflict::StudentNotFound)
        );
        assert_eq!(
            session.move_student(StudentSource::Group { group: 0, student: 9 }, 1),
            Err(EditConflict::StudentNotFound)
        );
        assert_eq!(session.remove_student(7, 0), Err(EditConflict::StudentNotFound));
        assert_eq!(session.dissolve_group(3), Err(EditConflict::GroupNotFound(3)));
        assert_eq!(session.current(), &pairs()[..]);
    }

    #[test]
    fn test_unassigned_student_moves_back() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomPairs);
        session.remove_student(2, 1).unwrap();
        assert_eq!(session.unassigned().len(), 1);
        assert_eq!(session.unassigned()[0].name, "F");

        session.move_student(StudentSource::Unassigned(0), 2).unwrap();
        assert!(session.unassigned().is_empty());
        assert_eq!(names(session.current())[2], vec!["E", "F"]);
    }

    #[test]
    fn test_empty_new_group_is_pruned() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomTeams);
        // B starts group 4, then leaves it for group 5; group 4 is pruned.
        session
            .move_student(StudentSource::Group { group: 0, student: 1 }, 3)
            .unwrap();
        session
            .move_student(StudentSource::Group { group: 1, student: 0 }, 4)
            .unwrap();
        session
            .move_student(StudentSource::Group { group: 3, student: 0 }, 4)
            .unwrap();
        assert_eq!(
            names(session.current()),
            vec![vec!["A"], vec!["D"], vec!["E", "F"], vec!["C", "B"]]
        );
    }

    #[test]
    fn test_emptied_original_group_is_kept() {
        let grouping = vec![group(&["A"]), group(&["B", "C"])];
        let mut session = EditSession::enable(&grouping, Policy::RandomTeams);
        session
            .move_student(StudentSource::Group { group: 0, student: 0 }, 1)
            .unwrap();
        assert_eq!(session.current().len(), 2);
        assert!(session.current()[0].is_empty());
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_dissolve_then_reset_restores_original() {
        let mut session = EditSession::enable(&pairs(), Policy::SimilarAbilityPairs);
        session.dissolve_group(1).unwrap();
        assert_eq!(session.current().len(), 2);
        assert_eq!(session.unassigned().len(), 2);

        session.reset_to_original();
        assert_eq!(session.current(), &pairs()[..]);
        assert!(session.unassigned().is_empty());
    }

    #[test]
    fn test_save_rejects_unassigned_students() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomTeams);
        session.remove_student(0, 0).unwrap();
        session.remove_student(1, 0).unwrap();

        let rejected = session.save().unwrap_err();
        assert_eq!(rejected.error, SaveValidationError::Unassigned(2));
        assert!(rejected.error.to_string().contains('2'));
        assert_eq!(rejected.session.unassigned().len(), 2);
    }

    #[test]
    fn test_save_rejects_undersized_pair() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomPairs);
        session
            .move_student(StudentSource::Group { group: 1, student: 0 }, 3)
            .unwrap();
        let rejected = session.save().unwrap_err();
        assert_eq!(
            rejected.error,
            SaveValidationError::Undersized { group: 1, size: 1, min: 2 }
        );

        let mut session = rejected.session;
        session
            .move_student(StudentSource::Group { group: 1, student: 0 }, 3)
            .unwrap();
        let saved = session.save().unwrap();
        assert_eq!(names(&saved)[3], vec!["C", "D"]);
    }

    #[test]
    fn test_cancel_returns_original() {
        let mut session = EditSession::enable(&pairs(), Policy::RandomPairs);
        session.dissolve_group(0).unwrap();
        assert_eq!(session.cancel(), pairs());
    }

    #[test]
    fn test_auto_balance_pools_everyone() {
        let grouping = vec![
            Group::from(vec![
                student("M1", 90, Sex::M),
                student("M2", 80, Sex::M),
                student("M3", 70, Sex::M),
            ]),
            Group::from(vec![
                student("F1", 85, Sex::F),
                student("F2", 75, Sex::F),
                student("F3", 65, Sex::F),
            ]),
        ];
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = EditSession::enable(&grouping, Policy::MixedSexPairs);
        session.dissolve_group(0).unwrap();

        for _ in 0..2 {
            session.auto_balance_with(&mut rng);
            assert!(session.unassigned().is_empty());
            assert_eq!(student_count(session.current()), 6);
            for pair in session.current() {
                let stats = pair.stats();
                assert_eq!((stats.males, stats.females), (1, 1));
            }
        }
        assert!(session.save().is_ok());
    }

    #[test]
    fn test_auto_balance_round_robin() {
        let students: Vec<Student> = (0..10)
            .map(|i| student(&format!("S{}", i), 50, Sex::M))
            .collect();
        let grouping = vec![Group::from(students)];

        let mut session = EditSession::enable(&grouping, Policy::RandomTeams);
        session.auto_balance();
        let sizes: Vec<usize> = session.current().iter().map(Group::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);

        let mut session = EditSession::enable(&grouping, Policy::BalancedTwoTeams);
        session.auto_balance();
        let sizes: Vec<usize> = session.current().iter().map(Group::len).collect();
        assert_eq!(sizes, vec![5, 5]);

        let mut session = EditSession::enable(&grouping, Policy::RandomPairs);
        session.auto_balance();
        assert_eq!(session.current().len(), 5);
        assert!(session.current().iter().all(|g| g.len() == 2));
    }

    #[test]
    fn test_auto_balance_heterogeneous() {
        let students: Vec<Student> = (0..8)
            .map(|i| {
                let sex = if i < 4 { Sex::M } else { Sex::F };
                student(&format!("S{}", i), 100 - i * 7, sex)
            })
            .collect();
        let mut session = EditSession::enable(&[Group::from(students)], Policy::HeterogeneousTeams);
        session.remove_student(0, 3).unwrap();
        session.auto_balance();
        assert_eq!(session.current().len(), 2);
        for team in session.current() {
            assert_eq!(team.len(), 4);
        }
    }
}
