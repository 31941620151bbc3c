use serde::{Deserialize, Serialize};

use crate::roster::{Sex, Student};

/// An ordered set of students. Order only matters for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group {
    pub members: Vec<Student>,
}

/// The result of a partition: every student in exactly one group.
pub type Grouping = Vec<Group>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupStats {
    pub males: usize,
    pub females: usize,
    /// Rounded to the nearest whole point.
    pub average_score: u32,
}

impl Group {
    pub fn new() -> Self {
        Group {
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn stats(&self) -> GroupStats {
        if self.members.is_empty() {
            return GroupStats {
                males: 0,
                females: 0,
                average_score: 0,
            };
        }
        let males = self.members.iter().filter(|s| s.sex == Sex::M).count();
        let total: u32 = self.members.iter().map(|s| u32::from(s.score)).sum();
        let average = f64::from(total) / self.members.len() as f64;
        GroupStats {
            males,
            females: self.members.len() - males,
            average_score: average.round() as u32,
        }
    }
}

impl From<Vec<Student>> for Group {
    fn from(members: Vec<Student>) -> Self {
        Group { members }
    }
}

/// Total number of students across all groups.
pub fn student_count(grouping: &[Group]) -> usize {
    grouping.iter().map(Group::len).sum()
}
