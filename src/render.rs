//! Plain-text export of a grouping.

use std::fmt::Write;

use crate::group::{student_count, Group};
use crate::policy::Policy;
use crate::roster::Student;

/// Renders every group with its label, size, balance and members.
pub fn render_grouping(groups: &[Group], policy: Policy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", policy.display_name());
    for (i, group) in groups.iter().enumerate() {
        let _ = writeln!(out, "{}", group_heading(policy, i, group));
        for member in &group.members {
            let _ = writeln!(out, "  - {}", member);
        }
    }
    let _ = writeln!(
        out,
        "\nTotal: {} {}(s), {} students",
        groups.len(),
        policy.group_label().to_lowercase(),
        student_count(groups)
    );
    out
}

/// Same as [`render_grouping`] plus the numbered unassigned list and size
/// limits, for use while editing.
pub fn render_edit_view(groups: &[Group], unassigned: &[Student], policy: Policy) -> String {
    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        let limit = match policy.max_group_size() {
            Some(max) => format!("{}/{}", group.len(), max),
            None => group.len().to_string(),
        };
        let _ = writeln!(out, "{} [{}]", group_heading(policy, i, group), limit);
        for (j, member) in group.members.iter().enumerate() {
            let _ = writeln!(out, "  {}.{} {}", i + 1, j + 1, member);
        }
        if !group.is_empty() && group.len() < policy.min_group_size() {
            let _ = writeln!(out, "  ! too small (min: {})", policy.min_group_size());
        }
    }
    let _ = writeln!(out, "+ new {} slot: {}", policy.group_label().to_lowercase(), groups.len() + 1);

    if unassigned.is_empty() {
        let _ = writeln!(out, "All students are assigned");
    } else {
        let _ = writeln!(out, "Unassigned:");
        for (i, student) in unassigned.iter().enumerate() {
            let _ = writeln!(out, "  u.{} {}", i + 1, student);
        }
    }
    out
}

fn group_heading(policy: Policy, index: usize, group: &Group) -> String {
    let stats = group.stats();
    format!(
        "{} {}: {}M {}F, avg {}",
        policy.group_label(),
        index + 1,
        stats.males,
        stats.females,
        stats.average_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Sex;

    fn pair() -> Group {
        Group::from(vec![
            Student::new("Ann", 90, Sex::F).unwrap(),
            Student::new("Bob", 70, Sex::M).unwrap(),
        ])
    }

    #[test]
    fn test_pairs_are_labelled_as_pairs() {
        let text = render_grouping(&[pair()], Policy::HighLowPairs);
        assert!(text.starts_with("=== High-Low Pairs ==="));
        assert!(text.contains("Pair 1: 1M 1F, avg 80"));
        assert!(text.contains("  - Ann (90, Female)"));
        assert!(text.contains("Total: 1 pair(s), 2 students"));
    }

    #[test]
    fn test_edit_view_numbers_students() {
        let unassigned = vec![Student::new("Cid", 60, Sex::M).unwrap()];
        let text = render_edit_view(&[pair()], &unassigned, Policy::RandomTeams);
        assert!(text.contains("Team 1: 1M 1F, avg 80 [2/5]"));
        assert!(text.contains("  1.2 Bob (70, Male)"));
        assert!(text.contains("+ new team slot: 2"));
        assert!(text.contains("  u.1 Cid (60, Male)"));
    }
}
