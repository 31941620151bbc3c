//! Partitioning engine: pure functions from a list of students to a grouping.
//!
//! Every policy keeps the partition property: each input student appears in
//! exactly one output group. Rosters too small for a policy come back as a
//! single group rather than an error; rejecting them is the caller's job.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::UnknownPolicyError;
use crate::group::{Group, Grouping};
use crate::policy::Policy;
use crate::roster::{by_score_desc, Sex, Student};

const TEAM_SIZE: usize = 4;
const PAIR_SIZE: usize = 2;
const ABILITY_BANDS: usize = 4;

/// Partitions `students` under `policy` using the thread-local RNG.
pub fn partition(policy: Policy, students: &[Student]) -> Grouping {
    partition_with(policy, students, &mut rand::thread_rng())
}

/// Partitions `students` under `policy`, drawing randomness from `rng`.
pub fn partition_with<R: Rng + ?Sized>(
    policy: Policy,
    students: &[Student],
    rng: &mut R,
) -> Grouping {
    let grouping = match policy {
        Policy::HeterogeneousTeams => heterogeneous_teams(students),
        Policy::RandomTeams => random_teams(students, rng),
        Policy::MixedAbilityTeams => mixed_ability_teams(students),
        Policy::SimilarAbilityTeams => similar_ability_teams(students),
        Policy::SameSexTeams => same_sex_teams(students),
        Policy::MixedSexTeams => mixed_sex_teams(students, rng),
        Policy::HighLowPairs => high_low_pairs(students),
        Policy::HighMediumPairs => high_medium_pairs(students),
        Policy::RandomPairs => random_pairs(students, rng),
        Policy::SimilarAbilityPairs => similar_ability_pairs(students),
        Policy::SameSexPairs => same_sex_pairs(students, rng),
        Policy::MixedSexPairs => mixed_sex_pairs(students, rng),
        Policy::RandomTwoTeams => random_two_teams(students, rng),
        Policy::BalancedTwoTeams => balanced_two_teams(students),
    };
    debug!(
        policy = %policy,
        students = students.len(),
        groups = grouping.len(),
        "partitioned roster"
    );
    grouping
}

/// String entry point for callers that carry tool names around.
pub fn partition_by_name(name: &str, students: &[Student]) -> Result<Grouping, UnknownPolicyError> {
    let policy: Policy = name.parse()?;
    Ok(partition(policy, students))
}

// Helpers

/// Splits a score-sorted list into four contiguous bands, highest first.
/// The `len % 4` leftover students go one each to the first bands.
pub fn ability_groups(sorted: &[Student]) -> [Vec<Student>; ABILITY_BANDS] {
    let base = sorted.len() / ABILITY_BANDS;
    let remainder = sorted.len() % ABILITY_BANDS;

    let mut bands: [Vec<Student>; ABILITY_BANDS] = Default::default();
    let mut start = 0;
    for (i, band) in bands.iter_mut().enumerate() {
        let size = base + usize::from(i < remainder);
        band.extend_from_slice(&sorted[start..start + size]);
        start += size;
    }
    bands
}

/// Consecutive groups of `size`; a short final group is kept.
pub fn fixed_size_groups(students: &[Student], size: usize) -> Grouping {
    students
        .chunks(size.max(1))
        .map(|chunk| Group::from(chunk.to_vec()))
        .collect()
}

/// Uniformly shuffled copy (Fisher-Yates).
pub fn shuffle<R: Rng + ?Sized>(students: &[Student], rng: &mut R) -> Vec<Student> {
    let mut shuffled = students.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

fn sorted_by_score(students: &[Student]) -> Vec<Student> {
    let mut sorted = students.to_vec();
    sorted.sort_by(by_score_desc);
    sorted
}

fn of_sex(students: &[Student], sex: Sex) -> Vec<Student> {
    students.iter().filter(|s| s.sex == sex).cloned().collect()
}

fn whole(students: &[Student]) -> Grouping {
    vec![Group::from(students.to_vec())]
}

// Teams of four

/// One student per ability band per team, aiming for two of each sex.
pub fn heterogeneous_teams(students: &[Student]) -> Grouping {
    let complete = students.len() / TEAM_SIZE;
    if students.len() < 2 || complete == 0 {
        return whole(students);
    }

    let sorted = sorted_by_score(students);
    let (banded, extra) = sorted.split_at(complete * TEAM_SIZE);
    let bands = ability_groups(banded);

    // Reversed so that pop() yields the highest scorer still in the band.
    let split = |sex: Sex| -> Vec<Vec<Student>> {
        bands
            .iter()
            .map(|band| band.iter().rev().filter(|s| s.sex == sex).cloned().collect())
            .collect()
    };
    let mut males = split(Sex::M);
    let mut females = split(Sex::F);

    let mut teams: Grouping = Vec::with_capacity(complete + 1);
    for _ in 0..complete {
        let mut team = Group::new();
        for band in 0..ABILITY_BANDS {
            let stats = team.stats();
            let pick = if stats.males < 2 && !males[band].is_empty() {
                males[band].pop()
            } else if stats.females < 2 && !females[band].is_empty() {
                females[band].pop()
            } else {
                males[band].pop().or_else(|| females[band].pop())
            };
            if let Some(student) = pick {
                team.members.push(student);
            }
        }
        if !team.is_empty() {
            teams.push(team);
        }
    }

    if !extra.is_empty() {
        teams.push(Group::from(extra.to_vec()));
    }
    teams
}

pub fn random_teams<R: Rng + ?Sized>(students: &[Student], rng: &mut R) -> Grouping {
    fixed_size_groups(&shuffle(students, rng), TEAM_SIZE)
}

/// Band-major round robin: team `i` takes the `i`-th student of each band.
pub fn mixed_ability_teams(students: &[Student]) -> Grouping {
    let complete = students.len() / TEAM_SIZE;
    if complete == 0 {
        return whole(students);
    }

    let sorted = sorted_by_score(students);
    let (banded, extra) = sorted.split_at(complete * TEAM_SIZE);
    let bands = ability_groups(banded);

    let mut teams: Grouping = (0..complete)
        .map(|i| {
            Group::from(
                bands
                    .iter()
                    .filter_map(|band| band.get(i).cloned())
                    .collect::<Vec<_>>(),
            )
        })
        .filter(|team| !team.is_empty())
        .collect();

    if !extra.is_empty() {
        teams.push(Group::from(extra.to_vec()));
    }
    teams
}

pub fn similar_ability_teams(students: &[Student]) -> Grouping {
    fixed_size_groups(&sorted_by_score(students), TEAM_SIZE)
}

pub fn same_sex_teams(students: &[Student]) -> Grouping {
    let mut teams = fixed_size_groups(&of_sex(students, Sex::M), TEAM_SIZE);
    teams.extend(fixed_size_groups(&of_sex(students, Sex::F), TEAM_SIZE));
    teams
}

/// Two males and two females per team while both can supply two; everyone
/// left over forms one trailing group.
pub fn mixed_sex_teams<R: Rng + ?Sized>(students: &[Student], rng: &mut R) -> Grouping {
    let mut males = shuffle(&of_sex(students, Sex::M), rng);
    let mut females = shuffle(&of_sex(students, Sex::F), rng);

    let mut teams = Grouping::new();
    while males.len() >= 2 && females.len() >= 2 {
        let split_m = males.len() - 2;
        let split_f = females.len() - 2;
        let mut members: Vec<Student> = males.drain(split_m..).rev().collect();
        members.extend(females.drain(split_f..).rev());
        teams.push(Group::from(members));
    }

    males.append(&mut females);
    if !males.is_empty() {
        teams.push(Group::from(males));
    }
    teams
}

// Pairs

/// Highest remaining with lowest remaining. An odd student joins the first
/// pair, or stands alone when there is no pair.
pub fn high_low_pairs(students: &[Student]) -> Grouping {
    let sorted = sorted_by_score(students);
    let mut pairs = Grouping::new();

    let (mut lo, mut hi) = (0, sorted.len());
    while hi - lo >= 2 {
        pairs.push(Group::from(vec![sorted[lo].clone(), sorted[hi - 1].clone()]));
        lo += 1;
        hi -= 1;
    }

    if hi - lo == 1 {
        attach_leftover(&mut pairs, sorted[lo].clone());
    }
    pairs
}

/// Upper half paired index-wise with lower half. For an odd count the
/// lower half is one longer and its last (lowest) student is left over.
pub fn high_medium_pairs(students: &[Student]) -> Grouping {
    let sorted = sorted_by_score(students);
    let (high, low) = sorted.split_at(sorted.len() / 2);

    let mut pairs: Grouping = high
        .iter()
        .zip(low)
        .map(|(h, l)| Group::from(vec![h.clone(), l.clone()]))
        .collect();

    let paired = high.len().min(low.len());
    let remaining: Vec<Student> = high[paired..]
        .iter()
        .chain(&low[paired..])
        .cloned()
        .collect();

    match remaining.len() {
        0 => {}
        1 if !pairs.is_empty() => pairs[0].members.extend(remaining),
        _ => pairs.extend(fixed_size_groups(&remaining, PAIR_SIZE)),
    }
    pairs
}

pub fn random_pairs<R: Rng + ?Sized>(students: &[Student], rng: &mut R) -> Grouping {
    fixed_size_groups(&shuffle(students, rng), PAIR_SIZE)
}

pub fn similar_ability_pairs(students: &[Student]) -> Grouping {
    fixed_size_groups(&sorted_by_score(students), PAIR_SIZE)
}

pub fn same_sex_pairs<R: Rng + ?Sized>(students: &[Student], rng: &mut R) -> Grouping {
    let males = shuffle(&of_sex(students, Sex::M), rng);
    let females = shuffle(&of_sex(students, Sex::F), rng);
    let mut pairs = fixed_size_groups(&males, PAIR_SIZE);
    pairs.extend(fixed_size_groups(&females, PAIR_SIZE));
    pairs
}

/// One male with one female while both remain; the rest pair up by sex.
pub fn mixed_sex_pairs<R: Rng + ?Sized>(students: &[Student], rng: &mut R) -> Grouping {
    let mut males = shuffle(&of_sex(students, Sex::M), rng);
    let mut females = shuffle(&of_sex(students, Sex::F), rng);

    let mut pairs = Grouping::new();
    while let (Some(m), Some(f)) = (males.last(), females.last()) {
        pairs.push(Group::from(vec![m.clone(), f.clone()]));
        males.pop();
        females.pop();
    }

    males.append(&mut females);
    pairs.extend(fixed_size_groups(&males, PAIR_SIZE));
    pairs
}

// Two teams

/// Shuffled, first team gets `ceil(n / 2)`.
pub fn random_two_teams<R: Rng + ?Sized>(students: &[Student], rng: &mut R) -> Grouping {
    let shuffled = shuffle(students, rng);
    let (first, second) = shuffled.split_at(shuffled.len().div_ceil(2));
    vec![Group::from(first.to_vec()), Group::from(second.to_vec())]
}

/// Each sex sorted by score, alternating between the teams by index parity.
pub fn balanced_two_teams(students: &[Student]) -> Grouping {
    let mut teams = [Group::new(), Group::new()];
    for sex in [Sex::M, Sex::F] {
        for (i, student) in sorted_by_score(&of_sex(students, sex)).into_iter().enumerate() {
            teams[i % 2].members.push(student);
        }
    }
    teams.into()
}

fn attach_leftover(groups: &mut Grouping, student: Student) {
    match groups.first_mut() {
        Some(first) => first.members.push(student),
        None => groups.push(Group::from(vec![student])),
    }
}
