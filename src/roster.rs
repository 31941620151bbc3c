//! Students and the validated roster of one class.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Ordered by letter, so `F` sorts before `M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    F,
    M,
}

impl Sex {
    pub fn label(self) -> &'static str {
        match self {
            Sex::M => "Male",
            Sex::F => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::M => f.write_str("M"),
            Sex::F => f.write_str("F"),
        }
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M" => Ok(Sex::M),
            "F" => Ok(Sex::F),
            _ => Err(ValidationError::InvalidSex(s.to_string())),
        }
    }
}

/// One student. Cloned freely; groupings and edit sessions own their copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub score: u8,
    pub sex: Sex,
}

impl Student {
    /// Builds a student, trimming the name and checking the score range.
    pub fn new(name: impl Into<String>, score: i64, sex: Sex) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !(0..=100).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange { name, score });
        }
        Ok(Student {
            name,
            score: score as u8,
            sex,
        })
    }

    /// Re-checks a student that did not come through [`Student::new`],
    /// e.g. one read from disk.
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.score > 100 {
            return Err(ValidationError::ScoreOutOfRange {
                name: self.name.clone(),
                score: i64::from(self.score),
            });
        }
        Ok(())
    }

    fn same_name(&self, other: &str) -> bool {
        self.name.trim().to_lowercase() == other.trim().to_lowercase()
    }

    fn trim_name(&mut self) {
        let trimmed = self.name.trim();
        if trimmed.len() != self.name.len() {
            self.name = trimmed.to_string();
        }
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.score, self.sex.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Score,
    Sex,
}

/// Summary figures for a whole class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStats {
    pub total_students: usize,
    pub male_count: usize,
    pub female_count: usize,
    /// Rounded to two decimals.
    pub average_score: f64,
    pub highest_score: u8,
    pub lowest_score: u8,
}

/// The students of one class. No two share a name, ignoring case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Result<Self, ValidationError> {
        let mut roster = Roster::default();
        for student in students {
            roster.add(student)?;
        }
        Ok(roster)
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn into_students(self) -> Vec<Student> {
        self.students
    }

    /// Appends a student. Surrounding whitespace in the name is dropped.
    pub fn add(&mut self, mut student: Student) -> Result<(), ValidationError> {
        student.trim_name();
        student.validate()?;
        if self.students.iter().any(|s| s.same_name(&student.name)) {
            return Err(ValidationError::DuplicateName(student.name));
        }
        self.students.push(student);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Student, ValidationError> {
        self.check_index(index)?;
        Ok(self.students.remove(index))
    }

    /// Replaces the student at `index`. The replacement may keep the old
    /// name but may not take another student's.
    pub fn update(&mut self, index: usize, mut student: Student) -> Result<(), ValidationError> {
        self.check_index(index)?;
        student.trim_name();
        student.validate()?;
        let clash = self
            .students
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.same_name(&student.name));
        if clash {
            return Err(ValidationError::DuplicateName(student.name));
        }
        self.students[index] = student;
        Ok(())
    }

    pub fn sort_by(&mut self, field: SortField, ascending: bool) {
        self.students.sort_by(|a, b| {
            let ord = match field {
                SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortField::Score => a.score.cmp(&b.score),
                SortField::Sex => a.sex.cmp(&b.sex),
            };
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    /// Students whose name contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<&Student> {
        let term = term.to_lowercase();
        self.students
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&term))
            .collect()
    }

    pub fn stats(&self) -> ClassStats {
        let total = self.students.len();
        if total == 0 {
            return ClassStats {
                total_students: 0,
                male_count: 0,
                female_count: 0,
                average_score: 0.0,
                highest_score: 0,
                lowest_score: 0,
            };
        }

        let male_count = self.students.iter().filter(|s| s.sex == Sex::M).count();
        let sum: u32 = self.students.iter().map(|s| u32::from(s.score)).sum();
        let average = f64::from(sum) / total as f64;
        let scores = self.students.iter().map(|s| s.score);

        ClassStats {
            total_students: total,
            male_count,
            female_count: total - male_count,
            average_score: (average * 100.0).round() / 100.0,
            highest_score: scores.clone().max().unwrap_or(0),
            lowest_score: scores.min().unwrap_or(0),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index >= self.students.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.students.len(),
            });
        }
        Ok(())
    }
}

/// Descending by score; ties keep their roster order.
pub(crate) fn by_score_desc(a: &Student, b: &Student) -> Ordering {
    b.score.cmp(&a.score)
}
